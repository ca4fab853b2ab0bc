//! # Business Profile Repository
//!
//! The profile is a singleton: there is at most one row, and saving either
//! creates it or updates it in place.

use slipbook_core::validation::validate_business_profile;
use slipbook_core::{BusinessProfile, BusinessProfileInput};
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use crate::pool::Database;
use crate::schema::Column;

const PROFILE_COLUMNS: &[&str] = &[
    "id",
    "name",
    "phone",
    "address",
    "cac_number",
    "logo_uri",
    "website_uri",
    "custom_footer",
];

/// Repository for the business profile.
#[derive(Debug, Clone)]
pub struct BusinessProfileRepository {
    db: Database,
}

impl BusinessProfileRepository {
    pub fn new(db: Database) -> Self {
        BusinessProfileRepository { db }
    }

    /// Creates the profile, or updates the existing one.
    ///
    /// The existence check and the write share one transaction, so the
    /// same process can never end up with two rows.
    ///
    /// ## Returns
    /// The profile's id (unchanged across updates).
    pub async fn save(&self, input: &BusinessProfileInput) -> DbResult<String> {
        validate_business_profile(input)?;
        let pool = self.db.writer().await?;
        let columns = self.db.columns().await?;

        let mut tx = pool.begin().await?;

        let existing: Option<String> =
            sqlx::query_scalar("SELECT id FROM business_profile ORDER BY rowid LIMIT 1")
                .fetch_optional(&mut *tx)
                .await?;

        let id = match existing {
            Some(id) => {
                debug!(id = %id, "Updating business profile");
                columns
                    .update("business_profile", profile_values(input), "id", &id)
                    .build()
                    .execute(&mut *tx)
                    .await?;
                id
            }
            None => {
                let id = Uuid::new_v4().to_string();
                debug!(id = %id, "Creating business profile");
                let mut values: Vec<Column> = vec![("id", id.as_str().into())];
                values.extend(profile_values(input));
                columns
                    .insert("business_profile", values)
                    .build()
                    .execute(&mut *tx)
                    .await?;
                id
            }
        };

        tx.commit().await?;

        Ok(id)
    }

    /// The profile, if one has been saved.
    pub async fn get(&self) -> DbResult<Option<BusinessProfile>> {
        let Some(pool) = self.db.reader().await? else {
            return Ok(None);
        };

        let columns = self.db.columns().await?;
        let profile = sqlx::query_as(&format!(
            "SELECT {} FROM business_profile ORDER BY rowid LIMIT 1",
            columns.select_list("business_profile", PROFILE_COLUMNS)
        ))
        .fetch_optional(pool)
        .await?;

        Ok(profile)
    }
}

fn profile_values(input: &BusinessProfileInput) -> Vec<Column> {
    vec![
        ("name", input.name.trim().into()),
        ("phone", input.phone.trim().into()),
        ("address", input.address.as_deref().into()),
        ("cac_number", input.cac_number.as_deref().into()),
        ("logo_uri", input.logo_uri.as_deref().into()),
        ("website_uri", input.website_uri.as_deref().into()),
        ("custom_footer", input.custom_footer.as_deref().into()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use crate::migrations::{run_migrations_with, Migration, MIGRATIONS};
    use crate::pool::DbConfig;

    #[tokio::test]
    async fn test_save_twice_keeps_one_row() {
        let db = Database::open(DbConfig::in_memory()).await.unwrap();
        let repo = db.business_profile();

        assert!(repo.get().await.unwrap().is_none());

        let first = repo.save(&BusinessProfileInput::new("Acme", "555")).await.unwrap();

        let mut input = BusinessProfileInput::new("Acme Traders", "0803 000 0000");
        input.cac_number = Some("RC123456".to_string());
        input.custom_footer = Some("No refunds".to_string());
        let second = repo.save(&input).await.unwrap();

        assert_eq!(first, second);

        let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM business_profile")
            .fetch_one(db.pool().await.unwrap())
            .await
            .unwrap();
        assert_eq!(rows, 1);

        let profile = repo.get().await.unwrap().unwrap();
        assert_eq!(profile.id, first);
        assert_eq!(profile.name, "Acme Traders");
        assert_eq!(profile.cac_number.as_deref(), Some("RC123456"));
        assert_eq!(profile.custom_footer.as_deref(), Some("No refunds"));
    }

    #[tokio::test]
    async fn test_missing_phone_rejected_before_write() {
        let db = Database::open(DbConfig::in_memory()).await.unwrap();
        let repo = db.business_profile();

        let err = repo.save(&BusinessProfileInput::new("Acme", "")).await.unwrap_err();
        assert!(matches!(err, DbError::Validation(_)));
        assert_eq!(err.user_message(), "phone is required");
        assert!(repo.get().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_profile_without_footer_columns() {
        let db = Database::new(DbConfig::in_memory().run_migrations(false));
        let without_v4: Vec<Migration> =
            MIGRATIONS.iter().copied().filter(|m| m.version != 4).collect();
        run_migrations_with(db.pool().await.unwrap(), &without_v4)
            .await
            .unwrap();

        let repo = db.business_profile();
        let mut input = BusinessProfileInput::new("Acme", "555");
        input.custom_footer = Some("No refunds".to_string());
        let id = repo.save(&input).await.unwrap();

        input.name = "Acme Traders".to_string();
        assert_eq!(repo.save(&input).await.unwrap(), id);

        let profile = repo.get().await.unwrap().unwrap();
        assert_eq!(profile.name, "Acme Traders");
        assert_eq!(profile.custom_footer, None);
        assert_eq!(profile.website_uri, None);
    }

    #[tokio::test]
    async fn test_unsupported_platform() {
        let repo = Database::unsupported().business_profile();
        assert!(repo.get().await.unwrap().is_none());
        assert!(matches!(
            repo.save(&BusinessProfileInput::new("Acme", "555")).await,
            Err(DbError::UnsupportedPlatform)
        ));
    }
}
