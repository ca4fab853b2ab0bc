//! # Payment Status Rules
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │      ┌────────┐        ┌──────────┐        ┌───────────┐               │
//! │      │ unset  │◄──────►│ not_paid │◄──────►│ part_paid │               │
//! │      └───┬────┘        └────┬─────┘        └─────┬─────┘               │
//! │          │                  │                    │                      │
//! │          └──────────────────┴─────────┬──────────┘                      │
//! │                                       ▼                                 │
//! │                                  ┌────────┐                             │
//! │                                  │  paid  │  (and back again)           │
//! │                                  └────────┘                             │
//! │                                                                         │
//! │  Every transition is allowed, before or after save. Whatever is         │
//! │  persisted last wins.                                                   │
//! │                                                                         │
//! │  unset, not_paid  →  amount_paid absent                                │
//! │  part_paid        →  0 < amount_paid < total                           │
//! │  paid             →  amount_paid == total                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! [`resolve_payment`] is the forgiving form used while a user is editing:
//! it fills in or drops the amount where the status decides it.
//! [`validate_payment`] is the strict form the repository applies before
//! writing.

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::PaymentStatus;
use crate::validation::ValidationResult;

/// Normalizes the amount paid for a chosen status.
///
/// ## Example
/// ```rust
/// use slipbook_core::money::Money;
/// use slipbook_core::payment::resolve_payment;
/// use slipbook_core::types::PaymentStatus;
///
/// let total = Money::from_kobo(25_000);
///
/// // Paid always means the full total, whatever was typed
/// let paid = resolve_payment(Some(PaymentStatus::Paid), None, total).unwrap();
/// assert_eq!(paid, Some(total));
///
/// // Not paid drops any amount that was typed before switching
/// let none = resolve_payment(Some(PaymentStatus::NotPaid), Some(Money::from_kobo(5)), total);
/// assert_eq!(none.unwrap(), None);
///
/// // Part paid must be strictly between zero and the total
/// assert!(resolve_payment(Some(PaymentStatus::PartPaid), Some(total), total).is_err());
/// ```
pub fn resolve_payment(
    status: Option<PaymentStatus>,
    amount_paid: Option<Money>,
    total: Money,
) -> ValidationResult<Option<Money>> {
    match status {
        None | Some(PaymentStatus::NotPaid) => Ok(None),
        Some(PaymentStatus::Paid) => Ok(Some(total)),
        Some(PaymentStatus::PartPaid) => {
            let amount = amount_paid.ok_or_else(|| ValidationError::required("amount paid"))?;
            check_part_payment(amount, total)?;
            Ok(Some(amount))
        }
    }
}

/// Checks that a stored status and amount agree with the total.
pub fn validate_payment(
    status: Option<PaymentStatus>,
    amount_paid: Option<Money>,
    total: Money,
) -> ValidationResult<()> {
    match (status, amount_paid) {
        (None | Some(PaymentStatus::NotPaid), None) => Ok(()),
        (None | Some(PaymentStatus::NotPaid), Some(_)) => Err(ValidationError::PaymentAmount {
            reason: "must be empty unless the receipt is paid or part paid".to_string(),
        }),
        (Some(PaymentStatus::Paid), Some(amount)) if amount == total => Ok(()),
        (Some(PaymentStatus::Paid), _) => Err(ValidationError::PaymentAmount {
            reason: format!("must equal the total {} when paid", total),
        }),
        (Some(PaymentStatus::PartPaid), None) => Err(ValidationError::required("amount paid")),
        (Some(PaymentStatus::PartPaid), Some(amount)) => check_part_payment(amount, total),
    }
}

fn check_part_payment(amount: Money, total: Money) -> ValidationResult<()> {
    if !amount.is_positive() {
        return Err(ValidationError::PaymentAmount {
            reason: "must be greater than zero for a part payment".to_string(),
        });
    }
    if amount >= total {
        return Err(ValidationError::PaymentAmount {
            reason: format!("must be less than the total {} for a part payment", total),
        });
    }
    Ok(())
}

/// What is still owed on a receipt.
///
/// Unset and not-paid receipts owe the full total. A negative result is
/// returned as-is rather than clamped.
pub fn balance_due(status: Option<PaymentStatus>, amount_paid: Option<Money>, total: Money) -> Money {
    match status {
        Some(PaymentStatus::Paid) => total - amount_paid.unwrap_or(total),
        Some(PaymentStatus::PartPaid) => total - amount_paid.unwrap_or_default(),
        Some(PaymentStatus::NotPaid) | None => total,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const TOTAL: Money = Money::from_kobo(25_000);

    #[test]
    fn test_resolve_payment() {
        assert_eq!(resolve_payment(None, Some(TOTAL), TOTAL).unwrap(), None);
        assert_eq!(
            resolve_payment(Some(PaymentStatus::Paid), Some(Money::from_kobo(1)), TOTAL).unwrap(),
            Some(TOTAL)
        );
        assert_eq!(
            resolve_payment(
                Some(PaymentStatus::PartPaid),
                Some(Money::from_kobo(10_000)),
                TOTAL
            )
            .unwrap(),
            Some(Money::from_kobo(10_000))
        );
        assert!(matches!(
            resolve_payment(Some(PaymentStatus::PartPaid), None, TOTAL),
            Err(ValidationError::Required { .. })
        ));
        assert!(resolve_payment(Some(PaymentStatus::PartPaid), Some(Money::zero()), TOTAL).is_err());
    }

    #[test]
    fn test_validate_payment_strict() {
        assert!(validate_payment(None, None, TOTAL).is_ok());
        assert!(validate_payment(Some(PaymentStatus::NotPaid), None, TOTAL).is_ok());
        assert!(validate_payment(Some(PaymentStatus::NotPaid), Some(TOTAL), TOTAL).is_err());

        assert!(validate_payment(Some(PaymentStatus::Paid), Some(TOTAL), TOTAL).is_ok());
        assert!(validate_payment(Some(PaymentStatus::Paid), None, TOTAL).is_err());
        assert!(
            validate_payment(Some(PaymentStatus::Paid), Some(Money::from_kobo(1)), TOTAL).is_err()
        );

        assert!(validate_payment(
            Some(PaymentStatus::PartPaid),
            Some(Money::from_kobo(24_999)),
            TOTAL
        )
        .is_ok());
        assert!(validate_payment(Some(PaymentStatus::PartPaid), Some(TOTAL), TOTAL).is_err());
        assert!(validate_payment(
            Some(PaymentStatus::PartPaid),
            Some(Money::from_kobo(-1)),
            TOTAL
        )
        .is_err());
    }

    #[test]
    fn test_balance_due() {
        assert_eq!(balance_due(None, None, TOTAL), TOTAL);
        assert_eq!(balance_due(Some(PaymentStatus::NotPaid), None, TOTAL), TOTAL);
        assert!(balance_due(Some(PaymentStatus::Paid), Some(TOTAL), TOTAL).is_zero());
        assert!(balance_due(Some(PaymentStatus::Paid), None, TOTAL).is_zero());
        assert_eq!(
            balance_due(
                Some(PaymentStatus::PartPaid),
                Some(Money::from_kobo(10_000)),
                TOTAL
            )
            .kobo(),
            15_000
        );
    }
}
