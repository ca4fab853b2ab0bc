//! # Receipt Numbering
//!
//! ```text
//!   "Acme Traders"  ──►  ACM - 1760868000123 - 42
//!                        ───   ─────────────   ──
//!                        │     │               └── random 0..=999
//!                        │     └── milliseconds since the Unix epoch
//!                        └── first 3 ASCII alphanumerics, uppercased, X-padded
//! ```
//!
//! Only the pure layout lives here. Reading the clock and picking the
//! random suffix happens in `slipbook-db::numbering`.

use crate::{RECEIPT_PREFIX_LEN, RECEIPT_PREFIX_PAD};

/// Business prefix of a receipt number.
///
/// Everything but ASCII letters and digits is stripped before truncation,
/// so the result is always exactly three ASCII characters. Accented
/// letters are dropped rather than transliterated.
///
/// ## Example
/// ```rust
/// use slipbook_core::numbering::receipt_prefix;
///
/// assert_eq!(receipt_prefix("Acme Traders"), "ACM");
/// assert_eq!(receipt_prefix("A"), "AXX");
/// assert_eq!(receipt_prefix("J&J Stores"), "JJS");
/// assert_eq!(receipt_prefix("!!"), "XXX");
/// assert_eq!(receipt_prefix("Ọjà Market"), "JMA");
/// ```
pub fn receipt_prefix(business_name: &str) -> String {
    let mut prefix: String = business_name
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_uppercase())
        .take(RECEIPT_PREFIX_LEN)
        .collect();

    while prefix.len() < RECEIPT_PREFIX_LEN {
        prefix.push(RECEIPT_PREFIX_PAD);
    }

    prefix
}

/// Lays out `<PREFIX>-<epochMillis>-<suffix>`.
pub fn format_receipt_number(business_name: &str, epoch_millis: i64, suffix: u16) -> String {
    format!("{}-{}-{}", receipt_prefix(business_name), epoch_millis, suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_is_always_three_chars() {
        for name in ["", "a", "ab", "abc", "abcd", "Ọjà Market", "  --  ", "123 Ltd"] {
            let prefix = receipt_prefix(name);
            assert_eq!(prefix.len(), 3, "name: {:?}", name);
            assert!(prefix.is_ascii(), "name: {:?}", name);
        }
        assert_eq!(receipt_prefix("Ọjà Market"), "JMA");
        assert_eq!(receipt_prefix("Ẹ̀kọ́ Stores"), "KST");
    }

    #[test]
    fn test_prefix_strips_before_truncating() {
        assert_eq!(receipt_prefix("A.B.C. Ventures"), "ABC");
        assert_eq!(receipt_prefix("  acme"), "ACM");
        assert_eq!(receipt_prefix("7Up Depot"), "7UP");
    }

    #[test]
    fn test_prefix_is_stable() {
        assert_eq!(receipt_prefix("Acme Traders"), receipt_prefix("Acme Traders"));
    }

    #[test]
    fn test_format_receipt_number() {
        assert_eq!(
            format_receipt_number("Acme", 1_760_868_000_123, 7),
            "ACM-1760868000123-7"
        );
        assert_eq!(format_receipt_number("", 0, 999), "XXX-0-999");
    }
}
