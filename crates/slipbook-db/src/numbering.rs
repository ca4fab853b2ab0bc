//! # Receipt Number Generation
//!
//! Reads the clock and picks the random suffix; the layout itself is
//! [`slipbook_core::numbering::format_receipt_number`].
//!
//! ## Uniqueness
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Two calls in the same millisecond would collide 1 time in 1000.       │
//! │                                                                         │
//! │  call 1 at t=1000  →  ACM-1000-42                                      │
//! │  call 2 at t=1000  →  ACM-1001-42   ← bumped past the last value used  │
//! │  call 3 at t=1005  →  ACM-1005-7                                       │
//! │                                                                         │
//! │  Within one process the millisecond part never repeats, so numbers     │
//! │  never repeat either. Across processes (not supported) the UNIQUE      │
//! │  index on receipts.receipt_number is the backstop.                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use rand::Rng;
use slipbook_core::numbering::format_receipt_number;
use std::sync::atomic::{AtomicI64, Ordering};

/// Largest millisecond value handed out so far in this process.
static LAST_MILLIS: AtomicI64 = AtomicI64::new(0);

/// Generates `"<PREFIX>-<epochMillis>-<0..=999>"` for a business.
///
/// ## Example
/// ```rust
/// use slipbook_db::numbering::generate_receipt_number;
///
/// let number = generate_receipt_number("Acme Traders");
/// assert!(number.starts_with("ACM-"));
/// ```
pub fn generate_receipt_number(business_name: &str) -> String {
    let millis = next_millis(Utc::now().timestamp_millis());
    let suffix: u16 = rand::thread_rng().gen_range(0..1000);
    format_receipt_number(business_name, millis, suffix)
}

/// Returns `now`, or one past the previous value if the clock hasn't moved
/// on (or went backwards).
fn next_millis(now: i64) -> i64 {
    let step = |last: i64| if now > last { now } else { last + 1 };
    match LAST_MILLIS.fetch_update(Ordering::AcqRel, Ordering::Acquire, |last| Some(step(last))) {
        Ok(previous) | Err(previous) => step(previous),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn parts(number: &str) -> (String, i64, u16) {
        let mut it = number.splitn(3, '-');
        let prefix = it.next().unwrap().to_string();
        let millis = it.next().unwrap().parse().unwrap();
        let suffix = it.next().unwrap().parse().unwrap();
        (prefix, millis, suffix)
    }

    #[test]
    fn test_layout() {
        let (prefix, millis, suffix) = parts(&generate_receipt_number("Acme Traders"));
        assert_eq!(prefix, "ACM");
        assert!(millis > 1_600_000_000_000);
        assert!(suffix < 1000);

        let (prefix, _, _) = parts(&generate_receipt_number("A"));
        assert_eq!(prefix, "AXX");
    }

    #[test]
    fn test_rapid_calls_never_repeat() {
        let numbers: HashSet<String> = (0..2_000).map(|_| generate_receipt_number("Acme")).collect();
        assert_eq!(numbers.len(), 2_000);
    }

    #[test]
    fn test_millis_are_strictly_increasing() {
        let a = next_millis(10);
        let b = next_millis(10);
        let c = next_millis(5);
        assert!(b > a);
        assert!(c > b);
    }
}
