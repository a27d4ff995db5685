//! Expiration Classifier - Urgency Bucketing for Tracked Items
//!
//! ## Responsibilities
//!
//! - Parse dd/MM/yyyy expiration strings
//! - Compute day difference against an injected "today"
//! - Bucket into an urgency class for display and filtering
//!
//! The current date is a parameter, never read from an ambient clock, so
//! every function here is deterministic and unit-testable.

use crate::models::UrgencyClass;
use chrono::NaiveDate;

/// Expected expiration date format (day/month/year)
pub const DATE_FORMAT: &str = "%d/%m/%Y";

/// Parse an expiration date string in dd/MM/yyyy form
pub fn parse_expiration(date: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(date.trim(), DATE_FORMAT).ok()
}

/// Whole days from `today` until `date` (negative when already expired)
pub fn days_until(date: NaiveDate, today: NaiveDate) -> i64 {
    date.signed_duration_since(today).num_days()
}

/// Classify an expiration date string against `today`
///
/// `d <= 3` days left is critical (already-expired items included),
/// `4..=7` is a warning, more than 7 is normal. Unparseable input maps to
/// `Unknown` rather than an error so one bad date never halts list
/// processing.
pub fn classify(expiration_date: &str, today: NaiveDate) -> UrgencyClass {
    match parse_expiration(expiration_date) {
        Some(date) => {
            let days_left = days_until(date, today);
            if days_left <= 3 {
                UrgencyClass::Critical
            } else if days_left <= 7 {
                UrgencyClass::Warning
            } else {
                UrgencyClass::Normal
            }
        }
        None => UrgencyClass::Unknown,
    }
}

/// Whether an item belongs in the "expiring soon" banner
///
/// The banner only lists items still ahead of (or on) their date, so the
/// window is `0..=3` days, not every critical item.
pub fn is_expiring_soon(expiration_date: &str, today: NaiveDate) -> bool {
    match parse_expiration(expiration_date) {
        Some(date) => (0..=3).contains(&days_until(date, today)),
        None => false,
    }
}
