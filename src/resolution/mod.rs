//! Identity resolution: turning partial identifiers (serial number or
//! phone fragments) into concrete customer/warranty records, and the
//! derived warranty status attached to a serial number.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub mod draft;

pub use draft::{RepairDraft, ResolutionOutcome};

/// Minimum serial fragment length before a lookup is dispatched.
pub const MIN_SERIAL_FRAGMENT_LEN: usize = 2;

/// Minimum phone fragment length before a lookup is dispatched.
pub const MIN_PHONE_FRAGMENT_LEN: usize = 3;

/// A warranty month counts as 30 days.
pub const DAYS_PER_WARRANTY_MONTH: i64 = 30;

/// Guard for search-as-you-type serial lookups. Short fragments
/// short-circuit to an empty result without touching the database.
pub fn serial_fragment_ok(fragment: &str) -> bool {
    fragment.trim().chars().count() >= MIN_SERIAL_FRAGMENT_LEN
}

/// Guard for search-as-you-type phone lookups.
pub fn phone_fragment_ok(fragment: &str) -> bool {
    fragment.trim().chars().count() >= MIN_PHONE_FRAGMENT_LEN
}

/// Warranty state resolved from a serial number. Read-only and fully
/// derived; nothing here is persisted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct WarrantyInfo {
    pub serial_number: String,
    pub product_name: String,
    pub category: String,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_email: String,
    pub purchase_date: NaiveDate,
    pub warranty_months: i32,
    pub is_under_warranty: bool,
    /// Days until the warranty lapses; negative once it has.
    pub warranty_remaining_days: i64,
}

impl WarrantyInfo {
    /// Derives warranty status as of `today`. A registration is under
    /// warranty while `today ≤ purchase_date + warranty_months`.
    #[allow(clippy::too_many_arguments)]
    pub fn derive(
        serial_number: String,
        product_name: String,
        category: String,
        customer_name: String,
        customer_phone: String,
        customer_email: String,
        purchase_date: NaiveDate,
        warranty_months: i32,
        today: NaiveDate,
    ) -> Self {
        let expiry =
            purchase_date + Duration::days(warranty_months as i64 * DAYS_PER_WARRANTY_MONTH);
        let warranty_remaining_days = (expiry - today).num_days();
        Self {
            serial_number,
            product_name,
            category,
            customer_name,
            customer_phone,
            customer_email,
            purchase_date,
            warranty_months,
            is_under_warranty: today <= expiry,
            warranty_remaining_days,
        }
    }
}

/// Token identifying one dispatched lookup.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct SearchToken(u64);

/// Monotonic sequence guarding search-as-you-type against out-of-order
/// response arrival: only the latest-issued token's result is
/// accepted, so a stale response can never overwrite newer input.
#[derive(Debug, Default)]
pub struct SearchSequence {
    latest: AtomicU64,
}

impl SearchSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues the token for a newly dispatched lookup, superseding all
    /// earlier ones.
    pub fn issue(&self) -> SearchToken {
        SearchToken(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Whether `token` still identifies the latest dispatched lookup.
    pub fn is_current(&self, token: SearchToken) -> bool {
        self.latest.load(Ordering::SeqCst) == token.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(purchase_days_ago: i64, months: i32, today: NaiveDate) -> WarrantyInfo {
        WarrantyInfo::derive(
            "SN-1001".to_string(),
            "ProBook 450".to_string(),
            "Laptop".to_string(),
            "Kamal Silva".to_string(),
            "0712345678".to_string(),
            "kamal@example.com".to_string(),
            today - Duration::days(purchase_days_ago),
            months,
            today,
        )
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()
    }

    #[test]
    fn fragment_guards_enforce_minimum_lengths() {
        assert!(!serial_fragment_ok(""));
        assert!(!serial_fragment_ok("S"));
        assert!(serial_fragment_ok("SN"));
        assert!(!phone_fragment_ok("07"));
        assert!(phone_fragment_ok("071"));
        assert!(!phone_fragment_ok("  0  "));
    }

    #[test]
    fn warranty_active_inside_the_window() {
        // 80 days into a 3-month (90-day) warranty: 10 days left.
        let info = info(80, 3, today());
        assert!(info.is_under_warranty);
        assert_eq!(info.warranty_remaining_days, 10);
    }

    #[test]
    fn warranty_lapsed_outside_the_window() {
        // 100 days into a 3-month (90-day) warranty: lapsed 10 days ago.
        let info = info(100, 3, today());
        assert!(!info.is_under_warranty);
        assert_eq!(info.warranty_remaining_days, -10);
    }

    #[test]
    fn warranty_boundary_day_counts_as_covered() {
        let info = info(90, 3, today());
        assert!(info.is_under_warranty);
        assert_eq!(info.warranty_remaining_days, 0);
    }

    #[test]
    fn under_warranty_iff_remaining_non_negative() {
        for days_ago in [0, 30, 89, 90, 91, 365] {
            let info = info(days_ago, 3, today());
            assert_eq!(info.is_under_warranty, info.warranty_remaining_days >= 0);
        }
    }

    #[test]
    fn latest_token_wins() {
        let seq = SearchSequence::new();
        let first = seq.issue();
        let second = seq.issue();
        assert!(!seq.is_current(first));
        assert!(seq.is_current(second));
    }
}
