//! Property-based tests for the pure core: lifecycle ordering, money
//! normalization, and phone validation. None of these touch the
//! database.

use fixpoint_api::lifecycle::{
    is_valid_transition, valid_next_statuses, RepairStatus, STATUS_ORDER,
};
use fixpoint_api::validation::{is_valid_phone, parse_money};
use proptest::prelude::*;
use rust_decimal::Decimal;

fn group_with_separators(digits: &str) -> String {
    let mut grouped = String::new();
    for (i, c) in digits.chars().enumerate() {
        let remaining = digits.len() - i;
        if i > 0 && remaining % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}

proptest! {
    #[test]
    fn transition_validity_is_exactly_rank_order(a in 0usize..4, b in 0usize..4) {
        let from = STATUS_ORDER[a];
        let to = STATUS_ORDER[b];
        prop_assert_eq!(is_valid_transition(from, to), b > a);
    }

    #[test]
    fn next_statuses_are_strictly_later_and_sorted(a in 0usize..4) {
        let current = STATUS_ORDER[a];
        let next = valid_next_statuses(Some(current));
        prop_assert_eq!(next.len(), STATUS_ORDER.len() - 1 - a);
        for window in next.windows(2) {
            prop_assert!(window[0].rank() < window[1].rank());
        }
        for status in next {
            prop_assert!(status.rank() > current.rank());
        }
    }

    #[test]
    fn thousands_separators_never_change_an_amount(n in 0u64..1_000_000_000_000) {
        let plain = n.to_string();
        let grouped = group_with_separators(&plain);
        prop_assert_eq!(
            parse_money(&grouped).expect("grouped amount parses"),
            Decimal::from(n)
        );
    }

    #[test]
    fn negative_amounts_are_always_rejected(n in 1u64..1_000_000_000) {
        let raw = format!("-{}", n);
        prop_assert!(parse_money(&raw).is_err());
    }

    #[test]
    fn local_and_international_phones_are_accepted(suffix in "[0-9]{8}") {
        let local = format!("07{}", suffix);
        let international = format!("+947{}", suffix);
        prop_assert!(is_valid_phone(&local));
        prop_assert!(is_valid_phone(&international));
    }

    #[test]
    fn short_digit_strings_are_rejected(digits in "[0-9]{0,9}") {
        prop_assert!(!is_valid_phone(&digits));
    }
}

#[test]
fn picked_up_reaches_nothing() {
    assert!(valid_next_statuses(Some(RepairStatus::PickedUp)).is_empty());
}
