//! Repair ticket lifecycle.
//!
//! A repair ticket moves through a strictly ordered, one-directional
//! progression: Pending → Completed → Cannot Repair → Picked Up.
//! Transitions may skip forward but never move backward or repeat the
//! current status. All checks here are synchronous and infallible;
//! callers get a value describing validity, never an error.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};
use utoipa::ToSchema;

/// Status of a repair ticket.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
    ToSchema,
)]
pub enum RepairStatus {
    #[strum(serialize = "Pending")]
    Pending,
    #[strum(serialize = "Completed")]
    Completed,
    #[serde(rename = "Cannot Repair")]
    #[strum(serialize = "Cannot Repair")]
    CannotRepair,
    #[serde(rename = "Picked Up")]
    #[strum(serialize = "Picked Up")]
    PickedUp,
}

/// Lifecycle order. The index of a status in this table is its rank.
pub const STATUS_ORDER: [RepairStatus; 4] = [
    RepairStatus::Pending,
    RepairStatus::Completed,
    RepairStatus::CannotRepair,
    RepairStatus::PickedUp,
];

impl RepairStatus {
    /// Rank used to enforce forward-only progression.
    pub fn rank(self) -> u8 {
        match self {
            RepairStatus::Pending => 0,
            RepairStatus::Completed => 1,
            RepairStatus::CannotRepair => 2,
            RepairStatus::PickedUp => 3,
        }
    }

    /// Parses an exact status label. Labels outside the lifecycle
    /// table (including legacy ad hoc ones) yield `None` and are
    /// treated as invalid by every consumer, never defaulted.
    pub fn parse(label: &str) -> Option<Self> {
        label.parse().ok()
    }

    /// Whether any forward transition remains.
    pub fn is_terminal(self) -> bool {
        self.rank() as usize == STATUS_ORDER.len() - 1
    }
}

/// Statuses reachable from `current`, in ascending rank order.
///
/// `None` (no prior status, e.g. a ticket being created) yields the
/// full table so the caller can offer an initial selection.
pub fn valid_next_statuses(current: Option<RepairStatus>) -> Vec<RepairStatus> {
    match current {
        Some(status) => RepairStatus::iter()
            .filter(|next| next.rank() > status.rank())
            .collect(),
        None => STATUS_ORDER.to_vec(),
    }
}

/// True iff `next` sits strictly later in the lifecycle than
/// `current`. Skipping ranks is allowed; equal or lower rank is not.
pub fn is_valid_transition(current: RepairStatus, next: RepairStatus) -> bool {
    next.rank() > current.rank()
}

/// Label-level transition check for statuses arriving off the wire.
/// Unknown labels on either side fail the check.
pub fn is_valid_transition_labels(current: &str, next: &str) -> bool {
    match (RepairStatus::parse(current), RepairStatus::parse(next)) {
        (Some(from), Some(to)) => is_valid_transition(from, to),
        _ => false,
    }
}

/// Diagnostic for a rejected transition; empty string when valid.
///
/// The three failure modes get distinct messages so the caller can
/// surface exactly what went wrong.
pub fn explain_invalid_transition(current: &str, next: &str) -> String {
    let from = RepairStatus::parse(current);
    let to = RepairStatus::parse(next);

    match (from, to) {
        (None, _) => format!("current status '{}' is not a recognized repair status", current),
        (_, None) => format!("next status '{}' is not a recognized repair status", next),
        (Some(from), Some(to)) if !is_valid_transition(from, to) => format!(
            "cannot move a repair backward or repeat its status (from '{}' to '{}')",
            from, to
        ),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rank_matches_table_position() {
        for (position, status) in STATUS_ORDER.iter().enumerate() {
            assert_eq!(status.rank() as usize, position);
        }
    }

    #[test]
    fn transition_validity_follows_rank_for_all_pairs() {
        for from in RepairStatus::iter() {
            for to in RepairStatus::iter() {
                assert_eq!(
                    is_valid_transition(from, to),
                    to.rank() > from.rank(),
                    "{from} -> {to}"
                );
            }
        }
    }

    #[test]
    fn no_op_transitions_are_rejected() {
        for status in RepairStatus::iter() {
            assert!(!is_valid_transition(status, status));
        }
    }

    #[test]
    fn picked_up_is_terminal() {
        assert!(RepairStatus::PickedUp.is_terminal());
        assert!(valid_next_statuses(Some(RepairStatus::PickedUp)).is_empty());
    }

    #[test]
    fn pending_can_reach_every_later_status_in_order() {
        assert_eq!(
            valid_next_statuses(Some(RepairStatus::Pending)),
            vec![
                RepairStatus::Completed,
                RepairStatus::CannotRepair,
                RepairStatus::PickedUp,
            ]
        );
    }

    #[test]
    fn missing_current_status_offers_the_full_table() {
        assert_eq!(valid_next_statuses(None), STATUS_ORDER.to_vec());
    }

    #[test]
    fn skipping_ranks_is_allowed() {
        assert!(is_valid_transition(
            RepairStatus::Pending,
            RepairStatus::PickedUp
        ));
        assert!(is_valid_transition_labels("Pending", "Picked Up"));
    }

    #[test]
    fn backward_transition_gets_backward_diagnostic() {
        let message = explain_invalid_transition("Completed", "Pending");
        assert!(message.contains("backward"), "{message}");
    }

    #[test]
    fn unknown_labels_get_distinct_diagnostics() {
        let unknown_current = explain_invalid_transition("In Progress", "Completed");
        assert!(unknown_current.contains("current status 'In Progress'"));

        let unknown_next = explain_invalid_transition("Pending", "Waiting for Parts");
        assert!(unknown_next.contains("next status 'Waiting for Parts'"));

        assert_ne!(unknown_current, unknown_next);
    }

    #[test]
    fn valid_transition_explains_as_empty() {
        assert!(explain_invalid_transition("Pending", "Completed").is_empty());
    }

    #[test]
    fn labels_round_trip_through_display_and_parse() {
        for status in RepairStatus::iter() {
            assert_eq!(RepairStatus::parse(&status.to_string()), Some(status));
        }
    }

    #[test]
    fn legacy_labels_are_not_ranked() {
        for label in ["In Progress", "Waiting for Parts", "pending", ""] {
            assert_eq!(RepairStatus::parse(label), None);
            assert!(!is_valid_transition_labels(label, "Completed"));
        }
    }
}
