//! Order lifecycle status

use serde::{Deserialize, Serialize};

/// Order status (ordered lifecycle, not a free lattice)
///
/// The main path is Open → InPreparation → Ready → Delivered. Canceled is
/// reachable from any non-terminal state; Finalized is reachable from any
/// state via an explicit status update and closes the order for good.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    Open,
    InPreparation,
    Ready,
    Delivered,
    Canceled,
    Finalized,
}

impl OrderStatus {
    /// True while line items may still be added, edited, or removed
    pub fn allows_item_mutation(&self) -> bool {
        matches!(self, Self::Open | Self::InPreparation)
    }

    /// True for states that end the order lifecycle
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Canceled | Self::Finalized)
    }

    /// Position on the main lifecycle path, None for off-path states
    fn rank(&self) -> Option<u8> {
        match self {
            Self::Open => Some(0),
            Self::InPreparation => Some(1),
            Self::Ready => Some(2),
            Self::Delivered => Some(3),
            Self::Canceled | Self::Finalized => None,
        }
    }

    /// Whether a status write from `self` to `next` is allowed
    ///
    /// Rewriting the current status is a no-op, not an error. Movement
    /// along the main path is forward-only.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        if *self == next {
            return true;
        }
        match next {
            Self::Finalized => true,
            Self::Canceled => !self.is_terminal(),
            _ => match (self.rank(), next.rank()) {
                (Some(from), Some(to)) => to > from,
                _ => false,
            },
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Open => "OPEN",
            Self::InPreparation => "IN_PREPARATION",
            Self::Ready => "READY",
            Self::Delivered => "DELIVERED",
            Self::Canceled => "CANCELED",
            Self::Finalized => "FINALIZED",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::OrderStatus::*;

    #[test]
    fn test_item_mutation_gate() {
        assert!(Open.allows_item_mutation());
        assert!(InPreparation.allows_item_mutation());
        assert!(!Ready.allows_item_mutation());
        assert!(!Delivered.allows_item_mutation());
        assert!(!Canceled.allows_item_mutation());
        assert!(!Finalized.allows_item_mutation());
    }

    #[test]
    fn test_forward_only_main_path() {
        assert!(Open.can_transition_to(InPreparation));
        assert!(Open.can_transition_to(Delivered));
        assert!(InPreparation.can_transition_to(Ready));
        assert!(!Delivered.can_transition_to(Open));
        assert!(!Ready.can_transition_to(InPreparation));
    }

    #[test]
    fn test_canceled_from_non_terminal_only() {
        assert!(Open.can_transition_to(Canceled));
        assert!(Delivered.can_transition_to(Canceled));
        assert!(!Finalized.can_transition_to(Canceled));
        assert!(!Canceled.can_transition_to(Open));
    }

    #[test]
    fn test_finalized_from_any_state() {
        assert!(Open.can_transition_to(Finalized));
        assert!(Delivered.can_transition_to(Finalized));
        assert!(Canceled.can_transition_to(Finalized));
        assert!(!Finalized.can_transition_to(Delivered));
    }

    #[test]
    fn test_rewrite_is_noop() {
        assert!(Finalized.can_transition_to(Finalized));
        assert!(Canceled.can_transition_to(Canceled));
        assert!(Open.can_transition_to(Open));
    }

    #[test]
    fn test_serde_screaming_snake_case() {
        let json = serde_json::to_string(&InPreparation).unwrap();
        assert_eq!(json, "\"IN_PREPARATION\"");
        let back: super::OrderStatus = serde_json::from_str("\"FINALIZED\"").unwrap();
        assert_eq!(back, Finalized);
    }
}
