//! Proxy lifecycle state machine and control messages
//!
//! ```text
//! Installing -> Waiting -> Activating -> Active -> Redundant
//!      \            \           \
//!       +------------+-----------+--------------> Redundant
//! ```

use crate::error::{PrecacheError, PrecacheResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of one proxy instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
    /// Precaching the manifest into its namespace
    Installing,
    /// Installed; another instance still controls pages
    Waiting,
    /// Purging stale namespaces
    Activating,
    /// Controls pages and answers fetches
    Active,
    /// Replaced or failed; never serves again
    Redundant,
}

impl LifecycleState {
    /// Whether `next` is a legal successor of this state
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Installing, Self::Waiting)
                | (Self::Waiting, Self::Activating)
                | (Self::Activating, Self::Active)
                | (Self::Installing | Self::Waiting | Self::Activating | Self::Active, Self::Redundant)
        )
    }

    /// Move to `next`, rejecting illegal transitions
    pub fn transition(self, next: Self) -> PrecacheResult<Self> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(PrecacheError::Lifecycle {
                from: self.to_string(),
                to: next.to_string(),
            })
        }
    }

    /// Whether this instance may answer fetches
    pub fn is_serving(self) -> bool {
        matches!(self, Self::Active)
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Installing => write!(f, "installing"),
            Self::Waiting => write!(f, "waiting"),
            Self::Activating => write!(f, "activating"),
            Self::Active => write!(f, "active"),
            Self::Redundant => write!(f, "redundant"),
        }
    }
}

/// Messages a page may post to the proxy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControlMessage {
    /// Leave `Waiting` without waiting for the previous instance's pages to close
    SkipWaiting,
}

impl ControlMessage {
    /// Parse a posted JSON message; anything unrecognised is ignored
    pub fn parse(raw: &str) -> Option<Self> {
        serde_json::from_str(raw).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_transitions() {
        let state = LifecycleState::Installing
            .transition(LifecycleState::Waiting)
            .and_then(|s| s.transition(LifecycleState::Activating))
            .and_then(|s| s.transition(LifecycleState::Active))
            .and_then(|s| s.transition(LifecycleState::Redundant))
            .unwrap();
        assert_eq!(state, LifecycleState::Redundant);
    }

    #[test]
    fn any_live_state_can_become_redundant() {
        for state in [
            LifecycleState::Installing,
            LifecycleState::Waiting,
            LifecycleState::Activating,
            LifecycleState::Active,
        ] {
            assert!(state.can_transition_to(LifecycleState::Redundant), "{state}");
        }
    }

    #[test]
    fn illegal_transitions_rejected() {
        assert!(LifecycleState::Installing
            .transition(LifecycleState::Active)
            .is_err());
        assert!(LifecycleState::Redundant
            .transition(LifecycleState::Active)
            .is_err());
        let err = LifecycleState::Active
            .transition(LifecycleState::Waiting)
            .unwrap_err();
        assert!(err.to_string().contains("active to waiting"));
    }

    #[test]
    fn only_active_serves() {
        assert!(LifecycleState::Active.is_serving());
        assert!(!LifecycleState::Waiting.is_serving());
        assert!(!LifecycleState::Redundant.is_serving());
    }

    #[test]
    fn parse_skip_waiting_message() {
        assert_eq!(
            ControlMessage::parse(r#"{"type":"SKIP_WAITING"}"#),
            Some(ControlMessage::SkipWaiting)
        );
        assert_eq!(ControlMessage::parse(r#"{"type":"PING"}"#), None);
        assert_eq!(ControlMessage::parse("not json"), None);
    }
}
