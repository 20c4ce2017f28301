//! Status-edge derivation.
//!
//! Each job write is reduced to at most one typed edge, computed from the
//! before/after state pair alone. Because the edge is derived per write, a
//! flag that rises exactly once produces its edge exactly once, and repeated
//! delivery of an unchanged snapshot produces `None`.

use thiserror::Error;

use crate::types::BuildState;

/// The single action a job write asks of the synchronizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusEdge {
    /// No flag rose; nothing to do.
    None,
    StartedProcessing,
    Succeeded,
    Failed,
}

/// A state pair outside the allowed transition set.
///
/// Seen when the executor violates the monotonic-flag contract (a terminal
/// job moving again, or an un-rising write). Treated as a logged no-op by the
/// caller, never a panic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid status transition: {from:?} -> {to:?}")]
pub struct InvalidTransition {
    pub from: BuildState,
    pub to: BuildState,
}

/// Derives the edge for an observed `old -> new` state pair.
///
/// Allowed: any state to itself (edge `None`); `NotStarted` to any of the
/// three later states; `Processing` to either terminal state. A write that
/// raises a terminal flag together with `processing` has already collapsed to
/// the terminal state, so it arrives here as a single terminal edge.
pub fn transition(old: BuildState, new: BuildState) -> Result<StatusEdge, InvalidTransition> {
    use BuildState::*;

    match (old, new) {
        (a, b) if a == b => Ok(StatusEdge::None),
        (NotStarted, Processing) => Ok(StatusEdge::StartedProcessing),
        (NotStarted, Succeeded) | (Processing, Succeeded) => Ok(StatusEdge::Succeeded),
        (NotStarted, Failed) | (Processing, Failed) => Ok(StatusEdge::Failed),
        (from, to) => Err(InvalidTransition { from, to }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BuildState::*;

    const ALL: [crate::types::BuildState; 4] = [NotStarted, Processing, Succeeded, Failed];

    #[test]
    fn self_transitions_are_silent() {
        for state in ALL {
            assert_eq!(transition(state, state), Ok(StatusEdge::None));
        }
    }

    #[test]
    fn rising_edges() {
        assert_eq!(
            transition(NotStarted, Processing),
            Ok(StatusEdge::StartedProcessing)
        );
        assert_eq!(transition(NotStarted, Succeeded), Ok(StatusEdge::Succeeded));
        assert_eq!(transition(NotStarted, Failed), Ok(StatusEdge::Failed));
        assert_eq!(transition(Processing, Succeeded), Ok(StatusEdge::Succeeded));
        assert_eq!(transition(Processing, Failed), Ok(StatusEdge::Failed));
    }

    #[test]
    fn terminal_states_never_move() {
        for from in [Succeeded, Failed] {
            for to in ALL {
                if from == to {
                    continue;
                }
                assert!(transition(from, to).is_err(), "{from:?} -> {to:?}");
            }
        }
    }

    #[test]
    fn flags_never_fall() {
        assert!(transition(Processing, NotStarted).is_err());
        assert!(transition(Succeeded, NotStarted).is_err());
        assert!(transition(Failed, NotStarted).is_err());
    }

    /// Every pair either yields exactly one edge or is flagged; the function
    /// is total over the 4x4 space.
    #[test]
    fn exhaustive_over_state_pairs() {
        let mut edges = 0;
        let mut invalid = 0;
        for from in ALL {
            for to in ALL {
                match transition(from, to) {
                    Ok(StatusEdge::None) => {}
                    Ok(_) => edges += 1,
                    Err(_) => invalid += 1,
                }
            }
        }
        assert_eq!(edges, 5);
        assert_eq!(invalid, 7);
    }
}
