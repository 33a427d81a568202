//! Status transition table
//!
//! Every legal edge of the lifecycle is listed literally in `TRANSITIONS`.
//! Anything not listed is rejected; there is no "forward is fine" fallback.

use crate::governance::error::{self, GovernanceError, GovernanceResult};
use crate::governance::EipStatus;
use chrono::Duration;

/// Minimum inactivity before a proposal may be marked Stagnant (180 days)
pub const STAGNATION_PERIOD_SECS: i64 = 180 * 24 * 60 * 60;

pub fn stagnation_period() -> Duration {
    Duration::seconds(STAGNATION_PERIOD_SECS)
}

/// What a caller is relative to one proposal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallerStanding {
    pub is_author: bool,
    pub is_editor: bool,
}

impl CallerStanding {
    pub fn has_any(&self) -> bool {
        self.is_author || self.is_editor
    }
}

/// Who may walk an edge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Standing {
    AuthorOrEditor,
    EditorOnly,
    /// The Editor is excluded unless also an author
    AuthorOnly,
}

impl Standing {
    pub fn permits(&self, caller: CallerStanding) -> bool {
        match self {
            Standing::AuthorOrEditor => caller.has_any(),
            Standing::EditorOnly => caller.is_editor,
            Standing::AuthorOnly => caller.is_author,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeGate {
    /// Time since the last transition must be at least the stagnation period
    Inactive,
}

impl TimeGate {
    pub fn is_satisfied(&self, inactivity: Duration) -> bool {
        match self {
            TimeGate::Inactive => inactivity >= stagnation_period(),
        }
    }

    pub fn reason(&self) -> &'static str {
        match self {
            TimeGate::Inactive => error::NOT_INACTIVE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionRule {
    pub from: EipStatus,
    pub to: EipStatus,
    pub standing: Standing,
    /// Reason reported when `standing` rejects the caller
    pub denied: &'static str,
    pub gate: Option<TimeGate>,
}

const fn open(from: EipStatus, to: EipStatus) -> TransitionRule {
    TransitionRule {
        from,
        to,
        standing: Standing::AuthorOrEditor,
        denied: error::NO_STANDING,
        gate: None,
    }
}

const fn stagnate(from: EipStatus) -> TransitionRule {
    TransitionRule {
        from,
        to: EipStatus::Stagnant,
        standing: Standing::AuthorOrEditor,
        denied: error::NO_STANDING,
        gate: Some(TimeGate::Inactive),
    }
}

const fn editor(from: EipStatus, to: EipStatus, denied: &'static str) -> TransitionRule {
    TransitionRule {
        from,
        to,
        standing: Standing::EditorOnly,
        denied,
        gate: None,
    }
}

pub const TRANSITIONS: &[TransitionRule] = &[
    open(EipStatus::Draft, EipStatus::Review),
    open(EipStatus::Draft, EipStatus::Withdrawn),
    stagnate(EipStatus::Draft),
    open(EipStatus::Review, EipStatus::Draft),
    open(EipStatus::Review, EipStatus::Withdrawn),
    stagnate(EipStatus::Review),
    editor(EipStatus::Review, EipStatus::LastCall, error::ONLY_EDITOR_TO_LAST_CALL),
    editor(EipStatus::LastCall, EipStatus::Review, error::ONLY_EDITOR_FROM_LAST_CALL),
    editor(EipStatus::LastCall, EipStatus::Final, error::ONLY_EDITOR_FROM_LAST_CALL),
    editor(EipStatus::LastCall, EipStatus::Living, error::ONLY_EDITOR_FROM_LAST_CALL),
    TransitionRule {
        from: EipStatus::Withdrawn,
        to: EipStatus::Draft,
        standing: Standing::AuthorOnly,
        denied: error::ONLY_AUTHOR_REVIVES,
        gate: None,
    },
    open(EipStatus::Stagnant, EipStatus::Draft),
];

/// Guard applied to every request leaving a state, before the edge lookup
fn source_guard(from: EipStatus) -> Option<(Standing, &'static str)> {
    match from {
        EipStatus::LastCall => Some((Standing::EditorOnly, error::ONLY_EDITOR_FROM_LAST_CALL)),
        _ => None,
    }
}

pub fn find_rule(from: EipStatus, to: EipStatus) -> Option<&'static TransitionRule> {
    TRANSITIONS.iter().find(|r| r.from == from && r.to == to)
}

/// Targets listed for `from`, in table order
pub fn targets_from(from: EipStatus) -> impl Iterator<Item = EipStatus> {
    TRANSITIONS.iter().filter(move |r| r.from == from).map(|r| r.to)
}

/// Validate one transition request.
///
/// Checks run in a fixed order: standing on the proposal, terminal source,
/// source guard, edge existence, edge standing, time gate.
pub fn check_transition(
    from: EipStatus,
    to: EipStatus,
    caller: CallerStanding,
    inactivity: Duration,
) -> GovernanceResult<&'static TransitionRule> {
    if !caller.has_any() {
        return Err(GovernanceError::unauthorized(error::NO_STANDING));
    }

    if from.is_terminal() {
        return Err(GovernanceError::terminal());
    }

    if let Some((standing, denied)) = source_guard(from) {
        if !standing.permits(caller) {
            return Err(GovernanceError::unauthorized(denied));
        }
    }

    let rule = find_rule(from, to).ok_or_else(|| GovernanceError::invalid_transition(from))?;

    if !rule.standing.permits(caller) {
        return Err(GovernanceError::unauthorized(rule.denied));
    }

    if let Some(gate) = rule.gate {
        if !gate.is_satisfied(inactivity) {
            return Err(GovernanceError::new(
                error::ErrorKind::PreconditionFailed,
                gate.reason(),
            ));
        }
    }

    Ok(rule)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::governance::error::ErrorKind;
    use pretty_assertions::assert_eq;

    const AUTHOR: CallerStanding = CallerStanding { is_author: true, is_editor: false };
    const EDITOR: CallerStanding = CallerStanding { is_author: false, is_editor: true };
    const BOTH: CallerStanding = CallerStanding { is_author: true, is_editor: true };
    const NOBODY: CallerStanding = CallerStanding { is_author: false, is_editor: false };

    fn long_idle() -> Duration {
        stagnation_period() + Duration::days(1)
    }

    #[test]
    fn test_table_has_twelve_unique_edges() {
        assert_eq!(TRANSITIONS.len(), 12);
        for (i, a) in TRANSITIONS.iter().enumerate() {
            for b in &TRANSITIONS[i + 1..] {
                assert!(!(a.from == b.from && a.to == b.to), "duplicate edge {:?}", a);
            }
        }
    }

    #[test]
    fn test_unlisted_pairs_are_invalid_for_the_editor_and_authors() {
        for from in EipStatus::ALL {
            if from.is_terminal() || from == EipStatus::LastCall {
                continue;
            }
            for to in EipStatus::ALL {
                if find_rule(from, to).is_some() {
                    continue;
                }
                let err = check_transition(from, to, BOTH, long_idle()).unwrap_err();
                assert_eq!(err.kind, ErrorKind::InvalidTransition, "{} -> {}", from, to);
                assert_eq!(err.reason, format!("invalid status transition from {}", from.name()));
            }
        }
    }

    #[test]
    fn test_last_call_rejects_unlisted_targets_for_editor() {
        for to in [EipStatus::Draft, EipStatus::LastCall, EipStatus::Stagnant, EipStatus::Withdrawn] {
            let err = check_transition(EipStatus::LastCall, to, EDITOR, long_idle()).unwrap_err();
            assert_eq!(err.kind, ErrorKind::InvalidTransition);
            assert_eq!(err.reason, "invalid status transition from LastCall");
        }
    }

    #[test]
    fn test_terminal_states_reject_every_target() {
        for from in [EipStatus::Final, EipStatus::Living] {
            for to in EipStatus::ALL {
                for caller in [AUTHOR, EDITOR, BOTH] {
                    let err = check_transition(from, to, caller, long_idle()).unwrap_err();
                    assert_eq!(err.kind, ErrorKind::TerminalState);
                    assert_eq!(err.reason, error::TERMINAL);
                }
            }
        }
    }

    #[test]
    fn test_no_standing_always_unauthorized() {
        for from in EipStatus::ALL {
            for to in EipStatus::ALL {
                let err = check_transition(from, to, NOBODY, long_idle()).unwrap_err();
                assert_eq!(err.kind, ErrorKind::Unauthorized);
                assert_eq!(err.reason, error::NO_STANDING);
            }
        }
    }

    #[test]
    fn test_every_listed_edge_is_reachable_by_someone() {
        for rule in TRANSITIONS {
            let caller = match rule.standing {
                Standing::EditorOnly => EDITOR,
                _ => AUTHOR,
            };
            assert!(check_transition(rule.from, rule.to, caller, long_idle()).is_ok());
        }
    }

    #[test]
    fn test_author_cannot_leave_last_call() {
        for to in EipStatus::ALL {
            let err = check_transition(EipStatus::LastCall, to, AUTHOR, long_idle()).unwrap_err();
            assert_eq!(err.kind, ErrorKind::Unauthorized);
            assert_eq!(err.reason, error::ONLY_EDITOR_FROM_LAST_CALL);
        }
    }

    #[test]
    fn test_review_to_last_call_is_editor_only() {
        let err = check_transition(EipStatus::Review, EipStatus::LastCall, AUTHOR, Duration::zero())
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Unauthorized);
        assert_eq!(err.reason, error::ONLY_EDITOR_TO_LAST_CALL);
        assert!(check_transition(EipStatus::Review, EipStatus::LastCall, EDITOR, Duration::zero()).is_ok());
    }

    #[test]
    fn test_withdrawn_revival_excludes_editor_who_is_not_author() {
        let err = check_transition(EipStatus::Withdrawn, EipStatus::Draft, EDITOR, Duration::zero())
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Unauthorized);
        assert_eq!(err.reason, error::ONLY_AUTHOR_REVIVES);
        assert!(check_transition(EipStatus::Withdrawn, EipStatus::Draft, AUTHOR, Duration::zero()).is_ok());
        assert!(check_transition(EipStatus::Withdrawn, EipStatus::Draft, BOTH, Duration::zero()).is_ok());
    }

    #[test]
    fn test_stagnation_boundary_is_inclusive() {
        let just_short = stagnation_period() - Duration::seconds(1);
        for from in [EipStatus::Draft, EipStatus::Review] {
            let err = check_transition(from, EipStatus::Stagnant, AUTHOR, just_short).unwrap_err();
            assert_eq!(err.kind, ErrorKind::PreconditionFailed);
            assert_eq!(err.reason, error::NOT_INACTIVE);
            assert!(check_transition(from, EipStatus::Stagnant, EDITOR, stagnation_period()).is_ok());
        }
    }

    #[test]
    fn test_targets_from_follows_table() {
        let from_review: Vec<_> = targets_from(EipStatus::Review).collect();
        assert_eq!(
            from_review,
            vec![EipStatus::Draft, EipStatus::Withdrawn, EipStatus::Stagnant, EipStatus::LastCall]
        );
        assert_eq!(targets_from(EipStatus::Final).count(), 0);
    }
}
