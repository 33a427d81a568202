//! Governance registry
//!
//! Owns the Editor identity and the proposal table. Each mutating
//! operation holds the write lock end to end and reads the clock once.

use crate::governance::clock::Clock;
use crate::governance::error::{self, ErrorKind, GovernanceError, GovernanceResult};
use crate::governance::events::{EventBus, JournalEntry, RegistryEvent};
use crate::governance::transitions::{self, CallerStanding};
use crate::governance::EipStatus;
use crate::identity::Identity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info, warn};

/// Lifecycle and authorship of one proposal
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalRecord {
    pub id: u64,
    pub authors: Vec<Identity>,
    pub status: EipStatus,
    pub last_transition_time: DateTime<Utc>,
    pub registered_at: DateTime<Utc>,
    pub registered_by: Identity,
}

impl ProposalRecord {
    pub fn is_author(&self, who: &Identity) -> bool {
        self.authors.contains(who)
    }
}

/// Read-only view returned by `proposal`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalView {
    pub id: u64,
    pub status: EipStatus,
    pub last_transition_time: DateTime<Utc>,
}

impl From<&ProposalRecord> for ProposalView {
    fn from(record: &ProposalRecord) -> Self {
        Self {
            id: record.id,
            status: record.status,
            last_transition_time: record.last_transition_time,
        }
    }
}

struct RegistryState {
    editor: Identity,
    proposals: BTreeMap<u64, ProposalRecord>,
    events: EventBus,
}

impl RegistryState {
    fn standing(&self, proposal: &ProposalRecord, caller: &Identity) -> CallerStanding {
        CallerStanding {
            is_author: proposal.is_author(caller),
            is_editor: *caller == self.editor,
        }
    }

    fn record(&self, id: u64) -> GovernanceResult<&ProposalRecord> {
        self.proposals.get(&id).ok_or_else(GovernanceError::not_found)
    }
}

pub struct GovernanceRegistry {
    state: RwLock<RegistryState>,
    clock: Arc<dyn Clock>,
}

impl GovernanceRegistry {
    /// Create a registry whose first Editor is `deployer`
    pub fn new(deployer: Identity, clock: Arc<dyn Clock>) -> GovernanceResult<Self> {
        if deployer.is_null() {
            return Err(GovernanceError::invalid_argument(error::NULL_EDITOR));
        }
        info!("Governance registry initialised with editor {}", deployer);
        Ok(Self {
            state: RwLock::new(RegistryState {
                editor: deployer,
                proposals: BTreeMap::new(),
                events: EventBus::new(),
            }),
            clock,
        })
    }

    // =========================================================================
    // EDITOR
    // =========================================================================

    pub async fn update_editor(&self, caller: &Identity, new_editor: Identity) -> GovernanceResult<()> {
        let mut state = self.state.write().await;
        let now = self.clock.now();

        if *caller != state.editor {
            return Err(rejected("update_editor", GovernanceError::unauthorized(
                error::ONLY_EDITOR_UPDATES_EDITOR,
            )));
        }
        if new_editor.is_null() {
            return Err(rejected("update_editor", GovernanceError::invalid_argument(error::NULL_EDITOR)));
        }

        let old = std::mem::replace(&mut state.editor, new_editor.clone());
        info!("Editor changed from {} to {}", old, new_editor);
        state.events.publish(RegistryEvent::EditorChanged { old, new: new_editor }, now);
        Ok(())
    }

    pub async fn current_editor(&self) -> Identity {
        self.state.read().await.editor.clone()
    }

    // =========================================================================
    // REGISTRATION
    // =========================================================================

    pub async fn register_proposal(
        &self,
        caller: &Identity,
        id: u64,
        authors: Vec<Identity>,
    ) -> GovernanceResult<ProposalView> {
        let mut state = self.state.write().await;
        let now = self.clock.now();

        if *caller != state.editor {
            return Err(rejected("register_proposal", GovernanceError::unauthorized(
                error::ONLY_EDITOR_REGISTERS,
            )));
        }
        if state.proposals.contains_key(&id) {
            return Err(rejected("register_proposal", GovernanceError::new(
                ErrorKind::AlreadyExists,
                error::DUPLICATE_PROPOSAL,
            )));
        }
        if authors.is_empty() {
            return Err(rejected("register_proposal", GovernanceError::invalid_argument(error::EMPTY_AUTHORS)));
        }
        if id == 0 {
            return Err(rejected("register_proposal", GovernanceError::invalid_argument(error::ZERO_PROPOSAL_ID)));
        }
        if authors.iter().any(Identity::is_null) {
            return Err(rejected("register_proposal", GovernanceError::invalid_argument(error::NULL_AUTHOR)));
        }

        let mut unique: Vec<Identity> = Vec::with_capacity(authors.len());
        for author in authors {
            if !unique.contains(&author) {
                unique.push(author);
            }
        }

        let record = ProposalRecord {
            id,
            authors: unique.clone(),
            status: EipStatus::Draft,
            last_transition_time: now,
            registered_at: now,
            registered_by: caller.clone(),
        };
        let view = ProposalView::from(&record);
        state.proposals.insert(id, record);

        info!("Registered EIP-{} with {} author(s)", id, unique.len());
        state.events.publish(
            RegistryEvent::ProposalRegistered {
                id,
                authors: unique,
                registered_by: caller.clone(),
            },
            now,
        );
        Ok(view)
    }

    // =========================================================================
    // STATUS TRANSITIONS
    // =========================================================================

    pub async fn change_status(
        &self,
        caller: &Identity,
        id: u64,
        target: EipStatus,
    ) -> GovernanceResult<ProposalView> {
        let mut state = self.state.write().await;
        let now = self.clock.now();

        let (from, last, standing) = {
            let record = state.record(id).map_err(|e| rejected("change_status", e))?;
            (record.status, record.last_transition_time, state.standing(record, caller))
        };

        transitions::check_transition(from, target, standing, now - last)
            .map_err(|e| rejected("change_status", e))?;

        let view = {
            let record = state
                .proposals
                .get_mut(&id)
                .ok_or_else(GovernanceError::not_found)?;
            record.status = target;
            record.last_transition_time = record.last_transition_time.max(now);
            ProposalView::from(&*record)
        };

        info!("EIP-{} moved {} -> {} by {}", id, from, target, caller);
        state.events.publish(
            RegistryEvent::StatusChanged {
                id,
                old_status: from,
                new_status: target,
                changed_by: caller.clone(),
            },
            now,
        );
        Ok(view)
    }

    /// Targets `caller` could move proposal `id` to right now
    pub async fn allowed_transitions(&self, caller: &Identity, id: u64) -> GovernanceResult<Vec<EipStatus>> {
        let state = self.state.read().await;
        let now = self.clock.now();
        let record = state.record(id)?;
        let standing = state.standing(record, caller);
        let inactivity = now - record.last_transition_time;

        Ok(transitions::targets_from(record.status)
            .filter(|to| transitions::check_transition(record.status, *to, standing, inactivity).is_ok())
            .collect())
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    pub async fn authors(&self, id: u64) -> GovernanceResult<Vec<Identity>> {
        let state = self.state.read().await;
        Ok(state.record(id)?.authors.clone())
    }

    pub async fn is_author(&self, id: u64, who: &Identity) -> GovernanceResult<bool> {
        let state = self.state.read().await;
        Ok(state.record(id)?.is_author(who))
    }

    pub async fn proposal(&self, id: u64) -> GovernanceResult<ProposalView> {
        let state = self.state.read().await;
        state.record(id).map(ProposalView::from)
    }

    /// Whether `caller` is the Editor or an author of proposal `id`
    pub async fn has_standing(&self, caller: &Identity, id: u64) -> GovernanceResult<bool> {
        let state = self.state.read().await;
        let record = state.record(id)?;
        Ok(state.standing(record, caller).has_any())
    }

    pub async fn list_proposals(&self, status: Option<EipStatus>) -> Vec<ProposalRecord> {
        let state = self.state.read().await;
        let list: Vec<ProposalRecord> = state
            .proposals
            .values()
            .filter(|p| status.map_or(true, |s| p.status == s))
            .cloned()
            .collect();
        debug!("Listed {} proposal(s) (filter: {:?})", list.len(), status);
        list
    }

    pub async fn events(&self, since: u64, limit: usize) -> Vec<JournalEntry> {
        self.state.read().await.events.since(since, limit)
    }

    pub async fn subscribe(&self) -> broadcast::Receiver<RegistryEvent> {
        self.state.read().await.events.subscribe()
    }
}

fn rejected(operation: &str, err: GovernanceError) -> GovernanceError {
    warn!("{} rejected ({:?}): {}", operation, err.kind, err.reason);
    err
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::governance::clock::ManualClock;
    use crate::governance::transitions::STAGNATION_PERIOD_SECS;
    use chrono::Duration;
    use pretty_assertions::assert_eq;
    use tokio_test::{assert_err, assert_ok};

    fn addr(n: u8) -> Identity {
        Identity::parse(&format!("0x{}", format!("{:02x}", n).repeat(20))).unwrap()
    }

    struct Fixture {
        registry: GovernanceRegistry,
        clock: ManualClock,
        editor: Identity,
        a: Identity,
        b: Identity,
        outsider: Identity,
    }

    async fn fixture() -> Fixture {
        let clock = ManualClock::new(Utc::now());
        let editor = addr(0xe0);
        let registry = GovernanceRegistry::new(editor.clone(), Arc::new(clock.clone())).unwrap();
        let (a, b) = (addr(0xa1), addr(0xb2));
        registry
            .register_proposal(&editor, 1, vec![a.clone(), b.clone()])
            .await
            .unwrap();
        Fixture { registry, clock, editor, a, b, outsider: addr(0x99) }
    }

    async fn drive(f: &Fixture, path: &[EipStatus]) {
        for status in path {
            f.registry.change_status(&f.editor, 1, *status).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_registration_starts_in_draft() {
        let f = fixture().await;
        let view = f.registry.proposal(1).await.unwrap();
        assert_eq!(view.status, EipStatus::Draft);
        assert_eq!(view.last_transition_time, f.clock.now());
        assert_eq!(f.registry.authors(1).await.unwrap(), vec![f.a.clone(), f.b.clone()]);
        assert!(f.registry.is_author(1, &f.a).await.unwrap());
        assert!(!f.registry.is_author(1, &f.outsider).await.unwrap());
    }

    #[tokio::test]
    async fn test_registration_rejections() {
        let f = fixture().await;

        let err = f.registry.register_proposal(&f.a, 2, vec![f.a.clone()]).await.unwrap_err();
        assert_eq!((err.kind, err.reason.as_str()), (ErrorKind::Unauthorized, error::ONLY_EDITOR_REGISTERS));

        let err = f.registry.register_proposal(&f.editor, 1, vec![f.outsider.clone()]).await.unwrap_err();
        assert_eq!((err.kind, err.reason.as_str()), (ErrorKind::AlreadyExists, error::DUPLICATE_PROPOSAL));

        let err = f.registry.register_proposal(&f.editor, 2, vec![]).await.unwrap_err();
        assert_eq!((err.kind, err.reason.as_str()), (ErrorKind::InvalidArgument, error::EMPTY_AUTHORS));

        let err = f.registry.register_proposal(&f.editor, 0, vec![f.a.clone()]).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidArgument);

        let err = f.registry.register_proposal(&f.editor, 3, vec![Identity::null()]).await.unwrap_err();
        assert_eq!((err.kind, err.reason.as_str()), (ErrorKind::InvalidArgument, error::NULL_AUTHOR));
    }

    #[tokio::test]
    async fn test_duplicate_authors_collapse_in_order() {
        let f = fixture().await;
        f.registry
            .register_proposal(&f.editor, 7, vec![f.b.clone(), f.a.clone(), f.b.clone()])
            .await
            .unwrap();
        assert_eq!(f.registry.authors(7).await.unwrap(), vec![f.b.clone(), f.a.clone()]);
    }

    #[tokio::test]
    async fn test_author_moves_draft_to_review_and_event_fires() {
        let f = fixture().await;
        let mut rx = f.registry.subscribe().await;

        let view = f.registry.change_status(&f.a, 1, EipStatus::Review).await.unwrap();
        assert_eq!(view.status, EipStatus::Review);
        assert_eq!(
            rx.recv().await.unwrap(),
            RegistryEvent::StatusChanged {
                id: 1,
                old_status: EipStatus::Draft,
                new_status: EipStatus::Review,
                changed_by: f.a.clone(),
            }
        );
    }

    #[tokio::test]
    async fn test_stagnation_requires_inactivity() {
        let f = fixture().await;

        let err = f.registry.change_status(&f.editor, 1, EipStatus::Stagnant).await.unwrap_err();
        assert_eq!((err.kind, err.reason.as_str()), (ErrorKind::PreconditionFailed, error::NOT_INACTIVE));

        f.clock.advance(Duration::days(181));
        assert_ok!(f.registry.change_status(&f.b, 1, EipStatus::Stagnant).await);
        assert_eq!(f.registry.proposal(1).await.unwrap().status, EipStatus::Stagnant);
    }

    #[tokio::test]
    async fn test_stagnation_boundary_exact_seconds() {
        let f = fixture().await;
        f.clock.advance(Duration::seconds(STAGNATION_PERIOD_SECS - 1));
        let err = f.registry.change_status(&f.a, 1, EipStatus::Stagnant).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::PreconditionFailed);

        f.clock.advance(Duration::seconds(1));
        assert_ok!(f.registry.change_status(&f.a, 1, EipStatus::Stagnant).await);
    }

    #[tokio::test]
    async fn test_inactivity_restarts_after_each_transition() {
        let f = fixture().await;
        f.clock.advance(Duration::days(200));
        f.registry.change_status(&f.a, 1, EipStatus::Review).await.unwrap();

        let err = f.registry.change_status(&f.a, 1, EipStatus::Stagnant).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::PreconditionFailed);
    }

    #[tokio::test]
    async fn test_last_call_gate_and_final_is_terminal() {
        let f = fixture().await;
        f.registry.change_status(&f.a, 1, EipStatus::Review).await.unwrap();

        let err = f.registry.change_status(&f.a, 1, EipStatus::LastCall).await.unwrap_err();
        assert_eq!((err.kind, err.reason.as_str()), (ErrorKind::Unauthorized, error::ONLY_EDITOR_TO_LAST_CALL));

        drive(&f, &[EipStatus::LastCall, EipStatus::Final]).await;

        let err = f.registry.change_status(&f.editor, 1, EipStatus::Draft).await.unwrap_err();
        assert_eq!((err.kind, err.reason.as_str()), (ErrorKind::TerminalState, error::TERMINAL));
        let err = f.registry.change_status(&f.a, 1, EipStatus::Review).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::TerminalState);
    }

    #[tokio::test]
    async fn test_living_is_terminal() {
        let f = fixture().await;
        drive(&f, &[EipStatus::Review, EipStatus::LastCall, EipStatus::Living]).await;
        let err = f.registry.change_status(&f.editor, 1, EipStatus::Draft).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::TerminalState);
    }

    #[tokio::test]
    async fn test_last_call_back_to_review_but_not_draft() {
        let f = fixture().await;
        drive(&f, &[EipStatus::Review, EipStatus::LastCall]).await;

        let err = f.registry.change_status(&f.editor, 1, EipStatus::Draft).await.unwrap_err();
        assert_eq!(err.reason, "invalid status transition from LastCall");

        let err = f.registry.change_status(&f.a, 1, EipStatus::Final).await.unwrap_err();
        assert_eq!((err.kind, err.reason.as_str()), (ErrorKind::Unauthorized, error::ONLY_EDITOR_FROM_LAST_CALL));

        assert_ok!(f.registry.change_status(&f.editor, 1, EipStatus::Review).await);
    }

    #[tokio::test]
    async fn test_withdrawn_revival_is_author_only() {
        let f = fixture().await;
        f.registry.change_status(&f.a, 1, EipStatus::Withdrawn).await.unwrap();

        let err = f.registry.change_status(&f.editor, 1, EipStatus::Draft).await.unwrap_err();
        assert_eq!((err.kind, err.reason.as_str()), (ErrorKind::Unauthorized, error::ONLY_AUTHOR_REVIVES));

        let err = f.registry.change_status(&f.a, 1, EipStatus::Review).await.unwrap_err();
        assert_eq!(err.reason, "invalid status transition from Withdrawn");

        assert_ok!(f.registry.change_status(&f.b, 1, EipStatus::Draft).await);
    }

    #[tokio::test]
    async fn test_stagnant_returns_to_draft_by_either_party() {
        let f = fixture().await;
        f.clock.advance(Duration::days(180));
        f.registry.change_status(&f.editor, 1, EipStatus::Stagnant).await.unwrap();

        let err = f.registry.change_status(&f.editor, 1, EipStatus::Review).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidTransition);

        assert_ok!(f.registry.change_status(&f.editor, 1, EipStatus::Draft).await);
    }

    #[tokio::test]
    async fn test_outsider_gets_unauthorized_before_anything_else() {
        let f = fixture().await;
        for target in EipStatus::ALL {
            let err = f.registry.change_status(&f.outsider, 1, target).await.unwrap_err();
            assert_eq!((err.kind, err.reason.as_str()), (ErrorKind::Unauthorized, error::NO_STANDING));
        }
        drive(&f, &[EipStatus::Review, EipStatus::LastCall, EipStatus::Final]).await;
        let err = f.registry.change_status(&f.outsider, 1, EipStatus::Draft).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Unauthorized);
    }

    #[tokio::test]
    async fn test_unknown_proposal_not_found() {
        let f = fixture().await;
        let err = f.registry.change_status(&f.editor, 999, EipStatus::Review).await.unwrap_err();
        assert_eq!((err.kind, err.reason.as_str()), (ErrorKind::NotFound, error::PROPOSAL_NOT_FOUND));
        assert_err!(f.registry.authors(999).await);
        assert_err!(f.registry.is_author(999, &f.a).await);
        assert_err!(f.registry.proposal(999).await);
    }

    #[tokio::test]
    async fn test_failed_transition_leaves_state_untouched() {
        let f = fixture().await;
        let before = f.registry.proposal(1).await.unwrap();
        let journal_len = f.registry.events(0, 100).await.len();

        f.clock.advance(Duration::days(10));
        assert_err!(f.registry.change_status(&f.a, 1, EipStatus::Final).await);

        assert_eq!(f.registry.proposal(1).await.unwrap(), before);
        assert_eq!(f.registry.events(0, 100).await.len(), journal_len);
    }

    #[tokio::test]
    async fn test_transition_time_never_moves_backwards() {
        let f = fixture().await;
        let registered = f.registry.proposal(1).await.unwrap().last_transition_time;
        f.clock.set(registered - Duration::hours(1));

        let view = f.registry.change_status(&f.a, 1, EipStatus::Review).await.unwrap();
        assert_eq!(view.last_transition_time, registered);
    }

    #[tokio::test]
    async fn test_update_editor_rules() {
        let f = fixture().await;
        let next = addr(0x42);

        let err = f.registry.update_editor(&f.outsider, next.clone()).await.unwrap_err();
        assert_eq!((err.kind, err.reason.as_str()), (ErrorKind::Unauthorized, error::ONLY_EDITOR_UPDATES_EDITOR));

        let err = f.registry.update_editor(&f.editor, Identity::null()).await.unwrap_err();
        assert_eq!((err.kind, err.reason.as_str()), (ErrorKind::InvalidArgument, error::NULL_EDITOR));

        assert_ok!(f.registry.update_editor(&f.editor, next.clone()).await);
        assert_eq!(f.registry.current_editor().await, next);

        let last = f.registry.events(0, 100).await.pop().unwrap();
        assert_eq!(last.event, RegistryEvent::EditorChanged { old: f.editor.clone(), new: next.clone() });

        // The previous editor lost their standing
        let err = f.registry.register_proposal(&f.editor, 2, vec![f.a.clone()]).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Unauthorized);
    }

    #[tokio::test]
    async fn test_allowed_transitions_reflect_role_and_time() {
        let f = fixture().await;
        assert_eq!(
            f.registry.allowed_transitions(&f.a, 1).await.unwrap(),
            vec![EipStatus::Review, EipStatus::Withdrawn]
        );

        f.registry.change_status(&f.a, 1, EipStatus::Review).await.unwrap();
        f.clock.advance(Duration::days(180));
        assert_eq!(
            f.registry.allowed_transitions(&f.editor, 1).await.unwrap(),
            vec![EipStatus::Draft, EipStatus::Withdrawn, EipStatus::Stagnant, EipStatus::LastCall]
        );
        assert!(f.registry.allowed_transitions(&f.outsider, 1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_null_deployer_rejected() {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        assert!(GovernanceRegistry::new(Identity::null(), clock).is_err());
    }

    #[tokio::test]
    async fn test_list_proposals_filters_by_status() {
        let f = fixture().await;
        f.registry.register_proposal(&f.editor, 2, vec![f.a.clone()]).await.unwrap();
        f.registry.change_status(&f.a, 2, EipStatus::Review).await.unwrap();

        let ids: Vec<u64> = f.registry.list_proposals(None).await.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 2]);
        let in_review: Vec<u64> = f
            .registry
            .list_proposals(Some(EipStatus::Review))
            .await
            .iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(in_review, vec![2]);
    }
}
