//! Registry notifications
//!
//! Events are pushed to live subscribers over a broadcast channel and kept
//! in a journal so indexers that connect late can catch up.

use crate::governance::EipStatus;
use crate::identity::Identity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tokio::sync::broadcast;
use uuid::Uuid;

const CHANNEL_CAPACITY: usize = 256;

/// Oldest entries are dropped once the journal holds this many
const JOURNAL_CAPACITY: usize = 10_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RegistryEvent {
    #[serde(rename_all = "camelCase")]
    EditorChanged { old: Identity, new: Identity },
    #[serde(rename_all = "camelCase")]
    ProposalRegistered {
        id: u64,
        authors: Vec<Identity>,
        registered_by: Identity,
    },
    #[serde(rename_all = "camelCase")]
    StatusChanged {
        id: u64,
        old_status: EipStatus,
        new_status: EipStatus,
        changed_by: Identity,
    },
}

/// An event as stored in the journal
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalEntry {
    pub id: Uuid,
    /// Position in the journal, starting at 1
    pub sequence: u64,
    pub timestamp: DateTime<Utc>,
    pub event: RegistryEvent,
}

/// Fan-out plus bounded journal. Callers must hold the registry write lock
/// while publishing so journal order matches mutation order.
pub struct EventBus {
    sender: broadcast::Sender<RegistryEvent>,
    journal: VecDeque<JournalEntry>,
    capacity: usize,
    next_sequence: u64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(JOURNAL_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            sender,
            journal: VecDeque::with_capacity(capacity.min(JOURNAL_CAPACITY)),
            capacity: capacity.max(1),
            next_sequence: 1,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RegistryEvent> {
        self.sender.subscribe()
    }

    pub fn publish(&mut self, event: RegistryEvent, at: DateTime<Utc>) {
        if self.journal.len() == self.capacity {
            self.journal.pop_front();
        }
        self.journal.push_back(JournalEntry {
            id: Uuid::new_v4(),
            sequence: self.next_sequence,
            timestamp: at,
            event: event.clone(),
        });
        self.next_sequence += 1;
        // No subscribers is fine
        let _ = self.sender.send(event);
    }

    /// Retained entries with `sequence > since`, oldest first. Sequences keep
    /// counting after old entries are evicted.
    pub fn since(&self, since: u64, limit: usize) -> Vec<JournalEntry> {
        self.journal
            .iter()
            .skip_while(|entry| entry.sequence <= since)
            .take(limit)
            .cloned()
            .collect()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
