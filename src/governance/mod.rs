//! EIP governance core
//!
//! Who may register proposals, who may move them through the lifecycle,
//! and when. Everything else in the service is plumbing around this module.

pub mod clock;
pub mod error;
pub mod events;
mod registry;
mod status;
pub mod transitions;

pub use clock::{Clock, SystemClock};
pub use error::{ErrorKind, GovernanceError};
pub use events::{JournalEntry, RegistryEvent};
pub use registry::{GovernanceRegistry, ProposalRecord, ProposalView};
pub use status::EipStatus;
