//! Proposal records - documents and comments kept beside the registry

mod models;
mod store;

pub use models::*;
pub use store::{find_comment, InMemoryRecordStore, RecordStore};
