//! Storage layer for SAQ.
//!
//! Owns the merged object store with its secondary indexes, the HTTP
//! client speaking the provider surface, and the per-provider polling
//! workers that keep the store consistent.

mod poller;
mod provider;
mod store;

pub use poller::{PollerSet, PollerStatus, ProviderHandle, ProviderSpec};
pub use provider::{FetchError, ProviderClient, ProviderInfo, ProviderMode};
pub use store::{LogicalKey, ObjectKey, SaoStore, StoreIndex, StoreSnapshot};
