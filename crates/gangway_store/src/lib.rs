//! Record store client and typed storages for the Gangway pipeline.
//!
//! [`StoreClient`] speaks the store's REST dialect with a concurrency cap and
//! request pacing. [`TesterStorage`] and [`ConfigStorage`] layer the domain
//! tables on top of it, implementing the [`gangway_core::BetaStore`] and
//! [`gangway_core::RemoteConfig`] seams.
#![warn(missing_docs)]

mod client;
mod config_storage;
mod tester_storage;

pub use client::{DEFAULT_API_URL, DEFAULT_WEB_URL, StoreClient};
pub use config_storage::ConfigStorage;
pub use tester_storage::TesterStorage;
