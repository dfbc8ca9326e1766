//! Domain model for the Gangway beta onboarding bot.
//!
//! This crate defines the entities owned by the record store (`Tester`,
//! `App`, `ReactionRole`, `TestingRequest`, `ConfigEntry`), the generic
//! [`Record`] wire representation with its (de)serialization helpers, the
//! [`Formula`] filter builder for the store's boolean query language, and the
//! async traits that form the seams between the engines and the record store.
//!
//! All chat-platform identifiers (guilds, channels, messages, users, roles)
//! are carried as strings; parsing to platform-native integers happens at the
//! gateway boundary.

#![warn(missing_docs)]

mod app;
mod config_entry;
mod formula;
pub mod keys;
mod reaction_role;
mod record;
mod request;
mod tester;
mod traits;

pub use app::App;
pub use config_entry::{AgreementMessage, ConfigEntry};
pub use formula::Formula;
pub use reaction_role::ReactionRole;
pub use record::{Record, RecordPayload};
pub use request::{RequestStatus, TestingRequest};
pub use tester::Tester;
pub use traits::{BetaStore, RemoteConfig, RequestApprovalFilter};
