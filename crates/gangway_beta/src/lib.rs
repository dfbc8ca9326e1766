//! Beta-distribution API client for the Gangway pipeline.
//!
//! The approval engine talks to the distribution service through the
//! [`BetaDistribution`] trait; [`AppConnectClient`] is the real HTTP
//! implementation. Bearer credentials come from a [`TokenProvider`]
//! collaborator so token minting stays outside this crate.
#![warn(missing_docs)]

mod client;
mod tester;
mod traits;

pub use client::{AppConnectClient, DEFAULT_BETA_API_URL};
pub use tester::BetaTester;
pub use traits::{BetaDistribution, BetaResult, TokenProvider};
