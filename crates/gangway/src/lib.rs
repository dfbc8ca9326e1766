//! Unified surface of the Gangway onboarding pipeline.
//!
//! Re-exports the workspace crates and provides the environment-backed
//! [`EnvTokenProvider`] used by the binary.
#![warn(missing_docs)]

mod token;

pub use gangway_beta::{AppConnectClient, BetaDistribution, BetaTester, TokenProvider};
pub use gangway_bot::{
    ApprovalEngine, BotConfig, ConfigCacheService, Dispatcher, OnboardingEngine, RoleCacheService,
    spawn_refresh_job,
};
pub use gangway_cache::{KeyedLocks, NegativeCache, TtlCache, TtlCacheConfig};
pub use gangway_core::{
    App, BetaStore, ConfigEntry, Formula, ReactionRole, RemoteConfig, Tester, TestingRequest,
};
pub use gangway_discord::{ChatGateway, MemberLeft, ReactionAdded};
#[cfg(feature = "discord")]
pub use gangway_discord::SerenityGateway;
pub use gangway_error::{GangwayError, GangwayErrorKind, GangwayResult};
pub use gangway_store::{ConfigStorage, StoreClient, TesterStorage};
pub use token::EnvTokenProvider;
