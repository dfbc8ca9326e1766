//! Engines and cache services of the Gangway onboarding pipeline.
//!
//! A chat reaction enters through [`Dispatcher::handle_reaction`], which
//! routes it to the [`OnboardingEngine`] (reactions on watched messages) or
//! the [`ApprovalEngine`] (moderator reactions in approval channels). Both
//! lean on the [`ConfigCacheService`] and [`RoleCacheService`] for store-backed
//! settings, refreshed in the background by [`spawn_refresh_job`].
#![warn(missing_docs)]

mod approval;
mod config;
mod config_cache;
mod dispatcher;
mod emoji;
mod onboarding;
mod refresh;
mod role_cache;

pub use approval::ApprovalEngine;
pub use config::{BetaConfig, BotConfig, StoreConfig};
pub use config_cache::ConfigCacheService;
pub use dispatcher::Dispatcher;
pub use emoji::{ALREADY_HANDLED_EMOJI, COMPLETION_EMOJI, PROCESSING_EMOJI};
pub use onboarding::OnboardingEngine;
pub use refresh::spawn_refresh_job;
pub use role_cache::RoleCacheService;
