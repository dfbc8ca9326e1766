//! Seams between the approval engine and the distribution service.

use crate::BetaTester;
use async_trait::async_trait;
use gangway_core::App;
use gangway_error::BetaError;

/// Result alias for distribution-service operations.
///
/// The error type is the closed [`BetaError`] enum rather than the crate-wide
/// wrapper: callers match its variants to decide between stopping, reporting,
/// and re-raising.
pub type BetaResult<T> = Result<T, BetaError>;

/// Supplies bearer tokens for the distribution API, keyed by the app's
/// configured key id. Token minting is out of scope here; implementations
/// may read pre-minted tokens from the environment.
pub trait TokenProvider: Send + Sync {
    /// A bearer token valid for the given key id.
    fn bearer_token(&self, key_id: &str) -> BetaResult<String>;
}

/// Operations the approval and removal flows need from the distribution
/// service.
#[async_trait]
pub trait BetaDistribution: Send + Sync {
    /// All remote testers registered under `email`, with their group
    /// memberships included.
    async fn find_testers(&self, email: &str, app: &App) -> BetaResult<Vec<BetaTester>>;

    /// Register a new tester in the app's beta group.
    async fn create_tester(
        &self,
        app: &App,
        email: &str,
        given_name: Option<&str>,
        family_name: Option<&str>,
    ) -> BetaResult<()>;

    /// Remove a tester from the app's beta group.
    async fn remove_from_group(&self, app: &App, tester_id: &str) -> BetaResult<()>;
}
