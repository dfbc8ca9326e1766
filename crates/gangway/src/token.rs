//! Environment-backed bearer tokens.

use gangway_beta::{BetaResult, TokenProvider};
use gangway_error::BetaError;

/// Reads pre-minted bearer tokens from the environment.
///
/// The token for key id `AB12CD34` is expected in `BETA_TOKEN_AB12CD34`.
/// Minting tokens from signing keys is deliberately out of scope.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvTokenProvider;

impl EnvTokenProvider {
    fn var_name(key_id: &str) -> String {
        format!("BETA_TOKEN_{}", key_id.to_uppercase().replace('-', "_"))
    }
}

impl TokenProvider for EnvTokenProvider {
    fn bearer_token(&self, key_id: &str) -> BetaResult<String> {
        let name = Self::var_name(key_id);
        std::env::var(&name)
            .map_err(|_| BetaError::Http(format!("no bearer token in environment ({name})")))
    }
}
