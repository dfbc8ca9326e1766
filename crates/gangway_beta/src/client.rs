//! HTTP client for the beta-distribution REST API.

use crate::{BetaDistribution, BetaResult, BetaTester, TokenProvider};
use async_trait::async_trait;
use gangway_core::App;
use gangway_error::BetaError;
use serde::Deserialize;
use std::sync::Arc;

/// Default endpoint of the distribution service.
pub const DEFAULT_BETA_API_URL: &str = "https://api.appstoreconnect.apple.com";

/// [`BetaDistribution`] implementation over the distribution service's
/// JSON:API dialect.
pub struct AppConnectClient {
    http: reqwest::Client,
    base_url: String,
    tokens: Arc<dyn TokenProvider>,
}

impl AppConnectClient {
    /// Create a client minting bearer tokens through `tokens`.
    pub fn new(base_url: impl Into<String>, tokens: Arc<dyn TokenProvider>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            tokens,
        }
    }

    async fn send(&self, request: reqwest::RequestBuilder, key_id: &str) -> BetaResult<String> {
        let token = self.tokens.bearer_token(key_id)?;
        let response = request
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| BetaError::Http(e.to_string()))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| BetaError::Http(e.to_string()))?;
        if status.is_success() {
            Ok(text)
        } else {
            Err(classify_failure(status.as_u16(), &text))
        }
    }
}

/// The app's distribution credentials, or the configuration error naming
/// what is missing.
fn credentials(app: &App) -> BetaResult<(&str, &str)> {
    let key_id = app
        .beta_key_id()
        .as_deref()
        .ok_or_else(|| BetaError::ApiKeyNotSet {
            app_name: app.name().clone(),
        })?;
    let group_id = app
        .beta_group_id()
        .as_deref()
        .ok_or_else(|| BetaError::BetaGroupNotSet {
            app_name: app.name().clone(),
        })?;
    Ok((key_id, group_id))
}

#[async_trait]
impl BetaDistribution for AppConnectClient {
    async fn find_testers(&self, email: &str, app: &App) -> BetaResult<Vec<BetaTester>> {
        let (key_id, _) = credentials(app)?;
        let url = format!("{}/v1/betaTesters", self.base_url);
        let request = self
            .http
            .get(&url)
            .query(&[("filter[email]", email), ("include", "betaGroups")]);
        let body = self.send(request, key_id).await?;
        let listing: TesterListResponse = serde_json::from_str(&body)
            .map_err(|e| BetaError::Http(format!("malformed tester listing: {e}")))?;
        tracing::debug!(email, count = listing.data.len(), "Fetched remote testers");
        Ok(listing.data.into_iter().map(TesterResource::into_tester).collect())
    }

    async fn create_tester(
        &self,
        app: &App,
        email: &str,
        given_name: Option<&str>,
        family_name: Option<&str>,
    ) -> BetaResult<()> {
        let (key_id, group_id) = credentials(app)?;
        let url = format!("{}/v1/betaTesters", self.base_url);
        let body = serde_json::json!({
            "data": {
                "type": "betaTesters",
                "attributes": {
                    "email": email,
                    "firstName": given_name,
                    "lastName": family_name,
                },
                "relationships": {
                    "betaGroups": {
                        "data": [{ "type": "betaGroups", "id": group_id }]
                    }
                }
            }
        });
        tracing::info!(app = %app.name(), "Creating remote beta tester");
        self.send(self.http.post(&url).json(&body), key_id).await?;
        Ok(())
    }

    async fn remove_from_group(&self, app: &App, tester_id: &str) -> BetaResult<()> {
        let (key_id, group_id) = credentials(app)?;
        let url = format!(
            "{}/v1/betaGroups/{}/relationships/betaTesters",
            self.base_url, group_id
        );
        let body = serde_json::json!({
            "data": [{ "type": "betaTesters", "id": tester_id }]
        });
        tracing::info!(app = %app.name(), tester_id, "Removing remote tester from beta group");
        self.send(self.http.delete(&url).json(&body), key_id).await?;
        Ok(())
    }
}

/// Sort a non-2xx response into the closed error taxonomy: attribute
/// rejections become [`BetaError::InvalidAttribute`], everything else is a
/// generic API error.
fn classify_failure(status: u16, body: &str) -> BetaError {
    if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(body) {
        let details: Vec<String> = envelope
            .errors
            .iter()
            .filter(|e| {
                e.code
                    .as_deref()
                    .is_some_and(|code| code.starts_with("ENTITY_ERROR.ATTRIBUTE"))
            })
            .map(ApiError::description)
            .collect();
        if !details.is_empty() {
            return BetaError::InvalidAttribute { details };
        }
        let message: Vec<String> = envelope.errors.iter().map(ApiError::description).collect();
        if !message.is_empty() {
            return BetaError::Api {
                status,
                message: message.join("; "),
            };
        }
    }
    BetaError::Api {
        status,
        message: body.to_string(),
    }
}

#[derive(Debug, Deserialize)]
struct TesterListResponse {
    #[serde(default)]
    data: Vec<TesterResource>,
}

#[derive(Debug, Deserialize)]
struct TesterResource {
    id: String,
    attributes: TesterAttributes,
    #[serde(default)]
    relationships: Option<TesterRelationships>,
}

impl TesterResource {
    fn into_tester(self) -> BetaTester {
        let groups = self
            .relationships
            .and_then(|r| r.beta_groups)
            .map(|g| g.data.into_iter().map(|link| link.id).collect())
            .unwrap_or_default();
        BetaTester::new(self.id, self.attributes.email.unwrap_or_default(), groups)
    }
}

#[derive(Debug, Deserialize)]
struct TesterAttributes {
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TesterRelationships {
    #[serde(rename = "betaGroups")]
    beta_groups: Option<LinkageList>,
}

#[derive(Debug, Deserialize)]
struct LinkageList {
    #[serde(default)]
    data: Vec<Linkage>,
}

#[derive(Debug, Deserialize)]
struct Linkage {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    errors: Vec<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    code: Option<String>,
    title: Option<String>,
    detail: Option<String>,
}

impl ApiError {
    fn description(&self) -> String {
        self.detail
            .clone()
            .or_else(|| self.title.clone())
            .unwrap_or_else(|| "unspecified error".to_string())
    }
}
