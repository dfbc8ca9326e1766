//! Low-level record store REST client.

use futures::{Stream, StreamExt};
use gangway_core::{Formula, Record, RecordPayload};
use gangway_error::{GangwayResult, HttpError, JsonError, StoreError};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

/// Default REST endpoint of the record store.
pub const DEFAULT_API_URL: &str = "https://api.airtable.com/v0";
/// Default web UI endpoint, used for record deep links.
pub const DEFAULT_WEB_URL: &str = "https://airtable.com";

/// The store rejects more than five requests in flight per base.
const MAX_IN_FLIGHT: usize = 5;
/// Pause after each response so a burst of events stays under the store's
/// per-second rate limit.
const PACING_DELAY: Duration = Duration::from_millis(200);

#[derive(Debug, Deserialize)]
struct RecordPage {
    #[serde(default)]
    records: Vec<Record>,
    offset: Option<String>,
}

/// REST client for one record store base.
///
/// All requests share a semaphore capping concurrency at the store's limit,
/// and each holds its permit through a short pacing delay after the response
/// arrives. Cloning is cheap and clones share the cap.
#[derive(Debug, Clone)]
pub struct StoreClient {
    http: reqwest::Client,
    api_url: String,
    web_url: String,
    base_id: String,
    api_key: String,
    permits: Arc<Semaphore>,
}

impl StoreClient {
    /// Create a client for one base.
    pub fn new(
        api_url: impl Into<String>,
        web_url: impl Into<String>,
        base_id: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url: api_url.into(),
            web_url: web_url.into(),
            base_id: base_id.into(),
            api_key: api_key.into(),
            permits: Arc::new(Semaphore::new(MAX_IN_FLIGHT)),
        }
    }

    /// REST URL of a table in this base.
    pub fn table_url(&self, table: &str) -> String {
        format!("{}/{}/{}", self.api_url, self.base_id, table)
    }

    /// Web UI deep link to one record, for human-facing notifications.
    pub fn record_web_url(&self, table: &str, record_id: &str) -> String {
        let table = table.replace(' ', "%20");
        format!("{}/{}/{}/{}", self.web_url, self.base_id, table, record_id)
    }

    /// Fetch a single record by its full URL.
    pub async fn get(&self, url: &str) -> GangwayResult<Record> {
        let body = self.send(self.http.get(url), url).await?;
        serde_json::from_value(body)
            .map_err(|e| JsonError::new(format!("malformed record from {url}: {e}")).into())
    }

    /// Return the first record matching `filter`, if any.
    pub async fn first(&self, url: &str, filter: Formula) -> GangwayResult<Option<Record>> {
        let stream = self.iterate(url, Some(filter), &[], &[]);
        futures::pin_mut!(stream);
        stream.next().await.transpose()
    }

    /// Stream every matching record, following the store's offset pagination.
    ///
    /// `sort` columns are applied ascending in order; `fields` narrows the
    /// returned columns when non-empty.
    pub fn iterate<'a>(
        &'a self,
        url: &'a str,
        filter: Option<Formula>,
        sort: &'a [&'a str],
        fields: &'a [&'a str],
    ) -> impl Stream<Item = GangwayResult<Record>> + 'a {
        let params = list_params(filter.as_ref(), sort, fields);
        async_stream::try_stream! {
            let mut offset: Option<String> = None;
            loop {
                let mut page_params = params.clone();
                if let Some(cursor) = &offset {
                    page_params.push(("offset".to_string(), cursor.clone()));
                }
                let body = self
                    .send(self.http.get(url).query(&page_params), url)
                    .await?;
                let page: RecordPage = serde_json::from_value(body)
                    .map_err(|e| JsonError::new(format!("malformed record page from {url}: {e}")))?;
                for record in page.records {
                    yield record;
                }
                match page.offset {
                    Some(cursor) => offset = Some(cursor),
                    None => break,
                }
            }
        }
    }

    /// Collect every matching record into a vector.
    pub async fn list(
        &self,
        url: &str,
        filter: Option<Formula>,
        sort: &[&str],
        fields: &[&str],
    ) -> GangwayResult<Vec<Record>> {
        let stream = self.iterate(url, filter, sort, fields);
        futures::pin_mut!(stream);
        let mut records = Vec::new();
        while let Some(record) = stream.next().await {
            records.push(record?);
        }
        Ok(records)
    }

    /// Insert one record.
    pub async fn insert(&self, url: &str, payload: &RecordPayload) -> GangwayResult<Record> {
        let body = serde_json::json!({ "records": [payload] });
        let response = self.send(self.http.post(url).json(&body), url).await?;
        let page: RecordPage = serde_json::from_value(response)
            .map_err(|e| JsonError::new(format!("malformed insert response from {url}: {e}")))?;
        page.records
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::message(url, "insert returned no records").into())
    }

    /// Update a batch of records, or upsert when `merge_on` names the columns
    /// to match existing records by.
    pub async fn update(
        &self,
        url: &str,
        payloads: &[RecordPayload],
        merge_on: Option<&[&str]>,
    ) -> GangwayResult<Vec<Record>> {
        let mut body = serde_json::json!({ "records": payloads });
        if let Some(fields) = merge_on {
            body["performUpsert"] = serde_json::json!({ "fieldsToMergeOn": fields });
        }
        let response = self.send(self.http.patch(url).json(&body), url).await?;
        let page: RecordPage = serde_json::from_value(response)
            .map_err(|e| JsonError::new(format!("malformed update response from {url}: {e}")))?;
        Ok(page.records)
    }

    /// Delete one record.
    pub async fn delete(&self, url: &str, record_id: &str) -> GangwayResult<()> {
        let record_url = format!("{url}/{record_id}");
        self.send(self.http.delete(&record_url), &record_url)
            .await?;
        Ok(())
    }

    /// Send one request under the concurrency cap, holding the permit through
    /// the pacing delay. Non-2xx responses become [`StoreError`]s carrying the
    /// parsed body.
    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        url: &str,
    ) -> GangwayResult<serde_json::Value> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|e| HttpError::new(e.to_string()))?;
        let response = request
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| HttpError::new(e.to_string()))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| HttpError::new(e.to_string()))?;
        tokio::time::sleep(PACING_DELAY).await;
        if !status.is_success() {
            let body = match serde_json::from_str(&text) {
                Ok(value) => value,
                Err(_) => serde_json::Value::String(text),
            };
            return Err(StoreError::new(url, &body).into());
        }
        serde_json::from_str(&text)
            .map_err(|e| JsonError::new(format!("malformed response body from {url}: {e}")).into())
    }
}

fn list_params(filter: Option<&Formula>, sort: &[&str], fields: &[&str]) -> Vec<(String, String)> {
    let mut params = Vec::new();
    if let Some(filter) = filter {
        params.push(("filterByFormula".to_string(), filter.render()));
    }
    for (i, column) in sort.iter().enumerate() {
        params.push((format!("sort[{i}][field]"), column.to_string()));
        params.push((format!("sort[{i}][direction]"), "asc".to_string()));
    }
    for column in fields {
        params.push(("fields[]".to_string(), column.to_string()));
    }
    params
}
