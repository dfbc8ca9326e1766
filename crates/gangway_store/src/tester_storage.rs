//! Typed storage over the beta-testing tables.

use crate::StoreClient;
use async_trait::async_trait;
use gangway_cache::{TtlCache, TtlCacheConfig};
use gangway_core::{
    App, BetaStore, Formula, ReactionRole, Record, RecordPayload, RequestApprovalFilter, Tester,
    TestingRequest,
};
use gangway_error::{GangwayError, GangwayErrorKind, GangwayResult, StoreError};
use tokio::sync::Mutex;

const TESTERS_TABLE: &str = "Testers";
const APPS_TABLE: &str = "Apps";
const REQUESTS_TABLE: &str = "Testing Requests";
const REACTION_ROLES_TABLE: &str = "Reaction Roles";

/// Testers and apps change rarely; cache fetches by record id for an hour.
const RECORD_CACHE_TTL_SECS: u64 = 3600;
const RECORD_CACHE_SIZE: usize = 20;

/// [`BetaStore`] implementation over the record store REST API.
pub struct TesterStorage {
    client: StoreClient,
    testers_url: String,
    apps_url: String,
    requests_url: String,
    reaction_roles_url: String,
    tester_cache: Mutex<TtlCache<String, Tester>>,
    app_cache: Mutex<TtlCache<String, App>>,
}

impl TesterStorage {
    /// Create a storage over the standard tables of `client`'s base.
    pub fn new(client: StoreClient) -> Self {
        let cache_config = TtlCacheConfig::default()
            .with_default_ttl(RECORD_CACHE_TTL_SECS)
            .with_max_size(RECORD_CACHE_SIZE);
        Self {
            testers_url: client.table_url(TESTERS_TABLE),
            apps_url: client.table_url(APPS_TABLE),
            requests_url: client.table_url(REQUESTS_TABLE),
            reaction_roles_url: client.table_url(REACTION_ROLES_TABLE),
            tester_cache: Mutex::new(TtlCache::new(cache_config.clone())),
            app_cache: Mutex::new(TtlCache::new(cache_config)),
            client,
        }
    }

    async fn fetch_record(&self, table_url: &str, record_id: &str) -> GangwayResult<Option<Record>> {
        let url = format!("{table_url}/{record_id}");
        absent_on_not_found(self.client.get(&url).await)
    }
}

/// Map the store's `NOT_FOUND` response to `None`, passing through every
/// other error.
fn absent_on_not_found<T>(result: GangwayResult<T>) -> GangwayResult<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) => match e.kind() {
            GangwayErrorKind::Store(store) if store.is_not_found() => Ok(None),
            _ => Err(e),
        },
    }
}

fn requests_filter(
    tester_discord_id: &str,
    app_ids: Option<&[String]>,
    approval: RequestApprovalFilter,
    exclude_removed: bool,
) -> Formula {
    let mut clauses = vec![Formula::eq("Tester Discord ID", tester_discord_id)];
    if let Some(app_ids) = app_ids {
        clauses.push(Formula::or(
            app_ids
                .iter()
                .map(|id| Formula::eq("App Record ID", id))
                .collect(),
        ));
    }
    match approval {
        RequestApprovalFilter::All => {}
        RequestApprovalFilter::Approved => clauses.push(Formula::or(vec![
            Formula::IsTrue("Approved".to_string()),
            Formula::eq("Status", "Approved"),
        ])),
        RequestApprovalFilter::Unapproved => {
            clauses.push(Formula::IsFalse("Approved".to_string()));
            clauses.push(Formula::Blank("Status".to_string()));
        }
    }
    if exclude_removed {
        clauses.push(Formula::IsFalse("Removed".to_string()));
    }
    Formula::and(clauses)
}

#[async_trait]
impl BetaStore for TesterStorage {
    async fn find_tester(&self, discord_id: &str) -> GangwayResult<Option<Tester>> {
        let record = self
            .client
            .first(&self.testers_url, Formula::eq("Discord ID", discord_id))
            .await?;
        record.as_ref().map(Tester::from_record).transpose()
    }

    async fn fetch_tester(&self, record_id: &str) -> GangwayResult<Option<Tester>> {
        {
            let mut cache = self.tester_cache.lock().await;
            if let Some(tester) = cache.get(&record_id.to_string()) {
                return Ok(Some(tester));
            }
        }
        match self.fetch_record(&self.testers_url, record_id).await? {
            Some(record) => {
                let tester = Tester::from_record(&record)?;
                self.tester_cache
                    .lock()
                    .await
                    .insert(record_id.to_string(), tester.clone(), None);
                Ok(Some(tester))
            }
            None => Ok(None),
        }
    }

    async fn find_tester_by_leave_message(
        &self,
        message_id: &str,
    ) -> GangwayResult<Option<Tester>> {
        let record = self
            .client
            .first(
                &self.testers_url,
                Formula::search(message_id, "Leave Message IDs"),
            )
            .await?;
        record.as_ref().map(Tester::from_record).transpose()
    }

    async fn upsert_tester(&self, tester: &Tester) -> GangwayResult<Tester> {
        let payload = tester.to_payload();
        let records = self
            .client
            .update(
                &self.testers_url,
                std::slice::from_ref(&payload),
                Some(&["Discord ID"]),
            )
            .await?;
        let record = records.into_iter().next().ok_or_else(|| {
            GangwayError::from(StoreError::message(
                &self.testers_url,
                "upsert returned no records",
            ))
        })?;
        let stored = Tester::from_record(&record)?;
        self.tester_cache
            .lock()
            .await
            .insert(record.id.clone(), stored.clone(), None);
        Ok(stored)
    }

    async fn fetch_app(&self, record_id: &str) -> GangwayResult<Option<App>> {
        {
            let mut cache = self.app_cache.lock().await;
            if let Some(app) = cache.get(&record_id.to_string()) {
                return Ok(Some(app));
            }
        }
        match self.fetch_record(&self.apps_url, record_id).await? {
            Some(record) => {
                let app = App::from_record(&record)?;
                self.app_cache
                    .lock()
                    .await
                    .insert(record_id.to_string(), app.clone(), None);
                Ok(Some(app))
            }
            None => Ok(None),
        }
    }

    async fn find_apps_by_beta_group(&self, group_ids: &[String]) -> GangwayResult<Vec<App>> {
        if group_ids.is_empty() {
            return Ok(Vec::new());
        }
        let filter = Formula::or(
            group_ids
                .iter()
                .map(|id| Formula::eq("Beta Group ID", id))
                .collect(),
        );
        let records = self
            .client
            .list(&self.apps_url, Some(filter), &[], &[])
            .await?;
        records.iter().map(App::from_record).collect()
    }

    async fn add_request(&self, request: &TestingRequest) -> GangwayResult<TestingRequest> {
        let record = self
            .client
            .insert(&self.requests_url, &request.to_payload())
            .await?;
        TestingRequest::from_record(&record)
    }

    async fn update_request(&self, request: &TestingRequest) -> GangwayResult<TestingRequest> {
        let records = self.update_requests(std::slice::from_ref(request)).await?;
        records.into_iter().next().ok_or_else(|| {
            GangwayError::from(StoreError::message(
                &self.requests_url,
                "update returned no records",
            ))
        })
    }

    async fn update_requests(
        &self,
        requests: &[TestingRequest],
    ) -> GangwayResult<Vec<TestingRequest>> {
        let mut payloads: Vec<RecordPayload> = Vec::with_capacity(requests.len());
        for request in requests {
            if request.id().is_none() {
                return Err(StoreError::message(
                    &self.requests_url,
                    "cannot update a request that has no record id",
                )
                .into());
            }
            payloads.push(request.to_payload());
        }
        // The store caps batch updates at ten records per call.
        let mut records = Vec::with_capacity(payloads.len());
        for chunk in payloads.chunks(10) {
            records.extend(self.client.update(&self.requests_url, chunk, None).await?);
        }
        records.iter().map(TestingRequest::from_record).collect()
    }

    async fn list_requests(
        &self,
        tester_discord_id: &str,
        app_ids: Option<&[String]>,
        approval: RequestApprovalFilter,
        exclude_removed: bool,
    ) -> GangwayResult<Vec<TestingRequest>> {
        if app_ids.is_some_and(|ids| ids.is_empty()) {
            return Ok(Vec::new());
        }
        let filter = requests_filter(tester_discord_id, app_ids, approval, exclude_removed);
        let records = self
            .client
            .list(&self.requests_url, Some(filter), &["Created"], &[])
            .await?;
        records.iter().map(TestingRequest::from_record).collect()
    }

    async fn fetch_request_by_message(
        &self,
        message_id: &str,
    ) -> GangwayResult<Option<TestingRequest>> {
        let primary = self
            .client
            .first(
                &self.requests_url,
                Formula::eq("Notification Message ID", message_id),
            )
            .await?;
        if let Some(record) = primary {
            return Ok(Some(TestingRequest::from_record(&record)?));
        }
        let further = self
            .client
            .first(
                &self.requests_url,
                Formula::search(message_id, "Further Notification Message IDs"),
            )
            .await?;
        further.as_ref().map(TestingRequest::from_record).transpose()
    }

    async fn list_watched_message_ids(&self) -> GangwayResult<Vec<String>> {
        let records = self
            .client
            .list(&self.reaction_roles_url, None, &[], &["Message ID"])
            .await?;
        Ok(records
            .iter()
            .filter_map(|record| record.opt_str("Message ID"))
            .collect())
    }

    async fn list_approvals_channel_ids(&self) -> GangwayResult<Vec<String>> {
        let records = self
            .client
            .list(
                &self.apps_url,
                Some(Formula::Truthy("Approval Channel".to_string())),
                &[],
                &["Approval Channel"],
            )
            .await?;
        Ok(records
            .iter()
            .filter_map(|record| record.opt_str("Approval Channel"))
            .collect())
    }

    async fn list_reaction_roles(&self) -> GangwayResult<Vec<ReactionRole>> {
        let records = self
            .client
            .list(&self.reaction_roles_url, None, &[], &[])
            .await?;
        records.iter().map(ReactionRole::from_record).collect()
    }

    async fn fetch_reaction_role(
        &self,
        guild_id: &str,
        message_id: &str,
        reaction: &str,
    ) -> GangwayResult<Option<ReactionRole>> {
        let filter = Formula::and(vec![
            Formula::eq("Server ID", guild_id),
            Formula::eq("Message ID", message_id),
            Formula::eq("Reaction", reaction),
        ]);
        let record = self.client.first(&self.reaction_roles_url, filter).await?;
        record.as_ref().map(ReactionRole::from_record).transpose()
    }

    fn request_url(&self, request: &TestingRequest) -> GangwayResult<String> {
        let id = request.id().as_deref().ok_or_else(|| {
            GangwayError::from(StoreError::message(
                &self.requests_url,
                "request has no record id",
            ))
        })?;
        Ok(self.client.record_web_url(REQUESTS_TABLE, id))
    }
}
