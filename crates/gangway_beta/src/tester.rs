//! Remote beta-tester resource.

use derive_getters::Getters;

/// One tester as known to the beta-distribution service.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct BetaTester {
    /// Remote resource id
    id: String,
    /// Registered email
    email: String,
    /// Ids of the beta groups the tester belongs to
    beta_group_ids: Vec<String>,
}

impl BetaTester {
    /// Construct directly; used by tests and fakes.
    pub fn new(id: impl Into<String>, email: impl Into<String>, beta_group_ids: Vec<String>) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            beta_group_ids,
        }
    }

    /// Whether the tester belongs to the given beta group.
    pub fn in_group(&self, group_id: &str) -> bool {
        self.beta_group_ids.iter().any(|id| id == group_id)
    }
}
