use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::{context::CallContext, domain::Session, Result};

use super::types::{AccountUsage, BandwidthRecord, HostingInstance};

/// Subscription-service account (session-token auth).
///
/// `login` is the single writer of the session; every other method only reads it and
/// fails with `Error::NotAuthenticated` when no session is held.
#[async_trait]
pub trait AccountApi: Send + Sync {
    async fn login(&self, ctx: &CallContext) -> Result<Session>;

    async fn get_usage(&self, ctx: &CallContext) -> Result<AccountUsage>;
}

/// Hosting provider (stateless API-key auth).
#[async_trait]
pub trait HostingApi: Send + Sync {
    async fn list_instances(&self, ctx: &CallContext) -> Result<Vec<HostingInstance>>;

    /// Daily records keyed by ISO date (`YYYY-MM-DD`).
    async fn get_bandwidth(
        &self,
        ctx: &CallContext,
        instance_id: &str,
    ) -> Result<BTreeMap<String, BandwidthRecord>>;
}
