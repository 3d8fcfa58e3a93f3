//! Vultr v2 client (bearer API key, plain JSON).

use std::{collections::BTreeMap, time::Duration};

use async_trait::async_trait;
use serde::Deserialize;

use dtb_core::{
    context::CallContext,
    usage::{
        ports::HostingApi,
        types::{BandwidthRecord, HostingInstance},
    },
    Result,
};

use crate::http::{Auth, JsonHttp, PlainJson};

#[derive(Deserialize)]
struct InstancesResponse {
    instances: Vec<InstanceWire>,
}

#[derive(Deserialize)]
struct InstanceWire {
    id: String,
    allowed_bandwidth: i64,
}

#[derive(Deserialize)]
struct BandwidthResponse {
    bandwidth: BTreeMap<String, BandwidthWire>,
}

#[derive(Deserialize)]
struct BandwidthWire {
    incoming_bytes: u64,
    outgoing_bytes: u64,
}

#[derive(Clone, Debug)]
pub struct VultrClient {
    http: JsonHttp<PlainJson>,
}

impl VultrClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        Ok(Self {
            http: JsonHttp::new(base_url, Auth::Bearer(api_key.into()), timeout)?,
        })
    }
}

#[async_trait]
impl HostingApi for VultrClient {
    async fn list_instances(&self, ctx: &CallContext) -> Result<Vec<HostingInstance>> {
        let resp: InstancesResponse = ctx
            .run("list_instances", self.http.get("instances"))
            .await?;

        Ok(resp
            .instances
            .into_iter()
            .map(|i| HostingInstance {
                id: i.id,
                allowed_bandwidth_gb: i.allowed_bandwidth,
            })
            .collect())
    }

    async fn get_bandwidth(
        &self,
        ctx: &CallContext,
        instance_id: &str,
    ) -> Result<BTreeMap<String, BandwidthRecord>> {
        let path = format!("instances/{instance_id}/bandwidth");
        let resp: BandwidthResponse = ctx.run("get_bandwidth", self.http.get(&path)).await?;

        Ok(resp
            .bandwidth
            .into_iter()
            .map(|(date, b)| {
                (
                    date,
                    BandwidthRecord {
                        incoming_bytes: b.incoming_bytes,
                        outgoing_bytes: b.outgoing_bytes,
                    },
                )
            })
            .collect())
    }
}
