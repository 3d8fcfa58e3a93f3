use std::{collections::HashMap, sync::Arc};

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, Utc};
use tracing::debug;

use crate::{context::CallContext, errors::Error, Result};

use super::{
    ports::{AccountApi, HostingApi},
    types::{AccountSummary, BandwidthRecord, InstanceMapping, InstanceUsage, UsageReport},
};

/// Bandwidth months are counted in UTC+8 (Asia/Shanghai, no DST).
pub const REPORT_UTC_OFFSET_SECS: i32 = 8 * 3600;

const BYTES_PER_GIB: f64 = 1024.0 * 1024.0 * 1024.0;
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Builds the combined account + hosting usage report.
///
/// Read-only and uncached: every call re-fetches everything and either returns a
/// complete report or the first error.
#[derive(Clone)]
pub struct UsageAggregator {
    account: Arc<dyn AccountApi>,
    hosting: Option<Arc<dyn HostingApi>>,
}

impl UsageAggregator {
    /// `hosting: None` disables hosting integration.
    pub fn new(account: Arc<dyn AccountApi>, hosting: Option<Arc<dyn HostingApi>>) -> Self {
        Self { account, hosting }
    }

    pub fn hosting_enabled(&self) -> bool {
        self.hosting.is_some()
    }

    pub async fn build_report(
        &self,
        ctx: &CallContext,
        mappings: &[InstanceMapping],
    ) -> Result<UsageReport> {
        self.build_report_at(ctx, mappings, report_now()?).await
    }

    /// Same as `build_report`, with an explicit clock in the reporting timezone.
    pub async fn build_report_at(
        &self,
        ctx: &CallContext,
        mappings: &[InstanceMapping],
        now: DateTime<FixedOffset>,
    ) -> Result<UsageReport> {
        let usage = self.account.get_usage(ctx).await?;
        let account = AccountSummary {
            used: usage.used,
            unused: usage.unused,
        };

        let Some(hosting) = &self.hosting else {
            return Ok(UsageReport {
                account,
                instances: Vec::new(),
                hosting_enabled: false,
            });
        };

        let allotments: HashMap<String, i64> = hosting
            .list_instances(ctx)
            .await?
            .into_iter()
            .map(|inst| (inst.id, inst.allowed_bandwidth_gb))
            .collect();

        // Validate every mapping before spending calls on bandwidth.
        for m in mappings {
            if !allotments.contains_key(&m.instance_id) {
                return Err(Error::ConfigInconsistency {
                    instance_id: m.instance_id.clone(),
                });
            }
        }

        let mut instances = Vec::with_capacity(mappings.len());
        for m in mappings {
            let allotment_gib = allotments.get(&m.instance_id).copied().unwrap_or_default() as f64;
            let records = hosting.get_bandwidth(ctx, &m.instance_id).await?;
            let used_bytes = month_total_bytes(&records, now)?;
            let used_gib = used_bytes as f64 / BYTES_PER_GIB;
            debug!(
                name = %m.name,
                instance_id = %m.instance_id,
                used_bytes,
                "summed monthly bandwidth"
            );

            instances.push(InstanceUsage {
                name: m.name.clone(),
                used: format_gib(used_gib),
                unused: format_gib(allotment_gib - used_gib),
            });
        }

        Ok(UsageReport {
            account,
            instances,
            hosting_enabled: true,
        })
    }
}

/// Current time in the reporting timezone.
pub fn report_now() -> Result<DateTime<FixedOffset>> {
    Ok(Utc::now().with_timezone(&report_offset()?))
}

pub fn report_offset() -> Result<FixedOffset> {
    FixedOffset::east_opt(REPORT_UTC_OFFSET_SECS)
        .ok_or_else(|| Error::Config("invalid report timezone offset".to_string()))
}

/// Sum in+out bytes of the records dated in `now`'s calendar month.
///
/// Any unparsable date key fails the whole sum.
pub fn month_total_bytes<'a, I>(records: I, now: DateTime<FixedOffset>) -> Result<u64>
where
    I: IntoIterator<Item = (&'a String, &'a BandwidthRecord)>,
{
    let mut total = 0u64;
    for (date, rec) in records {
        let day = NaiveDate::parse_from_str(date, DATE_FORMAT).map_err(|e| Error::DateParse {
            date: date.clone(),
            reason: e.to_string(),
        })?;
        if day.year() != now.year() || day.month() != now.month() {
            continue;
        }
        total = total.saturating_add(rec.total());
    }
    Ok(total)
}

/// Two-decimal GiB string; negative values are kept as-is.
pub fn format_gib(gib: f64) -> String {
    format!("{gib:.2}GiB")
}
