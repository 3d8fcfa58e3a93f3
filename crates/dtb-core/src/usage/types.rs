/// Account usage snapshot as reported by the subscription service.
///
/// Every field is already human readable (e.g. `"12.3GB"`); nothing is parsed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AccountUsage {
    pub plan: String,
    pub plan_time: String,
    pub money: String,
    pub aff_money: String,
    pub today_used: String,
    pub used: String,
    pub unused: String,
    pub traffic: String,
    pub integral: String,
}

/// A provisioned hosting instance and its monthly bandwidth allotment (GB).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HostingInstance {
    pub id: String,
    pub allowed_bandwidth_gb: i64,
}

/// Traffic counters for one calendar day.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BandwidthRecord {
    pub incoming_bytes: u64,
    pub outgoing_bytes: u64,
}

impl BandwidthRecord {
    pub fn total(&self) -> u64 {
        self.incoming_bytes.saturating_add(self.outgoing_bytes)
    }
}

/// Friendly name bound to a hosting instance id (from config).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InstanceMapping {
    pub name: String,
    pub instance_id: String,
}

impl InstanceMapping {
    pub fn new(name: impl Into<String>, instance_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            instance_id: instance_id.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccountSummary {
    pub used: String,
    pub unused: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InstanceUsage {
    pub name: String,
    pub used: String,
    pub unused: String,
}

/// Combined report handed back to the command handler.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UsageReport {
    pub account: AccountSummary,
    /// One entry per configured mapping, in config order.
    pub instances: Vec<InstanceUsage>,
    /// Whether hosting integration contributed to this report.
    pub hosting_enabled: bool,
}
