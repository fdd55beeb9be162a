//! Core data model
//!
//! All entities here are derived views, recomputed fresh on every analysis
//! run from the two input tables plus configuration. Nothing is mutated in
//! place across runs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Normalized firewall decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FwAction {
    Allow,
    Block,
    /// Unrecognized action string. Treated as BLOCK-equivalent for severity
    /// and surfaced as a parse warning, never silently coerced to ALLOW.
    Unknown,
}

impl std::fmt::Display for FwAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FwAction::Allow => write!(f, "ALLOW"),
            FwAction::Block => write!(f, "BLOCK"),
            FwAction::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// Severity tier attached by firewall correlation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum FwSeverity {
    /// No firewall record correlated with the flow
    None = 0,
    /// Traffic the firewall allowed
    Low = 1,
    /// Traffic the firewall blocked (or an unrecognized action)
    High = 2,
}

impl std::fmt::Display for FwSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FwSeverity::None => write!(f, "NONE"),
            FwSeverity::Low => write!(f, "LOW"),
            FwSeverity::High => write!(f, "HIGH"),
        }
    }
}

/// One normalized network flow record.
///
/// `timestamp` is `None` when the raw value did not parse; such rows are
/// retained but excluded from time-sensitive joins. `dst_port` is `None`
/// for non-numeric or out-of-range values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowRecord {
    pub timestamp: Option<DateTime<Utc>>,
    pub src_ip: String,
    pub dst_ip: String,
    pub dst_port: Option<u16>,
    pub protocol: Option<String>,
    pub bytes: u64,
    /// Lowercased, trimmed file extension (e.g. ".exe")
    pub file_type: String,
}

/// One normalized firewall decision record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FirewallRecord {
    pub timestamp: Option<DateTime<Utc>>,
    pub src_ip: String,
    pub dst_ip: String,
    pub dst_port: Option<u16>,
    pub action: FwAction,
    /// May be empty; passed through verbatim
    pub rule_name: String,
}

/// Per-flow heuristic indicators. Pure function of the flow record plus
/// threshold configuration; recomputed whenever thresholds change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionFlags {
    pub is_big_transfer: bool,
    pub is_suspicious_port: bool,
    pub is_risky_extension: bool,
}

impl DetectionFlags {
    /// True if any heuristic fired
    pub fn any(&self) -> bool {
        self.is_big_transfer || self.is_suspicious_port || self.is_risky_extension
    }
}

/// A (src, dst) pair exceeding the beacon repetition threshold
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeaconEntry {
    pub src_ip: String,
    pub dst_ip: String,
    pub connection_count: u64,
    /// Sliding window used for counting, if windowed mode was active
    pub window_secs: Option<u64>,
}

/// Nearest-in-time firewall decision attached to a flow. At most one match
/// is attached per flow record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FirewallMatch {
    pub action: FwAction,
    pub rule_name: String,
    pub severity: FwSeverity,
    /// |flow.timestamp - firewall.timestamp| in seconds
    pub time_diff_secs: i64,
}

/// Threat-intel lookup result. Never absent: a miss yields the default
/// non-match triple rather than nulls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreatIntelMatch {
    pub matched: bool,
    pub label: String,
    pub score: u8,
}

pub const NO_INTEL_LABEL: &str = "no known threat intel hit";

impl Default for ThreatIntelMatch {
    fn default() -> Self {
        Self {
            matched: false,
            label: NO_INTEL_LABEL.to_string(),
            score: 0,
        }
    }
}

/// Discrete verdict derived from the risk score
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "LOW"),
            RiskLevel::Medium => write!(f, "MEDIUM"),
            RiskLevel::High => write!(f, "HIGH"),
        }
    }
}

/// Weighted composite score plus its level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// Bounded 0-100
    pub score: u8,
    pub level: RiskLevel,
}

/// A flow record with every derived column attached: the augmented output
/// table handed to downstream reporting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedFlow {
    #[serde(flatten)]
    pub flow: FlowRecord,
    #[serde(flatten)]
    pub flags: DetectionFlags,
    pub firewall: Option<FirewallMatch>,
    pub intel: ThreatIntelMatch,
    pub risk: RiskAssessment,
    /// Coarse country code for the destination, "Unknown" when unmapped
    pub country: String,
}

impl EnrichedFlow {
    /// Severity tier of the correlated firewall decision, `None` tier when
    /// the flow stayed uncorrelated.
    pub fn fw_severity(&self) -> FwSeverity {
        self.firewall
            .as_ref()
            .map(|m| m.severity)
            .unwrap_or(FwSeverity::None)
    }
}
