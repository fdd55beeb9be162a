//! Reporting summaries
//!
//! Plain-data rollups over normalized and enriched tables, consumable by
//! any downstream reporting layer. No rendering lives here.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::types::{EnrichedFlow, FirewallRecord, FlowRecord, FwAction};

/// High-level flow metrics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowKpis {
    pub total_flows: u64,
    pub unique_sources: u64,
    pub unique_destinations: u64,
    pub total_bytes: u64,
}

pub fn flow_kpis<'a>(flows: impl IntoIterator<Item = &'a FlowRecord>) -> FlowKpis {
    let flows: Vec<&FlowRecord> = flows.into_iter().collect();
    let sources: HashSet<&str> = flows.iter().map(|f| f.src_ip.as_str()).collect();
    let destinations: HashSet<&str> = flows.iter().map(|f| f.dst_ip.as_str()).collect();
    FlowKpis {
        total_flows: flows.len() as u64,
        unique_sources: sources.len() as u64,
        unique_destinations: destinations.len() as u64,
        total_bytes: flows.iter().map(|f| f.bytes).sum(),
    }
}

/// Count per firewall action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionCount {
    pub action: FwAction,
    pub count: u64,
}

/// ALLOW vs BLOCK (vs unknown) counts, sorted descending
pub fn firewall_action_summary(records: &[FirewallRecord]) -> Vec<ActionCount> {
    let mut counts: HashMap<FwAction, u64> = HashMap::new();
    for rec in records {
        *counts.entry(rec.action).or_default() += 1;
    }
    let mut summary: Vec<ActionCount> = counts
        .into_iter()
        .map(|(action, count)| ActionCount { action, count })
        .collect();
    summary.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.action.to_string().cmp(&b.action.to_string()))
    });
    summary
}

/// Block count per destination
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockedDestination {
    pub dst_ip: String,
    pub block_count: u64,
}

/// Most-blocked destination IPs, descending, at most `limit` entries
pub fn top_blocked_destinations(records: &[FirewallRecord], limit: usize) -> Vec<BlockedDestination> {
    let mut counts: HashMap<&str, u64> = HashMap::new();
    for rec in records.iter().filter(|r| r.action == FwAction::Block) {
        *counts.entry(rec.dst_ip.as_str()).or_default() += 1;
    }
    let mut top: Vec<BlockedDestination> = counts
        .into_iter()
        .map(|(dst_ip, block_count)| BlockedDestination {
            dst_ip: dst_ip.to_string(),
            block_count,
        })
        .collect();
    top.sort_by(|a, b| {
        b.block_count
            .cmp(&a.block_count)
            .then_with(|| a.dst_ip.cmp(&b.dst_ip))
    });
    top.truncate(limit);
    top
}

/// The ranked list handed to responders: flows where any heuristic fired or
/// threat intel matched, highest risk first (byte count breaks ties).
pub fn ranked_suspicious(flows: &[EnrichedFlow]) -> Vec<EnrichedFlow> {
    let mut suspicious: Vec<EnrichedFlow> = flows
        .iter()
        .filter(|f| f.flags.any() || f.intel.matched)
        .cloned()
        .collect();
    suspicious.sort_by(|a, b| {
        b.risk
            .score
            .cmp(&a.risk.score)
            .then_with(|| b.flow.bytes.cmp(&a.flow.bytes))
    });
    suspicious
}
