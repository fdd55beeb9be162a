//! Firewall correlation
//!
//! Joins each flow record to the nearest-in-time firewall decision sharing
//! (src_ip, dst_ip, dst_port). Candidates further than the tolerance window
//! leave the flow uncorrelated. Equidistant candidates resolve to the
//! earlier firewall timestamp so repeated runs assign identically.
//!
//! Firewall records are indexed by key up front; the per-flow search is
//! independent of every other flow and parallelizes across row partitions.

use std::collections::HashMap;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::config::CorrelationConfig;
use crate::types::{FirewallMatch, FirewallRecord, FlowRecord, FwAction, FwSeverity};

/// Severity tier for a correlated firewall action
fn action_severity(action: FwAction) -> FwSeverity {
    match action {
        FwAction::Block | FwAction::Unknown => FwSeverity::High,
        FwAction::Allow => FwSeverity::Low,
    }
}

type Key<'a> = (&'a str, &'a str, u16);

pub struct FirewallCorrelator {
    config: CorrelationConfig,
}

impl FirewallCorrelator {
    pub fn new(config: CorrelationConfig) -> Self {
        Self { config }
    }

    /// Correlate every flow, returning one entry per flow in input order.
    /// Flows with an invalid timestamp or unknown port stay uncorrelated.
    pub fn correlate(
        &self,
        flows: &[FlowRecord],
        firewall: &[FirewallRecord],
    ) -> Vec<Option<FirewallMatch>> {
        let index = build_index(firewall);

        #[cfg(feature = "parallel")]
        {
            flows
                .par_iter()
                .map(|flow| self.correlate_single(flow, &index))
                .collect()
        }
        #[cfg(not(feature = "parallel"))]
        {
            flows
                .iter()
                .map(|flow| self.correlate_single(flow, &index))
                .collect()
        }
    }

    fn correlate_single(
        &self,
        flow: &FlowRecord,
        index: &HashMap<Key<'_>, Vec<&FirewallRecord>>,
    ) -> Option<FirewallMatch> {
        let flow_ts = flow.timestamp?;
        let port = flow.dst_port?;
        let candidates = index.get(&(flow.src_ip.as_str(), flow.dst_ip.as_str(), port))?;

        let tolerance_ms = self.config.time_tolerance_secs as i64 * 1000;
        let mut best: Option<(&FirewallRecord, i64)> = None;

        for fw in candidates {
            // Index only holds records with valid timestamps
            let fw_ts = fw.timestamp.unwrap();
            let diff_ms = (fw_ts - flow_ts).num_milliseconds().abs();
            if diff_ms > tolerance_ms {
                continue;
            }
            // Candidates are sorted by timestamp, so strict less-than keeps
            // the earlier record when two are equidistant
            if best.map_or(true, |(_, best_ms)| diff_ms < best_ms) {
                best = Some((fw, diff_ms));
            }
        }

        best.map(|(fw, diff_ms)| FirewallMatch {
            action: fw.action,
            rule_name: fw.rule_name.clone(),
            severity: action_severity(fw.action),
            time_diff_secs: diff_ms / 1000,
        })
    }
}

/// Index firewall records by (src, dst, port), each bucket sorted by
/// timestamp ascending. Records without a usable timestamp or port cannot
/// participate in the time join and are left out.
fn build_index(firewall: &[FirewallRecord]) -> HashMap<Key<'_>, Vec<&FirewallRecord>> {
    let mut index: HashMap<Key<'_>, Vec<&FirewallRecord>> = HashMap::new();

    for fw in firewall {
        let (Some(_), Some(port)) = (fw.timestamp, fw.dst_port) else {
            continue;
        };
        index
            .entry((fw.src_ip.as_str(), fw.dst_ip.as_str(), port))
            .or_default()
            .push(fw);
    }

    for bucket in index.values_mut() {
        bucket.sort_by_key(|fw| fw.timestamp);
    }

    index
}
