//! Threat-intel enrichment
//!
//! Left-join semantics against a static feed: every flow gets exactly one
//! [`ThreatIntelMatch`], matched or not. Only feed entries of type "ip"
//! participate. The feed is read-only configuration, swappable without
//! touching the join logic.

use std::collections::HashMap;

use crate::config::FeedEntry;
use crate::types::ThreatIntelMatch;

pub struct ThreatIntel {
    by_ip: HashMap<String, (String, u8)>,
}

impl ThreatIntel {
    /// Build a lookup table from feed entries, keeping "ip" indicators only
    pub fn new(feed: &[FeedEntry]) -> Self {
        let by_ip = feed
            .iter()
            .filter(|e| e.kind == "ip")
            .map(|e| (e.indicator.clone(), (e.label.clone(), e.score.min(100))))
            .collect();
        Self { by_ip }
    }

    /// Look up a destination indicator. A miss yields the default
    /// non-match triple, never null fields.
    pub fn lookup(&self, dst_ip: &str) -> ThreatIntelMatch {
        match self.by_ip.get(dst_ip) {
            Some((label, score)) => ThreatIntelMatch {
                matched: true,
                label: label.clone(),
                score: *score,
            },
            None => ThreatIntelMatch::default(),
        }
    }

    pub fn indicator_count(&self) -> usize {
        self.by_ip.len()
    }
}
