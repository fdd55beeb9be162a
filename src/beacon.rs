//! Beacon detection
//!
//! Flags (src, dst) pairs with enough repeated contact to look like
//! automated check-in behavior. Two counting modes, selected by config:
//!
//! - **Global**: count every connection for the pair across the dataset.
//! - **Rolling window**: for each connection, count the pair's connections
//!   inside the window ending at that connection's own timestamp. There is
//!   no global window alignment, so a burst anywhere in the stream
//!   qualifies even when the overall count would not. The reported count
//!   is the densest window observed.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::config::BeaconConfig;
use crate::types::{BeaconEntry, FlowRecord};

pub struct BeaconDetector {
    config: BeaconConfig,
}

impl BeaconDetector {
    pub fn new(config: BeaconConfig) -> Self {
        Self { config }
    }

    /// Detect beacon-like pairs, sorted by connection count descending
    /// (ties broken by pair key for reproducible output).
    pub fn detect(&self, flows: &[FlowRecord]) -> Vec<BeaconEntry> {
        let mut groups: HashMap<(&str, &str), PairStats> = HashMap::new();

        for flow in flows {
            let stats = groups
                .entry((flow.src_ip.as_str(), flow.dst_ip.as_str()))
                .or_default();
            stats.total += 1;
            if let Some(ts) = flow.timestamp {
                stats.timestamps.push(ts);
            }
        }

        let mut entries: Vec<BeaconEntry> = groups
            .into_iter()
            .filter_map(|((src, dst), stats)| {
                let count = match self.config.window_secs {
                    None => stats.total,
                    Some(window) => stats.max_rolling_count(window),
                };
                if count >= self.config.min_connections {
                    Some(BeaconEntry {
                        src_ip: src.to_string(),
                        dst_ip: dst.to_string(),
                        connection_count: count,
                        window_secs: self.config.window_secs,
                    })
                } else {
                    None
                }
            })
            .collect();

        entries.sort_by(|a, b| {
            b.connection_count
                .cmp(&a.connection_count)
                .then_with(|| a.src_ip.cmp(&b.src_ip))
                .then_with(|| a.dst_ip.cmp(&b.dst_ip))
        });
        entries
    }
}

#[derive(Default)]
struct PairStats {
    total: u64,
    /// Valid timestamps only; records with invalid timestamps are excluded
    /// from windowed counting
    timestamps: Vec<DateTime<Utc>>,
}

impl PairStats {
    /// Densest count over windows ending at each connection's own timestamp
    fn max_rolling_count(&self, window_secs: u64) -> u64 {
        let mut timestamps = self.timestamps.clone();
        timestamps.sort_unstable();

        let window = window_secs as i64;
        let mut best = 0u64;
        let mut start = 0;
        for end in 0..timestamps.len() {
            while (timestamps[end] - timestamps[start]).num_seconds() > window {
                start += 1;
            }
            best = best.max((end - start + 1) as u64);
        }
        best
    }
}
