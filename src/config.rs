//! Configuration
//!
//! All detection policy lives here: required columns, heuristic thresholds,
//! beacon and correlation windows, risk weights, plus the static threat feed
//! and GeoIP map. Everything is loadable from a TOML file and overridable
//! per deployment; `Default` impls carry the stock deployment values.
//!
//! Each analysis run captures its own config snapshot, so concurrent runs
//! with different feeds or thresholds do not interfere.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};

/// Root configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub schema: SchemaConfig,
    pub detection: DetectionConfig,
    pub beacon: BeaconConfig,
    pub correlation: CorrelationConfig,
    pub scoring: ScoringConfig,
    /// Static threat feed; stands in for a live intel source
    pub threat_feed: Vec<FeedEntry>,
    /// Static IP to country-code map; stands in for a GeoIP database
    pub geoip: HashMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schema: SchemaConfig::default(),
            detection: DetectionConfig::default(),
            beacon: BeaconConfig::default(),
            correlation: CorrelationConfig::default(),
            scoring: ScoringConfig::default(),
            threat_feed: default_threat_feed(),
            geoip: default_geoip(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| AnalysisError::Config(format!("failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Replace the threat feed from a JSON export (the format feeds are
    /// usually delivered in). Entries of types other than "ip" are kept
    /// but ignored by enrichment.
    pub fn with_feed_from_json<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        self.threat_feed = serde_json::from_str(&content)
            .map_err(|e| AnalysisError::Config(format!("failed to parse threat feed: {}", e)))?;
        Ok(self)
    }

    /// Check configuration invariants. Fatal at startup, before any data
    /// is processed.
    pub fn validate(&self) -> Result<()> {
        let s = &self.scoring;
        if s.high_threshold <= s.medium_threshold {
            return Err(AnalysisError::Config(format!(
                "high_threshold ({}) must be greater than medium_threshold ({})",
                s.high_threshold, s.medium_threshold
            )));
        }
        Ok(())
    }
}

/// Required columns per input table kind
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaConfig {
    pub flow_columns: Vec<String>,
    pub firewall_columns: Vec<String>,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            flow_columns: columns(&[
                "timestamp", "src_ip", "dst_ip", "dst_port", "bytes", "file_type",
            ]),
            firewall_columns: columns(&[
                "timestamp", "src_ip", "dst_ip", "dst_port", "action", "rule_name",
            ]),
        }
    }
}

/// Heuristic flagging thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Bytes threshold for a "big transfer" (inclusive)
    pub min_bytes_for_download: u64,
    pub suspicious_ports: HashSet<u16>,
    /// Lowercased extensions, leading dot included
    pub high_risk_extensions: HashSet<String>,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            min_bytes_for_download: 150_000,
            suspicious_ports: [22, 23, 135, 139, 445, 3389, 8080].into_iter().collect(),
            high_risk_extensions: [
                ".exe", ".dll", ".js", ".bat", ".ps1", ".vbs", ".scr", ".zip", ".rar", ".7z",
                ".sh",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

/// Beacon detection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BeaconConfig {
    /// Minimum repeated connections between the same (src, dst) pair
    pub min_connections: u64,
    /// Sliding window in seconds. `None` counts over the whole dataset.
    pub window_secs: Option<u64>,
}

impl Default for BeaconConfig {
    fn default() -> Self {
        Self {
            min_connections: 5,
            window_secs: None,
        }
    }
}

/// Firewall correlation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrelationConfig {
    /// Maximum |flow.timestamp - firewall.timestamp| for a match, in seconds
    pub time_tolerance_secs: u64,
}

impl Default for CorrelationConfig {
    fn default() -> Self {
        Self {
            time_tolerance_secs: 60,
        }
    }
}

/// Risk scoring weights and level thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub weights: RiskWeights,
    /// Scores at or above this are HIGH (inclusive lower bound)
    pub high_threshold: u8,
    /// Scores at or above this (and below high) are MEDIUM
    pub medium_threshold: u8,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weights: RiskWeights::default(),
            high_threshold: 70,
            medium_threshold: 40,
        }
    }
}

/// Per-flag score contributions
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskWeights {
    pub ti_match: u32,
    pub suspicious_port: u32,
    pub big_transfer: u32,
    pub risky_extension: u32,
}

impl Default for RiskWeights {
    fn default() -> Self {
        Self {
            ti_match: 50,
            suspicious_port: 20,
            big_transfer: 15,
            risky_extension: 15,
        }
    }
}

/// One threat feed record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedEntry {
    /// The indicator value, e.g. an IP address
    pub indicator: String,
    /// Indicator type; only "ip" entries participate in enrichment
    #[serde(rename = "type")]
    pub kind: String,
    pub label: String,
    /// Feed-assigned threat score, 0-100
    pub score: u8,
}

fn default_threat_feed() -> Vec<FeedEntry> {
    vec![
        FeedEntry {
            indicator: "185.199.108.153".into(),
            kind: "ip".into(),
            label: "Suspicious GitHub mirror".into(),
            score: 80,
        },
        FeedEntry {
            indicator: "45.155.205.25".into(),
            kind: "ip".into(),
            label: "Known C2 infrastructure".into(),
            score: 90,
        },
        FeedEntry {
            indicator: "91.198.174.192".into(),
            kind: "ip".into(),
            label: "Malicious redirector".into(),
            score: 75,
        },
    ]
}

fn default_geoip() -> HashMap<String, String> {
    [
        ("185.199.108.153", "US"),
        ("172.64.150.22", "US"),
        ("45.155.205.25", "NL"),
        ("91.198.174.192", "NL"),
        ("8.8.8.8", "US"),
        ("1.1.1.1", "AU"),
    ]
    .iter()
    .map(|(ip, cc)| (ip.to_string(), cc.to_string()))
    .collect()
}

fn columns(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn rejects_inverted_thresholds() {
        let mut config = Config::default();
        config.scoring.high_threshold = 40;
        config.scoring.medium_threshold = 70;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("high_threshold"));

        // Equal thresholds are rejected too
        config.scoring.high_threshold = 40;
        config.scoring.medium_threshold = 40;
        assert!(config.validate().is_err());
    }

    #[test]
    fn parses_partial_toml_with_defaults() {
        let toml_src = r#"
            [detection]
            min_bytes_for_download = 1000

            [scoring]
            high_threshold = 80
        "#;
        let config: Config = toml::from_str(toml_src).unwrap();
        assert_eq!(config.detection.min_bytes_for_download, 1000);
        assert_eq!(config.scoring.high_threshold, 80);
        // Untouched sections keep stock values
        assert_eq!(config.scoring.medium_threshold, 40);
        assert_eq!(config.beacon.min_connections, 5);
        assert!(config.detection.suspicious_ports.contains(&3389));
    }

    #[test]
    fn feed_entries_round_trip_json_with_type_field() {
        let json = r#"[
            {"indicator": "203.0.113.9", "type": "ip", "label": "scanner", "score": 60},
            {"indicator": "evil.example", "type": "domain", "label": "phish", "score": 70}
        ]"#;
        let feed: Vec<FeedEntry> = serde_json::from_str(json).unwrap();
        assert_eq!(feed.len(), 2);
        assert_eq!(feed[0].kind, "ip");
        assert_eq!(feed[1].kind, "domain");
    }
}
