//! flowsleuth — detection and correlation engine for flow and firewall logs
//!
//! Ingests two heterogeneous log tables — network flow records and firewall
//! decision logs — and produces a risk-scored, enriched flow table plus a
//! beacon table for incident responders.
//!
//! The engine is a pure batch pipeline: schema validation, normalization,
//! heuristic flagging, beacon detection, time-windowed firewall correlation,
//! threat-intel enrichment, weighted risk scoring, and GeoIP annotation.
//! File-format parsing and visualization are external collaborators; inputs
//! arrive as in-memory [`RawTable`]s.
//!
//! ```
//! use flowsleuth::{Config, Pipeline, RawTable};
//!
//! let mut flows = RawTable::new(vec![
//!     "timestamp", "src_ip", "dst_ip", "dst_port", "bytes", "file_type",
//! ]);
//! flows.push_row(vec![
//!     "2024-05-01 10:00:00", "10.0.0.5", "45.155.205.25", "3389", "200000", ".exe",
//! ]);
//! let firewall = RawTable::new(vec![
//!     "timestamp", "src_ip", "dst_ip", "dst_port", "action", "rule_name",
//! ]);
//!
//! let pipeline = Pipeline::new(Config::default()).unwrap();
//! let report = pipeline.analyze(&flows, &firewall).unwrap();
//! assert_eq!(report.flows[0].risk.level, flowsleuth::RiskLevel::High);
//! ```

pub mod beacon;
pub mod config;
pub mod correlate;
pub mod error;
pub mod flagger;
pub mod geoip;
pub mod intel;
pub mod normalize;
pub mod pipeline;
pub mod scoring;
pub mod summary;
pub mod table;
pub mod types;

pub use config::Config;
pub use error::{AnalysisError, Result};
pub use normalize::ParseWarning;
pub use pipeline::{AnalysisReport, AnalysisStats, Pipeline};
pub use table::{RawTable, TableKind};
pub use types::{
    BeaconEntry, DetectionFlags, EnrichedFlow, FirewallMatch, FirewallRecord, FlowRecord,
    FwAction, FwSeverity, RiskAssessment, RiskLevel, ThreatIntelMatch,
};
