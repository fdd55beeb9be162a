//! Analysis pipeline
//!
//! Orchestrates the stages over the two input tables:
//! validate -> normalize -> flag -> {beacon, correlate} -> enrich ->
//! score -> geo. Each stage consumes the previous stage's output and
//! produces a new table; nothing is mutated in place and no shared state
//! survives a run.
//!
//! The pipeline captures its configuration snapshot at construction, so
//! concurrent runs with different configurations do not interfere. A
//! deadline, when given, is checked between stages: a stage either
//! completes fully or the run fails without partial results.

use std::time::Instant;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::beacon::BeaconDetector;
use crate::config::Config;
use crate::correlate::FirewallCorrelator;
use crate::error::{AnalysisError, Result};
use crate::flagger::flag_flow;
use crate::geoip::GeoIpMap;
use crate::intel::ThreatIntel;
use crate::normalize::{normalize_firewall, normalize_flows, ParseWarning};
use crate::scoring::RiskScorer;
use crate::table::{validate_schema, RawTable, TableKind};
use crate::types::{BeaconEntry, EnrichedFlow, RiskLevel};

/// Full output of one analysis run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// The augmented flow table, one row per input flow row
    pub flows: Vec<EnrichedFlow>,
    /// Pairs exceeding the beacon threshold, densest first
    pub beacons: Vec<BeaconEntry>,
    /// Non-fatal parse issues from normalization
    pub warnings: Vec<ParseWarning>,
    pub stats: AnalysisStats,
}

impl AnalysisReport {
    /// The ranked suspicious-flow list for responders, highest risk first
    pub fn ranked_suspicious(&self) -> Vec<EnrichedFlow> {
        crate::summary::ranked_suspicious(&self.flows)
    }

    /// High-level flow metrics over the analyzed table
    pub fn flow_kpis(&self) -> crate::summary::FlowKpis {
        crate::summary::flow_kpis(self.flows.iter().map(|f| &f.flow))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisStats {
    pub flow_rows: u64,
    pub firewall_rows: u64,
    pub parse_warnings: u64,
    pub correlated_flows: u64,
    pub ti_matches: u64,
    pub beacon_pairs: u64,
    pub high_risk: u64,
    pub medium_risk: u64,
    pub low_risk: u64,
}

/// The detection and correlation engine
pub struct Pipeline {
    config: Config,
    intel: ThreatIntel,
    geoip: GeoIpMap,
    scorer: RiskScorer,
    beacon: BeaconDetector,
    correlator: FirewallCorrelator,
}

impl Pipeline {
    /// Build a pipeline from a configuration snapshot. Fails before any
    /// data is touched if the configuration is invalid.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let intel = ThreatIntel::new(&config.threat_feed);
        let geoip = GeoIpMap::new(config.geoip.clone());
        let scorer = RiskScorer::new(config.scoring.clone());
        let beacon = BeaconDetector::new(config.beacon.clone());
        let correlator = FirewallCorrelator::new(config.correlation.clone());
        Ok(Self {
            config,
            intel,
            geoip,
            scorer,
            beacon,
            correlator,
        })
    }

    /// Run the full pipeline over both input tables
    pub fn analyze(&self, flow_table: &RawTable, firewall_table: &RawTable) -> Result<AnalysisReport> {
        self.run(flow_table, firewall_table, None)
    }

    /// Same as [`analyze`](Self::analyze) with a deadline checked between
    /// stages. Exceeding it fails the run; partial results are never
    /// returned.
    pub fn analyze_with_deadline(
        &self,
        flow_table: &RawTable,
        firewall_table: &RawTable,
        deadline: Instant,
    ) -> Result<AnalysisReport> {
        self.run(flow_table, firewall_table, Some(deadline))
    }

    fn run(
        &self,
        flow_table: &RawTable,
        firewall_table: &RawTable,
        deadline: Option<Instant>,
    ) -> Result<AnalysisReport> {
        check_deadline(deadline, "validate")?;
        let (flow_idx, fw_idx) = self.validate_tables(flow_table, firewall_table)?;

        check_deadline(deadline, "normalize")?;
        let (flows, mut warnings) = normalize_flows(flow_table, &flow_idx);
        let (firewall, fw_warnings) = normalize_firewall(firewall_table, &fw_idx);
        warnings.extend(fw_warnings);
        info!(
            flows = flows.len(),
            firewall = firewall.len(),
            warnings = warnings.len(),
            "normalized input tables"
        );

        check_deadline(deadline, "flag")?;
        let flags: Vec<_> = flows
            .iter()
            .map(|f| flag_flow(f, &self.config.detection))
            .collect();

        check_deadline(deadline, "beacon")?;
        let beacons = self.beacon.detect(&flows);
        debug!(pairs = beacons.len(), "beacon detection complete");

        check_deadline(deadline, "correlate")?;
        let matches = self.correlator.correlate(&flows, &firewall);

        check_deadline(deadline, "enrich")?;
        let enriched = self.enrich(flows, flags, matches);

        let stats = build_stats(&enriched, &beacons, &warnings, firewall.len());
        info!(
            correlated = stats.correlated_flows,
            ti_matches = stats.ti_matches,
            high_risk = stats.high_risk,
            "analysis complete"
        );

        Ok(AnalysisReport {
            flows: enriched,
            beacons,
            warnings,
            stats,
        })
    }

    /// Validate both schemas, aggregating every problem into one error so
    /// callers can fix the whole input in a single pass.
    fn validate_tables(
        &self,
        flow_table: &RawTable,
        firewall_table: &RawTable,
    ) -> Result<(crate::table::ColumnIndex, crate::table::ColumnIndex)> {
        let flow_result = validate_schema(flow_table, TableKind::Flow, &self.config.schema.flow_columns);
        let fw_result = validate_schema(
            firewall_table,
            TableKind::Firewall,
            &self.config.schema.firewall_columns,
        );

        match (flow_result, fw_result) {
            (Ok(f), Ok(fw)) => Ok((f, fw)),
            (flow_result, fw_result) => {
                let problems = [flow_result.err(), fw_result.err()]
                    .into_iter()
                    .flatten()
                    .collect();
                Err(AnalysisError::Schema(problems))
            }
        }
    }

    /// Per-flow enrichment, scoring, and geo annotation. Each row is
    /// independent, so this partitions cleanly across threads.
    fn enrich(
        &self,
        flows: Vec<crate::types::FlowRecord>,
        flags: Vec<crate::types::DetectionFlags>,
        matches: Vec<Option<crate::types::FirewallMatch>>,
    ) -> Vec<EnrichedFlow> {
        let build = |((flow, flags), firewall): (
            (crate::types::FlowRecord, crate::types::DetectionFlags),
            Option<crate::types::FirewallMatch>,
        )| {
            let intel = self.intel.lookup(&flow.dst_ip);
            let risk = self.scorer.score(&flags, &intel);
            let country = self.geoip.country(&flow.dst_ip);
            EnrichedFlow {
                flow,
                flags,
                firewall,
                intel,
                risk,
                country,
            }
        };

        #[cfg(feature = "parallel")]
        {
            flows
                .into_par_iter()
                .zip(flags)
                .zip(matches)
                .map(build)
                .collect()
        }
        #[cfg(not(feature = "parallel"))]
        {
            flows.into_iter().zip(flags).zip(matches).map(build).collect()
        }
    }
}

fn check_deadline(deadline: Option<Instant>, stage: &'static str) -> Result<()> {
    if let Some(deadline) = deadline {
        if Instant::now() >= deadline {
            return Err(AnalysisError::DeadlineExceeded { stage });
        }
    }
    Ok(())
}

fn build_stats(
    flows: &[EnrichedFlow],
    beacons: &[BeaconEntry],
    warnings: &[ParseWarning],
    firewall_rows: usize,
) -> AnalysisStats {
    let mut stats = AnalysisStats {
        flow_rows: flows.len() as u64,
        firewall_rows: firewall_rows as u64,
        parse_warnings: warnings.len() as u64,
        beacon_pairs: beacons.len() as u64,
        ..Default::default()
    };
    for flow in flows {
        if flow.firewall.is_some() {
            stats.correlated_flows += 1;
        }
        if flow.intel.matched {
            stats.ti_matches += 1;
        }
        match flow.risk.level {
            RiskLevel::High => stats.high_risk += 1,
            RiskLevel::Medium => stats.medium_risk += 1,
            RiskLevel::Low => stats.low_risk += 1,
        }
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flow_table() -> RawTable {
        let mut table = RawTable::new(vec![
            "timestamp", "src_ip", "dst_ip", "dst_port", "bytes", "file_type",
        ]);
        table.push_row(vec![
            "2024-05-01 10:00:00",
            "10.0.0.1",
            "45.155.205.25",
            "3389",
            "200000",
            ".exe",
        ]);
        table
    }

    fn firewall_table() -> RawTable {
        let mut table = RawTable::new(vec![
            "timestamp", "src_ip", "dst_ip", "dst_port", "action", "rule_name",
        ]);
        table.push_row(vec![
            "2024-05-01 10:00:30",
            "10.0.0.1",
            "45.155.205.25",
            "3389",
            "BLOCK",
            "rdp-block",
        ]);
        table
    }

    #[test]
    fn schema_failures_from_both_tables_surface_in_one_error() {
        let pipeline = Pipeline::new(Config::default()).unwrap();
        let bad_flows = RawTable::new(vec!["timestamp", "src_ip"]);
        let bad_firewall = RawTable::new(vec!["timestamp"]);

        let err = pipeline.analyze(&bad_flows, &bad_firewall).unwrap_err();
        let AnalysisError::Schema(problems) = err else {
            panic!("expected schema error");
        };
        assert_eq!(problems.len(), 2);
        assert_eq!(problems[0].table, TableKind::Flow);
        assert_eq!(problems[1].table, TableKind::Firewall);
        assert!(problems[1].missing.contains(&"action".to_string()));
    }

    #[test]
    fn invalid_config_fails_before_data_is_processed() {
        let mut config = Config::default();
        config.scoring.high_threshold = 10;
        config.scoring.medium_threshold = 40;
        assert!(matches!(
            Pipeline::new(config),
            Err(AnalysisError::Config(_))
        ));
    }

    #[test]
    fn expired_deadline_fails_without_partial_results() {
        let pipeline = Pipeline::new(Config::default()).unwrap();
        let deadline = Instant::now() - std::time::Duration::from_secs(1);
        let err = pipeline
            .analyze_with_deadline(&flow_table(), &firewall_table(), deadline)
            .unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::DeadlineExceeded { stage: "validate" }
        ));
    }

    #[test]
    fn single_bad_flow_gets_fully_enriched() {
        let pipeline = Pipeline::new(Config::default()).unwrap();
        let report = pipeline.analyze(&flow_table(), &firewall_table()).unwrap();

        assert_eq!(report.flows.len(), 1);
        let flow = &report.flows[0];
        assert!(flow.flags.is_big_transfer);
        assert!(flow.flags.is_suspicious_port);
        assert!(flow.flags.is_risky_extension);

        let fw = flow.firewall.as_ref().unwrap();
        assert_eq!(fw.rule_name, "rdp-block");
        assert_eq!(fw.time_diff_secs, 30);

        assert!(flow.intel.matched);
        assert_eq!(flow.intel.score, 90);
        // 50 + 20 + 15 + 15 + 45 clamps to 100
        assert_eq!(flow.risk.score, 100);
        assert_eq!(flow.risk.level, RiskLevel::High);
        assert_eq!(flow.country, "NL");

        assert_eq!(report.stats.correlated_flows, 1);
        assert_eq!(report.stats.ti_matches, 1);
        assert_eq!(report.stats.high_risk, 1);
    }
}
