//! Normalization of raw table rows into typed records
//!
//! Normalization never drops rows. Unparseable timestamps become `None`
//! markers, out-of-range ports become unknown, bad byte counts default to
//! zero, unrecognized firewall actions become `FwAction::Unknown`. Every
//! degradation is recorded as a `ParseWarning` and logged; downstream
//! stages treat the degraded fields as risk-neutral.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::table::{ColumnIndex, RawTable, TableKind};
use crate::types::{FirewallRecord, FlowRecord, FwAction};

/// A non-fatal parse issue: the row was retained with the field marked
/// unknown or invalid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseWarning {
    pub table: TableKind,
    /// Zero-based row index in the input table
    pub row: usize,
    pub field: String,
    pub value: String,
}

impl std::fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} row {}: unparseable {} {:?}",
            self.table, self.row, self.field, self.value
        )
    }
}

/// Timestamp formats accepted besides RFC 3339 and unix epoch seconds
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
];

/// Parse a timestamp string into UTC, returning `None` for anything
/// unrecognized. Naive timestamps are assumed to be UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    // Date-only values land at midnight
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?));
    }

    // Unix epoch seconds
    if let Ok(secs) = raw.parse::<i64>() {
        return Utc.timestamp_opt(secs, 0).single();
    }

    None
}

/// Parse a port, treating non-numeric or out-of-range values as unknown
pub fn parse_port(raw: &str) -> Option<u16> {
    let n: i64 = raw.trim().parse().ok()?;
    u16::try_from(n).ok()
}

/// Parse a byte count. Accepts integer or float notation; negative or
/// unparseable values yield `None` (the caller defaults to 0).
pub fn parse_bytes(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    if let Ok(n) = raw.parse::<i64>() {
        return u64::try_from(n).ok();
    }
    match raw.parse::<f64>() {
        Ok(f) if f.is_finite() && f >= 0.0 => Some(f as u64),
        _ => None,
    }
}

fn parse_action(raw: &str) -> FwAction {
    match raw.trim().to_uppercase().as_str() {
        "ALLOW" => FwAction::Allow,
        "BLOCK" => FwAction::Block,
        _ => FwAction::Unknown,
    }
}

fn cell<'a>(columns: &ColumnIndex, row: &'a [String], name: &str) -> &'a str {
    columns.value(row, name).unwrap_or("")
}

/// Normalize a validated flow table into typed records.
///
/// Returns the records (one per input row, in order) plus the warnings
/// accumulated along the way.
pub fn normalize_flows(
    table: &RawTable,
    columns: &ColumnIndex,
) -> (Vec<FlowRecord>, Vec<ParseWarning>) {
    let mut records = Vec::with_capacity(table.len());
    let mut warnings = Vec::new();

    for (i, row) in table.rows.iter().enumerate() {
        let raw_ts = cell(columns, row, "timestamp");
        let timestamp = parse_timestamp(raw_ts);
        if timestamp.is_none() {
            push_warning(&mut warnings, TableKind::Flow, i, "timestamp", raw_ts);
        }

        let raw_port = cell(columns, row, "dst_port");
        let dst_port = parse_port(raw_port);
        if dst_port.is_none() {
            push_warning(&mut warnings, TableKind::Flow, i, "dst_port", raw_port);
        }

        let raw_bytes = cell(columns, row, "bytes");
        let bytes = match parse_bytes(raw_bytes) {
            Some(b) => b,
            None => {
                push_warning(&mut warnings, TableKind::Flow, i, "bytes", raw_bytes);
                0
            }
        };

        // Optional column: tolerated if absent, no warning
        let protocol = columns
            .value(row, "protocol")
            .map(|p| p.trim().to_lowercase())
            .filter(|p| !p.is_empty());

        records.push(FlowRecord {
            timestamp,
            src_ip: cell(columns, row, "src_ip").trim().to_string(),
            dst_ip: cell(columns, row, "dst_ip").trim().to_string(),
            dst_port,
            protocol,
            bytes,
            file_type: cell(columns, row, "file_type").trim().to_lowercase(),
        });
    }

    (records, warnings)
}

/// Normalize a validated firewall table into typed records
pub fn normalize_firewall(
    table: &RawTable,
    columns: &ColumnIndex,
) -> (Vec<FirewallRecord>, Vec<ParseWarning>) {
    let mut records = Vec::with_capacity(table.len());
    let mut warnings = Vec::new();

    for (i, row) in table.rows.iter().enumerate() {
        let raw_ts = cell(columns, row, "timestamp");
        let timestamp = parse_timestamp(raw_ts);
        if timestamp.is_none() {
            push_warning(&mut warnings, TableKind::Firewall, i, "timestamp", raw_ts);
        }

        let raw_port = cell(columns, row, "dst_port");
        let dst_port = parse_port(raw_port);
        if dst_port.is_none() {
            push_warning(&mut warnings, TableKind::Firewall, i, "dst_port", raw_port);
        }

        let raw_action = cell(columns, row, "action");
        let action = parse_action(raw_action);
        if action == FwAction::Unknown {
            push_warning(&mut warnings, TableKind::Firewall, i, "action", raw_action);
        }

        records.push(FirewallRecord {
            timestamp,
            src_ip: cell(columns, row, "src_ip").trim().to_string(),
            dst_ip: cell(columns, row, "dst_ip").trim().to_string(),
            dst_port,
            action,
            rule_name: cell(columns, row, "rule_name").trim().to_string(),
        });
    }

    (records, warnings)
}

fn push_warning(
    warnings: &mut Vec<ParseWarning>,
    table: TableKind,
    row: usize,
    field: &'static str,
    value: &str,
) {
    let warning = ParseWarning {
        table,
        row,
        field: field.to_string(),
        value: value.to_string(),
    };
    warn!(%warning, "field degraded to unknown");
    warnings.push(warning);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::validate_schema;

    fn flow_table(rows: Vec<Vec<&str>>) -> (RawTable, ColumnIndex) {
        let mut table = RawTable::new(vec![
            "timestamp",
            "src_ip",
            "dst_ip",
            "dst_port",
            "bytes",
            "file_type",
        ]);
        for row in rows {
            table.push_row(row);
        }
        let required = table.columns.clone();
        let idx = validate_schema(&table, TableKind::Flow, &required).unwrap();
        (table, idx)
    }

    #[test]
    fn parses_common_timestamp_formats() {
        for raw in [
            "2024-05-01T10:00:00Z",
            "2024-05-01 10:00:00",
            "2024-05-01T10:00:00",
            "2024/05/01 10:00:00",
            "05/01/2024 10:00:00",
        ] {
            let ts = parse_timestamp(raw).unwrap();
            assert_eq!(ts.timestamp(), 1714557600, "format {:?}", raw);
        }
        assert_eq!(parse_timestamp("1714557600").unwrap().timestamp(), 1714557600);
        assert!(parse_timestamp("not a date").is_none());
        assert!(parse_timestamp("").is_none());
    }

    #[test]
    fn port_range_is_enforced() {
        assert_eq!(parse_port("443"), Some(443));
        assert_eq!(parse_port("0"), Some(0));
        assert_eq!(parse_port("65535"), Some(65535));
        assert_eq!(parse_port("65536"), None);
        assert_eq!(parse_port("-1"), None);
        assert_eq!(parse_port("https"), None);
    }

    #[test]
    fn bytes_default_to_zero_with_warning() {
        let (table, idx) = flow_table(vec![
            vec!["2024-05-01 10:00:00", "10.0.0.1", "1.2.3.4", "443", "-5", ".exe"],
            vec!["2024-05-01 10:00:01", "10.0.0.1", "1.2.3.4", "443", "1234.0", ".exe"],
        ]);
        let (records, warnings) = normalize_flows(&table, &idx);
        assert_eq!(records[0].bytes, 0);
        assert_eq!(records[1].bytes, 1234);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].field, "bytes");
        assert_eq!(warnings[0].row, 0);
    }

    #[test]
    fn rows_are_retained_not_dropped() {
        let (table, idx) = flow_table(vec![
            vec!["garbage", "10.0.0.1", "1.2.3.4", "ssh", "oops", ".EXE "],
        ]);
        let (records, warnings) = normalize_flows(&table, &idx);
        assert_eq!(records.len(), 1);
        let rec = &records[0];
        assert!(rec.timestamp.is_none());
        assert!(rec.dst_port.is_none());
        assert_eq!(rec.bytes, 0);
        assert_eq!(rec.file_type, ".exe");
        assert_eq!(warnings.len(), 3);
    }

    #[test]
    fn unknown_firewall_action_is_reported_not_coerced() {
        let mut table = RawTable::new(vec![
            "timestamp", "src_ip", "dst_ip", "dst_port", "action", "rule_name",
        ]);
        table.push_row(vec!["2024-05-01 10:00:00", "10.0.0.1", "1.2.3.4", "443", " allow ", ""]);
        table.push_row(vec!["2024-05-01 10:00:01", "10.0.0.1", "1.2.3.4", "443", "DENY", "r1"]);
        let required = table.columns.clone();
        let idx = validate_schema(&table, TableKind::Firewall, &required).unwrap();

        let (records, warnings) = normalize_firewall(&table, &idx);
        assert_eq!(records[0].action, FwAction::Allow);
        assert_eq!(records[1].action, FwAction::Unknown);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].field, "action");
    }
}
