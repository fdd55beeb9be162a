//! Heuristic flagging
//!
//! Pure, order-independent per-record indicators. Thresholds come from the
//! injected [`DetectionConfig`] so detection policy can vary per deployment
//! without code change.

use crate::config::DetectionConfig;
use crate::types::{DetectionFlags, FlowRecord};

/// Compute the heuristic indicators for one flow record
pub fn flag_flow(flow: &FlowRecord, config: &DetectionConfig) -> DetectionFlags {
    DetectionFlags {
        is_big_transfer: flow.bytes >= config.min_bytes_for_download,
        is_suspicious_port: flow
            .dst_port
            .map_or(false, |p| config.suspicious_ports.contains(&p)),
        is_risky_extension: config.high_risk_extensions.contains(&flow.file_type),
    }
}
