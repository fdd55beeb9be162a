use thiserror::Error;

use crate::table::TableKind;

/// A single table failing schema validation, with the full missing set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaProblem {
    pub table: TableKind,
    pub missing: Vec<String>,
}

impl std::fmt::Display for SchemaProblem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} table missing required columns: {}",
            self.table,
            self.missing.join(", ")
        )
    }
}

#[derive(Debug, Error)]
pub enum AnalysisError {
    /// One or more input tables failed validation. Carries every problem
    /// found across all tables so callers can fix the input in one pass.
    #[error("schema validation failed: {}", format_problems(.0))]
    Schema(Vec<SchemaProblem>),

    #[error("config error: {0}")]
    Config(String),

    #[error("deadline exceeded before {stage} stage")]
    DeadlineExceeded { stage: &'static str },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

fn format_problems(problems: &[SchemaProblem]) -> String {
    problems
        .iter()
        .map(|p| p.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
