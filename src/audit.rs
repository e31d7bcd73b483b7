//! JSONL audit trail logging.
//!
//! Each CLI run appends events to an audit.jsonl file, one JSON object
//! per line. The engine itself stays pure; this records what was
//! computed and from which inputs.

use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::api::{PlanResponse, RebalanceResponse};
use crate::error::Result;

/// An audit event written to the JSONL trail.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEvent {
    pub event: &'static str,
    pub ts: DateTime<Utc>,
    #[serde(flatten)]
    pub data: serde_json::Value,
}

/// Append-only audit logger.
pub struct AuditLog {
    writer: BufWriter<std::fs::File>,
}

impl AuditLog {
    /// Open (or create) the audit log file for appending.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            writer: BufWriter::new(file),
        })
    }

    /// Log an event with arbitrary JSON data.
    pub fn log(&mut self, event: &'static str, data: serde_json::Value) -> Result<()> {
        let entry = AuditEvent {
            event,
            ts: Utc::now(),
            data,
        };
        let json = serde_json::to_string(&entry)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        writeln!(self.writer, "{json}")?;
        self.writer.flush()?;
        Ok(())
    }

    /// Log a simple event with no additional data.
    pub fn log_simple(&mut self, event: &'static str) -> Result<()> {
        self.log(event, serde_json::json!({}))
    }
}

/// Convenience: log a computed allocation plan.
pub fn log_plan(audit: &mut AuditLog, universe_file: &str, response: &PlanResponse) -> Result<()> {
    audit.log(
        "plan_computed",
        serde_json::json!({
            "universe_file": universe_file,
            "invested": response.summary.total_invested,
            "cash_remaining": response.summary.cash_remaining,
            "utilization": response.summary.utilization,
            "max_deviation": response.summary.max_deviation,
            "positions": response.allocations.iter().filter(|a| a.shares > 0).count(),
            "warnings": response.warnings,
        }),
    )
}

/// Convenience: log a computed rebalance plan.
pub fn log_rebalance(
    audit: &mut AuditLog,
    universe_file: &str,
    response: &RebalanceResponse,
) -> Result<()> {
    audit.log(
        "rebalance_computed",
        serde_json::json!({
            "universe_file": universe_file,
            "sells": response.sell.len(),
            "buys": response.buy.len(),
            "positions": response.final_portfolio.len(),
            "turnover": response.summary.turnover,
            "estimated_costs": response.summary.costs.total,
            "max_drift": response.max_drift,
            "recommendation": response.drift_recommendation,
            "warnings": response.warnings,
        }),
    )
}
