//! Append-only JSONL journal for ingestion batches.
//!
//! Each batch appends one envelope line to `ingest.events.jsonl`. Batches with
//! rejections also append one line per rejected event to
//! `dq.rejections.jsonl`.

use crate::core::error::LtvError;
use crate::core::time;
use crate::plugins::ingest::IngestionReport;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

pub const INGEST_LOG_NAME: &str = "ingest.events.jsonl";
pub const DQ_LOG_NAME: &str = "dq.rejections.jsonl";

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RejectionLine {
    pub ts: String,
    pub event_id: String,
    pub batch_id: String,
    pub reason: String,
    pub event: JsonValue,
}

pub struct Journal {
    dir: PathBuf,
}

impl Journal {
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
        }
    }

    pub fn ingest_log_path(&self) -> PathBuf {
        self.dir.join(INGEST_LOG_NAME)
    }

    pub fn dq_log_path(&self) -> PathBuf {
        self.dir.join(DQ_LOG_NAME)
    }

    /// Record one ingested batch.
    pub fn record_batch(&self, source: &str, report: &IngestionReport) -> Result<(), LtvError> {
        fs::create_dir_all(&self.dir)?;

        let status = if report.rejected > 0 { "partial" } else { "ok" };
        let line = time::command_envelope(
            "ingest",
            status,
            serde_json::json!({
                "batch_id": report.batch_id,
                "source": source,
                "new": report.new,
                "updated": report.updated,
                "rejected": report.rejected,
                "duplicate": report.duplicate,
                "size_before": report.size_before,
                "size_after": report.size_after,
            }),
        );
        append_line(&self.ingest_log_path(), &line)?;

        if report.rejections.is_empty() {
            return Ok(());
        }
        let ts = time::now_epoch_z();
        for rejection in &report.rejections {
            let line = RejectionLine {
                ts: ts.clone(),
                event_id: time::new_event_id(),
                batch_id: report.batch_id.clone(),
                reason: rejection.reason.to_string(),
                event: rejection.event.clone(),
            };
            append_line(&self.dq_log_path(), &line)?;
        }
        Ok(())
    }
}

fn append_line<T: Serialize>(path: &Path, value: &T) -> Result<(), LtvError> {
    let mut f = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(f, "{}", serde_json::to_string(value)?)?;
    Ok(())
}

/// Read back every rejection recorded under `dir`.
pub fn read_rejections(dir: &Path) -> Result<Vec<RejectionLine>, LtvError> {
    let path = dir.join(DQ_LOG_NAME);
    if !path.exists() {
        return Ok(Vec::new());
    }
    let content = fs::read_to_string(path)?;
    let mut out = Vec::new();
    for line in content.lines().filter(|l| !l.trim().is_empty()) {
        out.push(serde_json::from_str(line)?);
    }
    Ok(out)
}
