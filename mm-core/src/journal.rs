//! Append-only execution journal (§1a, §3a): every placement, cancel,
//! fill, and status transition is appended as one JSON line, independent
//! of the out-of-scope dashboard's own telemetry. Used for crash
//! forensics and audit, not for replay/backtesting (§1 Non-goals).

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::types::Side;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationLogEntry {
    pub ts_ms: u64,
    pub action: String,
    pub side: Option<Side>,
    pub price: Option<Decimal>,
    pub reason: String,
}

pub struct Journal {
    file: Mutex<File>,
}

impl Journal {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("opening journal file {}", path.display()))?;
        Ok(Self { file: Mutex::new(file) })
    }

    /// Appends one entry as a JSON line. Failures are logged, not
    /// propagated — a journal write must never interrupt the tick loop.
    pub fn append(&self, entry: OperationLogEntry) {
        let line = match serde_json::to_string(&entry) {
            Ok(line) => line,
            Err(err) => {
                tracing::warn!(error = %err, "failed to serialize journal entry");
                return;
            }
        };
        let mut file = match self.file.lock() {
            Ok(file) => file,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Err(err) = writeln!(file, "{line}") {
            tracing::warn!(error = %err, "failed to write journal entry");
        }
    }
}
