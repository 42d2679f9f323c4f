//! # JSONL History Store
//!
//! Append-only payment history on local disk: one JSON record per line,
//! keyed by the record timestamp. The engine only ever appends; the file is
//! never rewritten, truncated, or deleted here. `records()` exists for
//! diagnostics surfaces.

use cart_core::{EngineError, EngineResult, HistoryStore, PaymentAttempt};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// File-backed append-only history store.
pub struct JsonlHistoryStore {
    path: PathBuf,
    // Serializes writers so two attempts never interleave within a line
    write_lock: Mutex<()>,
}

impl JsonlHistoryStore {
    /// Open (or prepare to create) the history file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> EngineResult<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    EngineError::Internal(format!(
                        "cannot create history directory {}: {e}",
                        parent.display()
                    ))
                })?;
            }
        }
        Ok(Self {
            path,
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl HistoryStore for JsonlHistoryStore {
    fn append(&self, attempt: PaymentAttempt) -> EngineResult<()> {
        let line = serde_json::to_string(&attempt)
            .map_err(|e| EngineError::Internal(format!("cannot serialize history record: {e}")))?;

        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| {
                EngineError::Internal(format!(
                    "cannot open history file {}: {e}",
                    self.path.display()
                ))
            })?;
        writeln!(file, "{line}")
            .map_err(|e| EngineError::Internal(format!("cannot append history record: {e}")))
    }

    fn records(&self) -> EngineResult<Vec<PaymentAttempt>> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(EngineError::Internal(format!(
                    "cannot read history file {}: {e}",
                    self.path.display()
                )))
            }
        };

        let mut out = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line
                .map_err(|e| EngineError::Internal(format!("cannot read history line: {e}")))?;
            if line.trim().is_empty() {
                continue;
            }
            out.push(serde_json::from_str(&line).map_err(|e| {
                EngineError::Internal(format!("corrupt history record: {e}"))
            })?);
        }
        Ok(out)
    }
}
