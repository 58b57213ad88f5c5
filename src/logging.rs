//! Structured JSONL event logging for probe lifecycle and breaker decisions.
//!
//! Grounded on `core/network/debug_logger.rs`: append-only JSON lines with a
//! timestamp, component, event, and free-form fields. This crate's
//! selection runs are comparatively rare and short compared to a
//! long-running statusline, so the rotation/gzip-archive machinery the
//! teacher carries is not reproduced here — just the append-only writer.

use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

use chrono::Local;
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Serialize, Deserialize, Debug, Clone)]
struct LogEntry {
    timestamp: String,
    component: String,
    event: String,
    fields: HashMap<String, Value>,
}

/// Append-only JSONL logger for selection events.
///
/// Not thread-safe beyond the internal mutex guarding file writes; callers
/// that want cross-process safety should rely on `fs2` advisory locking,
/// which every write takes out for its duration.
pub struct SelectorLogger {
    log_path: PathBuf,
    lock: Mutex<()>,
}

impl SelectorLogger {
    pub fn new(log_path: PathBuf) -> Self {
        if let Some(parent) = log_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        Self {
            log_path,
            lock: Mutex::new(()),
        }
    }

    /// Record a structured event. Write failures are swallowed — a logging
    /// failure must never abort a selection run.
    pub fn log(&self, component: &str, event: &str, fields: HashMap<String, Value>) {
        let entry = LogEntry {
            timestamp: Local::now().to_rfc3339(),
            component: component.to_string(),
            event: event.to_string(),
            fields,
        };

        let Ok(line) = serde_json::to_string(&entry) else {
            return;
        };

        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        if let Ok(file) = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
        {
            if file.try_lock_exclusive().is_ok() {
                let mut file = file;
                let _ = writeln!(file, "{}", line);
                let _ = file.unlock();
            }
        }
    }
}

/// Convenience for building the `fields` map from a small number of pairs.
#[macro_export]
macro_rules! log_fields {
    ($($k:expr => $v:expr),* $(,)?) => {{
        let mut map = std::collections::HashMap::new();
        $(map.insert($k.to_string(), serde_json::json!($v));)*
        map
    }};
}
