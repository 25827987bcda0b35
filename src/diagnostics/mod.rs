//! Diagnostic channel for failures that never reach the caller.
//!
//! Playback commands swallow their asynchronous failures; this module is
//! where those failures land. The log writes every report through `log`,
//! keeps a bounded history for snapshots and fans entries out to live
//! subscribers over a broadcast channel.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use once_cell::sync::Lazy;
use tokio::sync::broadcast;

use crate::config::DiagnosticsConfig;
use crate::error::{AudioError, ErrorCode};

pub mod events;

pub use events::DiagnosticEntry;

/// Global diagnostic log shared across the crate.
static HUB: Lazy<DiagnosticLog> = Lazy::new(DiagnosticLog::default);

/// Access the global diagnostic log.
pub fn hub() -> &'static DiagnosticLog {
    &HUB
}

/// Write-only sink accepting `(message, error)` pairs.
///
/// Implementations must not panic; callers never inspect a result.
pub trait DiagnosticSink {
    fn report(&self, message: &str, error: &AudioError);
}

/// Snapshot of log state for CLI reporting.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct DiagnosticSnapshot {
    pub recent: Vec<DiagnosticEntry>,
    pub total_entries: u64,
    pub dropped_entries: u64,
}

/// Broadcast-based log retaining a bounded history of entries.
pub struct DiagnosticLog {
    tx: broadcast::Sender<DiagnosticEntry>,
    history: Mutex<VecDeque<DiagnosticEntry>>,
    history_capacity: usize,
    total_entries: AtomicU64,
    dropped_history: AtomicU64,
}

impl DiagnosticLog {
    pub fn new(buffer: usize, history_capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(buffer.max(1));
        Self {
            tx,
            history: Mutex::new(VecDeque::with_capacity(history_capacity)),
            history_capacity,
            total_entries: AtomicU64::new(0),
            dropped_history: AtomicU64::new(0),
        }
    }

    pub fn from_config(config: &DiagnosticsConfig) -> Self {
        Self::new(config.channel_capacity, config.history_capacity)
    }

    pub fn publish(&self, entry: DiagnosticEntry) {
        self.total_entries.fetch_add(1, Ordering::Relaxed);
        // A poisoned history only loses snapshots; the entry is still logged
        // and broadcast.
        if let Ok(mut history) = self.history.lock() {
            if self.history_capacity > 0 {
                if history.len() == self.history_capacity {
                    history.pop_front();
                    self.dropped_history.fetch_add(1, Ordering::Relaxed);
                }
                history.push_back(entry.clone());
            } else {
                self.dropped_history.fetch_add(1, Ordering::Relaxed);
            }
        }

        let _ = self.tx.send(entry);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DiagnosticEntry> {
        self.tx.subscribe()
    }

    pub fn snapshot(&self) -> DiagnosticSnapshot {
        let recent = self
            .history
            .lock()
            .map(|history| history.iter().cloned().collect())
            .unwrap_or_default();
        DiagnosticSnapshot {
            recent,
            total_entries: self.total_entries.load(Ordering::Relaxed),
            dropped_entries: self.dropped_history.load(Ordering::Relaxed),
        }
    }
}

impl Default for DiagnosticLog {
    fn default() -> Self {
        Self::from_config(&DiagnosticsConfig::default())
    }
}

impl DiagnosticSink for DiagnosticLog {
    fn report(&self, message: &str, error: &AudioError) {
        log::error!(
            "[Diagnostics] {}: code={}, message={}",
            message,
            error.code(),
            error.message()
        );
        self.publish(DiagnosticEntry::new(now_timestamp_ms(), message, error));
    }
}

impl DiagnosticSink for &'static DiagnosticLog {
    fn report(&self, message: &str, error: &AudioError) {
        (**self).report(message, error)
    }
}

fn now_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sink_error(id: &str) -> AudioError {
        AudioError::SinkSelectionFailed {
            device_id: id.to_string(),
            reason: "rejected".to_string(),
        }
    }

    #[test]
    fn log_preserves_order_within_history() {
        let log = DiagnosticLog::new(8, 3);
        log.report("Error setting sink", &sink_error("a"));
        log.report("Error setting sink", &AudioError::ElementReleased);
        log.report("Error setting sink", &sink_error("c"));

        let snapshot = log.snapshot();
        assert_eq!(snapshot.recent.len(), 3);
        assert!(snapshot.recent[0].detail.contains("'a'"));
        assert_eq!(
            snapshot.recent[1].code,
            AudioError::ElementReleased.code()
        );
        assert_eq!(snapshot.total_entries, 3);
    }

    #[test]
    fn log_drops_history_when_full() {
        let log = DiagnosticLog::new(8, 2);
        log.report("first", &sink_error("1"));
        log.report("second", &sink_error("2"));
        log.report("third", &sink_error("3"));

        let snapshot = log.snapshot();
        assert_eq!(snapshot.recent.len(), 2);
        assert_eq!(snapshot.dropped_entries, 1);
        assert_eq!(snapshot.recent[0].message, "second");
    }

    #[test]
    fn zero_history_still_counts_entries() {
        let log = DiagnosticLog::new(1, 0);
        log.report("only", &AudioError::ElementReleased);

        let snapshot = log.snapshot();
        assert!(snapshot.recent.is_empty());
        assert_eq!(snapshot.total_entries, 1);
        assert_eq!(snapshot.dropped_entries, 1);
    }

    #[test]
    fn subscribers_receive_entries() {
        let log = DiagnosticLog::new(4, 4);
        let mut rx = log.subscribe();
        log.report("Error setting sink", &sink_error("speaker"));

        let entry = rx.try_recv().unwrap();
        assert_eq!(entry.message, "Error setting sink");
        assert_eq!(entry.code, 1104);
    }
}
