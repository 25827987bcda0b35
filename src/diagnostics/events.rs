//! Diagnostic entry types exposed to CLI output and live subscribers.

use serde::{Deserialize, Serialize};

use crate::error::{AudioError, ErrorCode};

/// One non-fatal failure reported through the diagnostic channel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiagnosticEntry {
    pub timestamp_ms: u64,
    pub message: String,
    pub code: i32,
    pub detail: String,
}

impl DiagnosticEntry {
    pub fn new(timestamp_ms: u64, message: &str, error: &AudioError) -> Self {
        Self {
            timestamp_ms,
            message: message.to_string(),
            code: error.code(),
            detail: error.message(),
        }
    }
}
