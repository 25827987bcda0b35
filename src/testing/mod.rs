//! Test doubles for unit tests and downstream harnesses.
//!
//! Compiled only for unit tests or with the `test-support` feature.

use std::cell::RefCell;

use crate::diagnostics::DiagnosticSink;
use crate::error::AudioError;

/// Diagnostic sink that keeps every report in memory.
#[derive(Default)]
pub struct RecordingSink {
    entries: RefCell<Vec<(String, AudioError)>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<(String, AudioError)> {
        self.entries.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl DiagnosticSink for RecordingSink {
    fn report(&self, message: &str, error: &AudioError) {
        self.entries
            .borrow_mut()
            .push((message.to_string(), error.clone()));
    }
}
