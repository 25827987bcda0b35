// Error types for the audio element crate
//
// This module defines the audio error type and the structured code/message
// contract shared by logging, diagnostics and the CLI.

mod audio;

pub use audio::{log_audio_error, AudioError, AudioErrorCodes};

/// Error codes for structured error reporting
///
/// This trait provides a standard way to get error codes and messages
/// from custom error types, enabling consistent reporting through the
/// diagnostic channel.
pub trait ErrorCode {
    /// Get the numeric error code
    fn code(&self) -> i32;

    /// Get the human-readable error message
    fn message(&self) -> String;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_trait_object() {
        let err: &dyn ErrorCode = &AudioError::ElementReleased;
        assert_eq!(err.code(), AudioErrorCodes::ELEMENT_RELEASED);
        assert!(!err.message().is_empty());
    }
}
