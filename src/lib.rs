// Audio Element - cross-platform playback abstraction
// Stable playback API over mount-bound platform audio elements

// Module declarations
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod managers;
pub mod playback;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;

// Re-exports for convenience
pub use error::{AudioError, ErrorCode};
pub use playback::{AudioElement, ElementProps, MediaSource, PlaybackController, SinkSelector};

use log::info;

/// Install the fmt subscriber; `log` records are captured as well.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_logging() {
    if tracing_subscriber::fmt().try_init().is_ok() {
        info!("[AudioElement] Logging initialized");
    }
}
