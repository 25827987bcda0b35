//! Backend abstractions for platform audio elements.

use futures::future::LocalBoxFuture;

use crate::error::AudioError;

/// Pending result of an output-device change.
///
/// The future owns whatever it needs; it must stay valid after the element
/// that produced it is dropped.
pub type SinkFuture = LocalBoxFuture<'static, Result<(), AudioError>>;

/// Capability set every platform audio element provides.
///
/// Elements live on the UI thread; implementations use interior mutability
/// so commands can be issued through a shared reference.
pub trait AudioElement {
    fn play(&self);
    fn pause(&self);
    fn stop(&self);

    /// Playback position in seconds.
    fn current_time(&self) -> f64;
    fn set_current_time(&self, seconds: f64);

    /// Output-device routing, for backends that support it.
    fn sink_selector(&self) -> Option<&dyn SinkSelector> {
        None
    }
}

/// Optional capability: route output to a specific device.
pub trait SinkSelector {
    fn set_sink_id(&self, sink_id: &str) -> SinkFuture;
}

mod cpal;
pub use self::cpal::{list_output_devices, CpalElement};

mod stub;
pub use stub::{ElementCall, SinkResolver, SinkSupport, StubElement};
