//! PlaybackController: stable playback API over a mount-bound audio element.
//!
//! The owning UI element constructs the controller, hands it an element once
//! the platform primitive is ready (`attach`) and takes it back before the
//! primitive goes away (`detach`). Every command is a no-op while no element
//! is attached, and output-device selection is only attempted when the
//! element exposes the [`SinkSelector`] capability. Failures of that
//! asynchronous request are reported to the diagnostic sink and never reach
//! the caller.
//!
//! [`SinkSelector`]: crate::playback::backend::SinkSelector

use std::fmt;
use std::rc::Rc;

use futures::task::{LocalSpawn, LocalSpawnExt};

use crate::diagnostics::{self, DiagnosticSink};
use crate::error::AudioError;
use crate::playback::backend::AudioElement;
use crate::playback::source::ElementProps;

/// Message attached to failed sink changes in the diagnostic channel.
pub const SINK_ERROR_MESSAGE: &str = "Error setting sink";

/// Owner hook invoked on every attach (`Some`) and detach (`None`).
pub type ElementChangeCallback = Box<dyn FnMut(Option<&PlaybackController>)>;

/// Whether the controller currently has an element to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementState {
    Unbacked,
    Backed,
}

pub struct PlaybackController {
    element: Option<Box<dyn AudioElement>>,
    props: ElementProps,
    on_element_change: Option<ElementChangeCallback>,
    spawner: Rc<dyn LocalSpawn>,
    diagnostics: Rc<dyn DiagnosticSink>,
}

impl PlaybackController {
    /// Create an unbacked controller reporting to the global diagnostic log.
    pub fn new(props: ElementProps, spawner: Rc<dyn LocalSpawn>) -> Self {
        Self {
            element: None,
            props,
            on_element_change: None,
            spawner,
            diagnostics: Rc::new(diagnostics::hub()),
        }
    }

    pub fn with_element_change(
        mut self,
        callback: impl FnMut(Option<&PlaybackController>) + 'static,
    ) -> Self {
        self.on_element_change = Some(Box::new(callback));
        self
    }

    pub fn with_diagnostics(mut self, sink: Rc<dyn DiagnosticSink>) -> Self {
        self.set_diagnostics(sink);
        self
    }

    /// Redirect later failure reports. Completions already in flight keep
    /// the sink they were started with.
    pub fn set_diagnostics(&mut self, sink: Rc<dyn DiagnosticSink>) {
        self.diagnostics = sink;
    }

    pub fn props(&self) -> &ElementProps {
        &self.props
    }

    pub fn state(&self) -> ElementState {
        if self.element.is_some() {
            ElementState::Backed
        } else {
            ElementState::Unbacked
        }
    }

    pub fn is_attached(&self) -> bool {
        self.element.is_some()
    }

    pub fn play(&self) {
        if let Some(element) = &self.element {
            element.play();
        }
    }

    pub fn pause(&self) {
        if let Some(element) = &self.element {
            element.pause();
        }
    }

    pub fn stop(&self) {
        if let Some(element) = &self.element {
            element.stop();
        }
    }

    /// Playback position in seconds, `None` while unbacked.
    pub fn current_time(&self) -> Option<f64> {
        self.element.as_ref().map(|element| element.current_time())
    }

    pub fn set_current_time(&self, seconds: f64) {
        if let Some(element) = &self.element {
            element.set_current_time(seconds);
        }
    }

    /// Route output to `sink_id`, best effort.
    ///
    /// The request completes on a later turn of the local executor. A failed
    /// request is reported once to the diagnostic sink; it is not retried.
    /// The completion handler holds only the pending future and the sink, so
    /// it stays valid if the element is detached first.
    pub fn set_sink_id(&self, sink_id: &str) {
        let Some(selector) = self
            .element
            .as_deref()
            .and_then(|element| element.sink_selector())
        else {
            return;
        };

        let pending = selector.set_sink_id(sink_id);
        let diagnostics = Rc::clone(&self.diagnostics);
        let completion = async move {
            if let Err(err) = pending.await {
                diagnostics.report(SINK_ERROR_MESSAGE, &err);
            }
        };

        if let Err(err) = self.spawner.spawn_local(completion) {
            self.diagnostics.report(
                SINK_ERROR_MESSAGE,
                &AudioError::SpawnFailed {
                    reason: err.to_string(),
                },
            );
        }
    }

    /// Take ownership of `element`, replacing any previous one, and notify
    /// the owner.
    ///
    /// The replaced element is dropped here; releasing its platform
    /// resources is the element's own concern.
    pub fn attach(&mut self, element: Box<dyn AudioElement>) {
        let replaced = self.element.replace(element).is_some();
        log::debug!(
            "[PlaybackController] Attached element for {} (replaced={})",
            self.props.src.describe(),
            replaced
        );
        self.notify_owner();
    }

    /// Release the current element and notify the owner with `None`.
    pub fn detach(&mut self) {
        self.element = None;
        log::debug!(
            "[PlaybackController] Detached element for {}",
            self.props.src.describe()
        );
        self.notify_owner();
    }

    fn notify_owner(&mut self) {
        if let Some(mut callback) = self.on_element_change.take() {
            let current = self.is_attached().then_some(&*self);
            callback(current);
            self.on_element_change = Some(callback);
        }
    }
}

impl fmt::Debug for PlaybackController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaybackController")
            .field("props", &self.props)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::backend::{ElementCall, SinkSupport, StubElement};
    use crate::testing::RecordingSink;
    use futures::executor::LocalPool;
    use std::cell::RefCell;

    fn controller_with(pool: &LocalPool, sink: &Rc<RecordingSink>) -> PlaybackController {
        PlaybackController::new(ElementProps::new("sounds/ring.wav"), Rc::new(pool.spawner()))
            .with_diagnostics(Rc::clone(sink) as Rc<dyn DiagnosticSink>)
    }

    #[test]
    fn starts_unbacked() {
        let pool = LocalPool::new();
        let sink = Rc::new(RecordingSink::new());
        let controller = controller_with(&pool, &sink);

        assert_eq!(controller.state(), ElementState::Unbacked);
        assert_eq!(controller.current_time(), None);
    }

    #[test]
    fn forwards_transport_commands_once_backed() {
        let pool = LocalPool::new();
        let sink = Rc::new(RecordingSink::new());
        let mut controller = controller_with(&pool, &sink);
        let element = StubElement::default();
        let log = element.call_log();

        controller.attach(Box::new(element));
        controller.play();
        controller.set_current_time(2.5);
        controller.pause();
        controller.stop();

        assert_eq!(
            *log.borrow(),
            vec![
                ElementCall::Play,
                ElementCall::Seek(2.5),
                ElementCall::Pause,
                ElementCall::Stop
            ]
        );
        assert_eq!(controller.current_time(), Some(0.0));
    }

    #[test]
    fn owner_sees_backed_controller_during_attach() {
        let pool = LocalPool::new();
        let sink = Rc::new(RecordingSink::new());
        let seen: Rc<RefCell<Vec<Option<ElementState>>>> = Rc::new(RefCell::new(Vec::new()));

        let record = Rc::clone(&seen);
        let mut controller = controller_with(&pool, &sink).with_element_change(move |current| {
            record
                .borrow_mut()
                .push(current.map(|controller| controller.state()));
        });

        controller.attach(Box::new(StubElement::default()));
        controller.detach();

        assert_eq!(
            *seen.borrow(),
            vec![Some(ElementState::Backed), None]
        );
    }

    #[test]
    fn owner_can_issue_commands_from_callback() {
        let pool = LocalPool::new();
        let sink = Rc::new(RecordingSink::new());
        let element = StubElement::default();
        let log = element.call_log();

        let mut controller = controller_with(&pool, &sink).with_element_change(|current| {
            if let Some(controller) = current {
                controller.play();
            }
        });
        controller.attach(Box::new(element));

        assert_eq!(*log.borrow(), vec![ElementCall::Play]);
    }

    #[test]
    fn rejected_sink_change_is_reported_once() {
        let mut pool = LocalPool::new();
        let sink = Rc::new(RecordingSink::new());
        let mut controller = controller_with(&pool, &sink);
        controller.attach(Box::new(StubElement::new(SinkSupport::Reject(
            "NotAllowedError".to_string(),
        ))));

        controller.set_sink_id("headset");
        assert!(sink.is_empty(), "completion must not run synchronously");
        pool.run_until_stalled();

        let entries = sink.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].0, SINK_ERROR_MESSAGE);
        assert!(matches!(
            entries[0].1,
            AudioError::SinkSelectionFailed { ref device_id, .. } if device_id == "headset"
        ));
    }

    #[test]
    fn accepted_sink_change_reports_nothing() {
        let mut pool = LocalPool::new();
        let sink = Rc::new(RecordingSink::new());
        let mut controller = controller_with(&pool, &sink);
        let element = StubElement::new(SinkSupport::Accept);
        let log = element.call_log();
        controller.attach(Box::new(element));

        controller.set_sink_id("speaker");
        pool.run_until_stalled();

        assert!(sink.is_empty());
        assert_eq!(
            *log.borrow(),
            vec![ElementCall::SetSinkId("speaker".to_string())]
        );
    }

    #[test]
    fn spawn_failure_is_reported() {
        let pool = LocalPool::new();
        let spawner = pool.spawner();
        drop(pool);

        let sink = Rc::new(RecordingSink::new());
        let mut controller =
            PlaybackController::new(ElementProps::new("sounds/ring.wav"), Rc::new(spawner))
                .with_diagnostics(Rc::clone(&sink) as Rc<dyn DiagnosticSink>);
        controller.attach(Box::new(StubElement::new(SinkSupport::Accept)));

        controller.set_sink_id("speaker");

        let entries = sink.entries();
        assert_eq!(entries.len(), 1);
        assert!(matches!(entries[0].1, AudioError::SpawnFailed { .. }));
    }
}
