use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use futures::channel::oneshot;
use futures::FutureExt;

use crate::error::AudioError;

use super::{AudioElement, SinkFuture, SinkSelector};

/// Command observed by a [`StubElement`].
#[derive(Debug, Clone, PartialEq)]
pub enum ElementCall {
    Play,
    Pause,
    Stop,
    Seek(f64),
    SetSinkId(String),
}

/// How a [`StubElement`] answers sink changes.
#[derive(Debug, Clone, PartialEq)]
pub enum SinkSupport {
    /// The element has no output-device capability at all.
    Unsupported,
    /// Every request resolves `Ok` immediately.
    Accept,
    /// Every request resolves to `SinkSelectionFailed` with this reason.
    Reject(String),
    /// Requests stay pending until resolved through a [`SinkResolver`].
    Deferred,
}

type PendingQueue = Rc<RefCell<VecDeque<oneshot::Sender<Result<(), AudioError>>>>>;

/// Deterministic in-memory element used for tests and tooling.
///
/// It records every command it receives and keeps a simulated position; no
/// audio device is touched.
pub struct StubElement {
    calls: Rc<RefCell<Vec<ElementCall>>>,
    position: Cell<f64>,
    playing: Cell<bool>,
    sink_support: SinkSupport,
    pending: PendingQueue,
}

impl StubElement {
    pub fn new(sink_support: SinkSupport) -> Self {
        Self {
            calls: Rc::new(RefCell::new(Vec::new())),
            position: Cell::new(0.0),
            playing: Cell::new(false),
            sink_support,
            pending: Rc::new(RefCell::new(VecDeque::new())),
        }
    }

    /// Shared view of the recorded calls, valid after the element is boxed
    /// into a controller or dropped.
    pub fn call_log(&self) -> Rc<RefCell<Vec<ElementCall>>> {
        Rc::clone(&self.calls)
    }

    pub fn sink_resolver(&self) -> SinkResolver {
        SinkResolver {
            pending: Rc::clone(&self.pending),
        }
    }

    pub fn is_playing(&self) -> bool {
        self.playing.get()
    }

    /// Move the simulated clock forward while playing.
    pub fn advance(&self, seconds: f64) {
        if self.playing.get() {
            self.position.set(self.position.get() + seconds);
        }
    }

    fn record(&self, call: ElementCall) {
        self.calls.borrow_mut().push(call);
    }
}

impl Default for StubElement {
    fn default() -> Self {
        Self::new(SinkSupport::Unsupported)
    }
}

impl AudioElement for StubElement {
    fn play(&self) {
        self.record(ElementCall::Play);
        self.playing.set(true);
    }

    fn pause(&self) {
        self.record(ElementCall::Pause);
        self.playing.set(false);
    }

    fn stop(&self) {
        self.record(ElementCall::Stop);
        self.playing.set(false);
        self.position.set(0.0);
    }

    fn current_time(&self) -> f64 {
        self.position.get()
    }

    fn set_current_time(&self, seconds: f64) {
        self.record(ElementCall::Seek(seconds));
        self.position.set(seconds.max(0.0));
    }

    fn sink_selector(&self) -> Option<&dyn SinkSelector> {
        match self.sink_support {
            SinkSupport::Unsupported => None,
            _ => Some(self),
        }
    }
}

impl SinkSelector for StubElement {
    fn set_sink_id(&self, sink_id: &str) -> SinkFuture {
        self.record(ElementCall::SetSinkId(sink_id.to_string()));

        match &self.sink_support {
            SinkSupport::Accept | SinkSupport::Unsupported => futures::future::ok(()).boxed_local(),
            SinkSupport::Reject(reason) => {
                futures::future::err(AudioError::SinkSelectionFailed {
                    device_id: sink_id.to_string(),
                    reason: reason.clone(),
                })
                .boxed_local()
            }
            SinkSupport::Deferred => {
                let (tx, rx) = oneshot::channel();
                self.pending.borrow_mut().push_back(tx);
                async move { rx.await.unwrap_or(Err(AudioError::ElementReleased)) }.boxed_local()
            }
        }
    }
}

/// Completes deferred sink requests in FIFO order.
#[derive(Clone)]
pub struct SinkResolver {
    pending: PendingQueue,
}

impl SinkResolver {
    /// Resolve the oldest pending request. Returns `false` if none is pending.
    pub fn resolve_next(&self, result: Result<(), AudioError>) -> bool {
        let next = self.pending.borrow_mut().pop_front();
        match next {
            Some(tx) => {
                let _ = tx.send(result);
                true
            }
            None => false,
        }
    }

    pub fn pending(&self) -> usize {
        self.pending.borrow().len()
    }
}
