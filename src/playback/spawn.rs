//! Local task spawning for sink-selection completions.
//!
//! Controllers hold an `Rc<dyn LocalSpawn>` so the completion handler for a
//! pending sink change runs on the same event loop as the UI. Any
//! `futures::task::LocalSpawn` works: tests use `LocalPool::spawner()`, the
//! CLI uses [`TokioLocalSpawner`].

use std::rc::Rc;

use futures::future::LocalFutureObj;
use futures::task::{LocalSpawn, SpawnError};
use tokio::task::LocalSet;

/// Spawns onto a shared `tokio::task::LocalSet`.
///
/// Tasks are queued on the set itself, so spawning works from any context on
/// the owning thread: inside the set, inside a plain `Runtime::block_on`, or
/// with no runtime at all. Queued tasks run once the set is driven.
#[derive(Debug, Clone)]
pub struct TokioLocalSpawner {
    local: Rc<LocalSet>,
}

impl TokioLocalSpawner {
    pub fn new(local: Rc<LocalSet>) -> Self {
        Self { local }
    }

    /// The set tasks are queued on; drive it to run them.
    pub fn local_set(&self) -> &Rc<LocalSet> {
        &self.local
    }
}

impl LocalSpawn for TokioLocalSpawner {
    fn spawn_local_obj(&self, future: LocalFutureObj<'static, ()>) -> Result<(), SpawnError> {
        // Dropping the JoinHandle detaches the task.
        let _ = self.local.spawn_local(future);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::DiagnosticSink;
    use crate::error::AudioError;
    use crate::playback::{
        ElementCall, ElementProps, PlaybackController, SinkSupport, StubElement,
        SINK_ERROR_MESSAGE,
    };
    use crate::testing::RecordingSink;
    use futures::task::LocalSpawnExt;
    use std::cell::Cell;

    fn runtime() -> tokio::runtime::Runtime {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("failed to build test runtime")
    }

    fn controller(
        spawner: TokioLocalSpawner,
        sink: &Rc<RecordingSink>,
        support: SinkSupport,
    ) -> (PlaybackController, Rc<std::cell::RefCell<Vec<ElementCall>>>) {
        let element = StubElement::new(support);
        let log = element.call_log();
        let mut controller =
            PlaybackController::new(ElementProps::new("sounds/ring.wav"), Rc::new(spawner))
                .with_diagnostics(Rc::clone(sink) as Rc<dyn DiagnosticSink>);
        controller.attach(Box::new(element));
        (controller, log)
    }

    #[test]
    fn queues_spawn_without_runtime() {
        let local = Rc::new(LocalSet::new());
        let ran = Rc::new(Cell::new(false));

        let flag = Rc::clone(&ran);
        TokioLocalSpawner::new(Rc::clone(&local))
            .spawn_local(async move { flag.set(true) })
            .unwrap();
        assert!(!ran.get());

        let local = Rc::try_unwrap(local).expect("spawner dropped");
        runtime().block_on(local);
        assert!(ran.get());
    }

    #[test]
    fn runs_task_inside_local_set() {
        let runtime = runtime();
        let local = Rc::new(LocalSet::new());
        let spawner = TokioLocalSpawner::new(Rc::clone(&local));
        let ran = Rc::new(Cell::new(false));

        let flag = Rc::clone(&ran);
        local.block_on(&runtime, async move {
            spawner.spawn_local(async move { flag.set(true) }).unwrap();
            tokio::task::yield_now().await;
        });

        let local = Rc::try_unwrap(local).expect("spawner dropped");
        runtime.block_on(local);
        assert!(ran.get());
    }

    #[test]
    fn sink_change_inside_runtime_outside_local_set_does_not_panic() {
        let runtime = runtime();
        let local = Rc::new(LocalSet::new());
        let sink = Rc::new(RecordingSink::new());

        let (controller, log) = controller(
            TokioLocalSpawner::new(Rc::clone(&local)),
            &sink,
            SinkSupport::Reject("NotAllowedError".to_string()),
        );
        runtime.block_on(async {
            controller.set_sink_id("speaker");
        });
        drop(controller);

        let local = Rc::try_unwrap(local).expect("controller dropped");
        runtime.block_on(local);

        assert_eq!(
            *log.borrow(),
            vec![ElementCall::SetSinkId("speaker".to_string())]
        );
        let entries = sink.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].0, SINK_ERROR_MESSAGE);
        assert!(matches!(
            entries[0].1,
            AudioError::SinkSelectionFailed { .. }
        ));
    }

    #[test]
    fn accepted_sink_change_inside_runtime_is_quiet() {
        let runtime = runtime();
        let local = Rc::new(LocalSet::new());
        let sink = Rc::new(RecordingSink::new());

        let (controller, _log) = controller(
            TokioLocalSpawner::new(Rc::clone(&local)),
            &sink,
            SinkSupport::Accept,
        );
        runtime.block_on(async {
            controller.set_sink_id("speaker");
        });
        drop(controller);

        let local = Rc::try_unwrap(local).expect("controller dropped");
        runtime.block_on(local);
        assert!(sink.is_empty());
    }
}
