#![allow(dead_code, unused_imports)]

pub use watchrun_test_utils::{init_tracing, max_concurrent, with_timeout, ChildEvent, FakeBackend};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use watchrun::change::ChangeSignal;
use watchrun::exec::LaunchSpec;
use watchrun::supervise::{BackoffConfig, Supervisor, SupervisorEvent, SupervisorOptions};
use watchrun::types::StartPolicy;

/// A supervisor running on a background task against a [`FakeBackend`].
pub struct Harness {
    pub backend: FakeBackend,
    pub changes: ChangeSignal,
    pub shutdown: CancellationToken,
    pub events: mpsc::UnboundedReceiver<SupervisorEvent>,
    pub handle: JoinHandle<watchrun::errors::Result<()>>,
}

pub fn app_spec() -> LaunchSpec {
    LaunchSpec::new("app", ["--port", "8080"])
}

pub fn spawn_supervisor(start: StartPolicy) -> Harness {
    spawn_supervisor_with(SupervisorOptions {
        start,
        backoff: BackoffConfig::default(),
    })
}

pub fn spawn_supervisor_with(options: SupervisorOptions) -> Harness {
    let backend = FakeBackend::new();
    let changes = ChangeSignal::new();
    let shutdown = CancellationToken::new();
    let (tx, events) = mpsc::unbounded_channel();

    let supervisor = Supervisor::new(
        app_spec(),
        backend.clone(),
        changes.clone(),
        shutdown.clone(),
        options,
    )
    .with_observer(tx);
    let handle = tokio::spawn(supervisor.run());

    Harness {
        backend,
        changes,
        shutdown,
        events,
        handle,
    }
}

impl Harness {
    pub async fn next_event(&mut self) -> SupervisorEvent {
        with_timeout(self.events.recv())
            .await
            .expect("supervisor event channel closed")
    }

    /// Skip events until one matches `pred`, and return it.
    pub async fn wait_for(&mut self, pred: impl Fn(&SupervisorEvent) -> bool) -> SupervisorEvent {
        loop {
            let event = self.next_event().await;
            if pred(&event) {
                return event;
            }
        }
    }

    pub async fn wait_for_event(&mut self, expected: SupervisorEvent) {
        self.wait_for(|e| *e == expected).await;
    }

    pub async fn wait_for_start(&mut self, id: u32) {
        self.wait_for_event(SupervisorEvent::Started { pid: Some(id) })
            .await;
    }

    /// Request shutdown and wait for the loop to return.
    pub async fn stop(self) -> watchrun::errors::Result<()> {
        self.shutdown.cancel();
        with_timeout(self.handle)
            .await
            .expect("supervisor task panicked")
    }
}
