use std::collections::HashMap;
use std::io;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::watch;
use watchrun::errors::{Result, WatchrunError};
use watchrun::exec::{BoxFuture, ChildExit, LaunchSpec, ProcessBackend, SupervisedChild};

/// Lifecycle events recorded by [`FakeBackend`], in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChildEvent {
    Started(u32),
    Killed(u32),
    /// The child was reaped (its `wait` returned).
    Reaped(u32),
}

#[derive(Debug, Default)]
struct Inner {
    next_id: AtomicU32,
    failing_launches: AtomicUsize,
    failing_kills: AtomicUsize,
    log: Mutex<Vec<ChildEvent>>,
    exits: Mutex<HashMap<u32, watch::Sender<Option<ChildExit>>>>,
    specs: Mutex<Vec<LaunchSpec>>,
}

impl Inner {
    fn record(&self, event: ChildEvent) {
        self.log.lock().unwrap().push(event);
    }
}

/// Consume one pending failure from `counter`, if any.
fn take_failure(counter: &AtomicUsize) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

/// A process backend whose children only exit when told to.
///
/// - `exit(id, code)` makes child `id` exit on its own.
/// - `terminate_group` makes the child exit as killed.
/// - Every start, kill and reap is recorded for overlap assertions.
///
/// Child ids start at 1 and double as fake pids.
#[derive(Debug, Clone, Default)]
pub struct FakeBackend {
    inner: Arc<Inner>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `n` launches fail with a permission error.
    pub fn fail_next_launches(&self, n: usize) {
        self.inner.failing_launches.store(n, Ordering::SeqCst);
    }

    /// Make the next `n` group kills report an error. The child still ends,
    /// as if it died on its own just before the signal was sent.
    pub fn fail_next_kills(&self, n: usize) {
        self.inner.failing_kills.store(n, Ordering::SeqCst);
    }

    /// Let child `id` exit naturally with `code`. No-op if it already ended.
    pub fn exit(&self, id: u32, code: i32) {
        let exits = self.inner.exits.lock().unwrap();
        if let Some(tx) = exits.get(&id) {
            tx.send_if_modified(|slot| {
                if slot.is_none() {
                    *slot = Some(ChildExit::with_code(code));
                    true
                } else {
                    false
                }
            });
        }
    }

    pub fn events(&self) -> Vec<ChildEvent> {
        self.inner.log.lock().unwrap().clone()
    }

    /// Number of successful launches so far.
    pub fn launches(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, ChildEvent::Started(_)))
            .count()
    }

    pub fn kills(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, ChildEvent::Killed(_)))
            .count()
    }

    /// Specs passed to every launch attempt, including failed ones.
    pub fn launch_specs(&self) -> Vec<LaunchSpec> {
        self.inner.specs.lock().unwrap().clone()
    }
}

impl ProcessBackend for FakeBackend {
    fn launch(&self, spec: &LaunchSpec) -> Result<Box<dyn SupervisedChild>> {
        self.inner.specs.lock().unwrap().push(spec.clone());

        if take_failure(&self.inner.failing_launches) {
            return Err(WatchrunError::Launch {
                program: spec.program.clone(),
                source: io::Error::new(io::ErrorKind::PermissionDenied, "fake launch failure"),
            });
        }

        let id = self.inner.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let (tx, rx) = watch::channel(None);
        self.inner.exits.lock().unwrap().insert(id, tx);
        self.inner.record(ChildEvent::Started(id));

        Ok(Box::new(FakeChild {
            id,
            exit_rx: rx,
            reaped: false,
            inner: Arc::clone(&self.inner),
        }))
    }
}

struct FakeChild {
    id: u32,
    exit_rx: watch::Receiver<Option<ChildExit>>,
    reaped: bool,
    inner: Arc<Inner>,
}

impl SupervisedChild for FakeChild {
    fn id(&self) -> Option<u32> {
        (!self.reaped).then_some(self.id)
    }

    fn wait(&mut self) -> BoxFuture<'_, Result<ChildExit>> {
        Box::pin(async move {
            loop {
                let exit = *self.exit_rx.borrow_and_update();
                if let Some(exit) = exit {
                    if !self.reaped {
                        self.reaped = true;
                        self.inner.record(ChildEvent::Reaped(self.id));
                    }
                    return Ok(exit);
                }
                self.exit_rx
                    .changed()
                    .await
                    .map_err(|e| WatchrunError::Other(e.into()))?;
            }
        })
    }

    fn terminate_group(&mut self) -> Result<()> {
        self.inner.record(ChildEvent::Killed(self.id));
        let exits = self.inner.exits.lock().unwrap();
        if let Some(tx) = exits.get(&self.id) {
            tx.send_if_modified(|slot| {
                if slot.is_none() {
                    *slot = Some(ChildExit::killed());
                    true
                } else {
                    false
                }
            });
        }
        drop(exits);

        if take_failure(&self.inner.failing_kills) {
            return Err(WatchrunError::Other(anyhow::anyhow!(
                "fake kill failure for child {}",
                self.id
            )));
        }
        Ok(())
    }
}

/// Highest number of children alive at the same time in `events`.
pub fn max_concurrent(events: &[ChildEvent]) -> usize {
    let mut live = 0usize;
    let mut max = 0usize;
    for event in events {
        match event {
            ChildEvent::Started(_) => {
                live += 1;
                max = max.max(live);
            }
            ChildEvent::Reaped(_) => live = live.saturating_sub(1),
            ChildEvent::Killed(_) => {}
        }
    }
    max
}
