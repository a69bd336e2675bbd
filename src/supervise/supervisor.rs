// src/supervise/supervisor.rs

use std::fmt;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::change::{ChangeSignal, ChangeToken};
use crate::errors::Result;
use crate::exec::{ChildExit, LaunchSpec, ProcessBackend, SupervisedChild};
use crate::types::StartPolicy;

use super::backoff::Backoff;
use super::{RunOutcome, SupervisorEvent, SupervisorOptions, SupervisorState};

/// What the loop does after post-exit accounting.
#[derive(Debug)]
enum Next {
    /// Launch again right away with a fresh token.
    Restart,
    /// Block on this (still pending) token first.
    Idle(ChangeToken),
    ShutDown,
}

/// Keeps at most one instance of the binary running and restarts it whenever
/// a change is announced on the [`ChangeSignal`].
///
/// While a child runs, three events race:
/// - the child exits on its own → wait up to the backoff window for a change;
/// - a change is announced → kill the process group, restart immediately;
/// - shutdown is requested → kill the process group, return.
///
/// Change and shutdown take priority over a child exit that resolves in the
/// same poll.
pub struct Supervisor<B: ProcessBackend> {
    spec: LaunchSpec,
    backend: B,
    changes: ChangeSignal,
    shutdown: CancellationToken,
    options: SupervisorOptions,
    backoff: Backoff,
    state: SupervisorState,
    observer: Option<mpsc::UnboundedSender<SupervisorEvent>>,
}

impl<B: ProcessBackend> fmt::Debug for Supervisor<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Supervisor")
            .field("spec", &self.spec)
            .field("state", &self.state)
            .field("backoff", &self.backoff)
            .finish_non_exhaustive()
    }
}

impl<B: ProcessBackend> Supervisor<B> {
    pub fn new(
        spec: LaunchSpec,
        backend: B,
        changes: ChangeSignal,
        shutdown: CancellationToken,
        options: SupervisorOptions,
    ) -> Self {
        let initial = match options.start {
            StartPolicy::Immediately => SupervisorState::Starting,
            StartPolicy::OnChange => SupervisorState::Idle,
        };
        Self {
            spec,
            backend,
            changes,
            shutdown,
            backoff: Backoff::new(options.backoff),
            options,
            state: initial,
            observer: None,
        }
    }

    /// Publish state transitions and run results on `tx`.
    pub fn with_observer(mut self, tx: mpsc::UnboundedSender<SupervisorEvent>) -> Self {
        self.observer = Some(tx);
        self
    }

    /// Main loop. Returns once shutdown has been requested and any running
    /// child has been killed and reaped.
    pub async fn run(mut self) -> Result<()> {
        info!(
            program = ?self.spec.program,
            args = ?self.spec.args,
            start = %self.options.start,
            "supervisor started"
        );

        let mut pending = match self.options.start {
            StartPolicy::Immediately => None,
            StartPolicy::OnChange => Some(self.changes.wait()),
        };

        loop {
            if let Some(token) = pending.take() {
                self.transition(SupervisorState::Idle);
                if !self.idle(&token).await {
                    break;
                }
            }

            self.transition(SupervisorState::Starting);
            // Taken before launching so a change during startup is not lost.
            let token = self.changes.wait();

            let mut child = match self.backend.launch(&self.spec) {
                Ok(child) => child,
                Err(err) => {
                    error!(error = %err, "failed to start binary; waiting for the next change");
                    self.emit(SupervisorEvent::LaunchFailed);
                    pending = Some(token);
                    continue;
                }
            };

            let pid = child.id();
            info!(?pid, generation = token.generation(), "started binary");
            self.emit(SupervisorEvent::Started { pid });
            self.transition(SupervisorState::Running);

            let outcome = self.race(child.as_mut(), &token).await;
            drop(child);

            self.transition(SupervisorState::Stopping);
            self.emit(SupervisorEvent::Stopped { outcome });

            match self.settle(outcome, token).await {
                Next::Restart => {}
                Next::Idle(token) => pending = Some(token),
                Next::ShutDown => break,
            }
        }

        self.transition(SupervisorState::ShutDown);
        info!("supervisor shut down");
        Ok(())
    }

    /// Block until `token` fires. Returns `false` if shutdown came first.
    async fn idle(&self, token: &ChangeToken) -> bool {
        debug!(generation = token.generation(), "waiting for binary change");
        tokio::select! {
            biased;
            _ = self.shutdown.cancelled() => {
                info!("shutdown requested while idle");
                false
            }
            _ = token.changed() => true,
        }
    }

    /// Race the child's exit against a change and shutdown. The child is
    /// always reaped when this returns.
    async fn race(&self, child: &mut dyn SupervisedChild, token: &ChangeToken) -> RunOutcome {
        let outcome = tokio::select! {
            biased;
            _ = self.shutdown.cancelled() => RunOutcome::ShutdownRequested,
            _ = token.changed() => RunOutcome::Superseded,
            res = child.wait() => match res {
                Ok(exit) => return RunOutcome::NaturalExit(exit),
                Err(err) => {
                    warn!(error = %err, "waiting for binary failed; terminating it");
                    RunOutcome::NaturalExit(ChildExit::killed())
                }
            },
        };

        info!(reason = %outcome, pid = ?child.id(), "killing binary");
        if let Err(err) = child.terminate_group() {
            warn!(error = %err, "failed to kill binary");
        }
        match child.wait().await {
            Ok(exit) => debug!(code = ?exit.code, "killed binary reaped"),
            Err(err) => warn!(error = %err, "failed to reap killed binary"),
        }

        outcome
    }

    /// Post-exit accounting: adjust the backoff and decide what comes next.
    async fn settle(&mut self, outcome: RunOutcome, token: ChangeToken) -> Next {
        match outcome {
            RunOutcome::ShutdownRequested => Next::ShutDown,
            RunOutcome::Superseded => {
                info!("binary changed; restarting");
                self.reset_backoff();
                Next::Restart
            }
            RunOutcome::NaturalExit(exit) => {
                let window = self.backoff.current();
                info!(
                    code = ?exit.code,
                    success = exit.success,
                    ?window,
                    "binary exited"
                );

                tokio::select! {
                    biased;
                    _ = self.shutdown.cancelled() => Next::ShutDown,
                    _ = token.changed() => {
                        info!("binary changed; restarting");
                        self.reset_backoff();
                        Next::Restart
                    }
                    _ = tokio::time::sleep(window) => {
                        let current = self.backoff.grow();
                        debug!(backoff = ?current, "no change within window");
                        self.emit(SupervisorEvent::BackoffChanged { current });
                        Next::Idle(token)
                    }
                }
            }
        }
    }

    fn reset_backoff(&mut self) {
        let current = self.backoff.reset();
        self.emit(SupervisorEvent::BackoffChanged { current });
    }

    fn transition(&mut self, state: SupervisorState) {
        debug!(from = ?self.state, to = ?state, "supervisor transition");
        self.state = state;
        self.emit(SupervisorEvent::StateChanged(state));
    }

    fn emit(&self, event: SupervisorEvent) {
        if let Some(tx) = &self.observer {
            let _ = tx.send(event);
        }
    }
}
