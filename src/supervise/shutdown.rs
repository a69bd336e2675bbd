// src/supervise/shutdown.rs

//! OS shutdown signals delivered to the supervisor as a one-shot token.
//!
//! On unix SIGINT, SIGTERM and SIGQUIT are handled; on Windows only Ctrl-C.
//! Handlers are registered before [`spawn_shutdown_listener`] returns, so a
//! signal arriving right after startup is never lost.

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

#[cfg(unix)]
pub struct ShutdownSignals {
    sigint: tokio::signal::unix::Signal,
    sigterm: tokio::signal::unix::Signal,
    sigquit: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl ShutdownSignals {
    pub fn install() -> std::io::Result<Self> {
        use tokio::signal::unix::{signal, SignalKind};

        Ok(Self {
            sigint: signal(SignalKind::interrupt())?,
            sigterm: signal(SignalKind::terminate())?,
            sigquit: signal(SignalKind::quit())?,
        })
    }

    pub async fn recv(&mut self) {
        tokio::select! {
            _ = self.sigint.recv()  => {},
            _ = self.sigterm.recv() => {},
            _ = self.sigquit.recv() => {},
        }
    }
}

#[cfg(windows)]
pub struct ShutdownSignals {
    ctrl_c: tokio::signal::windows::CtrlC,
}

#[cfg(windows)]
impl ShutdownSignals {
    pub fn install() -> std::io::Result<Self> {
        Ok(Self {
            ctrl_c: tokio::signal::windows::ctrl_c()?,
        })
    }

    pub async fn recv(&mut self) {
        self.ctrl_c.recv().await;
    }
}

/// Cancel `token` on the first shutdown signal.
pub fn spawn_shutdown_listener(token: CancellationToken) -> std::io::Result<JoinHandle<()>> {
    let mut signals = ShutdownSignals::install()?;
    Ok(tokio::spawn(async move {
        signals.recv().await;
        info!("shutdown signal received");
        token.cancel();
    }))
}
