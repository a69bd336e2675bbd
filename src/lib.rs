// src/lib.rs

pub mod change;
pub mod cli;
pub mod config;
pub mod errors;
pub mod exec;
pub mod locate;
pub mod logging;
pub mod supervise;
pub mod types;
pub mod watch;

use std::sync::Arc;

use anyhow::anyhow;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::change::ChangeSignal;
use crate::cli::CliArgs;
use crate::config::load_or_default;
use crate::errors::{Result, WatchrunError};
use crate::exec::OsBackend;
use crate::locate::{BinaryLocator, OsLocator};
use crate::supervise::{spawn_shutdown_listener, Supervisor};
use crate::types::StartPolicy;
use crate::watch::BinaryWatcher;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - startup resolution of the binary (fatal if it cannot be found)
/// - the polling watcher
/// - Ctrl-C / SIGTERM handling
/// - the supervisor loop
///
/// Returns `Ok(())` once a requested shutdown has completed.
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = load_or_default(args.config.as_deref())?;
    let mut options = cfg.supervisor_options();
    if args.wait_for_change {
        options.start = StartPolicy::OnChange;
    }

    let spec = args
        .launch_spec()
        .ok_or_else(|| WatchrunError::ConfigError("no binary given".to_string()))?;

    let locator: Arc<dyn BinaryLocator> = Arc::new(OsLocator);
    let identity = locator.lookup(&spec.program)?;
    info!(path = ?identity.path, "watching binary");

    let changes = ChangeSignal::new();
    let mut watcher = BinaryWatcher::new(spec.program.clone(), locator, changes.clone()).spawn();

    let shutdown = CancellationToken::new();
    let _listener = spawn_shutdown_listener(shutdown.clone())?;

    let supervisor = Supervisor::new(spec, OsBackend::new(), changes, shutdown.clone(), options);
    let supervised = supervisor.run();
    tokio::pin!(supervised);

    tokio::select! {
        res = &mut supervised => {
            watcher.abort();
            res
        }
        res = &mut watcher => {
            let reason = match res {
                Ok(()) => "exited".to_string(),
                Err(err) => err.to_string(),
            };
            error!(%reason, "binary watcher stopped unexpectedly; shutting down");
            // Without a watcher no restart can ever happen again.
            shutdown.cancel();
            if let Err(err) = supervised.await {
                error!(error = %err, "supervisor failed during shutdown");
            }
            Err(anyhow!("binary watcher stopped unexpectedly: {reason}").into())
        }
    }
}
