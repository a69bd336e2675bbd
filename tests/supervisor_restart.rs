// tests/supervisor_restart.rs

mod common;
use crate::common::{init_tracing, max_concurrent, spawn_supervisor, ChildEvent};

use std::error::Error;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use tokio::time::Instant;

use watchrun::exec::ChildExit;
use watchrun::locate::mock::ScriptedLocator;
use watchrun::supervise::{RunOutcome, SupervisorEvent, SupervisorState};
use watchrun::types::StartPolicy;
use watchrun::watch::{BinaryWatcher, PollOutcome};

type TestResult = Result<(), Box<dyn Error>>;

fn secs(n: u64) -> Duration {
    Duration::from_secs(n)
}

#[tokio::test(start_paused = true)]
async fn change_while_running_kills_and_restarts_immediately() -> TestResult {
    init_tracing();
    let mut h = spawn_supervisor(StartPolicy::Immediately);

    h.wait_for_start(1).await;
    let announced_at = Instant::now();
    h.changes.announce();

    h.wait_for_event(SupervisorEvent::Stopped {
        outcome: RunOutcome::Superseded,
    })
    .await;
    h.wait_for_event(SupervisorEvent::BackoffChanged { current: secs(1) })
        .await;
    h.wait_for_start(2).await;

    // No backoff window was waited out.
    assert!(Instant::now() - announced_at < secs(1));
    assert_eq!(
        h.backend.events(),
        vec![
            ChildEvent::Started(1),
            ChildEvent::Killed(1),
            ChildEvent::Reaped(1),
            ChildEvent::Started(2),
        ]
    );

    // Same arguments every time.
    let specs = h.backend.launch_specs();
    assert_eq!(specs.len(), 2);
    assert_eq!(specs[0], specs[1]);
    assert_eq!(specs[0], crate::common::app_spec());

    h.stop().await?;
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn on_change_start_waits_for_the_watcher() -> TestResult {
    init_tracing();

    let t0 = SystemTime::UNIX_EPOCH + secs(1_000);
    let t1 = t0 + secs(1);
    let locator = ScriptedLocator::new();
    locator.set("app", "/opt/app/bin/app", t0);

    let mut h = spawn_supervisor(StartPolicy::OnChange);
    let mut watcher = BinaryWatcher::new("app", Arc::new(locator.clone()), h.changes.clone());

    h.wait_for_event(SupervisorEvent::StateChanged(SupervisorState::Idle))
        .await;
    assert_eq!(h.backend.launches(), 0);

    // 1. The binary is rebuilt: exactly one announcement, one start.
    locator.set("app", "/opt/app/bin/app", t1);
    assert_eq!(watcher.poll_once(), PollOutcome::Changed { generation: 0 });

    assert_eq!(
        h.next_event().await,
        SupervisorEvent::StateChanged(SupervisorState::Starting)
    );
    assert_eq!(h.next_event().await, SupervisorEvent::Started { pid: Some(1) });
    assert_eq!(
        h.next_event().await,
        SupervisorEvent::StateChanged(SupervisorState::Running)
    );

    // 2. Polling again sees the same identity: nothing happens.
    assert_eq!(watcher.poll_once(), PollOutcome::Unchanged);
    tokio::time::sleep(secs(30)).await;
    assert_eq!(h.backend.launches(), 1);
    assert_eq!(h.backend.kills(), 0);

    h.stop().await?;
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn natural_exit_waits_out_window_then_stays_idle() -> TestResult {
    init_tracing();
    let mut h = spawn_supervisor(StartPolicy::Immediately);

    h.wait_for_start(1).await;
    h.backend.exit(1, 3);

    h.wait_for_event(SupervisorEvent::Stopped {
        outcome: RunOutcome::NaturalExit(ChildExit::with_code(3)),
    })
    .await;
    let exited_at = Instant::now();

    h.wait_for_event(SupervisorEvent::BackoffChanged { current: secs(2) })
        .await;
    assert!(Instant::now() - exited_at >= secs(1));
    h.wait_for_event(SupervisorEvent::StateChanged(SupervisorState::Idle))
        .await;

    // Not respawned without an observed change, however long we wait.
    tokio::time::sleep(secs(600)).await;
    assert_eq!(h.backend.launches(), 1);

    // The next real change starts it again.
    h.changes.announce();
    h.wait_for_start(2).await;

    h.stop().await?;
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn repeated_crashes_double_backoff_up_to_cap() -> TestResult {
    init_tracing();
    let mut h = spawn_supervisor(StartPolicy::Immediately);

    let mut windows = Vec::new();
    for id in 1..=5u32 {
        h.wait_for_start(id).await;
        h.backend.exit(id, 1);

        let event = h
            .wait_for(|e| matches!(e, SupervisorEvent::BackoffChanged { .. }))
            .await;
        if let SupervisorEvent::BackoffChanged { current } = event {
            windows.push(current.as_secs());
        }

        h.wait_for_event(SupervisorEvent::StateChanged(SupervisorState::Idle))
            .await;
        h.changes.announce();
    }

    assert_eq!(windows, vec![2, 4, 8, 10, 10]);

    h.stop().await?;
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn change_inside_window_restarts_promptly_and_resets_backoff() -> TestResult {
    init_tracing();
    let mut h = spawn_supervisor(StartPolicy::Immediately);

    // 1. Crash once with no change so the window grows to 2s.
    h.wait_for_start(1).await;
    h.backend.exit(1, 1);
    h.wait_for_event(SupervisorEvent::BackoffChanged { current: secs(2) })
        .await;
    h.wait_for_event(SupervisorEvent::StateChanged(SupervisorState::Idle))
        .await;

    // 2. A change after the window starts it again without resetting.
    h.changes.announce();
    h.wait_for_start(2).await;

    // 3. Crash, then a change lands inside the 2s window.
    h.backend.exit(2, 1);
    h.wait_for(|e| matches!(e, SupervisorEvent::Stopped { .. }))
        .await;
    let changed_at = Instant::now();
    h.changes.announce();

    h.wait_for_event(SupervisorEvent::BackoffChanged { current: secs(1) })
        .await;
    h.wait_for_start(3).await;
    assert!(Instant::now() - changed_at < secs(2));

    h.stop().await?;
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn change_wins_over_simultaneous_exit() -> TestResult {
    init_tracing();
    let mut h = spawn_supervisor(StartPolicy::Immediately);

    h.wait_for_start(1).await;

    // Both resolve before the supervisor gets to poll again.
    h.backend.exit(1, 0);
    h.changes.announce();

    h.wait_for_event(SupervisorEvent::Stopped {
        outcome: RunOutcome::Superseded,
    })
    .await;
    h.wait_for_start(2).await;
    assert!(h.backend.events().contains(&ChildEvent::Killed(1)));

    h.stop().await?;
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn never_more_than_one_child_alive() -> TestResult {
    init_tracing();
    let mut h = spawn_supervisor(StartPolicy::Immediately);
    let backend = h.backend.clone();

    for id in 1..=12u32 {
        h.wait_for_start(id).await;
        match id % 3 {
            0 => {
                h.changes.announce();
            }
            1 => {
                h.backend.exit(id, 0);
                h.changes.announce();
            }
            _ => {
                h.backend.exit(id, 2);
                h.wait_for(|e| matches!(e, SupervisorEvent::Stopped { .. }))
                    .await;
                h.changes.announce();
            }
        }
    }
    h.wait_for_start(13).await;
    h.stop().await?;

    let events = backend.events();
    assert_eq!(max_concurrent(&events), 1);
    assert_eq!(backend.launches(), 13);
    // Every child that was started has been reaped.
    let reaped = events
        .iter()
        .filter(|e| matches!(e, ChildEvent::Reaped(_)))
        .count();
    assert_eq!(reaped, 13);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn failed_kill_is_not_fatal() -> TestResult {
    init_tracing();
    let mut h = spawn_supervisor(StartPolicy::Immediately);

    h.wait_for_start(1).await;
    h.backend.fail_next_kills(1);
    h.changes.announce();

    h.wait_for_event(SupervisorEvent::Stopped {
        outcome: RunOutcome::Superseded,
    })
    .await;
    h.wait_for_start(2).await;
    assert_eq!(
        h.backend.events(),
        vec![
            ChildEvent::Started(1),
            ChildEvent::Killed(1),
            ChildEvent::Reaped(1),
            ChildEvent::Started(2),
        ]
    );

    // Shutdown with a failing kill still returns cleanly.
    h.backend.fail_next_kills(1);
    let backend = h.backend.clone();
    h.stop().await?;
    assert_eq!(max_concurrent(&backend.events()), 1);
    assert_eq!(backend.kills(), 2);
    Ok(())
}
