//! Pegel-Poller
//!
//! Hintergrund-Task, der die Quelle im festen Takt abfragt und jedes
//! Sample per `report_level` an den Monitor weitergibt.

use super::source::LevelSource;
use crate::monitor::SilenceMonitor;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Standard-Takt der Abfrage (einmal pro Sekunde)
pub const DEFAULT_SAMPLE_INTERVAL: Duration = Duration::from_secs(1);

/// Handle auf einen laufenden Poller; beim Drop wird er beendet
pub struct SamplerHandle {
    task: Option<JoinHandle<()>>,
}

impl SamplerHandle {
    /// Beendet den Poller
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            tracing::debug!("Level sampler stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}

impl Drop for SamplerHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Startet einen Poller für `monitor`
///
/// Solange der Monitor `Idle` ist, werden Ticks übersprungen. Der Poller
/// endet von selbst, sobald der Monitor nicht mehr existiert.
pub fn spawn_sampler<S: LevelSource>(
    monitor: &Arc<SilenceMonitor>,
    source: S,
    interval: Duration,
) -> SamplerHandle {
    let monitor: Weak<SilenceMonitor> = Arc::downgrade(monitor);

    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;

            let Some(monitor) = monitor.upgrade() else {
                tracing::debug!("Monitor dropped, stopping level sampler");
                break;
            };

            if !monitor.is_monitoring() {
                continue;
            }

            for (track, level) in source.sample() {
                monitor.report_level(&track, level);
            }
        }
    });

    tracing::debug!("Level sampler started ({:?} interval)", interval);
    SamplerHandle { task: Some(task) }
}

// ============================================================================
// TESTS
// ============================================================================
