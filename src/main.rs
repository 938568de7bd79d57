//! silence-watch - Stille-Monitor über stdin
//!
//! Liest Zeilen von stdin und beendet sich, sobald der Anruf zu lange
//! still war:
//! - `<track> <level>`  Pegel-Sample (0.0 - 1.0)
//! - `+<track>`          Track hinzufügen
//! - `-<track>`          Track entfernen
//! - `activity`          Sofortige Aktivität (z.B. Unmute)
//!
//! Schwellwerte über `SILENCE_THRESHOLD_MS`, `SILENCE_ACTIVITY_LEVEL`
//! und `SILENCE_DEBOUNCE_MS`.

use anyhow::{Context, Result};
use silence_monitor::{init_logging, MonitorConfig, MonitorEvent, SilenceMonitor, TrackHandle};
use std::collections::HashMap;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;

#[derive(Debug, PartialEq)]
enum Command {
    Add(String),
    Remove(String),
    Activity,
    Level(String, f32),
}

fn parse_command(line: &str) -> Option<Command> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    if line == "activity" {
        return Some(Command::Activity);
    }
    if let Some(name) = line.strip_prefix('+') {
        return Some(Command::Add(name.trim().to_string()));
    }
    if let Some(name) = line.strip_prefix('-') {
        return Some(Command::Remove(name.trim().to_string()));
    }

    let mut parts = line.split_whitespace();
    let name = parts.next()?;
    let level = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some(Command::Level(name.to_string(), level))
}

fn track_for(tracks: &mut HashMap<String, TrackHandle>, name: &str) -> TrackHandle {
    tracks
        .entry(name.to_string())
        .or_insert_with(|| TrackHandle::new(name))
        .clone()
}

fn apply(monitor: &SilenceMonitor, tracks: &mut HashMap<String, TrackHandle>, line: &str) {
    match parse_command(line) {
        Some(Command::Add(name)) => {
            monitor.add_track(track_for(tracks, &name));
        }
        Some(Command::Remove(name)) => {
            if let Some(track) = tracks.remove(&name) {
                monitor.remove_track(&track);
            }
        }
        Some(Command::Activity) => monitor.record_activity(),
        Some(Command::Level(name, level)) => {
            let track = track_for(tracks, &name);
            monitor.report_level(&track, level);
        }
        None => tracing::warn!("Ignoring unrecognized input: {:?}", line),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let config = MonitorConfig::from_env().context("Invalid silence monitor configuration")?;
    let monitor = SilenceMonitor::new(config)?;
    let mut events = monitor.subscribe();
    let mut tracks = HashMap::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    monitor.start();

    loop {
        tokio::select! {
            line = lines.next_line(), if stdin_open => {
                match line.context("Failed to read stdin")? {
                    Some(line) => apply(&monitor, &mut tracks, &line),
                    None => {
                        tracing::info!("Input closed, waiting for silence");
                        stdin_open = false;
                    }
                }
            }
            event = events.recv() => match event {
                Ok(MonitorEvent::SilenceExceeded { silent_for }) => {
                    tracing::info!("Call silent for {:?}, hanging up", silent_for);
                    break;
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("Missed {} monitor events", skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }
    }

    monitor.stop();
    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================
