//! Monitor Module - Stille-Erkennung für Anrufe
//!
//! Dieses Modul verwaltet:
//! - Die Konfiguration der Schwellwerte
//! - Track Handles der Audio-Quellen eines Anrufs
//! - Stille-Timer und Debounce der Aktivitäts-Resets
//!

mod config;
mod engine;
mod track;

pub use config::{
    ConfigError, MonitorConfig, DEFAULT_ACTIVITY_LEVEL_THRESHOLD, DEFAULT_DEBOUNCE_MS,
    DEFAULT_SILENCE_THRESHOLD_MS, ENV_ACTIVITY_LEVEL, ENV_DEBOUNCE_MS, ENV_SILENCE_THRESHOLD_MS,
};
pub use engine::{MonitorEvent, MonitorState, SilenceCallback, SilenceMonitor};
pub use track::TrackHandle;
