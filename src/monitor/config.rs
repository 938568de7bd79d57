//! Monitor-Konfiguration
//!
//! Schwellwerte für die Stille-Erkennung. Werden einmal pro Anruf
//! festgelegt und danach nicht mehr verändert.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

// ============================================================================
// CONSTANTS
// ============================================================================

/// Standard-Stilledauer bis zum Auflegen (30 Sekunden)
pub const DEFAULT_SILENCE_THRESHOLD_MS: u64 = 30_000;

/// Standard-Pegel ab dem ein Sample als Sprache gilt (0.0 - 1.0)
pub const DEFAULT_ACTIVITY_LEVEL_THRESHOLD: f32 = 0.05;

/// Standard-Debounce für Aktivitäts-Resets
pub const DEFAULT_DEBOUNCE_MS: u64 = 500;

pub const ENV_SILENCE_THRESHOLD_MS: &str = "SILENCE_THRESHOLD_MS";
pub const ENV_ACTIVITY_LEVEL: &str = "SILENCE_ACTIVITY_LEVEL";
pub const ENV_DEBOUNCE_MS: &str = "SILENCE_DEBOUNCE_MS";

// ============================================================================
// ERROR TYPES
// ============================================================================

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Silence threshold must be greater than zero")]
    InvalidSilenceThreshold,

    #[error("Debounce ({debounce_ms}ms) must be smaller than silence threshold ({silence_threshold_ms}ms)")]
    DebounceNotBelowThreshold {
        debounce_ms: u64,
        silence_threshold_ms: u64,
    },

    #[error("Activity level threshold must be within 0.0..=1.0, got {0}")]
    InvalidLevelThreshold(f32),

    #[error("Invalid value for {key}: {value}")]
    InvalidEnvValue { key: String, value: String },

    #[error("Invalid JSON configuration: {0}")]
    InvalidJson(String),
}

// ============================================================================
// MONITOR CONFIG
// ============================================================================

/// Konfiguration des Silence Monitors
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MonitorConfig {
    /// Dauer ununterbrochener Stille bis zum Event
    pub silence_threshold_ms: u64,
    /// Minimaler Pegel der als Sprache zählt
    pub activity_level_threshold: f32,
    /// Mindestabstand zwischen wirksamen Timer-Resets
    pub debounce_ms: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            silence_threshold_ms: DEFAULT_SILENCE_THRESHOLD_MS,
            activity_level_threshold: DEFAULT_ACTIVITY_LEVEL_THRESHOLD,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
        }
    }
}

impl MonitorConfig {
    pub fn new(silence_threshold_ms: u64, activity_level_threshold: f32, debounce_ms: u64) -> Self {
        Self {
            silence_threshold_ms,
            activity_level_threshold,
            debounce_ms,
        }
    }

    pub fn silence_threshold(&self) -> Duration {
        Duration::from_millis(self.silence_threshold_ms)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Prüft die Konfiguration
    ///
    /// Der Debounce muss strikt kleiner als die Stilledauer sein, sonst
    /// könnte ein Reset erst nach Ablauf des Stille-Fensters greifen.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.silence_threshold_ms == 0 {
            return Err(ConfigError::InvalidSilenceThreshold);
        }

        if self.debounce_ms >= self.silence_threshold_ms {
            return Err(ConfigError::DebounceNotBelowThreshold {
                debounce_ms: self.debounce_ms,
                silence_threshold_ms: self.silence_threshold_ms,
            });
        }

        let level = self.activity_level_threshold;
        if !level.is_finite() || !(0.0..=1.0).contains(&level) {
            return Err(ConfigError::InvalidLevelThreshold(level));
        }

        Ok(())
    }

    /// Lädt die Konfiguration aus JSON (fehlende Felder = Defaults)
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::InvalidJson(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Lädt die Konfiguration aus Umgebungsvariablen
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Wie `from_env`, aber mit beliebiger Quelle für die Werte
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let config = Self {
            silence_threshold_ms: parse_or(
                &lookup,
                ENV_SILENCE_THRESHOLD_MS,
                defaults.silence_threshold_ms,
            )?,
            activity_level_threshold: parse_or(
                &lookup,
                ENV_ACTIVITY_LEVEL,
                defaults.activity_level_threshold,
            )?,
            debounce_ms: parse_or(&lookup, ENV_DEBOUNCE_MS, defaults.debounce_ms)?,
        };

        config.validate()?;
        Ok(config)
    }
}

fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidEnvValue {
                key: key.to_string(),
                value: raw,
            }),
        None => Ok(default),
    }
}

// ============================================================================
// TESTS
// ============================================================================
