//! Call Silence Monitor - Auto-Hangup bei Stille
//!
//! Erkennt bei überbrückten Telefonanrufen (PSTN ↔ Browser), wann der
//! gesamte Anruf zu lange still war:
//! - Pegel-Samples pro Track mit Schwellwert und Debounce
//! - Gemeinsame Aktivitäts-Uhr über alle Tracks
//! - Einmaliges Stille-Event an die Anruf-Schicht
//! - Optionaler Poller für periodische Pegel-Abfrage

pub mod monitor;
pub mod sampler;

pub use monitor::{
    ConfigError, MonitorConfig, MonitorEvent, MonitorState, SilenceMonitor, TrackHandle,
};
pub use sampler::{spawn_sampler, LevelSource, SamplerHandle, SharedLevels};

use once_cell::sync::OnceCell;
use tracing_subscriber::EnvFilter;

// ============================================================================
// LOGGING
// ============================================================================

static LOGGING: OnceCell<()> = OnceCell::new();

const DEFAULT_LOG_DIRECTIVES: &str = "silence_monitor=debug,silence_watch=debug";

/// Initialisiert das Logging (mehrfacher Aufruf ist harmlos)
///
/// `RUST_LOG` hat Vorrang vor den Standard-Direktiven.
pub fn init_logging() {
    LOGGING.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_DIRECTIVES));

        if tracing_subscriber::fmt()
            .with_env_filter(filter)
            .try_init()
            .is_err()
        {
            tracing::debug!("Global tracing subscriber already set");
        }
    });
}
