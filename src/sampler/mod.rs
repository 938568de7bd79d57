//! Sampler Module - Periodische Pegel-Abfrage
//!
//! Fragt in festem Takt die Pegel aller Tracks bei einer Quelle ab und
//! meldet sie an den SilenceMonitor. Wie die Quelle ihre Pegel ermittelt,
//! ist ihre Sache.
//!

mod poller;
mod source;

pub use poller::{spawn_sampler, SamplerHandle, DEFAULT_SAMPLE_INTERVAL};
pub use source::{LevelSource, SharedLevels};
