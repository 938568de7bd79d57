//! Pegel-Quellen

use crate::monitor::TrackHandle;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Liefert die aktuellen Pegel (0.0 - 1.0) aller bekannten Tracks
pub trait LevelSource: Send + Sync + 'static {
    fn sample(&self) -> Vec<(TrackHandle, f32)>;
}

/// Pegel-Tabelle, die von der Audio-Schicht beschrieben wird
///
/// Klone teilen dieselbe Tabelle.
#[derive(Clone, Default)]
pub struct SharedLevels {
    levels: Arc<RwLock<HashMap<TrackHandle, f32>>>,
}

impl SharedLevels {
    pub fn new() -> Self {
        Self::default()
    }

    /// Setzt den zuletzt gemessenen Pegel eines Tracks (auf 0.0 - 1.0 begrenzt)
    pub fn set_level(&self, track: &TrackHandle, level: f32) {
        let level = if level.is_nan() { 0.0 } else { level.clamp(0.0, 1.0) };
        self.levels.write().insert(track.clone(), level);
    }

    pub fn remove(&self, track: &TrackHandle) -> Option<f32> {
        self.levels.write().remove(track)
    }

    pub fn level(&self, track: &TrackHandle) -> Option<f32> {
        self.levels.read().get(track).copied()
    }

    pub fn len(&self) -> usize {
        self.levels.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.read().is_empty()
    }
}

impl LevelSource for SharedLevels {
    fn sample(&self) -> Vec<(TrackHandle, f32)> {
        self.levels
            .read()
            .iter()
            .map(|(track, level)| (track.clone(), *level))
            .collect()
    }
}

impl std::fmt::Debug for SharedLevels {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedLevels")
            .field("tracks", &self.len())
            .finish()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levels_are_clamped() {
        let levels = SharedLevels::new();
        let track = TrackHandle::new("caller");

        levels.set_level(&track, 3.0);
        assert_eq!(levels.level(&track), Some(1.0));

        levels.set_level(&track, f32::NAN);
        assert_eq!(levels.level(&track), Some(0.0));
        assert_eq!(levels.len(), 1);
    }

    #[test]
    fn test_clones_share_table() {
        let levels = SharedLevels::new();
        let writer = levels.clone();
        let track = TrackHandle::new("agent");

        writer.set_level(&track, 0.4);
        assert_eq!(levels.sample(), vec![(track.clone(), 0.4)]);

        writer.remove(&track);
        assert!(levels.is_empty());
    }
}
