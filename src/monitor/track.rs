//! Track Handles
//!
//! Opaker Verweis auf eine Audio-Quelle (z.B. das Mikrofon eines
//! Teilnehmers). Gleichheit ist Identität: Klone teilen die ID,
//! zwei separat erzeugte Handles sind immer verschieden.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use uuid::Uuid;

/// Handle für einen Audio-Track innerhalb eines Anrufs
#[derive(Clone)]
pub struct TrackHandle {
    id: Uuid,
    label: Arc<str>,
}

impl TrackHandle {
    /// Erzeugt ein neues Handle mit eigener Identität
    pub fn new(label: impl Into<Arc<str>>) -> Self {
        Self {
            id: Uuid::new_v4(),
            label: label.into(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Anzeigename, nur für Logs
    pub fn label(&self) -> &str {
        &self.label
    }
}

impl PartialEq for TrackHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TrackHandle {}

impl Hash for TrackHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TrackHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrackHandle")
            .field("label", &self.label)
            .field("id", &self.id)
            .finish()
    }
}

impl fmt::Display for TrackHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label)
    }
}

// ============================================================================
// TESTS
// ============================================================================
