//! Per-session conversational state.

use derive_getters::Getters;
use serde::{Deserialize, Serialize};

const SCALE_MAX: u8 = 100;

/// Coarse conversational state kept for each session.
///
/// `trust` and `energy` live on a 0..=100 scale; constructors and
/// deserialization clamp out-of-range values. State is replaced as a whole,
/// never patched field by field.
///
/// # Examples
///
/// ```
/// use yuki_core::SessionState;
///
/// let state = SessionState::default();
/// assert_eq!(state.mood(), "calm");
/// assert_eq!(*state.trust(), 50);
///
/// let warmer = SessionState::new("happy", 250, 70, "playful");
/// assert_eq!(*warmer.trust(), 100);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Getters)]
#[serde(from = "StoredState")]
pub struct SessionState {
    mood: String,
    trust: u8,
    energy: u8,
    last_emotion: String,
}

impl SessionState {
    /// Create a state, clamping `trust` and `energy` to 0..=100.
    pub fn new(
        mood: impl Into<String>,
        trust: u32,
        energy: u32,
        last_emotion: impl Into<String>,
    ) -> Self {
        Self {
            mood: mood.into(),
            trust: clamp_scale(trust),
            energy: clamp_scale(energy),
            last_emotion: last_emotion.into(),
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new("calm", 50, 60, "calm")
    }
}

fn clamp_scale(value: u32) -> u8 {
    value.min(SCALE_MAX as u32) as u8
}

/// Wire form accepted on deserialization; missing fields take defaults.
#[derive(Deserialize)]
#[serde(default)]
struct StoredState {
    mood: String,
    trust: u32,
    energy: u32,
    last_emotion: String,
}

impl Default for StoredState {
    fn default() -> Self {
        let state = SessionState::default();
        Self {
            mood: state.mood,
            trust: state.trust as u32,
            energy: state.energy as u32,
            last_emotion: state.last_emotion,
        }
    }
}

impl From<StoredState> for SessionState {
    fn from(raw: StoredState) -> Self {
        SessionState::new(raw.mood, raw.trust, raw.energy, raw.last_emotion)
    }
}
