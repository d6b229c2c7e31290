//! Game cues
//!
//! The game reports what happened (a hair picked up, dropped, the round
//! lost or won); which sample answers each cue is configuration.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Gameplay moments that trigger a one-shot sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameCue {
    /// A hair was picked up
    DragStart,
    /// A hair landed on the head
    Drop,
    /// The round was lost
    Failure,
    /// The round was won
    Success,
}

impl fmt::Display for GameCue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameCue::DragStart => write!(f, "drag_start"),
            GameCue::Drop => write!(f, "drop"),
            GameCue::Failure => write!(f, "failure"),
            GameCue::Success => write!(f, "success"),
        }
    }
}

/// Sound name played for each cue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CueMap {
    pub drag_start: String,
    pub drop: String,
    pub failure: String,
    pub success: String,
}

impl Default for CueMap {
    fn default() -> Self {
        Self {
            drag_start: "pickup".to_string(),
            drop: "drop".to_string(),
            failure: "losing".to_string(),
            success: "success".to_string(),
        }
    }
}

impl CueMap {
    pub fn sound_for(&self, cue: GameCue) -> &str {
        match cue {
            GameCue::DragStart => &self.drag_start,
            GameCue::Drop => &self.drop,
            GameCue::Failure => &self.failure,
            GameCue::Success => &self.success,
        }
    }
}
