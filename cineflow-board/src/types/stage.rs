//! Pipeline stages and view modes.

use crate::error::BoardError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One fixed stage of the production pipeline. Doubles as the column id.
///
/// The serialized names are stored in shared documents; renaming one needs a
/// document migration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Stage {
    Ideation,
    Scripting,
    Filming,
    Editing,
    Review,
    Upload,
    Published,
}

impl Stage {
    /// All stages in board order
    pub const ALL: [Stage; 7] = [
        Stage::Ideation,
        Stage::Scripting,
        Stage::Filming,
        Stage::Editing,
        Stage::Review,
        Stage::Upload,
        Stage::Published,
    ];

    /// Stable identifier used in documents
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Ideation => "Ideation",
            Stage::Scripting => "Scripting",
            Stage::Filming => "Filming",
            Stage::Editing => "Editing",
            Stage::Review => "Review",
            Stage::Upload => "Upload",
            Stage::Published => "Published",
        }
    }

    /// Default display label for the column
    pub fn default_title(&self) -> &'static str {
        match self {
            Stage::Upload => "Ready to Upload",
            other => other.as_str(),
        }
    }

    /// Position of the stage in board order
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Stages before any footage exists
    pub fn is_pre_production(&self) -> bool {
        matches!(self, Stage::Ideation | Stage::Scripting)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Stage::ALL
            .into_iter()
            .find(|stage| stage.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| BoardError::UnknownStage {
                value: s.to_string(),
            })
    }
}

/// Which role the board is being viewed as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    /// Sees the whole pipeline, Published only when enabled in settings
    #[default]
    Creator,
    /// Sees post-production only
    Editor,
}

impl ViewMode {
    /// Whether a stage's column is shown in this mode
    pub fn shows(&self, stage: Stage, show_published: bool) -> bool {
        match self {
            ViewMode::Creator => stage != Stage::Published || show_published,
            ViewMode::Editor => matches!(
                stage,
                Stage::Editing | Stage::Review | Stage::Upload | Stage::Published
            ),
        }
    }
}

impl FromStr for ViewMode {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "creator" => Ok(ViewMode::Creator),
            "editor" => Ok(ViewMode::Editor),
            _ => Err(BoardError::UnknownViewMode {
                value: s.to_string(),
            }),
        }
    }
}
