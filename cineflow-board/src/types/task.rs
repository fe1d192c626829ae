//! Task types: Task, Subtask, Revision, Milestone, QuickFlag

use super::ids::{RevisionId, SubtaskId, TaskId};
use crate::error::BoardError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A video-production work item on the board
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    #[serde(default)]
    pub description: String,

    /// ISO date (`YYYY-MM-DD`) as entered. Kept as text so a bad value never
    /// makes the whole document unreadable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,

    /// Tag set; insertion order is kept for display
    #[serde(default)]
    pub tags: Vec<String>,

    /// Production checklist
    #[serde(default)]
    pub subtasks: Vec<Subtask>,

    /// Editor feedback requiring rework
    #[serde(default)]
    pub revisions: Vec<Revision>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub editor: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub footage_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_link: Option<String>,

    #[serde(default)]
    pub has_outline: bool,
    #[serde(default)]
    pub has_script: bool,
}

impl Task {
    /// Create a new task with a fresh id
    pub fn new(title: impl Into<String>) -> Self {
        Self::with_id(TaskId::new(), title)
    }

    /// Create a task with an explicit id
    pub fn with_id(id: impl Into<TaskId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            due_date: None,
            tags: Vec::new(),
            subtasks: Vec::new(),
            revisions: Vec::new(),
            project: None,
            editor: None,
            script_link: None,
            footage_link: None,
            thumbnail_link: None,
            video_link: None,
            has_outline: false,
            has_script: false,
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the subtasks
    pub fn with_subtasks(mut self, subtasks: Vec<Subtask>) -> Self {
        self.subtasks = subtasks;
        self
    }

    /// Set the revisions
    pub fn with_revisions(mut self, revisions: Vec<Revision>) -> Self {
        self.revisions = revisions;
        self
    }

    /// Add a tag unless already present. Returns true if it was added.
    pub fn add_tag(&mut self, tag: impl Into<String>) -> bool {
        let tag = tag.into();
        if self.tags.iter().any(|t| t == &tag) {
            return false;
        }
        self.tags.push(tag);
        true
    }

    /// Parsed due date; `None` when unset or not a valid ISO date
    pub fn due(&self) -> Option<NaiveDate> {
        self.due_date
            .as_deref()
            .and_then(|d| NaiveDate::parse_from_str(d.trim(), "%Y-%m-%d").ok())
    }

    /// Due strictly before `today`
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.due().is_some_and(|due| due < today)
    }

    /// Whether a subtask carrying this milestone is completed
    pub fn milestone_done(&self, milestone: Milestone) -> bool {
        self.subtasks
            .iter()
            .any(|s| s.completed && s.milestone() == Some(milestone))
    }

    /// Fraction of completed subtasks, 0.0 when there are none
    pub fn progress(&self) -> f64 {
        if self.subtasks.is_empty() {
            return 0.0;
        }
        let done = self.subtasks.iter().filter(|s| s.completed).count();
        done as f64 / self.subtasks.len() as f64
    }

    /// Revisions still waiting on rework
    pub fn open_revisions(&self) -> usize {
        self.revisions.iter().filter(|r| !r.completed).count()
    }

    /// Read a quick flag
    pub fn flag(&self, flag: QuickFlag) -> bool {
        match flag {
            QuickFlag::HasOutline => self.has_outline,
            QuickFlag::HasScript => self.has_script,
        }
    }

    /// Mutable access to a quick flag
    pub fn flag_mut(&mut self, flag: QuickFlag) -> &mut bool {
        match flag {
            QuickFlag::HasOutline => &mut self.has_outline,
            QuickFlag::HasScript => &mut self.has_script,
        }
    }
}

/// Production step that moves a task along the pipeline when completed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Milestone {
    FinalizeScript,
    RecordVideo,
}

impl Milestone {
    /// Checklist title that historically identified this milestone
    pub fn legacy_title(&self) -> &'static str {
        match self {
            Milestone::FinalizeScript => "Finalize Script",
            Milestone::RecordVideo => "Record Video",
        }
    }

    /// Exact, case-sensitive match against a checklist title
    pub fn from_title(title: &str) -> Option<Self> {
        [Milestone::FinalizeScript, Milestone::RecordVideo]
            .into_iter()
            .find(|m| m.legacy_title() == title)
    }
}

/// A checklist item on a task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subtask {
    pub id: SubtaskId,
    pub title: String,
    #[serde(default)]
    pub completed: bool,
    /// Explicit milestone tag; absent on items written before tags existed.
    /// Saving a task through [`upsert_task`](crate::task::upsert_task)
    /// re-tags items whose title changed, so the tag never outlives a rename.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub milestone: Option<Milestone>,
}

impl Subtask {
    /// Create an open subtask, tagging it if the title names a milestone
    pub fn new(title: impl Into<String>) -> Self {
        let title = title.into();
        Self {
            id: SubtaskId::new(),
            milestone: Milestone::from_title(&title),
            title,
            completed: false,
        }
    }

    /// Mark completed
    pub fn done(mut self) -> Self {
        self.completed = true;
        self
    }

    /// Tag with an explicit milestone
    pub fn with_milestone(mut self, milestone: Milestone) -> Self {
        self.milestone = Some(milestone);
        self
    }

    /// The milestone this item represents. Untagged items fall back to the title.
    pub fn milestone(&self) -> Option<Milestone> {
        self.milestone.or_else(|| Milestone::from_title(&self.title))
    }
}

/// A rework request from the editor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Revision {
    pub id: RevisionId,
    pub text: String,
    #[serde(default)]
    pub completed: bool,
}

impl Revision {
    /// Create an open revision request
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: RevisionId::new(),
            text: text.into(),
            completed: false,
        }
    }
}

/// Boolean fields that can be flipped straight from the card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum QuickFlag {
    HasOutline,
    HasScript,
}

impl FromStr for QuickFlag {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hasOutline" => Ok(QuickFlag::HasOutline),
            "hasScript" => Ok(QuickFlag::HasScript),
            _ => Err(BoardError::UnknownFlag {
                value: s.to_string(),
            }),
        }
    }
}
