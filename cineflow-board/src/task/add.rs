//! Creating tasks from the new-task form

use crate::types::{Board, BoardSettings, Subtask, Task};
use tracing::debug;

/// A new-task request. Materialized against the board settings so the
/// default checklist is instantiated with fresh ids.
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    /// The task title (required)
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<String>,
    pub tags: Vec<String>,
    pub project: Option<String>,
    pub editor: Option<String>,
}

impl NewTask {
    /// Create a request with just a title
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the due date (`YYYY-MM-DD`)
    pub fn with_due_date(mut self, due_date: impl Into<String>) -> Self {
        self.due_date = Some(due_date.into());
        self
    }

    /// Set the tags
    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    /// Set the project label
    pub fn with_project(mut self, project: impl Into<String>) -> Self {
        self.project = Some(project.into());
        self
    }

    /// Set the assigned editor
    pub fn with_editor(mut self, editor: impl Into<String>) -> Self {
        self.editor = Some(editor.into());
        self
    }

    /// Build the task with a fresh id and the default checklist
    pub fn into_task(self, settings: &BoardSettings) -> Task {
        let mut task = Task::new(self.title);
        task.description = self.description.unwrap_or_default();
        task.due_date = self.due_date;
        for tag in self.tags {
            task.add_tag(tag);
        }
        task.project = self.project;
        task.editor = self.editor;
        task.subtasks = settings
            .default_subtasks
            .iter()
            .map(|title| Subtask::new(title.as_str()))
            .collect();
        task
    }
}

/// Insert a task at the head of the entry column. A task whose id is
/// already on the board is left alone.
pub fn add_task(board: &Board, task: Task) -> Board {
    let mut next = board.clone();
    if next.contains(&task.id) {
        return next;
    }
    let entry = next.entry_stage();
    debug!(task = %task.id, column = %entry, "added task");
    next.column_mut(entry).tasks.insert(0, task);
    next
}
