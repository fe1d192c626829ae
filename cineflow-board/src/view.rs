//! Read-only projection of a board for rendering
//!
//! The view mode picks which columns are shown and the [`TaskFilter`] hides
//! cards that don't match. The board itself is never touched.

use crate::types::{Board, BoardSettings, Column, Stage, Task, ViewMode};

/// Search over cards
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    query: Option<String>,
    tag: Option<String>,
}

impl TaskFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Case-insensitive text match on title, description, project and tags.
    /// Blank queries match everything.
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        let query = query.into().trim().to_lowercase();
        self.query = (!query.is_empty()).then_some(query);
        self
    }

    /// Only cards carrying this tag (case-insensitive)
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.query.is_none() && self.tag.is_none()
    }

    pub fn matches(&self, task: &Task) -> bool {
        if let Some(tag) = &self.tag {
            if !task.tags.iter().any(|t| t.eq_ignore_ascii_case(tag)) {
                return false;
            }
        }

        let Some(query) = &self.query else {
            return true;
        };
        let hit = |text: &str| text.to_lowercase().contains(query.as_str());
        hit(&task.title)
            || hit(&task.description)
            || task.project.as_deref().is_some_and(|p| hit(p))
            || task.tags.iter().any(|t| hit(t))
    }
}

/// One visible column
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnView<'a> {
    pub stage: Stage,
    pub title: &'a str,
    pub tasks: Vec<&'a Task>,
    /// Cards in the column before filtering
    pub total: usize,
}

/// The columns a view shows, in stage order
#[derive(Debug, Clone, PartialEq)]
pub struct BoardView<'a> {
    pub mode: ViewMode,
    pub columns: Vec<ColumnView<'a>>,
}

impl<'a> BoardView<'a> {
    pub fn project(
        board: &'a Board,
        settings: &BoardSettings,
        mode: ViewMode,
        filter: &TaskFilter,
    ) -> Self {
        let columns = board
            .columns()
            .iter()
            .filter(|column| mode.shows(column.id, settings.show_published))
            .map(|column| project_column(column, filter))
            .collect();
        Self { mode, columns }
    }

    pub fn column(&self, stage: Stage) -> Option<&ColumnView<'a>> {
        self.columns.iter().find(|c| c.stage == stage)
    }

    /// Visible cards across all columns
    pub fn task_count(&self) -> usize {
        self.columns.iter().map(|c| c.tasks.len()).sum()
    }
}

fn project_column<'a>(column: &'a Column, filter: &TaskFilter) -> ColumnView<'a> {
    ColumnView {
        stage: column.id,
        title: &column.title,
        tasks: column.tasks.iter().filter(|t| filter.matches(t)).collect(),
        total: column.tasks.len(),
    }
}
