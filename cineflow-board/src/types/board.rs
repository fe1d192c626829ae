//! Board-level types: Board, Column

use super::ids::TaskId;
use super::stage::Stage;
use super::task::Task;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;
use tracing::warn;

/// A column holds the ordered tasks of one pipeline stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub id: Stage,
    pub title: String,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

impl Column {
    /// Create an empty column with the stage's default title
    pub fn new(id: Stage) -> Self {
        Self {
            id,
            title: id.default_title().to_string(),
            tasks: Vec::new(),
        }
    }

    /// Set the tasks
    pub fn with_tasks(mut self, tasks: Vec<Task>) -> Self {
        self.tasks = tasks;
        self
    }

    /// Index of a task within this column
    pub fn position_of(&self, id: &TaskId) -> Option<usize> {
        self.tasks.iter().position(|t| &t.id == id)
    }

    /// Whether the column holds the task
    pub fn contains(&self, id: &TaskId) -> bool {
        self.position_of(id).is_some()
    }

    /// Task ids in display order
    pub fn task_ids(&self) -> Vec<&TaskId> {
        self.tasks.iter().map(|t| &t.id).collect()
    }
}

/// The board: one column per stage, in stage order.
///
/// Serialized as the bare column array. Any column list read back is
/// normalized so the fixed column set and the one-column-per-task rule hold.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Board {
    columns: Vec<Column>,
}

impl Board {
    /// Empty board with every stage column
    pub fn new() -> Self {
        Self {
            columns: Stage::ALL.into_iter().map(Column::new).collect(),
        }
    }

    /// Build a board from arbitrary columns.
    ///
    /// Columns are put in stage order, missing stages are added empty,
    /// duplicate columns are merged and repeated task ids keep their first
    /// occurrence only.
    pub fn from_columns(columns: Vec<Column>) -> Self {
        let mut board = Self::new();
        let mut seen_columns: HashSet<Stage> = HashSet::new();
        let mut seen_tasks: HashSet<TaskId> = HashSet::new();

        for column in columns {
            let slot = &mut board.columns[column.id.index()];
            if seen_columns.insert(column.id) {
                slot.title = column.title;
            } else {
                warn!(column = %column.id, "merging duplicate column");
            }
            for task in column.tasks {
                if seen_tasks.insert(task.id.clone()) {
                    slot.tasks.push(task);
                } else {
                    warn!(task = %task.id, column = %column.id, "dropping duplicate task");
                }
            }
        }

        board
    }

    /// Columns in stage order
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Get a column by stage
    pub fn column(&self, stage: Stage) -> &Column {
        &self.columns[stage.index()]
    }

    /// Mutable column by stage. Crate-private so the fixed column set can't change.
    pub(crate) fn column_mut(&mut self, stage: Stage) -> &mut Column {
        &mut self.columns[stage.index()]
    }

    /// Column where new tasks enter the pipeline
    pub fn entry_stage(&self) -> Stage {
        self.columns
            .first()
            .map(|c| c.id)
            .unwrap_or(Stage::Ideation)
    }

    /// The stage currently holding a task
    pub fn column_of(&self, id: &TaskId) -> Option<Stage> {
        self.columns.iter().find(|c| c.contains(id)).map(|c| c.id)
    }

    /// Find a task anywhere on the board
    pub fn find_task(&self, id: &TaskId) -> Option<&Task> {
        self.columns
            .iter()
            .flat_map(|c| c.tasks.iter())
            .find(|t| &t.id == id)
    }

    /// Mutable task lookup
    pub(crate) fn find_task_mut(&mut self, id: &TaskId) -> Option<&mut Task> {
        self.columns
            .iter_mut()
            .flat_map(|c| c.tasks.iter_mut())
            .find(|t| &t.id == id)
    }

    /// Whether the board holds a task
    pub fn contains(&self, id: &TaskId) -> bool {
        self.column_of(id).is_some()
    }

    /// All tasks, column by column
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.columns.iter().flat_map(|c| c.tasks.iter())
    }

    /// Total number of tasks
    pub fn task_count(&self) -> usize {
        self.columns.iter().map(|c| c.tasks.len()).sum()
    }

    /// Task ids that appear in more than one place. Empty for every board
    /// produced by this crate.
    pub fn duplicate_task_ids(&self) -> Vec<TaskId> {
        let mut seen = HashSet::new();
        self.tasks()
            .filter(|t| !seen.insert(&t.id))
            .map(|t| t.id.clone())
            .collect()
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl<'de> Deserialize<'de> for Board {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let columns = Vec::<Column>::deserialize(deserializer)?;
        Ok(Board::from_columns(columns))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_board_has_every_stage() {
        let board = Board::new();
        let ids: Vec<Stage> = board.columns().iter().map(|c| c.id).collect();
        assert_eq!(ids, Stage::ALL.to_vec());
        assert_eq!(board.column(Stage::Upload).title, "Ready to Upload");
        assert_eq!(board.entry_stage(), Stage::Ideation);
    }

    #[test]
    fn test_column_of_and_find() {
        let board = Board::from_columns(vec![
            Column::new(Stage::Filming).with_tasks(vec![Task::with_id("t3", "Coffee B-Roll")])
        ]);
        assert_eq!(board.column_of(&"t3".into()), Some(Stage::Filming));
        assert_eq!(board.find_task(&"t3".into()).unwrap().title, "Coffee B-Roll");
        assert_eq!(board.column_of(&"nope".into()), None);
    }

    #[test]
    fn test_legacy_five_column_document_is_normalized() {
        let json = r#"[
            {"id": "Ideation", "title": "Ideation", "tasks": [{"id": "t1", "title": "A"}]},
            {"id": "Scripting", "title": "Scripting", "tasks": []},
            {"id": "Filming", "title": "Filming", "tasks": []},
            {"id": "Editing", "title": "Editing", "tasks": []},
            {"id": "Upload", "title": "Upload Queue", "tasks": []}
        ]"#;
        let board: Board = serde_json::from_str(json).unwrap();
        assert_eq!(board.columns().len(), 7);
        assert_eq!(board.column(Stage::Review).tasks.len(), 0);
        assert_eq!(board.column(Stage::Upload).title, "Upload Queue");
        assert_eq!(board.column_of(&"t1".into()), Some(Stage::Ideation));
    }

    #[test]
    fn test_out_of_order_columns_are_reordered() {
        let board = Board::from_columns(vec![
            Column::new(Stage::Review),
            Column::new(Stage::Ideation),
        ]);
        assert_eq!(board.columns()[0].id, Stage::Ideation);
        assert_eq!(board.columns()[4].id, Stage::Review);
    }

    #[test]
    fn test_duplicate_tasks_keep_first_occurrence() {
        let board = Board::from_columns(vec![
            Column::new(Stage::Ideation).with_tasks(vec![Task::with_id("t1", "first")]),
            Column::new(Stage::Editing).with_tasks(vec![Task::with_id("t1", "second")]),
        ]);
        assert!(board.duplicate_task_ids().is_empty());
        assert_eq!(board.task_count(), 1);
        assert_eq!(board.column_of(&"t1".into()), Some(Stage::Ideation));
    }

    #[test]
    fn test_board_serializes_as_column_array() {
        let value = serde_json::to_value(Board::new()).unwrap();
        assert!(value.is_array());
        assert_eq!(value[0]["id"], "Ideation");
        assert_eq!(value[6]["id"], "Published");
    }
}
