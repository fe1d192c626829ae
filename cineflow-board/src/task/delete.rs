//! Deleting tasks

use crate::types::{Board, TaskId};
use tracing::debug;

/// Remove a task from whichever column holds it. No-op if it isn't there.
pub fn remove_task(board: &Board, id: &TaskId) -> Board {
    let mut next = board.clone();
    if let Some(stage) = next.column_of(id) {
        next.column_mut(stage).tasks.retain(|t| &t.id != id);
        debug!(task = %id, column = %stage, "removed task");
    }
    next
}
