//! Quick-toggles on the card

use crate::types::{Board, QuickFlag, TaskId};
use tracing::debug;

/// Flip a boolean flag on a task wherever it is. No-op if it isn't there.
pub fn toggle_flag(board: &Board, id: &TaskId, flag: QuickFlag) -> Board {
    let mut next = board.clone();
    if let Some(task) = next.find_task_mut(id) {
        let value = task.flag_mut(flag);
        *value = !*value;
        debug!(task = %id, ?flag, value = *value, "toggled flag");
    }
    next
}
