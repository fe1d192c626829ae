//! Moving tasks within and across columns

use crate::types::{Board, Stage, TaskId};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Where a task dropped onto another task lands in the destination column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsertPolicy {
    /// After the reference, or before it when the moved id sorts below the
    /// reference id
    IdOrder,
    /// Always immediately before the reference
    #[default]
    BeforeHovered,
}

impl InsertPolicy {
    fn index(&self, moving: &TaskId, reference: &TaskId, reference_index: usize) -> usize {
        match self {
            InsertPolicy::IdOrder if moving < reference => reference_index,
            InsertPolicy::IdOrder => reference_index + 1,
            InsertPolicy::BeforeHovered => reference_index,
        }
    }
}

/// Reorder `task` within `column` to the slot currently held by `target`.
///
/// Returns the board unchanged when either id is missing from the column or
/// both resolve to the same index.
pub fn move_within_column(board: &Board, column: Stage, task: &TaskId, target: &TaskId) -> Board {
    let mut next = board.clone();
    let tasks = &mut next.column_mut(column).tasks;

    let (Some(from), Some(to)) = (
        tasks.iter().position(|t| &t.id == task),
        tasks.iter().position(|t| &t.id == target),
    ) else {
        return next;
    };
    if from == to {
        return next;
    }

    let moved = tasks.remove(from);
    tasks.insert(to, moved);
    debug!(%task, %column, from, to, "moved task within column");
    next
}

/// Move `task` from one column into another using [`InsertPolicy::IdOrder`].
///
/// With a `reference` task present in the destination the task lands next to
/// it; otherwise it is appended. No-op when `from == to` or the task isn't in
/// `from`.
pub fn move_across_columns(
    board: &Board,
    task: &TaskId,
    from: Stage,
    to: Stage,
    reference: Option<&TaskId>,
) -> Board {
    move_across_columns_with(board, task, from, to, reference, InsertPolicy::IdOrder)
}

/// [`move_across_columns`] with an explicit insertion policy
pub fn move_across_columns_with(
    board: &Board,
    task: &TaskId,
    from: Stage,
    to: Stage,
    reference: Option<&TaskId>,
    policy: InsertPolicy,
) -> Board {
    let mut next = board.clone();
    if from == to {
        return next;
    }

    let Some(from_index) = next.column(from).position_of(task) else {
        return next;
    };
    let moved = next.column_mut(from).tasks.remove(from_index);

    let destination = &mut next.column_mut(to).tasks;
    let index = reference
        .and_then(|r| {
            destination
                .iter()
                .position(|t| &t.id == r)
                .map(|i| policy.index(task, r, i))
        })
        .unwrap_or(destination.len());
    destination.insert(index, moved);

    debug!(%task, %from, %to, index, "moved task across columns");
    next
}
