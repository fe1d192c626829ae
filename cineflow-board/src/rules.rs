//! Stage-transition rules applied when a task is saved.
//!
//! Rules run in order and a later rule overrides an earlier one's target:
//!
//! 1. "Finalize Script" completed while in Ideation or Scripting → Filming
//! 2. "Record Video" completed while in Ideation, Scripting or Filming → Editing
//! 3. In Review and the save added a revision → Editing
//!
//! Milestones are matched by the subtask's tag, falling back to the exact
//! checklist title for untagged items.

use crate::types::{Milestone, Stage, Task};

/// Column a saved task should move to, or `None` to keep it where it is.
///
/// `previous` is the task as it was before the edit, `current` the column
/// holding it.
pub fn transition_target(previous: &Task, saved: &Task, current: Stage) -> Option<Stage> {
    let mut target = None;

    if saved.milestone_done(Milestone::FinalizeScript) && current.is_pre_production() {
        target = Some(Stage::Filming);
    }

    if saved.milestone_done(Milestone::RecordVideo)
        && matches!(current, Stage::Ideation | Stage::Scripting | Stage::Filming)
    {
        target = Some(Stage::Editing);
    }

    if current == Stage::Review && saved.revisions.len() > previous.revisions.len() {
        target = Some(Stage::Editing);
    }

    target.filter(|stage| *stage != current)
}
