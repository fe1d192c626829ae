//! Saving a task from the editor

use crate::rules::transition_target;
use crate::types::{Board, Milestone, Task};
use tracing::debug;

/// Insert or replace a task.
///
/// An existing task is replaced in place, unless a stage-transition rule
/// fires, in which case it is appended to the target column instead. A task
/// the board doesn't hold yet goes to the head of the entry column.
///
/// Checklist items renamed by the edit are re-tagged from their new title.
pub fn upsert_task(board: &Board, mut task: Task) -> Board {
    let mut next = board.clone();

    let Some(current) = next.column_of(&task.id) else {
        let entry = next.entry_stage();
        debug!(task = %task.id, column = %entry, "inserted task");
        next.column_mut(entry).tasks.insert(0, task);
        return next;
    };

    let column = next.column_mut(current);
    let Some(index) = column.position_of(&task.id) else {
        return next;
    };

    retag_renamed(&column.tasks[index], &mut task);
    match transition_target(&column.tasks[index], &task, current) {
        Some(target) => {
            column.tasks.remove(index);
            debug!(task = %task.id, from = %current, to = %target, "stage transition");
            next.column_mut(target).tasks.push(task);
        }
        None => column.tasks[index] = task,
    }

    next
}

fn retag_renamed(previous: &Task, task: &mut Task) {
    for subtask in &mut task.subtasks {
        let renamed = previous
            .subtasks
            .iter()
            .find(|s| s.id == subtask.id)
            .is_some_and(|s| s.title != subtask.title);
        if renamed {
            subtask.milestone = Milestone::from_title(&subtask.title);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Column, Revision, Stage, Subtask};

    fn board_with(stage: Stage, tasks: Vec<Task>) -> Board {
        Board::from_columns(vec![Column::new(stage).with_tasks(tasks)])
    }

    #[test]
    fn test_upsert_new_task_goes_to_entry_head() {
        let board = board_with(Stage::Ideation, vec![Task::with_id("t1", "existing")]);
        let next = upsert_task(&board, Task::with_id("t2", "fresh"));
        let ids = next.column(Stage::Ideation).task_ids();
        assert_eq!(ids[0].as_str(), "t2");
        assert_eq!(ids[1].as_str(), "t1");
    }

    #[test]
    fn test_upsert_replaces_in_place() {
        let board = board_with(
            Stage::Scripting,
            vec![
                Task::with_id("a", "A"),
                Task::with_id("b", "B"),
                Task::with_id("c", "C"),
            ],
        );
        let edited = Task::with_id("b", "B renamed").with_description("notes");
        let next = upsert_task(&board, edited);

        let column = next.column(Stage::Scripting);
        assert_eq!(column.tasks[1].title, "B renamed");
        assert_eq!(column.tasks[1].description, "notes");
        assert_eq!(column.tasks.len(), 3);
    }

    #[test]
    fn test_finalize_script_relocates_from_ideation_to_filming() {
        let board = Board::from_columns(vec![
            Column::new(Stage::Ideation).with_tasks(vec![
                Task::with_id("t1", "Tech Review")
                    .with_subtasks(vec![Subtask::new("Finalize Script")]),
            ]),
            Column::new(Stage::Filming).with_tasks(vec![Task::with_id("t3", "Coffee B-Roll")]),
        ]);

        let mut saved = board.find_task(&"t1".into()).unwrap().clone();
        saved.subtasks[0].completed = true;
        let next = upsert_task(&board, saved);

        assert!(next.column(Stage::Ideation).tasks.is_empty());
        let filming = next.column(Stage::Filming).task_ids();
        assert_eq!(filming.len(), 2);
        assert_eq!(filming[1].as_str(), "t1");
        assert!(next.duplicate_task_ids().is_empty());
    }

    #[test]
    fn test_renamed_milestone_item_stops_triggering() {
        let board = board_with(
            Stage::Scripting,
            vec![Task::with_id("t1", "Tech Review")
                .with_subtasks(vec![Subtask::new("Finalize Script")])],
        );

        let mut saved = board.find_task(&"t1".into()).unwrap().clone();
        saved.subtasks[0].title = "Polish draft".into();
        saved.subtasks[0].completed = true;
        let next = upsert_task(&board, saved);

        assert_eq!(next.column_of(&"t1".into()), Some(Stage::Scripting));
        assert_eq!(next.find_task(&"t1".into()).unwrap().subtasks[0].milestone, None);
    }

    #[test]
    fn test_item_renamed_to_milestone_title_triggers() {
        let board = board_with(
            Stage::Ideation,
            vec![Task::with_id("t1", "Tech Review").with_subtasks(vec![Subtask::new("Shoot")])],
        );

        let mut saved = board.find_task(&"t1".into()).unwrap().clone();
        saved.subtasks[0].title = "Record Video".into();
        saved.subtasks[0].completed = true;
        let next = upsert_task(&board, saved);

        assert_eq!(next.column_of(&"t1".into()), Some(Stage::Editing));
    }

    #[test]
    fn test_new_revision_relocates_review_task_to_editing() {
        let r1 = Revision::new("r1");
        let board = board_with(
            Stage::Review,
            vec![Task::with_id("T", "Final cut").with_revisions(vec![r1.clone()])],
        );
        let saved =
            Task::with_id("T", "Final cut").with_revisions(vec![r1, Revision::new("r2")]);

        let next = upsert_task(&board, saved);
        assert_eq!(next.column_of(&"T".into()), Some(Stage::Editing));
        assert!(next.column(Stage::Review).tasks.is_empty());
    }

    #[test]
    fn test_upsert_leaves_input_untouched() {
        let board = board_with(Stage::Ideation, vec![Task::with_id("t1", "A")]);
        let _ = upsert_task(&board, Task::with_id("t1", "B"));
        assert_eq!(board.find_task(&"t1".into()).unwrap().title, "A");
    }
}
