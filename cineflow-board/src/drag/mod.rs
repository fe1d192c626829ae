//! Drag session coordinator
//!
//! Turns pointer and keyboard gestures into board mutations. The coordinator
//! is a small state machine:
//!
//! ```text
//! Idle ──(press + movement past threshold | key pick-up)──▶ Dragging
//! Dragging ──(position update)──▶ Dragging      records cross-column placements
//! Dragging ──(release)──▶ Committing ──(save finished)──▶ Idle
//! Dragging ──(cancel)──▶ Idle                    placements discarded
//! ```
//!
//! Drag-over never touches committed state. The session records each
//! cross-column placement and the preview is derived by replaying them on
//! whatever board is current, so a snapshot replacing the board mid-drag is
//! picked up and ids that disappeared simply stop moving. The placements are
//! folded into committed state on release.

mod collision;

pub use collision::{closest_corners, DropTarget, Droppable, Layout, Point, Rect};

use crate::task::{move_across_columns_with, move_within_column, InsertPolicy};
use crate::types::{Board, Stage, Task, TaskId};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Pointer travel needed before a press becomes a drag
pub const DEFAULT_ACTIVATION_DISTANCE: f64 = 5.0;

/// Tuning for drag sessions
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DragConfig {
    pub activation_distance: f64,
    pub insert_policy: InsertPolicy,
}

impl Default for DragConfig {
    fn default() -> Self {
        Self {
            activation_distance: DEFAULT_ACTIVATION_DISTANCE,
            insert_policy: InsertPolicy::default(),
        }
    }
}

/// Gesture input
#[derive(Debug, Clone, PartialEq)]
pub enum DragEvent {
    PointerDown { task: TaskId, at: Point },
    PointerMove { at: Point },
    PointerUp { at: Point },
    KeyPickUp { task: TaskId },
    KeyMove { delta: Point },
    KeyDrop,
    Cancel,
}

/// Which sensor started the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragInput {
    Pointer,
    Keyboard,
}

/// A cross-column move recorded during drag-over
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub to: Stage,
    pub reference: Option<TaskId>,
}

/// An active drag
#[derive(Debug, Clone)]
pub struct DragSession {
    task: Task,
    source: Stage,
    input: DragInput,
    origin: Point,
    offset: Point,
    rect: Rect,
    over: Option<DropTarget>,
    placements: Vec<Placement>,
}

impl DragSession {
    /// Snapshot of the dragged task taken when the drag started
    pub fn task(&self) -> &Task {
        &self.task
    }

    /// Column the drag started from
    pub fn source(&self) -> Stage {
        self.source
    }

    /// Target currently under the card
    pub fn over(&self) -> Option<&DropTarget> {
        self.over.as_ref()
    }

    /// Cross-column moves made so far
    pub fn placements(&self) -> &[Placement] {
        &self.placements
    }

    /// Record a move into `to`. Revisiting a column drops the detour taken
    /// since the earlier visit; coming back to `home`, the column the task
    /// sits in on the committed board, drops every placement.
    fn place(&mut self, to: Stage, reference: Option<TaskId>, home: Option<Stage>) {
        if home == Some(to) {
            self.placements.clear();
            return;
        }
        if let Some(visited) = self.placements.iter().position(|p| p.to == to) {
            self.placements.truncate(visited);
        }
        self.placements.push(Placement { to, reference });
    }

    fn active_rect(&self) -> Rect {
        self.rect.translate(&self.offset)
    }

    /// Replay the placements on `board`
    pub fn preview(&self, board: &Board, policy: InsertPolicy) -> Board {
        let mut preview = board.clone();
        for placement in &self.placements {
            let Some(from) = preview.column_of(&self.task.id) else {
                break;
            };
            preview = move_across_columns_with(
                &preview,
                &self.task.id,
                from,
                placement.to,
                placement.reference.as_ref(),
                policy,
            );
        }
        preview
    }
}

/// Coordinator state
#[derive(Debug, Clone)]
pub enum DragState {
    Idle,
    Dragging(DragSession),
    /// Released; waiting for the save to finish
    Committing { task: TaskId },
}

/// What the caller should do after an event
#[derive(Debug, Clone, PartialEq)]
pub enum DragEffect {
    /// Nothing changed
    None,
    /// A drag started; render the overlay for this task
    Started(Task),
    /// The preview changed
    Preview(Board),
    /// Fold this board into committed state and persist it
    Commit(Board),
    /// The drag ended without a mutation
    Cancelled,
}

#[derive(Debug, Clone)]
struct Press {
    task: TaskId,
    origin: Point,
}

/// Drives one drag at a time
#[derive(Debug, Clone)]
pub struct DragCoordinator {
    config: DragConfig,
    state: DragState,
    press: Option<Press>,
}

impl DragCoordinator {
    pub fn new(config: DragConfig) -> Self {
        Self {
            config,
            state: DragState::Idle,
            press: None,
        }
    }

    pub fn config(&self) -> &DragConfig {
        &self.config
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, DragState::Idle)
    }

    /// Task to render under the pointer while dragging
    pub fn overlay(&self) -> Option<&Task> {
        match &self.state {
            DragState::Dragging(session) => Some(&session.task),
            _ => None,
        }
    }

    /// Preview of `board` with the active drag applied
    pub fn preview(&self, board: &Board) -> Option<Board> {
        match &self.state {
            DragState::Dragging(session) => Some(session.preview(board, self.config.insert_policy)),
            _ => None,
        }
    }

    /// Feed one gesture event. `board` is the committed board and `layout`
    /// the currently rendered rects.
    pub fn handle(&mut self, event: DragEvent, board: &Board, layout: &Layout) -> DragEffect {
        trace!(?event, "drag event");
        match event {
            DragEvent::PointerDown { task, at } => self.pointer_down(task, at),
            DragEvent::PointerMove { at } => self.pointer_move(at, board, layout),
            DragEvent::PointerUp { at } => self.pointer_up(at, board, layout),
            DragEvent::KeyPickUp { task } => self.key_pick_up(task, board, layout),
            DragEvent::KeyMove { delta } => self.key_move(delta, board, layout),
            DragEvent::KeyDrop => self.release(board),
            DragEvent::Cancel => self.cancel(),
        }
    }

    /// The save that followed a commit has finished
    pub fn finish_commit(&mut self) {
        if let DragState::Committing { task } = &self.state {
            debug!(%task, "drag commit finished");
            self.state = DragState::Idle;
        }
    }

    fn pointer_down(&mut self, task: TaskId, at: Point) -> DragEffect {
        if self.is_idle() {
            self.press = Some(Press { task, origin: at });
        }
        DragEffect::None
    }

    fn pointer_move(&mut self, at: Point, board: &Board, layout: &Layout) -> DragEffect {
        if let DragState::Dragging(session) = &mut self.state {
            if session.input != DragInput::Pointer {
                return DragEffect::None;
            }
            session.offset = at.delta_from(&session.origin);
            return self.drag_over(board, layout);
        }

        let threshold = self.config.activation_distance;
        let exceeded = self
            .press
            .as_ref()
            .is_some_and(|press| at.distance(&press.origin) > threshold);
        if !exceeded || !self.is_idle() {
            return DragEffect::None;
        }
        let Some(press) = self.press.take() else {
            return DragEffect::None;
        };
        let offset = at.delta_from(&press.origin);
        self.activate(press.task, DragInput::Pointer, press.origin, offset, board, layout)
    }

    fn pointer_up(&mut self, at: Point, board: &Board, layout: &Layout) -> DragEffect {
        if let DragState::Dragging(session) = &mut self.state {
            if session.input != DragInput::Pointer {
                return DragEffect::None;
            }
            session.offset = at.delta_from(&session.origin);
            self.drag_over(board, layout);
            return self.release(board);
        }

        if self.press.take().is_some() {
            trace!("press released below activation distance");
        }
        DragEffect::None
    }

    fn key_pick_up(&mut self, task: TaskId, board: &Board, layout: &Layout) -> DragEffect {
        if !self.is_idle() {
            return DragEffect::None;
        }
        self.press = None;
        self.activate(
            task,
            DragInput::Keyboard,
            Point::default(),
            Point::default(),
            board,
            layout,
        )
    }

    fn key_move(&mut self, delta: Point, board: &Board, layout: &Layout) -> DragEffect {
        match &mut self.state {
            DragState::Dragging(session) if session.input == DragInput::Keyboard => {
                session.offset = session.offset.offset(&delta);
            }
            _ => return DragEffect::None,
        }
        self.drag_over(board, layout)
    }

    fn activate(
        &mut self,
        task: TaskId,
        input: DragInput,
        origin: Point,
        offset: Point,
        board: &Board,
        layout: &Layout,
    ) -> DragEffect {
        let (Some(snapshot), Some(source)) = (board.find_task(&task).cloned(), board.column_of(&task))
        else {
            debug!(%task, "drag target no longer on the board");
            return DragEffect::None;
        };

        let rect = layout.task_rect(&task).unwrap_or_else(|| Rect::at(origin));
        debug!(%task, column = %source, ?input, "drag started");
        self.state = DragState::Dragging(DragSession {
            task: snapshot.clone(),
            source,
            input,
            origin,
            offset,
            rect,
            over: None,
            placements: Vec::new(),
        });
        DragEffect::Started(snapshot)
    }

    fn drag_over(&mut self, board: &Board, layout: &Layout) -> DragEffect {
        let policy = self.config.insert_policy;
        let DragState::Dragging(session) = &mut self.state else {
            return DragEffect::None;
        };

        session.over = closest_corners(&session.active_rect(), layout.droppables()).cloned();
        let Some(over) = session.over.clone() else {
            return DragEffect::None;
        };

        let preview = session.preview(board, policy);
        let task_column = preview.column_of(&session.task.id);
        let over_column = match &over {
            DropTarget::Column(stage) => Some(*stage),
            DropTarget::Task(id) => preview.column_of(id),
        };

        match (task_column, over_column) {
            (Some(from), Some(to)) if from != to => {
                debug!(task = %session.task.id, %from, %to, "drag over new column");
                let home = board.column_of(&session.task.id);
                session.place(to, over.task().cloned(), home);
                DragEffect::Preview(session.preview(board, policy))
            }
            _ => DragEffect::None,
        }
    }

    fn release(&mut self, board: &Board) -> DragEffect {
        let session = match std::mem::replace(&mut self.state, DragState::Idle) {
            DragState::Dragging(session) => session,
            other => {
                self.state = other;
                return DragEffect::None;
            }
        };

        let task = session.task.id.clone();
        let mut next = session.preview(board, self.config.insert_policy);

        let Some(over) = session.over else {
            if session.placements.is_empty() {
                debug!(%task, "drag abandoned");
                return DragEffect::Cancelled;
            }
            debug!(%task, "drag released outside any target");
            self.state = DragState::Committing { task };
            return DragEffect::Commit(next);
        };

        if let (Some(column), Some(target)) = (next.column_of(&task), over.task()) {
            if next.column_of(target) == Some(column) {
                next = move_within_column(&next, column, &task, target);
            }
        }

        debug!(%task, "drag released");
        self.state = DragState::Committing { task };
        DragEffect::Commit(next)
    }

    fn cancel(&mut self) -> DragEffect {
        self.press = None;
        match std::mem::replace(&mut self.state, DragState::Idle) {
            DragState::Dragging(session) => {
                debug!(task = %session.task.id, "drag cancelled");
                DragEffect::Cancelled
            }
            other => {
                self.state = other;
                DragEffect::None
            }
        }
    }
}

impl Default for DragCoordinator {
    fn default() -> Self {
        Self::new(DragConfig::default())
    }
}
