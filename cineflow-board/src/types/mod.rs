//! Core types for the board model

mod board;
mod document;
mod ids;
mod stage;
mod task;

// Re-export all types
pub use board::{Board, Column};
pub use document::{BoardSettings, Document, DocumentPatch, DEFAULT_SUBTASKS};
pub use ids::{BoardId, RevisionId, SubtaskId, TaskId};
pub use stage::{Stage, ViewMode};
pub use task::{Milestone, QuickFlag, Revision, Subtask, Task};
