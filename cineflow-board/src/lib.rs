//! Video production pipeline board
//!
//! A kanban board for creators: every video moves through fixed stages from
//! ideation to publishing. Boards are shared documents; every client keeps a
//! local copy, mutates it optimistically and persists in the background, and
//! adopts every snapshot the backend pushes (last writer wins).
//!
//! ## Overview
//!
//! - **Value semantics** - [`task`] operations take a [`Board`] and return a new one
//! - **Stage rules** - saving a task can move it: finishing the script sends it
//!   to Filming, recording to Editing, new revision notes in Review back to Editing
//! - **Drag and drop** - [`drag::DragCoordinator`] turns gestures into moves,
//!   previewing cross-column placements until the card is released
//! - **Sync** - [`sync::SyncGateway`] backends keep one JSON document per board
//!
//! ## Basic Usage
//!
//! ```rust,no_run
//! use cineflow_board::{BoardConfig, BoardStore, NewTask};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = BoardConfig::load(None)?.with_identity("host@example.com");
//! let store = BoardStore::open(&config).await?;
//!
//! let id = store.add_task(NewTask::new("Camera review").with_project("Spring"));
//! println!("Created task: {}", id);
//! # Ok(())
//! # }
//! ```
//!
//! ## Stored Document
//!
//! ```text
//! {
//!   "columns": [ { "id": "Ideation", "title": "Ideation", "tasks": [ ... ] }, ... ],
//!   "settings": { "showPublished": false, "defaultSubtasks": [ ... ] },
//!   "allowedUsers": [ "host@example.com" ]
//! }
//! ```

pub mod config;
pub mod drag;
mod error;
pub mod rules;
pub mod store;
pub mod sync;
pub mod task;
pub mod types;
pub mod view;

pub use config::{BoardConfig, StorageConfig};
pub use error::{BoardError, Result};
pub use store::{BoardState, BoardStore};
pub use task::NewTask;
pub use view::{BoardView, ColumnView, TaskFilter};

// Re-export commonly used types
pub use types::{
    Board, BoardId, BoardSettings, Column, Document, DocumentPatch, Milestone, QuickFlag,
    Revision, Stage, Subtask, Task, TaskId, ViewMode,
};
