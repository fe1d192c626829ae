//! Pure task operations.
//!
//! Every operation takes the current [`Board`](crate::types::Board) by
//! reference and returns a new one. They never fail: ids that can't be
//! resolved make the operation a no-op.

mod add;
mod delete;
mod flag;
mod mv;
mod update;

pub use add::{add_task, NewTask};
pub use delete::remove_task;
pub use flag::toggle_flag;
pub use mv::{move_across_columns, move_across_columns_with, move_within_column, InsertPolicy};
pub use update::upsert_task;
