//! Persistence and live sync for shared board documents
//!
//! A [`SyncGateway`] stores one [`Document`] per board and pushes every new
//! snapshot to subscribers. Writes are merge-writes of a [`DocumentPatch`];
//! snapshots always carry the whole document, which subscribers adopt
//! wholesale (last writer wins).

mod file;
mod memory;

pub use file::{FileGateway, WatchHandle};
pub use memory::MemoryGateway;

use crate::error::Result;
use crate::types::{BoardId, Document, DocumentPatch};
use async_trait::async_trait;
use tokio::sync::broadcast;

/// Snapshots buffered per subscriber before it starts lagging
pub const SNAPSHOT_CHANNEL_CAPACITY: usize = 64;

/// Backend holding shared board documents
#[async_trait]
pub trait SyncGateway: Send + Sync {
    /// Read the stored document. `Ok(None)` when the board was never written;
    /// [`BoardError::MalformedDocument`](crate::BoardError::MalformedDocument)
    /// when it exists but can't be parsed.
    async fn load(&self, board: &BoardId) -> Result<Option<Document>>;

    /// Merge `patch` into the stored document and notify subscribers
    async fn save(&self, board: &BoardId, patch: DocumentPatch) -> Result<()>;

    /// Receive every snapshot written after this call
    async fn subscribe(&self, board: &BoardId) -> Result<broadcast::Receiver<Document>>;

    /// Subscribe, then read the current document.
    ///
    /// Subscribing first means a write landing between the two calls is
    /// delivered on the receiver instead of being lost.
    async fn subscribe_with_snapshot(
        &self,
        board: &BoardId,
    ) -> Result<(broadcast::Receiver<Document>, Result<Option<Document>>)> {
        let receiver = self.subscribe(board).await?;
        let snapshot = self.load(board).await;
        Ok((receiver, snapshot))
    }
}
