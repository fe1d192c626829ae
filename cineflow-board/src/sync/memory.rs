//! In-process gateway shared by every store holding the same `Arc`

use super::{SyncGateway, SNAPSHOT_CHANNEL_CAPACITY};
use crate::error::{BoardError, Result};
use crate::types::{BoardId, Document, DocumentPatch};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{broadcast, RwLock};
use tracing::debug;

#[derive(Debug)]
struct Slot {
    /// Raw stored JSON, so a corrupt document can be represented
    stored: Option<serde_json::Value>,
    sender: broadcast::Sender<Document>,
}

impl Slot {
    fn new() -> Self {
        let (sender, _) = broadcast::channel(SNAPSHOT_CHANNEL_CAPACITY);
        Self {
            stored: None,
            sender,
        }
    }
}

/// Documents kept in memory, with switches to simulate an unreachable backend
#[derive(Debug, Default)]
pub struct MemoryGateway {
    slots: RwLock<HashMap<BoardId, Slot>>,
    offline: AtomicBool,
    reject_writes: AtomicBool,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse every call while `offline` is set
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Refuse writes while set; reads and subscriptions keep working
    pub fn fail_writes(&self, fail: bool) {
        self.reject_writes.store(fail, Ordering::SeqCst);
    }

    /// Store raw JSON without validation or notification
    pub async fn put_raw(&self, board: &BoardId, value: serde_json::Value) {
        let mut slots = self.slots.write().await;
        slots.entry(board.clone()).or_insert_with(Slot::new).stored = Some(value);
    }

    fn check_online(&self) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(BoardError::unavailable("memory backend is offline"));
        }
        Ok(())
    }
}

fn parse(board: &BoardId, value: &serde_json::Value) -> Result<Document> {
    serde_json::from_value(value.clone()).map_err(|e| BoardError::malformed(board.as_str(), e.to_string()))
}

#[async_trait]
impl SyncGateway for MemoryGateway {
    async fn load(&self, board: &BoardId) -> Result<Option<Document>> {
        self.check_online()?;
        let slots = self.slots.read().await;
        match slots.get(board).and_then(|slot| slot.stored.as_ref()) {
            Some(value) => parse(board, value).map(Some),
            None => Ok(None),
        }
    }

    async fn save(&self, board: &BoardId, patch: DocumentPatch) -> Result<()> {
        self.check_online()?;
        if self.reject_writes.load(Ordering::SeqCst) {
            return Err(BoardError::unavailable("memory backend rejected the write"));
        }

        let mut slots = self.slots.write().await;
        let slot = slots.entry(board.clone()).or_insert_with(Slot::new);
        // A corrupt document is overwritten rather than merged into
        let mut document = slot
            .stored
            .as_ref()
            .and_then(|value| parse(board, value).ok())
            .unwrap_or_default();
        document.apply(patch);
        slot.stored = Some(serde_json::to_value(&document)?);

        let receivers = slot.sender.send(document).unwrap_or(0);
        debug!(%board, receivers, "saved document");
        Ok(())
    }

    async fn subscribe(&self, board: &BoardId) -> Result<broadcast::Receiver<Document>> {
        self.check_online()?;
        let mut slots = self.slots.write().await;
        Ok(slots
            .entry(board.clone())
            .or_insert_with(Slot::new)
            .sender
            .subscribe())
    }
}
