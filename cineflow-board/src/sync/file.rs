//! JSON documents on disk, one file per board
//!
//! Layout under the root directory:
//!
//! ```text
//! <root>/
//!   <board_id>.json   current document
//!   <board_id>.lock   advisory write lock
//! ```
//!
//! Writes go through an exclusive advisory lock and land via temp file and
//! rename, so readers never see a half-written document. With
//! [`FileGateway::watch`] running, writes made by other processes are
//! picked up and fanned out to subscribers too.

use super::{SyncGateway, SNAPSHOT_CHANNEL_CAPACITY};
use crate::error::{BoardError, Result};
use crate::types::{BoardId, Document, DocumentPatch};
use async_trait::async_trait;
use fs2::FileExt;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::fs;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

const LOCK_ATTEMPTS: usize = 50;
const LOCK_RETRY_DELAY: Duration = Duration::from_millis(10);

fn lock_ignoring_poison<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Fan-out for one board. Remembers the last published document so the
/// watcher doesn't echo our own writes back a second time.
#[derive(Debug)]
struct BoardChannel {
    sender: broadcast::Sender<Document>,
    last: Mutex<Option<Document>>,
}

impl BoardChannel {
    fn new() -> Self {
        let (sender, _) = broadcast::channel(SNAPSHOT_CHANNEL_CAPACITY);
        Self {
            sender,
            last: Mutex::new(None),
        }
    }

    /// Publish a document picked up from disk unless it was the last one sent
    fn publish_changed(&self, document: Document) -> bool {
        let mut last = lock_ignoring_poison(&self.last);
        if last.as_ref() == Some(&document) {
            return false;
        }
        *last = Some(document.clone());
        let _ = self.sender.send(document);
        true
    }

    /// Publish the result of a save. Every successful write is echoed, even
    /// one that left the document unchanged.
    fn publish_write(&self, document: Document) {
        let mut last = lock_ignoring_poison(&self.last);
        *last = Some(document.clone());
        let _ = self.sender.send(document);
    }
}

type Channels = Mutex<HashMap<BoardId, Arc<BoardChannel>>>;

/// Board documents stored as JSON files under a root directory
#[derive(Debug, Clone)]
pub struct FileGateway {
    root: PathBuf,
    channels: Arc<Channels>,
}

impl FileGateway {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            channels: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of a board's document
    pub fn document_path(&self, board: &BoardId) -> PathBuf {
        self.root.join(format!("{}.json", board))
    }

    fn lock_path(&self, board: &BoardId) -> PathBuf {
        self.root.join(format!("{}.lock", board))
    }

    /// Take the board's write lock without waiting.
    ///
    /// Fails with [`BoardError::LockBusy`] while another writer holds it.
    pub async fn lock(&self, board: &BoardId) -> Result<DocumentLock> {
        fs::create_dir_all(&self.root).await?;

        let path = self.lock_path(board);
        let file = fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)
            .await?
            .into_std()
            .await;

        match file.try_lock_exclusive() {
            Ok(()) => Ok(DocumentLock { file }),
            Err(_) => Err(BoardError::LockBusy),
        }
    }

    async fn lock_with_retry(&self, board: &BoardId) -> Result<DocumentLock> {
        let mut attempt = 1;
        loop {
            match self.lock(board).await {
                Err(e) if e.is_retryable() && attempt < LOCK_ATTEMPTS => {
                    trace!(%board, attempt, "document lock busy, retrying");
                    attempt += 1;
                    tokio::time::sleep(LOCK_RETRY_DELAY).await;
                }
                other => return other,
            }
        }
    }

    fn channel(&self, board: &BoardId) -> Arc<BoardChannel> {
        lock_ignoring_poison(&self.channels)
            .entry(board.clone())
            .or_insert_with(|| Arc::new(BoardChannel::new()))
            .clone()
    }

    /// Watch the root directory for writes from other processes.
    ///
    /// Must be called from within a tokio runtime. Watching stops when the
    /// returned handle is dropped.
    pub fn watch(&self) -> Result<WatchHandle> {
        std::fs::create_dir_all(&self.root)?;

        let (tx, mut rx) = mpsc::channel(100);
        let mut watcher = RecommendedWatcher::new(
            move |result: std::result::Result<Event, notify::Error>| match result {
                Ok(event) => {
                    if let Err(e) = tx.blocking_send(event) {
                        trace!("watch event dropped: {}", e);
                    }
                }
                Err(e) => warn!("file watch error: {}", e),
            },
            notify::Config::default(),
        )?;
        watcher.watch(&self.root, RecursiveMode::NonRecursive)?;
        info!(root = %self.root.display(), "watching board documents");

        let gateway = self.clone();
        let task = tokio::spawn(async move {
            // keep the watcher alive as long as the task
            let _watcher = watcher;
            while let Some(event) = rx.recv().await {
                if !matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)) {
                    continue;
                }
                for path in &event.paths {
                    gateway.on_file_changed(path).await;
                }
            }
        });

        Ok(WatchHandle { task })
    }

    async fn on_file_changed(&self, path: &Path) {
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            return;
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            return;
        };
        let board = BoardId::from_string(stem);

        let Some(channel) = lock_ignoring_poison(&self.channels).get(&board).cloned() else {
            return;
        };

        // read under the write lock so snapshots go out in write order
        let _lock = match self.lock_with_retry(&board).await {
            Ok(lock) => lock,
            Err(e) => {
                trace!(%board, "skipping change, document lock unavailable: {}", e);
                return;
            }
        };
        match read_document(path, &board).await {
            Ok(Some(document)) => {
                if channel.publish_changed(document) {
                    debug!(%board, "picked up external write");
                }
            }
            Ok(None) => {}
            // partially written files show up here between create and write
            Err(e) => trace!(%board, "ignoring unreadable document: {}", e),
        }
    }
}

async fn read_document(path: &Path, board: &BoardId) -> Result<Option<Document>> {
    let content = match fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    serde_json::from_str(&content)
        .map(Some)
        .map_err(|e| BoardError::malformed(board.as_str(), e.to_string()))
}

/// Atomic write via temp file and rename
async fn atomic_write(path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    let temp_path = path.with_extension("json.tmp");
    fs::write(&temp_path, content).await?;
    fs::rename(&temp_path, path).await?;
    Ok(())
}

#[async_trait]
impl SyncGateway for FileGateway {
    async fn load(&self, board: &BoardId) -> Result<Option<Document>> {
        read_document(&self.document_path(board), board).await
    }

    async fn save(&self, board: &BoardId, patch: DocumentPatch) -> Result<()> {
        let path = self.document_path(board);
        let _lock = self.lock_with_retry(board).await?;

        let mut document = match read_document(&path, board).await {
            Ok(existing) => existing.unwrap_or_default(),
            Err(BoardError::MalformedDocument { message, .. }) => {
                warn!(%board, "overwriting malformed document: {}", message);
                Document::default()
            }
            Err(e) => return Err(e),
        };
        document.apply(patch);

        let json = serde_json::to_string_pretty(&document)?;
        atomic_write(&path, json.as_bytes()).await?;
        debug!(%board, path = %path.display(), "saved document");

        self.channel(board).publish_write(document);
        Ok(())
    }

    async fn subscribe(&self, board: &BoardId) -> Result<broadcast::Receiver<Document>> {
        fs::create_dir_all(&self.root)
            .await
            .map_err(|e| BoardError::unavailable(format!("{}: {}", self.root.display(), e)))?;
        Ok(self.channel(board).sender.subscribe())
    }
}

/// Write lock on one board document, released on drop
pub struct DocumentLock {
    file: std::fs::File,
}

impl Drop for DocumentLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

/// Keeps a directory watch running; stops it on drop
pub struct WatchHandle {
    task: JoinHandle<()>,
}

impl Drop for WatchHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
