//! Board store: local state reconciled with a shared document
//!
//! The store owns the committed [`Board`] value and publishes it through a
//! `watch` channel. Local mutations are applied immediately and persisted in
//! the background; nothing waits for the write and failures are only logged.
//!
//! Saves go through one writer task per store, so a client's own writes
//! reach the backend in the order they were made. Every snapshot pushed by
//! the gateway replaces local state, with the writes still in the
//! outbox laid over it. A client never rolls back its own queued
//! edits; between clients the last writer wins.

mod outbox;

use crate::config::{BoardConfig, StorageConfig};
use crate::drag::{DragCoordinator, DragEffect, DragEvent, Layout};
use crate::error::{BoardError, Result};
use crate::sync::{FileGateway, SyncGateway, WatchHandle};
use crate::task::{self, NewTask};
use crate::types::{Board, BoardId, BoardSettings, Document, DocumentPatch, QuickFlag, Task, TaskId};
use outbox::Outbox;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc, watch, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Everything a view needs to render the board
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BoardState {
    /// Committed board
    pub board: Board,
    pub settings: BoardSettings,
    pub allowed_users: Vec<String>,
    /// Committed board with the active drag applied
    pub preview: Option<Board>,
    /// Task following the pointer
    pub overlay: Option<Task>,
}

impl BoardState {
    fn from_document(document: Document) -> Self {
        Self {
            board: document.columns,
            settings: document.settings,
            allowed_users: document.allowed_users,
            preview: None,
            overlay: None,
        }
    }

    /// The board to render: the preview while dragging, else the committed one
    pub fn visible(&self) -> &Board {
        self.preview.as_ref().unwrap_or(&self.board)
    }
}

/// A patch waiting for the writer task
struct PendingSave {
    seq: u64,
    patch: DocumentPatch,
    /// Settles the drag commit once written
    finishes_drag: bool,
}

struct Inner {
    board_id: BoardId,
    identity: Option<String>,
    gateway: Arc<dyn SyncGateway>,
    runtime: Handle,
    settle_delay: Duration,
    state: watch::Sender<BoardState>,
    /// Held for every state change; taken before the watch lock
    coordinator: Mutex<DragCoordinator>,
    /// Taken after the coordinator lock, before the watch lock
    outbox: Mutex<Outbox>,
    /// Queued and scheduled saves not yet written
    pending_saves: AtomicUsize,
    saves_idle: Notify,
    saves: mpsc::UnboundedSender<PendingSave>,
    listener: Mutex<Option<JoinHandle<()>>>,
    _watcher: Option<WatchHandle>,
}

impl Inner {
    fn begin_save(&self) {
        self.pending_saves.fetch_add(1, Ordering::SeqCst);
    }

    fn finish_save(&self) {
        if self.pending_saves.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.saves_idle.notify_waiters();
        }
    }

    /// Hand a counted save to the writer
    fn queue(&self, save: PendingSave) {
        if let Err(mpsc::error::SendError(save)) = self.saves.send(save) {
            warn!(board = %self.board_id, "save writer stopped, dropping save");
            lock_ignoring_poison(&self.outbox).discard(save.seq);
            self.finish_save();
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        let listener = self
            .listener
            .get_mut()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(handle) = listener.take() {
            handle.abort();
        }
    }
}

/// Shared handle to one board's local state
#[derive(Clone)]
pub struct BoardStore {
    inner: Arc<Inner>,
}

fn into_unavailable(error: BoardError) -> BoardError {
    match error {
        BoardError::Unavailable { .. } => error,
        other => BoardError::unavailable(other.to_string()),
    }
}

impl BoardStore {
    /// Build the gateway described by `config.storage` and connect to it
    pub async fn open(config: &BoardConfig) -> Result<Self> {
        match &config.storage {
            StorageConfig::File { path, watch: true } => {
                let gateway = FileGateway::new(path);
                let watcher = gateway.watch()?;
                Self::connect_inner(Arc::new(gateway), config, Some(watcher)).await
            }
            storage => Self::connect_inner(storage.gateway(), config, None).await,
        }
    }

    /// Subscribe to the board and load it.
    ///
    /// A board that was never written, or whose stored document is corrupt,
    /// is initialized with the default document owned by `config.identity`.
    /// Fails with [`BoardError::Unavailable`] when the backend can't be
    /// reached and [`BoardError::AccessDenied`] when the identity isn't on a
    /// non-empty allow-list.
    pub async fn connect(gateway: Arc<dyn SyncGateway>, config: &BoardConfig) -> Result<Self> {
        Self::connect_inner(gateway, config, None).await
    }

    async fn connect_inner(
        gateway: Arc<dyn SyncGateway>,
        config: &BoardConfig,
        watcher: Option<WatchHandle>,
    ) -> Result<Self> {
        let board_id = config.board_id.clone();
        let identity = config.identity.clone();

        let (receiver, snapshot) = gateway
            .subscribe_with_snapshot(&board_id)
            .await
            .map_err(into_unavailable)?;

        let (document, initialized) = match snapshot {
            Ok(Some(document)) => (document, false),
            Ok(None) => {
                info!(board = %board_id, "initializing new board");
                (initialize(gateway.as_ref(), &board_id, identity.as_deref()).await?, true)
            }
            Err(BoardError::MalformedDocument { message, .. }) => {
                warn!(board = %board_id, "stored board is malformed, reinitializing: {}", message);
                (initialize(gateway.as_ref(), &board_id, identity.as_deref()).await?, true)
            }
            Err(e) => return Err(into_unavailable(e)),
        };

        if !document.allowed_users.is_empty() {
            let granted = identity.as_deref().is_some_and(|id| document.grants_access(id));
            if !granted {
                return Err(BoardError::AccessDenied {
                    identity: identity.unwrap_or_else(|| "anonymous".to_string()),
                });
            }
        }

        // the initial write echoes back like any other local write
        let mut outbox = Outbox::default();
        if initialized {
            let seq = outbox.push(DocumentPatch::full(document.clone()));
            outbox.mark_sent(seq);
        }

        let (state, _) = watch::channel(BoardState::from_document(document));
        let (saves, pending) = mpsc::unbounded_channel();
        let inner = Arc::new(Inner {
            board_id,
            identity,
            gateway,
            runtime: Handle::current(),
            settle_delay: config.settle_delay(),
            state,
            coordinator: Mutex::new(DragCoordinator::new(config.drag_config())),
            outbox: Mutex::new(outbox),
            pending_saves: AtomicUsize::new(0),
            saves_idle: Notify::new(),
            saves,
            listener: Mutex::new(None),
            _watcher: watcher,
        });

        tokio::spawn(write_saves(Arc::downgrade(&inner), pending));
        let listener = tokio::spawn(listen(Arc::downgrade(&inner), receiver));
        *lock_ignoring_poison(&inner.listener) = Some(listener);

        info!(board = %inner.board_id, "connected to board");
        Ok(Self { inner })
    }

    pub fn board_id(&self) -> &BoardId {
        &self.inner.board_id
    }

    pub fn identity(&self) -> Option<&str> {
        self.inner.identity.as_deref()
    }

    /// Watch every state change
    pub fn subscribe(&self) -> watch::Receiver<BoardState> {
        self.inner.state.subscribe()
    }

    /// Current state snapshot
    pub fn state(&self) -> BoardState {
        self.inner.state.borrow().clone()
    }

    /// Current committed board
    pub fn board(&self) -> Board {
        self.inner.state.borrow().board.clone()
    }

    pub fn settings(&self) -> BoardSettings {
        self.inner.state.borrow().settings.clone()
    }

    /// Whether no drag is active or committing
    pub fn is_drag_idle(&self) -> bool {
        self.coordinator().is_idle()
    }

    /// Create a task at the top of the entry column
    pub fn add_task(&self, new_task: NewTask) -> TaskId {
        let mut created = None;
        self.change_board(|board, settings| {
            let task = new_task.into_task(settings);
            created = Some(task.id.clone());
            task::add_task(board, task)
        });
        created.unwrap_or_default()
    }

    /// Save an edited task, applying the stage-transition rules
    pub fn save_task(&self, task: Task) {
        self.change_board(|board, _| task::upsert_task(board, task));
    }

    pub fn delete_task(&self, id: &TaskId) {
        self.change_board(|board, _| task::remove_task(board, id));
    }

    pub fn toggle_flag(&self, id: &TaskId, flag: QuickFlag) {
        self.change_board(|board, _| task::toggle_flag(board, id, flag));
    }

    pub fn update_settings(&self, settings: BoardSettings) {
        let _guard = self.coordinator();
        self.inner
            .state
            .send_modify(|state| state.settings = settings.clone());
        debug!(board = %self.inner.board_id, "updated settings");
        self.persist(DocumentPatch::default().with_settings(settings));
    }

    pub fn set_allowed_users(&self, users: Vec<String>) {
        let _guard = self.coordinator();
        self.inner
            .state
            .send_modify(|state| state.allowed_users = users.clone());
        debug!(board = %self.inner.board_id, count = users.len(), "updated allowed users");
        self.persist(DocumentPatch::default().with_allowed_users(users));
    }

    /// Route a gesture through the drag coordinator.
    ///
    /// The preview and overlay follow the drag; a commit replaces the
    /// committed board at once and is persisted after the settle delay.
    pub fn drag(&self, event: DragEvent, layout: &Layout) -> DragEffect {
        let mut coordinator = self.coordinator();
        let effect = {
            let state = self.inner.state.borrow();
            coordinator.handle(event, &state.board, layout)
        };

        match &effect {
            DragEffect::Started(task) => {
                let task = task.clone();
                self.inner.state.send_modify(|state| {
                    state.preview = Some(state.board.clone());
                    state.overlay = Some(task);
                });
            }
            DragEffect::Preview(preview) => {
                let preview = preview.clone();
                self.inner
                    .state
                    .send_modify(|state| state.preview = Some(preview));
            }
            DragEffect::Commit(board) => {
                self.schedule_commit(board.clone());
                let board = board.clone();
                self.inner.state.send_modify(|state| {
                    state.board = board;
                    state.preview = None;
                    state.overlay = None;
                });
            }
            DragEffect::Cancelled => {
                self.inner.state.send_modify(|state| {
                    state.preview = None;
                    state.overlay = None;
                });
            }
            DragEffect::None => {}
        }
        effect
    }

    /// Replace local state with a snapshot from the backend. Local writes
    /// the snapshot doesn't reflect yet stay applied on top of it.
    pub fn apply_remote(&self, document: Document) {
        let coordinator = self.coordinator();
        let document = {
            let mut outbox = lock_ignoring_poison(&self.inner.outbox);
            let document = outbox.rebase(document);
            debug!(board = %self.inner.board_id, pending = outbox.len(), "applied remote snapshot");
            document
        };
        let preview = coordinator.preview(&document.columns);
        self.inner.state.send_modify(|state| {
            state.board = document.columns;
            state.settings = document.settings;
            state.allowed_users = document.allowed_users;
            state.preview = preview;
        });
    }

    /// Wait until every background save has finished
    pub async fn settled(&self) {
        loop {
            let idle = self.inner.saves_idle.notified();
            if self.inner.pending_saves.load(Ordering::SeqCst) == 0 {
                return;
            }
            idle.await;
        }
    }

    fn coordinator(&self) -> MutexGuard<'_, DragCoordinator> {
        lock_ignoring_poison(&self.inner.coordinator)
    }

    fn change_board(&self, f: impl FnOnce(&Board, &BoardSettings) -> Board) {
        let coordinator = self.coordinator();
        self.inner.state.send_modify(|state| {
            let next = f(&state.board, &state.settings);
            state.preview = coordinator.preview(&next);
            state.board = next;
        });
        // queued under the coordinator lock so patches keep mutation order
        let board = self.inner.state.borrow().board.clone();
        self.persist(DocumentPatch::board(board));
    }

    /// Queue a patch. Callers hold the coordinator lock.
    fn persist(&self, patch: DocumentPatch) {
        let seq = lock_ignoring_poison(&self.inner.outbox).push(patch.clone());
        self.inner.begin_save();
        self.inner.queue(PendingSave {
            seq,
            patch,
            finishes_drag: false,
        });
    }

    /// Queue the committed board once the settle delay has passed. The
    /// commit sits in the outbox meanwhile so snapshots can't undo it.
    fn schedule_commit(&self, board: Board) {
        let seq = lock_ignoring_poison(&self.inner.outbox).push(DocumentPatch::board(board));
        self.inner.begin_save();
        let store = self.clone();
        self.inner.runtime.spawn(async move {
            tokio::time::sleep(store.inner.settle_delay).await;
            let _guard = store.coordinator();
            let patch = DocumentPatch::board(store.inner.state.borrow().board.clone());
            let seq = {
                let mut outbox = lock_ignoring_poison(&store.inner.outbox);
                if outbox.replace(seq, patch.clone()) {
                    seq
                } else {
                    outbox.push(patch.clone())
                }
            };
            store.inner.queue(PendingSave {
                seq,
                patch,
                finishes_drag: true,
            });
        });
    }
}

impl std::fmt::Debug for BoardStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoardStore")
            .field("board_id", &self.inner.board_id)
            .field("identity", &self.inner.identity)
            .finish_non_exhaustive()
    }
}

fn lock_ignoring_poison<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

async fn initialize(
    gateway: &dyn SyncGateway,
    board_id: &BoardId,
    identity: Option<&str>,
) -> Result<Document> {
    let document = Document::initial(identity);
    gateway
        .save(board_id, DocumentPatch::full(document.clone()))
        .await
        .map_err(into_unavailable)?;
    Ok(document)
}

async fn save(gateway: &dyn SyncGateway, board_id: &BoardId, patch: DocumentPatch) -> bool {
    match gateway.save(board_id, patch).await {
        Ok(()) => {
            debug!(board = %board_id, "board saved");
            true
        }
        Err(e) => {
            warn!(board = %board_id, "failed to save board: {}", e);
            false
        }
    }
}

/// Write queued patches one at a time, in the order they were queued
async fn write_saves(store: Weak<Inner>, mut pending: mpsc::UnboundedReceiver<PendingSave>) {
    while let Some(next) = pending.recv().await {
        let Some(inner) = store.upgrade() else { break };
        lock_ignoring_poison(&inner.outbox).mark_sent(next.seq);
        if !save(inner.gateway.as_ref(), &inner.board_id, next.patch).await {
            // rejected writes stay applied locally until the next snapshot
            lock_ignoring_poison(&inner.outbox).discard(next.seq);
        }
        if next.finishes_drag {
            lock_ignoring_poison(&inner.coordinator).finish_commit();
        }
        inner.finish_save();
    }
}

async fn listen(store: Weak<Inner>, mut receiver: broadcast::Receiver<Document>) {
    loop {
        let document = match receiver.recv().await {
            Ok(document) => document,
            Err(RecvError::Lagged(skipped)) => {
                let Some(inner) = store.upgrade() else { break };
                warn!(board = %inner.board_id, skipped, "missed snapshots, reloading");
                lock_ignoring_poison(&inner.outbox).forget_sent();
                match inner.gateway.load(&inner.board_id).await {
                    Ok(Some(document)) => document,
                    Ok(None) => continue,
                    Err(e) => {
                        warn!(board = %inner.board_id, "reload failed: {}", e);
                        continue;
                    }
                }
            }
            Err(RecvError::Closed) => break,
        };

        let Some(inner) = store.upgrade() else { break };
        BoardStore { inner }.apply_remote(document);
    }
}
