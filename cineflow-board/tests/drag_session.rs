//! Integration tests for dragging cards through a connected store

use cineflow_board::drag::{DragEffect, DragEvent, Layout, Point, Rect};
use cineflow_board::sync::{MemoryGateway, SyncGateway};
use cineflow_board::task::InsertPolicy;
use cineflow_board::{
    Board, BoardConfig, BoardState, BoardStore, Column, Document, DocumentPatch, Stage, Task,
};
use std::sync::Arc;
use std::time::Duration;

const CARD_W: f64 = 276.0;
const CARD_H: f64 = 180.0;

fn seeded_board() -> Board {
    Board::from_columns(vec![
        Column::new(Stage::Ideation).with_tasks(vec![
            Task::with_id("t1", "Tech Review"),
            Task::with_id("t2", "Studio Vlog"),
        ]),
        Column::new(Stage::Filming).with_tasks(vec![Task::with_id("f1", "B-roll")]),
    ])
}

/// Ideation at x=0, Scripting at x=324
fn layout() -> Layout {
    Layout::new()
        .with_column(Stage::Ideation, Rect::new(0.0, 0.0, 300.0, 400.0))
        .with_column(Stage::Scripting, Rect::new(324.0, 0.0, 300.0, 400.0))
        .with_task("t1", Rect::new(12.0, 12.0, CARD_W, CARD_H))
        .with_task("t2", Rect::new(12.0, 204.0, CARD_W, CARD_H))
}

async fn setup(config: BoardConfig) -> (Arc<MemoryGateway>, BoardStore) {
    let gateway = Arc::new(MemoryGateway::new());
    let document = Document {
        columns: seeded_board(),
        ..Document::initial(None)
    };
    gateway
        .save(&config.board_id, DocumentPatch::full(document))
        .await
        .unwrap();
    let store = BoardStore::connect(gateway.clone(), &config).await.unwrap();
    (gateway, store)
}

fn config() -> BoardConfig {
    BoardConfig::new("drag")
        .with_identity("host@example.com")
        .with_settle_delay(Duration::from_millis(5))
}

fn ids(board: &Board, stage: Stage) -> Vec<String> {
    board
        .column(stage)
        .tasks
        .iter()
        .map(|t| t.id.to_string())
        .collect()
}

fn pick_up_t1(store: &BoardStore) {
    let layout = layout();
    store.drag(
        DragEvent::PointerDown {
            task: "t1".into(),
            at: Point::new(100.0, 100.0),
        },
        &layout,
    );
    let effect = store.drag(
        DragEvent::PointerMove {
            at: Point::new(110.0, 100.0),
        },
        &layout,
    );
    assert!(matches!(effect, DragEffect::Started(_)));
}

fn move_to_scripting(store: &BoardStore) -> DragEffect {
    store.drag(
        DragEvent::PointerMove {
            at: Point::new(424.0, 100.0),
        },
        &layout(),
    )
}

async fn wait_until(store: &BoardStore, ready: impl FnMut(&BoardState) -> bool) -> BoardState {
    let mut rx = store.subscribe();
    let state = tokio::time::timeout(Duration::from_secs(5), rx.wait_for(ready))
        .await
        .expect("timed out waiting for store state")
        .expect("store closed")
        .clone();
    state
}

#[test_log::test(tokio::test)]
async fn test_cross_column_drag_commits_after_settle() {
    let (gateway, store) = setup(config()).await;

    pick_up_t1(&store);
    let state = store.state();
    assert_eq!(state.overlay.as_ref().unwrap().title, "Tech Review");

    assert!(matches!(move_to_scripting(&store), DragEffect::Preview(_)));
    let state = store.state();
    assert_eq!(ids(state.visible(), Stage::Scripting), vec!["t1"]);
    assert_eq!(ids(&state.board, Stage::Ideation), vec!["t1", "t2"]);

    let effect = store.drag(
        DragEvent::PointerUp {
            at: Point::new(424.0, 100.0),
        },
        &layout(),
    );
    assert!(matches!(effect, DragEffect::Commit(_)));

    let state = store.state();
    assert_eq!(ids(&state.board, Stage::Scripting), vec!["t1"]);
    assert!(state.preview.is_none());
    assert!(state.overlay.is_none());
    assert!(!store.is_drag_idle());

    store.settled().await;
    assert!(store.is_drag_idle());
    let stored = gateway.load(store.board_id()).await.unwrap().unwrap();
    assert_eq!(ids(&stored.columns, Stage::Scripting), vec!["t1"]);
    assert_eq!(ids(&stored.columns, Stage::Ideation), vec!["t2"]);
}

#[test_log::test(tokio::test)]
async fn test_remote_change_mid_drag_rebases_preview() {
    let (gateway, store) = setup(config()).await;
    pick_up_t1(&store);
    move_to_scripting(&store);

    // another client adds a card while the drag is in flight
    let mut remote = seeded_board().columns().to_vec();
    remote[Stage::Editing.index()]
        .tasks
        .push(Task::with_id("e1", "Color grade"));
    gateway
        .save(store.board_id(), DocumentPatch::board(Board::from_columns(remote)))
        .await
        .unwrap();

    let state = wait_until(&store, |s| s.board.contains(&"e1".into())).await;
    let preview = state.preview.expect("drag still previewing");
    assert_eq!(ids(&preview, Stage::Scripting), vec!["t1"]);
    assert_eq!(ids(&preview, Stage::Editing), vec!["e1"]);
    assert_eq!(ids(&state.board, Stage::Ideation), vec!["t1", "t2"]);

    let effect = store.drag(
        DragEvent::PointerUp {
            at: Point::new(424.0, 100.0),
        },
        &layout(),
    );
    let DragEffect::Commit(committed) = effect else {
        panic!("expected commit, got {effect:?}");
    };
    assert_eq!(ids(&committed, Stage::Scripting), vec!["t1"]);
    assert!(committed.contains(&"e1".into()));
}

#[test_log::test(tokio::test)]
async fn test_dragged_task_deleted_remotely() {
    let (gateway, store) = setup(config()).await;
    pick_up_t1(&store);
    move_to_scripting(&store);

    let without_t1 = cineflow_board::task::remove_task(&seeded_board(), &"t1".into());
    gateway
        .save(store.board_id(), DocumentPatch::board(without_t1))
        .await
        .unwrap();
    wait_until(&store, |s| !s.board.contains(&"t1".into())).await;

    store.drag(
        DragEvent::PointerUp {
            at: Point::new(424.0, 100.0),
        },
        &layout(),
    );
    store.settled().await;

    let board = store.board();
    assert!(!board.contains(&"t1".into()));
    assert_eq!(board.task_count(), 2);
    assert!(board.duplicate_task_ids().is_empty());
}

#[test_log::test(tokio::test)]
async fn test_cancel_leaves_everything_untouched() {
    let (gateway, store) = setup(config()).await;
    pick_up_t1(&store);
    move_to_scripting(&store);

    assert_eq!(
        store.drag(DragEvent::Cancel, &layout()),
        DragEffect::Cancelled
    );
    assert!(store.is_drag_idle());
    assert!(store.state().preview.is_none());
    assert_eq!(store.board(), seeded_board());

    store.settled().await;
    let stored = gateway.load(store.board_id()).await.unwrap().unwrap();
    assert_eq!(stored.columns, seeded_board());
}

#[test_log::test(tokio::test)]
async fn test_keyboard_reorder_within_column() {
    let (_gateway, store) = setup(config()).await;
    let layout = layout();

    store.drag(DragEvent::KeyPickUp { task: "t1".into() }, &layout);
    let effect = store.drag(
        DragEvent::KeyMove {
            delta: Point::new(0.0, 192.0),
        },
        &layout,
    );
    assert_eq!(effect, DragEffect::None);

    store.drag(DragEvent::KeyDrop, &layout);
    assert_eq!(ids(&store.board(), Stage::Ideation), vec!["t2", "t1"]);
    store.settled().await;
    assert!(store.is_drag_idle());
}

#[test_log::test(tokio::test)]
async fn test_insert_policy_controls_preview_slot() {
    let with_card = Layout::new()
        .with_column(Stage::Ideation, Rect::new(0.0, 0.0, 300.0, 400.0))
        .with_column(Stage::Filming, Rect::new(324.0, 0.0, 300.0, 400.0))
        .with_task("t1", Rect::new(12.0, 12.0, CARD_W, CARD_H))
        .with_task("f1", Rect::new(336.0, 12.0, CARD_W, CARD_H));

    for (policy, expected) in [
        (InsertPolicy::BeforeHovered, vec!["t1", "f1"]),
        (InsertPolicy::IdOrder, vec!["f1", "t1"]),
    ] {
        let (_gateway, store) = setup(config().with_insert_policy(policy)).await;
        store.drag(DragEvent::KeyPickUp { task: "t1".into() }, &with_card);
        let effect = store.drag(
            DragEvent::KeyMove {
                delta: Point::new(324.0, 0.0),
            },
            &with_card,
        );
        let DragEffect::Preview(preview) = effect else {
            panic!("expected preview, got {effect:?}");
        };
        assert_eq!(ids(&preview, Stage::Filming), expected, "{policy:?}");
        store.drag(DragEvent::Cancel, &with_card);
    }
}
