//! Benchmarks for the board move operations on a busy board
//!
//! Every move clones the board, so cost grows with the number of cards.

use cineflow_board::task::{move_across_columns, move_within_column, upsert_task};
use cineflow_board::{Board, Column, Stage, Subtask, Task, TaskId};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

fn busy_board(per_column: usize) -> Board {
    let columns = Stage::ALL
        .iter()
        .map(|stage| {
            let tasks = (0..per_column)
                .map(|i| {
                    Task::with_id(format!("{}-{i}", stage.as_str()), format!("Video {i}"))
                        .with_subtasks(vec![Subtask::new("Finalize Script"), Subtask::new("Record Video")])
                })
                .collect();
            Column::new(*stage).with_tasks(tasks)
        })
        .collect();
    Board::from_columns(columns)
}

fn bench_moves(c: &mut Criterion) {
    let mut group = c.benchmark_group("move_task");

    for per_column in [10usize, 100, 500] {
        let board = busy_board(per_column);
        let first = TaskId::from_string("Ideation-0");
        let last = TaskId::from_string(format!("Ideation-{}", per_column - 1));
        let reference = TaskId::from_string("Scripting-0");

        group.bench_with_input(BenchmarkId::new("within_column", per_column), &board, |b, board| {
            b.iter(|| move_within_column(black_box(board), Stage::Ideation, &first, &last));
        });

        group.bench_with_input(BenchmarkId::new("across_columns", per_column), &board, |b, board| {
            b.iter(|| {
                move_across_columns(
                    black_box(board),
                    &first,
                    Stage::Ideation,
                    Stage::Scripting,
                    Some(&reference),
                )
            });
        });

        group.bench_with_input(BenchmarkId::new("upsert_with_rule", per_column), &board, |b, board| {
            let mut edited = board.find_task(&first).cloned().expect("seeded task");
            edited.subtasks[0].completed = true;
            b.iter(|| upsert_task(black_box(board), edited.clone()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_moves);
criterion_main!(benches);
