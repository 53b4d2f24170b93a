//! Benchmarks for snapshot history and the render model.
//!
//! Run with: cargo bench

use collage_core::DocumentStore;
use collage_document::{History, OverlayId, PixelPoint, presets};
use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

/// Builds a store holding a sizeable document.
fn populated_store(images: usize, stickers: usize) -> DocumentStore {
    let mut store = DocumentStore::new();
    for i in 0..images {
        store.add_image(format!("image-{i}.png"));
    }
    for i in 0..stickers {
        store.add_sticker(format!("sticker-{i}.png"));
    }
    store
}

/// Benchmarks committing edits onto a large document.
fn bench_commit(c: &mut Criterion) {
    let mut group = c.benchmark_group("commit");

    for size in [10, 100, 1000].iter() {
        group.bench_with_input(BenchmarkId::new("add_image", size), size, |b, &size| {
            b.iter_with_setup(
                || populated_store(size, size),
                |mut store| {
                    store.add_image(black_box("new.png"));
                    black_box(store)
                },
            )
        });
    }

    group.finish();
}

/// Benchmarks undo/redo over a full history.
fn bench_undo_redo(c: &mut Criterion) {
    let mut group = c.benchmark_group("undo_redo");

    group.bench_function("undo_100_operations", |b| {
        b.iter_with_setup(
            || populated_store(50, 50),
            |mut store| {
                while store.undo() {}
                black_box(store)
            },
        )
    });

    group.bench_function("history_bounded_push", |b| {
        b.iter_with_setup(
            || History::new(0u64, 1000),
            |mut history| {
                for i in 1..=5000u64 {
                    history.commit(i);
                }
                black_box(history)
            },
        )
    });

    group.finish();
}

/// Benchmarks a drag gesture: many drafts, one commit.
fn bench_drag(c: &mut Criterion) {
    let mut group = c.benchmark_group("gesture");

    group.bench_function("drag_200_steps", |b| {
        b.iter_with_setup(
            || {
                let mut store = populated_store(20, 20);
                store.set_canvas_size(collage_document::CanvasSize::new(800.0, 600.0));
                let target = store.document().stickers[0].id;
                (store, OverlayId::Sticker(target))
            },
            |(mut store, target)| {
                store.begin_drag(target);
                for step in 0..200 {
                    store.drag_to(PixelPoint::new(step as f64 * 2.0, step as f64));
                }
                store.end_gesture();
                black_box(store)
            },
        )
    });

    group.finish();
}

/// Benchmarks building the render plan.
fn bench_render_plan(c: &mut Criterion) {
    let mut group = c.benchmark_group("render_plan");

    let mut store = populated_store(100, 0);
    if let Some(layout) = presets::grid_layout("grid-8") {
        store.set_layout(Some(layout)).unwrap();
    }

    group.bench_function("grid_3x2", |b| {
        b.iter(|| black_box(store.render_plan()))
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_commit,
    bench_undo_redo,
    bench_drag,
    bench_render_plan,
);
criterion_main!(benches);
