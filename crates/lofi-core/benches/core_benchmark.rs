//! Benchmark tests for lofi-core operations
//!
//! Run with: cargo bench -p lofi-core

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use lofi_core::types::{PlaybackSnapshot, PlayerPhase, VideoId};
use lofi_core::youtube::{extract_video_id, format_time, is_valid_url, thumbnail_url};

// ============================================================================
// URL Benchmarks
// ============================================================================

fn bench_extract_video_id(c: &mut Criterion) {
    let mut group = c.benchmark_group("extract_video_id");

    let urls = [
        ("watch", "https://www.youtube.com/watch?v=dQw4w9WgXcQ"),
        ("short", "https://youtu.be/dQw4w9WgXcQ"),
        ("embed", "https://www.youtube.com/embed/dQw4w9WgXcQ"),
        ("playlist", "https://www.youtube.com/watch?list=PL9tY0BWXOZFu&v=dQw4w9WgXcQ&t=42"),
        ("rejected", "https://vimeo.com/76979871"),
    ];

    for (name, url) in urls {
        group.bench_with_input(BenchmarkId::from_parameter(name), url, |b, url| {
            b.iter(|| extract_video_id(black_box(url)))
        });
    }

    group.finish();
}

fn bench_is_valid_url(c: &mut Criterion) {
    c.bench_function("is_valid_url", |b| {
        b.iter(|| is_valid_url(black_box("https://youtu.be/jfKfPfyJRdk?t=10")))
    });
}

fn bench_thumbnail_url(c: &mut Criterion) {
    let id = VideoId::new("jfKfPfyJRdk").unwrap();

    c.bench_function("thumbnail_url", |b| b.iter(|| thumbnail_url(black_box(&id))));
}

// ============================================================================
// Time Formatting Benchmarks
// ============================================================================

fn bench_format_time(c: &mut Criterion) {
    let mut group = c.benchmark_group("format_time");

    for seconds in [0.0, 65.0, 3599.9, 86_400.0] {
        group.bench_with_input(BenchmarkId::from_parameter(seconds), &seconds, |b, &s| {
            b.iter(|| format_time(black_box(s)))
        });
    }

    group.finish();
}

fn bench_snapshot_labels(c: &mut Criterion) {
    let snapshot = PlaybackSnapshot {
        current_time: 83.4,
        duration: 212.0,
        ..PlaybackSnapshot::default()
    }
    .with_phase(PlayerPhase::Playing);

    c.bench_function("snapshot_labels", |b| {
        b.iter(|| {
            let snap = black_box(&snapshot);
            (snap.elapsed_label(), snap.duration_label(), snap.thumbnail_url())
        })
    });
}

criterion_group!(
    benches,
    bench_extract_video_id,
    bench_is_valid_url,
    bench_thumbnail_url,
    bench_format_time,
    bench_snapshot_labels,
);

criterion_main!(benches);
