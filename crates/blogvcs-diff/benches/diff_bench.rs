//! Diff engine benchmarks.
//!
//! Run with:
//!   cargo bench --bench diff_bench

use blogvcs_diff::{diff, diff_with, render, DiffOptions, Granularity};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

fn article(paragraphs: usize, seed: usize) -> String {
    const WORDS: [&str; 12] = [
        "the", "version", "editor", "saves", "each", "draft", "quietly", "while", "readers",
        "compare", "old", "text",
    ];
    let mut out = String::new();
    for p in 0..paragraphs {
        out.push_str("<p>");
        for w in 0..40 {
            if w > 0 {
                out.push(' ');
            }
            out.push_str(WORDS[(p * 7 + w * 3 + seed * (w % 5)) % WORDS.len()]);
        }
        out.push_str(".</p>\n");
    }
    out
}

fn bench_diff_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("diff_small_edit");
    for paragraphs in [4, 16, 64] {
        let source = article(paragraphs, 0);
        let mut target = source.clone();
        target.insert_str(source.len() / 2, " freshly inserted words ");
        group.throughput(Throughput::Bytes(source.len() as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(paragraphs),
            &(source, target),
            |b, (s, t)| b.iter(|| diff(black_box(s), black_box(t))),
        );
    }
    group.finish();
}

fn bench_rewrite(c: &mut Criterion) {
    let source = article(16, 0);
    let target = article(16, 1);
    let mut group = c.benchmark_group("diff_rewrite");
    for granularity in [Granularity::Char, Granularity::Word, Granularity::Line] {
        let options = DiffOptions::default().with_granularity(granularity);
        group.bench_function(format!("{granularity:?}"), |b| {
            b.iter(|| diff_with(black_box(&source), black_box(&target), &options))
        });
    }
    group.finish();
}

fn bench_render(c: &mut Criterion) {
    let script = diff(&article(16, 0), &article(16, 1));
    c.bench_function("render", |b| b.iter(|| render(black_box(&script))));
}

criterion_group!(benches, bench_diff_sizes, bench_rewrite, bench_render);
criterion_main!(benches);
