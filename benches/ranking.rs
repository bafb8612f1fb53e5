//! Performance benchmarks for pathfinder
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use pathfinder::index::{index_paths, merge_all};
use pathfinder::query::{
    find_candidates, match_paths, weighted_distance, ParsedQuery, SearchConfig,
};
use pathfinder::store::StringStore;
use tempfile::TempDir;

const WORDS: &[&str] = &[
    "budget", "report", "invoice", "notes", "photo", "archive", "draft", "summary", "config",
    "holiday", "readme", "backup",
];
const EXTS: &[&str] = &["csv", "pdf", "txt", "md", "jpg", "xlsx", "json"];

/// Deterministic synthetic paths
fn synthetic_paths(count: usize) -> Vec<String> {
    (0..count)
        .map(|i| {
            let dir = WORDS[i % WORDS.len()];
            let sub = WORDS[(i / 7) % WORDS.len()];
            let name = WORDS[(i / 3) % WORDS.len()];
            let ext = EXTS[i % EXTS.len()];
            format!("/home/user/{}/{}_{}/{}_{}.{}", dir, sub, i % 50, name, i, ext)
        })
        .collect()
}

fn bench_distance(c: &mut Criterion) {
    let mut group = c.benchmark_group("weighted_distance");
    let candidates = [
        "budget.csv",
        "budget_report_2023_final.xlsx",
        "a_very_long_basename_with_many_words.txt",
    ];
    for candidate in candidates {
        let id = BenchmarkId::from_parameter(candidate.len());
        group.bench_with_input(id, candidate, |b, cand| {
            b.iter(|| weighted_distance(black_box(b"budrep"), black_box(cand.as_bytes())))
        });
    }
    group.finish();
}

fn bench_intern(c: &mut Criterion) {
    let paths = synthetic_paths(10_000);
    c.bench_function("intern_10k", |b| {
        b.iter_with_setup(
            || {
                let dir = TempDir::new().unwrap();
                let store = StringStore::open(&dir.path().join("paths.log")).unwrap();
                (dir, store)
            },
            |(_dir, store)| index_paths(&store, black_box(&paths)).unwrap(),
        )
    });
}

fn bench_search(c: &mut Criterion) {
    let dir = TempDir::new().unwrap();
    let store = StringStore::open(&dir.path().join("paths.log")).unwrap();
    let paths = synthetic_paths(50_000);
    let (first, second) = paths.split_at(paths.len() / 2);
    let mapping = merge_all(vec![
        index_paths(&store, first).unwrap().mapping,
        index_paths(&store, second).unwrap().mapping,
    ]);
    let config = SearchConfig::default();

    let mut group = c.benchmark_group("search");
    for word in ["budget", "report_12", "invoice/archive", "summ"] {
        group.bench_with_input(BenchmarkId::from_parameter(word), word, |b, word| {
            b.iter(|| {
                let query = ParsedQuery::parse(black_box(word));
                let fragment = query.file_fragment();
                let ids = find_candidates(fragment, &mapping, config.min_trigram_matches);
                let candidates = store.resolve_many(&ids);
                match_paths(&query, candidates, &config)
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_distance, bench_intern, bench_search);
criterion_main!(benches);
