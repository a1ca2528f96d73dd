//! Benchmarks for building the similarity indices
//!
//! Run with: cargo bench --package sources
//!
//! Loads the MovieLens dataset once and times the two O(n^2) builds plus
//! one query against each.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use data_loader::Dataset;
use sources::{CollaborativeFilter, ContentSimilarityIndex};
use std::path::Path;

fn load_test_data() -> Dataset {
    let data_dir = Path::new("../../data/ml-latest-small");
    Dataset::load_from_dir(data_dir).expect("Failed to load test data")
}

fn bench_content_build(c: &mut Criterion) {
    let dataset = load_test_data();

    let mut group = c.benchmark_group("content");
    group.sample_size(10);
    group.bench_function("content_build", |b| {
        b.iter(|| black_box(ContentSimilarityIndex::build(black_box(&dataset.catalog))))
    });
    group.finish();

    let index = ContentSimilarityIndex::build(&dataset.catalog);
    let title = dataset.catalog.movies()[0].title.clone();
    c.bench_function("content_similar_to", |b| {
        b.iter(|| black_box(index.similar_to(black_box(&title), 5)))
    });
}

fn bench_collaborative_build(c: &mut Criterion) {
    let dataset = load_test_data();

    c.bench_function("collaborative_build", |b| {
        b.iter(|| {
            black_box(CollaborativeFilter::build(
                black_box(&dataset.ratings),
                &dataset.catalog,
            ))
        })
    });

    let filter = CollaborativeFilter::build(&dataset.ratings, &dataset.catalog);
    c.bench_function("collaborative_recommend_for", |b| {
        b.iter(|| black_box(filter.recommend_for(black_box(1), 5)))
    });
}

criterion_group!(benches, bench_content_build, bench_collaborative_build);
criterion_main!(benches);
