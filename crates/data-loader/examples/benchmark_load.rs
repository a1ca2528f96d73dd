//! Load a MovieLens directory and report what the recommenders will see.
//!
//! Run with: cargo run --package data-loader --example benchmark_load [DIR]

use data_loader::Dataset;
use std::path::PathBuf;
use std::time::Instant;

fn main() {
    let data_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("data/ml-latest-small"));

    println!("Loading {}...\n", data_dir.display());

    let start = Instant::now();
    let dataset = Dataset::load_from_dir(&data_dir).expect("Failed to load dataset");
    let elapsed = start.elapsed();

    dataset.validate().expect("Dataset failed validation");
    let (movies, ratings, users) = dataset.counts();
    let (_, rated_movies) = dataset.ratings.counts();
    let untagged = dataset
        .catalog
        .iter()
        .filter(|movie| movie.genres.is_empty())
        .count();

    println!("=== Load Complete in {:?} ===", elapsed);
    println!("Catalog: {} movies, {} without genres", movies, untagged);
    println!("Genre vocabulary: {}", dataset.catalog.genres().len());
    println!("Ratings: {} from {} users", ratings, users);
    println!(
        "Rated movies: {} ({:.1}% of the catalog never rated)",
        rated_movies,
        100.0 * (movies.saturating_sub(rated_movies)) as f64 / movies.max(1) as f64
    );
    if users > 0 {
        println!("Ratings per user: {:.1}", ratings as f64 / users as f64);
    }
    println!(
        "\nThroughput: {:.0} ratings/second",
        ratings as f64 / elapsed.as_secs_f64()
    );
}
