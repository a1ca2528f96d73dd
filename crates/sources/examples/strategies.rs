//! Example: Run every strategy once
//!
//! Run with: cargo run --package sources --example strategies
//!
//! This example shows how to:
//! 1. Load the MovieLens dataset
//! 2. Build the content index and the collaborative filter
//! 3. Query each of the four strategies
//! 4. Display the results with timings

use data_loader::Dataset;
use rand::SeedableRng;
use rand::rngs::StdRng;
use sources::{CollaborativeFilter, ContentSimilarityIndex, GenreFilter, PopularityRanker};
use std::path::Path;
use std::time::Instant;

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter("info")
        .init();

    println!("=== ReelRecs Strategy Example ===\n");

    // Load dataset
    println!("Loading MovieLens dataset...");
    let start = Instant::now();
    let dataset = Dataset::load_from_dir(Path::new("data/ml-latest-small"))?;
    println!("Loaded dataset in {:?}\n", start.elapsed());

    // Build the similarity indices
    let start = Instant::now();
    let content = ContentSimilarityIndex::build(&dataset.catalog);
    let content_time = start.elapsed();

    let start = Instant::now();
    let collaborative = CollaborativeFilter::build(&dataset.ratings, &dataset.catalog);
    let collaborative_time = start.elapsed();

    println!("Content index: {} movies in {:?}", content.len(), content_time);
    println!(
        "Collaborative filter: {} users in {:?}\n",
        collaborative.user_count(),
        collaborative_time
    );

    let title = "Toy Story (1995)";
    println!("Because you searched '{}':", title);
    match content.similar_to(title, 5) {
        Ok(similar) => print_titles(&similar),
        Err(e) => println!("  {}", e),
    }

    let user_id = 1;
    println!("\nPersonalized recommendations for User {}:", user_id);
    match collaborative.recommend_for(user_id, 5) {
        Ok(recs) => print_titles(&recs),
        Err(e) => println!("  {}", e),
    }
    for (other, similarity) in collaborative.similar_users(user_id, 3)? {
        println!("     - similar to user {} ({:.3})", other, similarity);
    }

    let genres = ["Comedy", "Romance"];
    println!("\nBecause you like {:?}:", genres);
    let mut rng = StdRng::seed_from_u64(42);
    print_titles(&GenreFilter::build(&dataset.catalog).sample(genres, 5, &mut rng));

    println!("\nNew user detected! Showing popular movies:");
    print_titles(&PopularityRanker::build(&dataset.ratings, &dataset.catalog).top_popular(5));

    Ok(())
}

fn print_titles(titles: &[String]) {
    if titles.is_empty() {
        println!("  (no matches)");
    }
    for (i, title) in titles.iter().enumerate() {
        println!("  {}. {}", i + 1, title);
    }
}
