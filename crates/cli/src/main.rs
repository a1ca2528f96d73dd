use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use colored::Colorize;
use data_loader::UserId;
use hybrid::{HybridRecommender, RecommendRequest, RecommenderConfig, RecommenderContext};
use rand::Rng;
use rand::seq::IndexedRandom;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing::info;

/// ReelRecs - Hybrid Movie Recommendation Engine
#[derive(Parser)]
#[command(name = "reel-recs")]
#[command(about = "Movie recommendations from content, collaborative, genre and popularity signals", long_about = None)]
struct Cli {
    /// Path to a MovieLens dataset directory (movies/ratings as .csv or .dat)
    #[arg(short, long, default_value = "data/ml-latest-small")]
    data_dir: PathBuf,

    /// Seed for genre sampling
    #[arg(long, default_value = "42")]
    seed: u64,

    /// Skip checking that every rating references a catalog movie
    #[arg(long)]
    no_validate: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Recommend movies from whatever is known about the user
    Recommend {
        /// User ID (used when the user has ratings)
        #[arg(long)]
        user_id: Option<UserId>,

        /// Movie title to find similar movies for (takes priority)
        #[arg(long)]
        title: Option<String>,

        /// Preferred genres, comma separated
        #[arg(long, value_delimiter = ',')]
        genres: Vec<String>,

        /// Number of recommendations to return
        #[arg(long, default_value = "5")]
        limit: usize,
    },

    /// Movies with the most similar genres to a title
    Similar {
        #[arg(long)]
        title: String,

        #[arg(long, default_value = "5")]
        limit: usize,
    },

    /// Show a user's ratings, nearest users and recommendations
    User {
        #[arg(long)]
        user_id: UserId,

        #[arg(long, default_value = "5")]
        limit: usize,
    },

    /// Most rated movies
    Popular {
        #[arg(long, default_value = "5")]
        limit: usize,
    },

    /// Random movies from the given genres
    Genres {
        #[arg(long, value_delimiter = ',', required = true)]
        genres: Vec<String>,

        #[arg(long, default_value = "5")]
        limit: usize,
    },

    /// Search for movies by title
    Search {
        /// Movie title to search for (case-insensitive substring match)
        #[arg(long)]
        title: String,
    },

    /// Run benchmark to test query performance
    Benchmark {
        /// Number of requests to make
        #[arg(long, default_value = "100")]
        requests: usize,

        /// Number of concurrent requests
        #[arg(long, default_value = "10")]
        concurrent: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = RecommenderConfig::default()
        .with_seed(cli.seed)
        .with_validation(!cli.no_validate);

    // Build every index before serving anything
    println!("Loading dataset from {}...", cli.data_dir.display());
    let start = Instant::now();
    let context = {
        let data_dir = cli.data_dir.clone();
        let config = config.clone();
        tokio::task::spawn_blocking(move || RecommenderContext::load(&data_dir, &config))
            .await
            .context("Index build task panicked")??
    };
    info!(
        movies = context.catalog().len(),
        ratings = context.ratings().len(),
        users = context.collaborative().user_count(),
        "Recommender ready"
    );
    println!("{} Built recommender in {:?}", "✓".green(), start.elapsed());

    let recommender = HybridRecommender::new(Arc::new(context), config);

    match cli.command {
        Commands::Recommend {
            user_id,
            title,
            genres,
            limit,
        } => {
            let request = RecommendRequest {
                user_id,
                title,
                genres,
                k: Some(limit),
            };
            handle_recommend(&recommender, &request)?
        }
        Commands::Similar { title, limit } => handle_recommend(
            &recommender,
            &RecommendRequest::new().with_title(title).with_limit(limit),
        )?,
        Commands::User { user_id, limit } => handle_user(&recommender, user_id, limit)?,
        Commands::Popular { limit } => {
            handle_recommend(&recommender, &RecommendRequest::new().with_limit(limit))?
        }
        Commands::Genres { genres, limit } => handle_recommend(
            &recommender,
            &RecommendRequest::new().with_genres(genres).with_limit(limit),
        )?,
        Commands::Search { title } => handle_search(&recommender, &title),
        Commands::Benchmark {
            requests,
            concurrent,
        } => handle_benchmark(recommender, requests, concurrent).await?,
    }

    Ok(())
}

/// Route a request through the dispatcher and print the result
fn handle_recommend(recommender: &HybridRecommender, request: &RecommendRequest) -> Result<()> {
    let strategy = recommender.plan(request);
    println!("{}", strategy.rationale().bold().blue());

    let titles = recommender.recommend(request)?;
    print_titles(&titles);
    Ok(())
}

/// Handle the 'user' command
fn handle_user(recommender: &HybridRecommender, user_id: UserId, limit: usize) -> Result<()> {
    let context = recommender.context();
    let ratings = context.ratings().user_ratings(user_id);
    if ratings.is_empty() {
        bail!("User {} has no ratings", user_id);
    }

    println!("{}", format!("User ID: {}", user_id).bold().blue());

    let total: f32 = ratings.iter().map(|r| r.rating).sum();
    println!("{}Number of ratings: {}", "• ".cyan(), ratings.len());
    println!("{}Distinct movies rated: {}", "• ".cyan(), context.collaborative().rated_count(user_id));
    println!("{}Average rating: {:.2}", "• ".cyan(), total / ratings.len() as f32);

    let mut top_rated: Vec<_> = ratings.iter().collect();
    top_rated.sort_by(|a, b| {
        b.rating
            .partial_cmp(&a.rating)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    println!("Top rated movies:");
    for rating in top_rated.iter().take(limit) {
        if let Some(title) = context.catalog().title_of(rating.movie_id) {
            println!("  - {} (Rating: {})", title, rating.rating);
        }
    }

    println!("Most similar users:");
    for (other, similarity) in context.collaborative().similar_users(user_id, limit)? {
        println!("  - User {} (cosine {:.3})", other, similarity);
    }

    println!();
    handle_recommend(
        recommender,
        &RecommendRequest::new().with_user(user_id).with_limit(limit),
    )
}

/// Handle the 'search' command
fn handle_search(recommender: &HybridRecommender, title: &str) {
    let context = recommender.context();
    let needle = title.to_lowercase();

    let mut matches = context.catalog().search(title);
    // Exact matches first, then most rated
    matches.sort_by_key(|movie| {
        (
            movie.title.to_lowercase() != needle,
            std::cmp::Reverse(context.popularity().rating_count(movie.id)),
        )
    });

    println!("{}", format!("Search results for '{}':", title).bold().blue());
    if matches.is_empty() {
        println!("  No movies matched.");
    }
    for movie in matches.iter().take(20) {
        let genres = movie.genres.iter().cloned().collect::<Vec<_>>().join(", ");
        println!(
            "{}: {} [{}] ({} ratings)",
            movie.id,
            movie.title,
            genres,
            context.popularity().rating_count(movie.id)
        );
    }
}

/// Handle the 'benchmark' command
async fn handle_benchmark(
    recommender: HybridRecommender,
    requests: usize,
    concurrent: usize,
) -> Result<()> {
    let known_users = recommender.context().ratings().user_ids();
    if known_users.is_empty() || requests == 0 {
        bail!("Benchmark needs at least one rated user and one request");
    }

    let user_ids = benchmark_users(&known_users, requests, &mut rand::rng());
    info!(requests = user_ids.len(), concurrent, "Starting benchmark");

    let permits = Arc::new(Semaphore::new(concurrent.max(1)));
    let started = Instant::now();

    let mut handles = vec![];
    for user in user_ids {
        let recommender = recommender.clone();
        let permit = permits.clone().acquire_owned().await?;
        handles.push(tokio::task::spawn_blocking(move || {
            let _permit = permit;
            let start = Instant::now();
            recommender.recommend(&RecommendRequest::new().with_user(user).with_limit(20))?;
            Ok::<_, anyhow::Error>(start.elapsed())
        }));
    }

    let mut timings: Vec<Duration> = vec![];
    for handle in handles {
        timings.push(handle.await??);
    }
    let wall_time = started.elapsed();

    let total_time: Duration = timings.iter().sum();
    let avg_latency = total_time / timings.len() as u32;
    timings.sort();
    let percentile = |p: f32| timings[((timings.len() as f32 * p) as usize).min(timings.len() - 1)];

    println!("Benchmark results:");
    println!("Wall time: {:?}", wall_time);
    println!("Average latency: {:?}", avg_latency);
    println!("P50 latency: {:?}", percentile(0.50));
    println!("P95 latency: {:?}", percentile(0.95));
    println!("P99 latency: {:?}", percentile(0.99));
    println!(
        "Throughput: {:.2} requests/second",
        timings.len() as f64 / wall_time.as_secs_f64()
    );

    Ok(())
}

/// Random known users, plus one unknown id in ten to exercise fallbacks.
///
/// `known_users` must be ascending, so one past the last id is never rated.
fn benchmark_users<R: Rng + ?Sized>(
    known_users: &[UserId],
    requests: usize,
    rng: &mut R,
) -> Vec<UserId> {
    let unknown_user = known_users.last().and_then(|last| last.checked_add(1));
    (0..requests)
        .filter_map(|i| match unknown_user {
            Some(unknown) if i % 10 == 9 => Some(unknown),
            _ => known_users.choose(&mut *rng).copied(),
        })
        .collect()
}

/// Print a ranked list, or say nothing matched
fn print_titles(titles: &[String]) {
    if titles.is_empty() {
        println!("  No movies matched.");
        return;
    }
    for (rank, title) in titles.iter().enumerate() {
        println!("{}. {}", (rank + 1).to_string().green(), title);
    }
}
