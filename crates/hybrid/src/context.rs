//! # Recommender Context
//!
//! Owns the two input tables and every structure derived from them:
//! 1. Content similarity index (item x item)
//! 2. Collaborative filter (user x item ratings, user x user similarity)
//! 3. Popularity ranking
//! 4. Genre filter
//!
//! A context only exists once all four are fully built, which makes
//! construction the one-time barrier before any query is served. After
//! that it is read-only and is shared between requests behind an `Arc`.

use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::info;

use data_loader::{Catalog, Dataset, RatingLog};
use sources::{CollaborativeFilter, ContentSimilarityIndex, GenreFilter, PopularityRanker};

/// Settings for building and querying the recommender
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecommenderConfig {
    /// Number of titles returned when a request does not ask for a count
    pub default_k: usize,
    /// Base seed for genre sampling; each request derives its own stream
    pub seed: u64,
    /// Reject datasets whose ratings reference unknown movies
    pub validate: bool,
}

impl Default for RecommenderConfig {
    fn default() -> Self {
        Self {
            default_k: 5,
            seed: 42,
            validate: true,
        }
    }
}

impl RecommenderConfig {
    /// Configure the default result count (default: 5)
    pub fn with_default_k(mut self, k: usize) -> Self {
        self.default_k = k;
        self
    }

    /// Configure the sampling seed (default: 42)
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Enable or disable dataset validation on load (default: on)
    pub fn with_validation(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }
}

/// Fully built, immutable recommender state
#[derive(Debug)]
pub struct RecommenderContext {
    dataset: Dataset,
    content: ContentSimilarityIndex,
    collaborative: CollaborativeFilter,
    popularity: PopularityRanker,
    genres: GenreFilter,
}

impl RecommenderContext {
    /// Build every strategy from the dataset.
    ///
    /// The two O(n^2) similarity matrices are built concurrently with
    /// `rayon::join`; the cheap aggregations run alongside them.
    pub fn build(dataset: Dataset) -> Self {
        let start = Instant::now();

        let ((content, collaborative), (popularity, genres)) = rayon::join(
            || {
                rayon::join(
                    || ContentSimilarityIndex::build(&dataset.catalog),
                    || CollaborativeFilter::build(&dataset.ratings, &dataset.catalog),
                )
            },
            || {
                (
                    PopularityRanker::build(&dataset.ratings, &dataset.catalog),
                    GenreFilter::build(&dataset.catalog),
                )
            },
        );

        info!("Recommender context built in {:.2?}", start.elapsed());

        Self {
            dataset,
            content,
            collaborative,
            popularity,
            genres,
        }
    }

    /// Load a MovieLens directory and build the context from it
    pub fn load(data_dir: &Path, config: &RecommenderConfig) -> Result<Self> {
        let dataset = Dataset::load_from_dir(data_dir)
            .with_context(|| format!("Failed to load dataset from {}", data_dir.display()))?;

        if config.validate {
            dataset.validate().context("Dataset failed validation")?;
        }

        Ok(Self::build(dataset))
    }

    pub fn catalog(&self) -> &Catalog {
        &self.dataset.catalog
    }

    pub fn ratings(&self) -> &RatingLog {
        &self.dataset.ratings
    }

    pub fn content(&self) -> &ContentSimilarityIndex {
        &self.content
    }

    pub fn collaborative(&self) -> &CollaborativeFilter {
        &self.collaborative
    }

    pub fn popularity(&self) -> &PopularityRanker {
        &self.popularity
    }

    pub fn genre_filter(&self) -> &GenreFilter {
        &self.genres
    }
}
