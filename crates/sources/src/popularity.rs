//! Popularity ranking - the cold-start fallback.
//!
//! Movies are ranked by how many ratings they received. Every row of the
//! log counts, so repeated ratings by one user count more than once. Equal
//! counts are ordered by ascending movie id.

use data_loader::{Catalog, MovieId, RatingLog};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info, instrument};

/// Precomputed popularity ordering of every rated movie with a title
#[derive(Debug, Clone, Default)]
pub struct PopularityRanker {
    /// `(movie, title, rating count)`, most rated first
    ranked: Vec<(MovieId, String, usize)>,
    counts: HashMap<MovieId, usize>,
}

impl PopularityRanker {
    pub fn build(log: &RatingLog, catalog: &Catalog) -> Self {
        // BTreeMap keeps ids ascending, so the stable sort below breaks
        // ties by id
        let mut counts: BTreeMap<MovieId, usize> = BTreeMap::new();
        for rating in log.iter() {
            *counts.entry(rating.movie_id).or_insert(0) += 1;
        }

        let mut ranked: Vec<(MovieId, String, usize)> = counts
            .into_iter()
            .filter_map(|(id, count)| {
                catalog
                    .title_of(id)
                    .map(|title| (id, title.to_string(), count))
            })
            .collect();
        ranked.sort_by(|a, b| b.2.cmp(&a.2));
        let counts = ranked.iter().map(|(id, _, count)| (*id, *count)).collect();

        info!("Built popularity ranking over {} movies", ranked.len());
        Self { ranked, counts }
    }

    /// The `k` most rated titles
    #[instrument(skip(self))]
    pub fn top_popular(&self, k: usize) -> Vec<String> {
        let top: Vec<String> = self
            .ranked
            .iter()
            .take(k)
            .map(|(_, title, _)| title.clone())
            .collect();
        debug!("Returning {} popular movies", top.len());
        top
    }

    /// Rating count of a movie; 0 when it was never rated
    pub fn rating_count(&self, movie: MovieId) -> usize {
        self.counts.get(&movie).copied().unwrap_or(0)
    }

    /// Number of distinct rated movies in the ranking
    pub fn len(&self) -> usize {
        self.ranked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranked.is_empty()
    }
}
