//! Core domain types for the movie catalog and the rating log.
//!
//! Both tables are immutable once built: the constructors take ownership of
//! the parsed rows and derive every lookup table up front, and all getters
//! hand out references.

use crate::parser::split_genres;
use std::collections::{BTreeSet, HashMap};
use tracing::warn;

// =============================================================================
// Type Aliases
// =============================================================================

/// Unique identifier for a user
pub type UserId = u32;

/// Unique identifier for a movie
pub type MovieId = u32;

// =============================================================================
// Movie
// =============================================================================

/// Represents a movie in the catalog
#[derive(Debug, Clone, PartialEq)]
pub struct Movie {
    pub id: MovieId,
    /// Title as it appears in the source table, e.g. "Toy Story (1995)".
    /// Used as the secondary lookup key.
    pub title: String,
    /// Genre tokens exactly as written in the source table.
    ///
    /// An empty genre field yields an empty set, not an error.
    pub genres: BTreeSet<String>,
}

impl Movie {
    /// Build a movie from a raw `|`-separated genre field.
    pub fn new(id: MovieId, title: impl Into<String>, genres: &str) -> Self {
        Self {
            id,
            title: title.into(),
            genres: split_genres(genres),
        }
    }
}

// =============================================================================
// Rating
// =============================================================================

/// A single (user, movie, score) observation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rating {
    pub user_id: UserId,
    pub movie_id: MovieId,
    pub rating: f32,
    /// Unix timestamp when present in the source table
    pub timestamp: Option<i64>,
}

impl Rating {
    pub fn new(user_id: UserId, movie_id: MovieId, rating: f32) -> Self {
        Self {
            user_id,
            movie_id,
            rating,
            timestamp: None,
        }
    }
}

// =============================================================================
// Catalog
// =============================================================================

/// Immutable, ordered view over all movies.
///
/// Catalog order is the order rows appeared in the source table; it is the
/// tie-break order used by the content index.
///
/// Titles are expected to be unique. When they are not, title lookup
/// resolves to the *first* movie carrying that title and the later ones are
/// only reachable by id. The same rule applies to duplicate ids.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    movies: Vec<Movie>,
    by_id: HashMap<MovieId, usize>,
    by_title: HashMap<String, usize>,
}

impl Catalog {
    pub fn new(movies: Vec<Movie>) -> Self {
        let mut by_id = HashMap::with_capacity(movies.len());
        let mut by_title = HashMap::with_capacity(movies.len());

        for (position, movie) in movies.iter().enumerate() {
            if by_id.contains_key(&movie.id) {
                warn!("Duplicate movie id {} at row {}, keeping first", movie.id, position);
            } else {
                by_id.insert(movie.id, position);
            }

            if by_title.contains_key(&movie.title) {
                warn!(
                    "Duplicate title {:?} (movie {}), title lookup keeps first",
                    movie.title, movie.id
                );
            } else {
                by_title.insert(movie.title.clone(), position);
            }
        }

        Self {
            movies,
            by_id,
            by_title,
        }
    }

    pub fn len(&self) -> usize {
        self.movies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.movies.is_empty()
    }

    /// Movies in catalog order
    pub fn movies(&self) -> &[Movie] {
        &self.movies
    }

    pub fn iter(&self) -> impl Iterator<Item = &Movie> {
        self.movies.iter()
    }

    pub fn get(&self, id: MovieId) -> Option<&Movie> {
        self.by_id.get(&id).map(|&position| &self.movies[position])
    }

    pub fn get_by_title(&self, title: &str) -> Option<&Movie> {
        self.by_title.get(title).map(|&position| &self.movies[position])
    }

    /// Catalog row of a movie id
    pub fn position(&self, id: MovieId) -> Option<usize> {
        self.by_id.get(&id).copied()
    }

    /// Catalog row a title resolves to
    pub fn position_of_title(&self, title: &str) -> Option<usize> {
        self.by_title.get(title).copied()
    }

    pub fn title_of(&self, id: MovieId) -> Option<&str> {
        self.get(id).map(|movie| movie.title.as_str())
    }

    /// Case-insensitive substring search over titles, in catalog order
    pub fn search(&self, needle: &str) -> Vec<&Movie> {
        let needle = needle.to_lowercase();
        self.movies
            .iter()
            .filter(|movie| movie.title.to_lowercase().contains(&needle))
            .collect()
    }

    /// Every distinct genre token used by the catalog
    pub fn genres(&self) -> BTreeSet<&str> {
        self.movies
            .iter()
            .flat_map(|movie| movie.genres.iter().map(String::as_str))
            .collect()
    }
}

// =============================================================================
// RatingLog
// =============================================================================

/// Immutable view over the rating triples, in source order.
#[derive(Debug, Clone, Default)]
pub struct RatingLog {
    ratings: Vec<Rating>,
    /// All ratings made by each user, in source order
    user_ratings: HashMap<UserId, Vec<Rating>>,
}

impl RatingLog {
    pub fn new(ratings: Vec<Rating>) -> Self {
        let mut user_ratings: HashMap<UserId, Vec<Rating>> = HashMap::new();
        for rating in &ratings {
            user_ratings
                .entry(rating.user_id)
                .or_insert_with(Vec::new)
                .push(*rating);
        }

        Self {
            ratings,
            user_ratings,
        }
    }

    pub fn len(&self) -> usize {
        self.ratings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ratings.is_empty()
    }

    pub fn ratings(&self) -> &[Rating] {
        &self.ratings
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rating> {
        self.ratings.iter()
    }

    /// All ratings made by a user; empty slice for unknown users
    pub fn user_ratings(&self, user_id: UserId) -> &[Rating] {
        self.user_ratings
            .get(&user_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Distinct user ids, ascending
    pub fn user_ids(&self) -> Vec<UserId> {
        let mut ids: Vec<UserId> = self.user_ratings.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Number of distinct users and distinct rated movies
    pub fn counts(&self) -> (usize, usize) {
        let movies: BTreeSet<MovieId> = self.ratings.iter().map(|r| r.movie_id).collect();
        (self.user_ratings.len(), movies.len())
    }
}

// =============================================================================
// Dataset
// =============================================================================

/// The two input tables, loaded together.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub catalog: Catalog,
    pub ratings: RatingLog,
}

impl Dataset {
    pub fn new(catalog: Catalog, ratings: RatingLog) -> Self {
        Self { catalog, ratings }
    }

    /// Movie, rating and distinct user counts for logging
    pub fn counts(&self) -> (usize, usize, usize) {
        let (users, _) = self.ratings.counts();
        (self.catalog.len(), self.ratings.len(), users)
    }
}
