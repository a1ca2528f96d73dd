//! Collaborative Filtering - "Users who rate like you also watched..."
//!
//! ## Algorithm
//! 1. Pivot the rating log into a user x item matrix. A missing rating is
//!    `None`, never `0.0`.
//! 2. Compute user-user cosine similarity over the rows. Missing ratings
//!    count as zero *for this step only*; this is an approximation (an
//!    unrated item reads as "rated zero"), not a claim about the user.
//! 3. For a target user, walk the other users from most to least similar
//!    and collect every item they rated that the target has not, scored by
//!    the neighbour's rating.
//! 4. Stop walking as soon as a finished neighbour brings the pool to at
//!    least `k` candidates. This bounds the work on large logs but means a
//!    better candidate held by a less similar user can be missed.
//! 5. Stable-sort the pool by score, highest first, and keep `k`.
//!
//! An item offered by several neighbours appears once per neighbour; the
//! pool is not deduplicated.

use crate::error::{RecommendError, Result};
use crate::similarity::{SimilarityMatrix, SparseRow};
use data_loader::{Catalog, MovieId, RatingLog, UserId};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{debug, info, instrument, warn};

// =============================================================================
// UserItemMatrix
// =============================================================================

/// Sparse user x item rating table.
///
/// Rows are users in ascending id order, columns are items in ascending id
/// order. When the log holds several ratings for the same (user, item), the
/// last one in log order is kept.
#[derive(Debug, Clone, Default)]
pub struct UserItemMatrix {
    users: Vec<UserId>,
    user_rows: HashMap<UserId, usize>,
    items: Vec<MovieId>,
    item_columns: HashMap<MovieId, usize>,
    /// Per user: `(column, rating)` sorted by column
    rows: Vec<SparseRow>,
}

impl UserItemMatrix {
    pub fn from_log(log: &RatingLog) -> Self {
        let mut pivot: BTreeMap<UserId, BTreeMap<MovieId, f32>> = BTreeMap::new();
        let mut overwritten = 0usize;
        for rating in log.iter() {
            let previous = pivot
                .entry(rating.user_id)
                .or_default()
                .insert(rating.movie_id, rating.rating);
            if previous.is_some() {
                overwritten += 1;
            }
        }
        if overwritten > 0 {
            warn!("{} repeated (user, movie) ratings, keeping the last of each", overwritten);
        }

        let items: Vec<MovieId> = pivot
            .values()
            .flat_map(|row| row.keys().copied())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let item_columns: HashMap<MovieId, usize> = items
            .iter()
            .enumerate()
            .map(|(column, &id)| (id, column))
            .collect();

        let mut users = Vec::with_capacity(pivot.len());
        let mut rows = Vec::with_capacity(pivot.len());
        for (user_id, ratings) in pivot {
            users.push(user_id);
            rows.push(
                ratings
                    .into_iter()
                    .map(|(movie_id, score)| (item_columns[&movie_id], score))
                    .collect(),
            );
        }
        let user_rows = users
            .iter()
            .enumerate()
            .map(|(row, &id)| (id, row))
            .collect();

        Self {
            users,
            user_rows,
            items,
            item_columns,
            rows,
        }
    }

    /// The rating `user` gave `item`, or `None` when absent.
    ///
    /// `Some(0.0)` is a real zero rating and is not the same as `None`.
    pub fn rating(&self, user: UserId, item: MovieId) -> Option<f32> {
        let row = *self.user_rows.get(&user)?;
        let column = *self.item_columns.get(&item)?;
        lookup(&self.rows[row], column)
    }

    pub fn contains_user(&self, user: UserId) -> bool {
        self.user_rows.contains_key(&user)
    }

    /// Users in row order (ascending id)
    pub fn users(&self) -> &[UserId] {
        &self.users
    }

    /// Items in column order (ascending id)
    pub fn items(&self) -> &[MovieId] {
        &self.items
    }

    /// Number of items `user` has rated
    pub fn rated_count(&self, user: UserId) -> usize {
        self.user_rows
            .get(&user)
            .map(|&row| self.rows[row].len())
            .unwrap_or(0)
    }

    fn row_of(&self, user: UserId) -> Option<usize> {
        self.user_rows.get(&user).copied()
    }
}

fn lookup(row: &[(usize, f32)], column: usize) -> Option<f32> {
    row.binary_search_by_key(&column, |&(c, _)| c)
        .ok()
        .map(|position| row[position].1)
}

// =============================================================================
// CollaborativeFilter
// =============================================================================

/// User-based collaborative filter over a dense user-user similarity matrix
#[derive(Debug, Clone)]
pub struct CollaborativeFilter {
    ratings: UserItemMatrix,
    similarity: SimilarityMatrix,
    titles: HashMap<MovieId, String>,
}

impl CollaborativeFilter {
    pub fn build(log: &RatingLog, catalog: &Catalog) -> Self {
        let ratings = UserItemMatrix::from_log(log);
        let similarity = SimilarityMatrix::cosine(&ratings.rows);

        let titles: HashMap<MovieId, String> = ratings
            .items
            .iter()
            .filter_map(|&id| catalog.title_of(id).map(|title| (id, title.to_string())))
            .collect();
        if titles.len() < ratings.items.len() {
            warn!(
                "{} rated movies have no catalog entry and will never be recommended",
                ratings.items.len() - titles.len()
            );
        }

        info!(
            "Built collaborative filter: {} users x {} movies",
            ratings.users.len(),
            ratings.items.len()
        );

        Self {
            ratings,
            similarity,
            titles,
        }
    }

    /// Whether the user has a row in the user-item matrix
    pub fn knows_user(&self, user: UserId) -> bool {
        self.ratings.contains_user(user)
    }

    /// Up to `k` titles the user has not rated, best first
    #[instrument(skip(self))]
    pub fn recommend_for(&self, user: UserId, k: usize) -> Result<Vec<String>> {
        let row = self
            .ratings
            .row_of(user)
            .ok_or(RecommendError::UserNotFound { user_id: user })?;
        if k == 0 {
            return Ok(Vec::new());
        }

        let mut candidates = self.collect_candidates(row, k);
        candidates.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

        let recommendations: Vec<String> = candidates
            .into_iter()
            .filter_map(|(column, _)| {
                let movie_id = self.ratings.items[column];
                let title = self.titles.get(&movie_id);
                if title.is_none() {
                    debug!("Skipping movie {} without a catalog title", movie_id);
                }
                title.cloned()
            })
            .take(k)
            .collect();

        debug!("Recommending {} movies", recommendations.len());
        Ok(recommendations)
    }

    /// Candidate pool for the user at `row`: `(column, neighbour rating)`
    /// in collection order.
    fn collect_candidates(&self, row: usize, k: usize) -> Vec<(usize, f32)> {
        let seen = &self.ratings.rows[row];
        let mut candidates = Vec::new();
        let mut walked = 0usize;

        for neighbour in self.similarity.neighbours(row) {
            walked += 1;
            candidates.extend(
                self.ratings.rows[neighbour]
                    .iter()
                    .filter(|&&(column, _)| lookup(seen, column).is_none())
                    .copied(),
            );
            if candidates.len() >= k {
                break;
            }
        }

        debug!(
            "Collected {} candidates from {} similar users",
            candidates.len(),
            walked
        );
        candidates
    }

    /// The rating `user` gave `item`; `None` when absent
    pub fn rating(&self, user: UserId, item: MovieId) -> Option<f32> {
        self.ratings.rating(user, item)
    }

    /// Cosine similarity of two users' rating rows
    pub fn user_similarity(&self, a: UserId, b: UserId) -> Option<f32> {
        let a = self.ratings.row_of(a)?;
        let b = self.ratings.row_of(b)?;
        Some(self.similarity.get(a, b))
    }

    /// Users most similar to `user`, most similar first
    pub fn similar_users(&self, user: UserId, limit: usize) -> Result<Vec<(UserId, f32)>> {
        let row = self
            .ratings
            .row_of(user)
            .ok_or(RecommendError::UserNotFound { user_id: user })?;
        Ok(self
            .similarity
            .neighbours(row)
            .into_iter()
            .take(limit)
            .map(|other| (self.ratings.users[other], self.similarity.get(row, other)))
            .collect())
    }

    pub fn user_count(&self) -> usize {
        self.ratings.users.len()
    }

    pub fn rated_count(&self, user: UserId) -> usize {
        self.ratings.rated_count(user)
    }
}
