//! Content Similarity - "Because you searched X"
//!
//! Item-to-item recommendations from shared genres.
//!
//! ## Algorithm
//! 1. Collect the genre vocabulary of the whole catalog (tokens lower-cased)
//! 2. Turn each movie's genre set into a binary vector over that vocabulary
//! 3. Compute the item-item cosine similarity matrix once, up front
//! 4. For a query title, rank every other movie by similarity to it;
//!    ties keep catalog order

use crate::error::{RecommendError, Result};
use crate::similarity::{SimilarityMatrix, SparseRow};
use data_loader::{Catalog, MovieId};
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, info, instrument};

/// Item-item similarity index over the catalog's genre vectors
#[derive(Debug, Clone)]
pub struct ContentSimilarityIndex {
    /// Titles in catalog order (row `i` of the matrix is `titles[i]`)
    titles: Vec<String>,
    /// Title -> row; the first movie wins when titles collide
    title_rows: HashMap<String, usize>,
    id_rows: HashMap<MovieId, usize>,
    vocabulary: Vec<String>,
    matrix: SimilarityMatrix,
}

impl ContentSimilarityIndex {
    pub fn build(catalog: &Catalog) -> Self {
        let vocabulary: Vec<String> = catalog
            .iter()
            .flat_map(|movie| movie.genres.iter().map(|g| g.to_lowercase()))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let token_index: HashMap<&str, usize> = vocabulary
            .iter()
            .enumerate()
            .map(|(i, token)| (token.as_str(), i))
            .collect();

        let rows: Vec<SparseRow> = catalog
            .iter()
            .map(|movie| {
                movie
                    .genres
                    .iter()
                    .map(|g| token_index[g.to_lowercase().as_str()])
                    .collect::<BTreeSet<usize>>()
                    .into_iter()
                    .map(|column| (column, 1.0))
                    .collect()
            })
            .collect();

        let matrix = SimilarityMatrix::cosine(&rows);

        let mut title_rows = HashMap::with_capacity(catalog.len());
        let mut id_rows = HashMap::with_capacity(catalog.len());
        for (row, movie) in catalog.iter().enumerate() {
            title_rows.entry(movie.title.clone()).or_insert(row);
            id_rows.entry(movie.id).or_insert(row);
        }

        info!(
            "Built content index: {} movies over {} genre tokens",
            matrix.len(),
            vocabulary.len()
        );

        Self {
            titles: catalog.iter().map(|movie| movie.title.clone()).collect(),
            title_rows,
            id_rows,
            vocabulary,
            matrix,
        }
    }

    /// Up to `k` titles most similar to `title`, most similar first.
    ///
    /// The query movie itself is never returned.
    #[instrument(skip(self))]
    pub fn similar_to(&self, title: &str, k: usize) -> Result<Vec<String>> {
        let row = *self
            .title_rows
            .get(title)
            .ok_or_else(|| RecommendError::TitleNotFound {
                title: title.to_string(),
            })?;

        let similar: Vec<String> = self
            .matrix
            .neighbours(row)
            .into_iter()
            .take(k)
            .map(|other| self.titles[other].clone())
            .collect();

        debug!("Found {} similar movies", similar.len());
        Ok(similar)
    }

    /// Cosine similarity of two movies' genre vectors
    pub fn similarity(&self, a: MovieId, b: MovieId) -> Option<f32> {
        let a = *self.id_rows.get(&a)?;
        let b = *self.id_rows.get(&b)?;
        Some(self.matrix.get(a, b))
    }

    pub fn contains_title(&self, title: &str) -> bool {
        self.title_rows.contains_key(title)
    }

    /// Lower-cased genre tokens, sorted
    pub fn vocabulary(&self) -> &[String] {
        &self.vocabulary
    }

    pub fn len(&self) -> usize {
        self.titles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use data_loader::Movie;

    fn create_test_catalog() -> Catalog {
        Catalog::new(vec![
            Movie::new(1, "A", "Action|Comedy"),
            Movie::new(2, "B", "Action"),
            Movie::new(3, "C", "Comedy"),
        ])
    }

    #[test]
    fn test_tie_keeps_catalog_order() {
        let index = ContentSimilarityIndex::build(&create_test_catalog());

        // B and C both share one genre with A
        assert_eq!(index.similar_to("A", 1).unwrap(), vec!["B"]);
        assert_eq!(index.similar_to("A", 5).unwrap(), vec!["B", "C"]);
    }

    #[test]
    fn test_never_returns_query() {
        let catalog = Catalog::new(vec![
            Movie::new(1, "Twin 1", "Drama"),
            Movie::new(2, "Twin 2", "Drama"),
            Movie::new(3, "Twin 3", "Drama"),
        ]);
        let index = ContentSimilarityIndex::build(&catalog);

        for title in ["Twin 1", "Twin 2", "Twin 3"] {
            for k in 1..=4 {
                let similar = index.similar_to(title, k).unwrap();
                assert!(!similar.iter().any(|t| t == title));
                assert_eq!(similar.len(), k.min(2));
            }
        }
    }

    #[test]
    fn test_unknown_title() {
        let index = ContentSimilarityIndex::build(&create_test_catalog());

        let err = index.similar_to("Nope", 3).unwrap_err();
        assert_eq!(err, RecommendError::TitleNotFound { title: "Nope".to_string() });
    }

    #[test]
    fn test_found_but_empty() {
        let catalog = Catalog::new(vec![Movie::new(1, "Alone", "Drama")]);
        let index = ContentSimilarityIndex::build(&catalog);

        assert!(index.similar_to("Alone", 5).unwrap().is_empty());
        assert!(index.similar_to("Alone", 0).unwrap().is_empty());
    }

    #[test]
    fn test_similarity_matrix_values() {
        let index = ContentSimilarityIndex::build(&create_test_catalog());

        assert_eq!(index.similarity(1, 1), Some(1.0));
        assert_eq!(index.similarity(2, 3), Some(0.0));
        assert_eq!(index.similarity(1, 2), index.similarity(2, 1));
        assert_eq!(index.similarity(1, 99), None);
        assert_eq!(index.vocabulary(), &["action", "comedy"]);
    }

    #[test]
    fn test_movie_without_genres() {
        let catalog = Catalog::new(vec![
            Movie::new(1, "Untagged", ""),
            Movie::new(2, "Tagged", "Horror"),
        ]);
        let index = ContentSimilarityIndex::build(&catalog);

        assert_eq!(index.similar_to("Untagged", 3).unwrap(), vec!["Tagged"]);
        assert_eq!(index.similarity(1, 1), Some(0.0));
    }
}
