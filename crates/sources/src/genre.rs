//! Genre sampling - "Because you like ..."
//!
//! A movie matches when its genre set shares at least one token with the
//! preferred genres (compared case-insensitively). A uniform sample without
//! replacement is drawn from the matches using the caller's random source.

use data_loader::Catalog;
use rand::Rng;
use rand::seq::IndexedRandom;
use std::collections::BTreeSet;
use tracing::{debug, instrument};

#[derive(Debug, Clone, Default)]
pub struct GenreFilter {
    /// `(title, lower-cased genres)` in catalog order
    movies: Vec<(String, BTreeSet<String>)>,
}

impl GenreFilter {
    pub fn build(catalog: &Catalog) -> Self {
        Self {
            movies: catalog
                .iter()
                .map(|movie| {
                    let genres = movie.genres.iter().map(|g| g.to_lowercase()).collect();
                    (movie.title.clone(), genres)
                })
                .collect(),
        }
    }

    /// Every title whose genres intersect `preferred`, in catalog order
    pub fn matches<I, S>(&self, preferred: I) -> Vec<&str>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let preferred: BTreeSet<String> = preferred
            .into_iter()
            .map(|g| g.as_ref().trim().to_lowercase())
            .filter(|g| !g.is_empty())
            .collect();

        self.movies
            .iter()
            .filter(|(_, genres)| !genres.is_disjoint(&preferred))
            .map(|(title, _)| title.as_str())
            .collect()
    }

    /// `min(k, matches)` distinct matching titles drawn uniformly at random.
    ///
    /// The result order is whatever the draw produced; it carries no rank.
    #[instrument(skip(self, preferred, rng))]
    pub fn sample<I, S, R>(&self, preferred: I, k: usize, rng: &mut R) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        R: Rng + ?Sized,
    {
        let matches = self.matches(preferred);
        let sample: Vec<String> = matches
            .choose_multiple(rng, k)
            .map(|title| title.to_string())
            .collect();

        debug!("Sampled {} of {} matching movies", sample.len(), matches.len());
        sample
    }
}
