//! Loading and validating the input tables.
//!
//! The catalog and the rating log are parsed in parallel with Rayon, then
//! wrapped in their immutable views.

use crate::error::{DataLoadError, Result};
use crate::parser;
use crate::types::*;
use std::path::{Path, PathBuf};
use tracing::info;

impl Catalog {
    /// Load a catalog from a `.csv` or `.dat` movie table
    pub fn load(path: &Path) -> Result<Self> {
        Ok(Catalog::new(parser::parse_movies(path)?))
    }
}

impl RatingLog {
    /// Load a rating log from a `.csv` or `.dat` rating table
    pub fn load(path: &Path) -> Result<Self> {
        Ok(RatingLog::new(parser::parse_ratings(path)?))
    }
}

impl Dataset {
    /// Load both tables from a MovieLens directory.
    ///
    /// `movies.csv`/`ratings.csv` are preferred; `movies.dat`/`ratings.dat`
    /// are used when the CSV pair is absent.
    pub fn load_from_dir(data_dir: &Path) -> Result<Self> {
        info!("Loading dataset from {:?}", data_dir);

        let movies_path = locate(data_dir, "movies")?;
        let ratings_path = locate(data_dir, "ratings")?;

        let (catalog, ratings) = rayon::join(
            || Catalog::load(&movies_path),
            || RatingLog::load(&ratings_path),
        );
        let dataset = Dataset::new(catalog?, ratings?);

        let (movies, ratings, users) = dataset.counts();
        info!("Loaded {} movies, {} ratings from {} users", movies, ratings, users);
        Ok(dataset)
    }

    /// Check that every rating references a catalog movie and carries a
    /// finite score.
    pub fn validate(&self) -> Result<()> {
        for rating in self.ratings.iter() {
            if self.catalog.get(rating.movie_id).is_none() {
                return Err(DataLoadError::MissingReference {
                    entity: "Movie".to_string(),
                    id: rating.movie_id,
                });
            }
            if !rating.rating.is_finite() {
                return Err(DataLoadError::InvalidValue {
                    field: "rating".to_string(),
                    value: rating.rating.to_string(),
                });
            }
        }
        Ok(())
    }
}

fn locate(data_dir: &Path, stem: &str) -> Result<PathBuf> {
    ["csv", "dat"]
        .iter()
        .map(|ext| data_dir.join(format!("{}.{}", stem, ext)))
        .find(|path| path.exists())
        .ok_or_else(|| DataLoadError::FileNotFound {
            path: data_dir.join(format!("{}.csv", stem)).display().to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_load_from_dir_prefers_csv() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("movies.csv"),
            "movieId,title,genres\n1,A,Action|Comedy\n2,B,Action\n",
        )
        .unwrap();
        fs::write(dir.path().join("ratings.csv"), "userId,movieId,rating\n7,1,4.0\n").unwrap();
        fs::write(dir.path().join("movies.dat"), "not::used").unwrap();

        let dataset = Dataset::load_from_dir(dir.path()).unwrap();
        assert_eq!(dataset.catalog.len(), 2);
        assert_eq!(dataset.ratings.len(), 1);
        assert!(dataset.validate().is_ok());
    }

    #[test]
    fn test_load_from_dir_falls_back_to_dat() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("movies.dat"), "1::A::Drama\n").unwrap();
        fs::write(dir.path().join("ratings.dat"), "3::1::5::0\n").unwrap();

        let dataset = Dataset::load_from_dir(dir.path()).unwrap();
        assert_eq!(dataset.catalog.title_of(1), Some("A"));
        assert_eq!(dataset.ratings.user_ratings(3).len(), 1);
    }

    #[test]
    fn test_load_from_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let err = Dataset::load_from_dir(dir.path()).unwrap_err();
        assert!(matches!(err, DataLoadError::FileNotFound { .. }));
    }

    #[test]
    fn test_validate_missing_movie() {
        let dataset = Dataset::new(
            Catalog::new(vec![Movie::new(1, "A", "Drama")]),
            RatingLog::new(vec![Rating::new(1, 2, 3.0)]),
        );

        let err = dataset.validate().unwrap_err();
        assert!(matches!(err, DataLoadError::MissingReference { id: 2, .. }));
    }
}
