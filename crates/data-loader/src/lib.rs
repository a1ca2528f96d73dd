//! # Data Loader Crate
//!
//! Loads the two input tables of the recommender: the movie catalog and the
//! rating log.
//!
//! ## Main Components
//!
//! - **types**: Domain types (Movie, Rating) and the immutable table views
//!   (Catalog, RatingLog, Dataset)
//! - **parser**: Parse MovieLens `.csv` and `.dat` files into Rust structs
//! - **index**: Directory loading and validation
//! - **error**: Error types for data loading
//!
//! ## Example Usage
//!
//! ```ignore
//! use data_loader::Dataset;
//! use std::path::Path;
//!
//! let dataset = Dataset::load_from_dir(Path::new("data/ml-latest-small"))?;
//! dataset.validate()?;
//!
//! let toy_story = dataset.catalog.get_by_title("Toy Story (1995)").unwrap();
//! println!("{} has {} genres", toy_story.title, toy_story.genres.len());
//! ```

pub mod error;
pub mod types;
pub mod parser;
pub mod index;

pub use error::{DataLoadError, Result};
pub use types::{
    // Type aliases
    UserId,
    MovieId,
    // Core types
    Movie,
    Rating,
    // Tables
    Catalog,
    RatingLog,
    Dataset,
};
