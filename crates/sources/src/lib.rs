//! # Sources Crate
//!
//! The four recommendation strategies and the similarity kernel they share.
//!
//! ## Components
//!
//! ### Content similarity
//! Item-to-item cosine similarity over genre vectors:
//! - "Because you searched X..."
//!
//! ### Collaborative filtering
//! User-to-user cosine similarity over the rating matrix:
//! - "Users who rate like you also watched..."
//!
//! ### Popularity
//! Most rated movies, the fallback when nothing is known about the user.
//!
//! ### Genre sampling
//! Random movies from the genres a new user picked.
//!
//! ## Example Usage
//!
//! ```ignore
//! use sources::{CollaborativeFilter, ContentSimilarityIndex, GenreFilter, PopularityRanker};
//! use data_loader::Dataset;
//! use rand::SeedableRng;
//!
//! let dataset = Dataset::load_from_dir("data/ml-latest-small".as_ref())?;
//!
//! let content = ContentSimilarityIndex::build(&dataset.catalog);
//! let collaborative = CollaborativeFilter::build(&dataset.ratings, &dataset.catalog);
//!
//! let similar = content.similar_to("Toy Story (1995)", 5)?;
//! let personal = collaborative.recommend_for(1, 5)?;
//!
//! let popular = PopularityRanker::build(&dataset.ratings, &dataset.catalog).top_popular(5);
//! let mut rng = rand::rngs::StdRng::seed_from_u64(42);
//! let picks = GenreFilter::build(&dataset.catalog).sample(["Comedy"], 5, &mut rng);
//! ```
//!
//! Every strategy is built once and only read afterwards: all query
//! methods take `&self`, so a built strategy can be shared across threads.

pub mod error;
pub mod similarity;
pub mod content;
pub mod collaborative;
pub mod popularity;
pub mod genre;

// Re-export commonly used types
pub use error::{RecommendError, Result};
pub use similarity::{SimilarityMatrix, SparseRow};
pub use content::ContentSimilarityIndex;
pub use collaborative::{CollaborativeFilter, UserItemMatrix};
pub use popularity::PopularityRanker;
pub use genre::GenreFilter;
