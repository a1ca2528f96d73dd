//! Hybrid crate for the ReelRecs recommendation engine.
//!
//! This crate owns the built recommender state and routes each request to
//! exactly one of the strategies in the `sources` crate.

pub mod context;
pub mod dispatcher;

pub use context::{RecommenderConfig, RecommenderContext};
pub use dispatcher::{HybridRecommender, RecommendRequest, Strategy};
