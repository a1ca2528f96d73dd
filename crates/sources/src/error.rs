//! Errors surfaced by the recommendation strategies.
//!
//! Only lookups of a named entity fail. A valid query that matches nothing
//! returns an empty list instead.

use data_loader::UserId;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecommendError {
    /// The title is not in the catalog
    #[error("Movie not found in dataset: {title}")]
    TitleNotFound { title: String },

    /// The user has no row in the user-item matrix
    #[error("User {user_id} has no ratings")]
    UserNotFound { user_id: UserId },
}

pub type Result<T> = std::result::Result<T, RecommendError>;
