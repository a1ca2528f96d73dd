//! # Hybrid Dispatcher
//!
//! Picks exactly one strategy per request, in fixed priority order:
//! 1. A title was given -> content similarity
//! 2. A user id was given and the user has ratings -> collaborative filter
//! 3. Preferred genres were given -> genre sampling
//! 4. Otherwise -> most popular movies (cold start)
//!
//! The choice depends only on the request and on whether the collaborative
//! filter knows the user. An unknown user is not an error here: the request
//! falls through to the genre or popularity branch. Errors from the chosen
//! branch are returned unchanged.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, instrument};

use data_loader::UserId;
use sources::Result;

use crate::context::{RecommenderConfig, RecommenderContext};

/// Everything a caller may know about the person asking
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecommendRequest {
    pub user_id: Option<UserId>,
    pub title: Option<String>,
    pub genres: Vec<String>,
    /// Number of titles wanted; the configured default when `None`
    pub k: Option<usize>,
}

impl RecommendRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_genres<I, S>(mut self, genres: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.genres = genres.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_limit(mut self, k: usize) -> Self {
        self.k = Some(k);
        self
    }

    /// The title, ignoring blank strings
    fn search_title(&self) -> Option<&str> {
        self.title.as_deref().filter(|t| !t.trim().is_empty())
    }

    /// Non-blank genres
    fn preferred_genres(&self) -> Vec<String> {
        self.genres
            .iter()
            .map(|g| g.trim())
            .filter(|g| !g.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// The branch a request was routed to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Strategy {
    Content { title: String },
    Collaborative { user_id: UserId },
    Genre { genres: Vec<String> },
    Popular,
}

impl Strategy {
    pub fn name(&self) -> &'static str {
        match self {
            Strategy::Content { .. } => "content",
            Strategy::Collaborative { .. } => "collaborative",
            Strategy::Genre { .. } => "genre",
            Strategy::Popular => "popular",
        }
    }

    /// Human-readable reason for the choice
    pub fn rationale(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Content { title } => write!(f, "Because you searched '{}':", title),
            Strategy::Collaborative { user_id } => {
                write!(f, "Personalized recommendations for User {}:", user_id)
            }
            Strategy::Genre { genres } => write!(f, "Because you like {:?}:", genres),
            Strategy::Popular => write!(f, "New user detected! Showing popular movies:"),
        }
    }
}

/// Entry point for recommendation requests.
///
/// Cloning is cheap and clones share the built context and the request
/// counter used to derive sampling seeds.
#[derive(Debug, Clone)]
pub struct HybridRecommender {
    context: Arc<RecommenderContext>,
    config: RecommenderConfig,
    requests: Arc<AtomicU64>,
}

impl HybridRecommender {
    pub fn new(context: Arc<RecommenderContext>, config: RecommenderConfig) -> Self {
        Self {
            context,
            config,
            requests: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn context(&self) -> &RecommenderContext {
        &self.context
    }

    pub fn config(&self) -> &RecommenderConfig {
        &self.config
    }

    /// Decide which strategy serves `request`, without running it
    pub fn plan(&self, request: &RecommendRequest) -> Strategy {
        if let Some(title) = request.search_title() {
            return Strategy::Content {
                title: title.to_string(),
            };
        }

        if let Some(user_id) = request.user_id {
            if self.context.collaborative().knows_user(user_id) {
                return Strategy::Collaborative { user_id };
            }
            debug!("User {} has no ratings, falling through", user_id);
        }

        let genres = request.preferred_genres();
        if !genres.is_empty() {
            return Strategy::Genre { genres };
        }

        Strategy::Popular
    }

    /// Recommend titles, seeding genre sampling from the configured seed
    /// and a per-recommender request counter.
    pub fn recommend(&self, request: &RecommendRequest) -> Result<Vec<String>> {
        let mut rng = self.next_rng();
        self.recommend_with_rng(request, &mut rng)
    }

    /// Recommend titles using the caller's random source for genre sampling
    #[instrument(skip(self, request, rng), fields(strategy = tracing::field::Empty))]
    pub fn recommend_with_rng<R: Rng + ?Sized>(
        &self,
        request: &RecommendRequest,
        rng: &mut R,
    ) -> Result<Vec<String>> {
        let k = request.k.unwrap_or(self.config.default_k);
        let strategy = self.plan(request);
        tracing::Span::current().record("strategy", strategy.name());
        info!("{}", strategy.rationale());

        let titles = match &strategy {
            Strategy::Content { title } => self.context.content().similar_to(title, k)?,
            Strategy::Collaborative { user_id } => {
                self.context.collaborative().recommend_for(*user_id, k)?
            }
            Strategy::Genre { genres } => self.context.genre_filter().sample(genres, k, rng),
            Strategy::Popular => self.context.popularity().top_popular(k),
        };

        debug!("Returning {} titles", titles.len());
        Ok(titles)
    }

    /// Movies similar to `title` (default count)
    pub fn similar_to(&self, title: &str) -> Result<Vec<String>> {
        self.context.content().similar_to(title, self.config.default_k)
    }

    /// Collaborative recommendations for `user_id` (default count)
    pub fn recommend_for(&self, user_id: UserId) -> Result<Vec<String>> {
        self.context
            .collaborative()
            .recommend_for(user_id, self.config.default_k)
    }

    /// Most rated movies (default count)
    pub fn top_popular(&self) -> Vec<String> {
        self.context.popularity().top_popular(self.config.default_k)
    }

    /// Random movies from `genres` (default count), seeded like `recommend`
    pub fn sample<I, S>(&self, genres: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut rng = self.next_rng();
        self.context
            .genre_filter()
            .sample(genres, self.config.default_k, &mut rng)
    }

    fn next_rng(&self) -> StdRng {
        let n = self.requests.fetch_add(1, Ordering::Relaxed);
        StdRng::seed_from_u64(self.config.seed.wrapping_add(n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use data_loader::{Catalog, Dataset, Movie, Rating, RatingLog};
    use sources::RecommendError;

    fn build_test_recommender() -> HybridRecommender {
        let dataset = Dataset::new(
            Catalog::new(vec![
                Movie::new(1, "A", "Action|Comedy"),
                Movie::new(2, "B", "Action"),
                Movie::new(3, "C", "Comedy"),
                Movie::new(4, "D", "Drama"),
            ]),
            RatingLog::new(vec![
                Rating::new(1, 1, 5.0),
                Rating::new(2, 1, 4.0),
                Rating::new(2, 4, 3.0),
                Rating::new(3, 4, 2.0),
            ]),
        );
        HybridRecommender::new(
            Arc::new(RecommenderContext::build(dataset)),
            RecommenderConfig::default(),
        )
    }

    #[test]
    fn test_plan_priority() {
        let recommender = build_test_recommender();

        let everything = RecommendRequest::new()
            .with_title("A")
            .with_user(1)
            .with_genres(["Drama"]);
        assert_eq!(
            recommender.plan(&everything),
            Strategy::Content { title: "A".to_string() }
        );

        let user_and_genres = RecommendRequest::new().with_user(1).with_genres(["Drama"]);
        assert_eq!(
            recommender.plan(&user_and_genres),
            Strategy::Collaborative { user_id: 1 }
        );

        let unknown_user = RecommendRequest::new().with_user(99).with_genres(["Drama"]);
        assert_eq!(
            recommender.plan(&unknown_user),
            Strategy::Genre { genres: vec!["Drama".to_string()] }
        );

        assert_eq!(recommender.plan(&RecommendRequest::new().with_user(99)), Strategy::Popular);
        assert_eq!(recommender.plan(&RecommendRequest::new()), Strategy::Popular);
    }

    #[test]
    fn test_blank_inputs_are_ignored() {
        let recommender = build_test_recommender();

        let request = RecommendRequest::new().with_title("  ").with_genres(["", " "]);
        assert_eq!(recommender.plan(&request), Strategy::Popular);
    }

    #[test]
    fn test_title_wins_over_user() {
        let recommender = build_test_recommender();

        let request = RecommendRequest::new().with_title("A").with_user(1).with_limit(1);
        let direct = recommender.context().content().similar_to("A", 1).unwrap();
        assert_eq!(recommender.recommend(&request).unwrap(), direct);
        assert_eq!(direct, vec!["B"]);
    }

    #[test]
    fn test_content_error_is_forwarded() {
        let recommender = build_test_recommender();

        let request = RecommendRequest::new().with_title("Missing").with_user(1);
        assert_eq!(
            recommender.recommend(&request),
            Err(RecommendError::TitleNotFound { title: "Missing".to_string() })
        );
    }

    #[test]
    fn test_unknown_user_falls_back_to_popular() {
        let recommender = build_test_recommender();

        let request = RecommendRequest::new().with_user(42).with_limit(2);
        assert_eq!(recommender.recommend(&request).unwrap(), vec!["A", "D"]);
    }

    #[test]
    fn test_missing_limit_uses_default_k() {
        let dataset = Dataset::new(
            Catalog::new((1..=12).map(|id| Movie::new(id, format!("M{}", id), "Drama")).collect()),
            RatingLog::new(
                (1..=12)
                    .map(|id| Rating::new(2, id, 4.0))
                    .chain([Rating::new(1, 1, 5.0)])
                    .collect(),
            ),
        );
        let recommender = HybridRecommender::new(
            Arc::new(RecommenderContext::build(dataset)),
            RecommenderConfig::default(),
        );

        let personal = recommender
            .recommend(&RecommendRequest::new().with_user(1))
            .unwrap();
        assert!(!personal.is_empty());
        assert!(personal.len() <= 5);
        assert_eq!(recommender.recommend(&RecommendRequest::new()).unwrap().len(), 5);

        let zero = RecommendRequest::new().with_user(1).with_limit(0);
        assert_eq!(recommender.recommend(&zero), Ok(Vec::new()));
    }

    #[test]
    fn test_genre_branch_is_reproducible() {
        let recommender = build_test_recommender();
        let request = RecommendRequest::new().with_genres(["Action", "Comedy"]).with_limit(2);

        let first = recommender
            .recommend_with_rng(&request, &mut StdRng::seed_from_u64(3))
            .unwrap();
        let second = recommender
            .recommend_with_rng(&request, &mut StdRng::seed_from_u64(3))
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
        assert!(first.iter().all(|t| ["A", "B", "C"].contains(&t.as_str())));
    }

    #[test]
    fn test_rationale() {
        assert_eq!(
            Strategy::Collaborative { user_id: 7 }.rationale(),
            "Personalized recommendations for User 7:"
        );
        assert_eq!(Strategy::Popular.name(), "popular");
    }
}
