//! Fixture catalog, its upstream feed and fuzzy fixture matching

pub mod api_football;
pub mod catalog;
pub mod matcher;
pub mod messages;
pub mod similarity;

pub use api_football::ApiFootballClient;
pub use catalog::{CachedFixtureCatalog, QuotaTracker};
pub use matcher::{FixtureMatch, FixtureMatcher};
pub use similarity::team_similarity;
