//! Livescore collector: the settlement job's source of final scores

pub mod client;
pub mod matching;
pub mod messages;

pub use client::LivescoreClient;
pub use matching::match_livescore;
