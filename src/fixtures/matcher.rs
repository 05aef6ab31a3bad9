//! Fuzzy lookup of a slip fixture in the catalog

use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::similarity::pair_similarity;
use crate::common::errors::Result;
use crate::common::traits::FixtureCatalog;
use crate::common::types::{DateRange, Fixture};
use crate::config::types::MatchingConfig;

/// Days searched before a kickoff hint
pub const DAYS_BEFORE_HINT: i64 = 2;
/// Days searched after a kickoff hint (exclusive end)
pub const DAYS_AFTER_HINT: i64 = 3;
/// Days searched from today when there is no hint
pub const DAYS_WITHOUT_HINT: i64 = 7;

/// Catalog fixture chosen for a selection, with the per-side similarity
#[derive(Debug, Clone, PartialEq)]
pub struct FixtureMatch {
    pub fixture: Fixture,
    pub home_score: f64,
    pub away_score: f64,
}

impl FixtureMatch {
    pub fn combined(&self) -> f64 {
        (self.home_score + self.away_score) / 2.0
    }
}

/// Catalog search window around an optional kickoff hint
pub fn search_window(hint: Option<DateTime<Utc>>, today: NaiveDate) -> DateRange {
    match hint {
        Some(kickoff) => {
            let day = kickoff.date_naive();
            DateRange::new(
                day - Duration::days(DAYS_BEFORE_HINT),
                day + Duration::days(DAYS_AFTER_HINT),
            )
        }
        None => DateRange::new(today, today + Duration::days(DAYS_WITHOUT_HINT)),
    }
}

/// Best candidate whose both sides reach `threshold`
///
/// Highest average wins; ties go to the kickoff nearest the hint, then to
/// the earlier candidate.
pub fn best_match(
    fixtures: &[Fixture],
    home: &str,
    away: &str,
    hint: Option<DateTime<Utc>>,
    threshold: f64,
) -> Option<FixtureMatch> {
    let mut best: Option<FixtureMatch> = None;

    for fixture in fixtures {
        let (home_score, away_score) =
            pair_similarity(home, away, &fixture.home_team, &fixture.away_team);
        if home_score < threshold || away_score < threshold {
            continue;
        }

        let candidate = FixtureMatch {
            fixture: fixture.clone(),
            home_score,
            away_score,
        };
        let replace = match &best {
            None => true,
            Some(current) if candidate.combined() > current.combined() => true,
            Some(current) if candidate.combined() == current.combined() => match hint {
                Some(hint) => distance(&candidate.fixture, hint) < distance(&current.fixture, hint),
                None => false,
            },
            Some(_) => false,
        };
        if replace {
            best = Some(candidate);
        }
    }
    best
}

fn distance(fixture: &Fixture, hint: DateTime<Utc>) -> Duration {
    (fixture.kickoff - hint).abs()
}

/// Looks up selections in a fixture catalog
#[derive(Clone)]
pub struct FixtureMatcher {
    catalog: Arc<dyn FixtureCatalog>,
    threshold: f64,
}

impl FixtureMatcher {
    pub fn new(catalog: Arc<dyn FixtureCatalog>, threshold: f64) -> Self {
        Self { catalog, threshold }
    }

    pub fn from_config(catalog: Arc<dyn FixtureCatalog>, config: &MatchingConfig) -> Self {
        Self::new(catalog, config.enrichment_threshold)
    }

    pub fn catalog(&self) -> &Arc<dyn FixtureCatalog> {
        &self.catalog
    }

    pub async fn find_match(
        &self,
        home: &str,
        away: &str,
        hint: Option<DateTime<Utc>>,
    ) -> Result<Option<FixtureMatch>> {
        self.find_match_at(home, away, hint, Utc::now().date_naive()).await
    }

    pub async fn find_match_at(
        &self,
        home: &str,
        away: &str,
        hint: Option<DateTime<Utc>>,
        today: NaiveDate,
    ) -> Result<Option<FixtureMatch>> {
        let window = search_window(hint, today);
        let fixtures = self.catalog.find(window).await?;
        debug!(home, away, candidates = fixtures.len(), "Searching catalog");

        let found = best_match(&fixtures, home, away, hint, self.threshold);
        match &found {
            Some(m) => info!(
                home,
                away,
                fixture = %m.fixture.api_id,
                matched_home = %m.fixture.home_team,
                matched_away = %m.fixture.away_team,
                score = m.combined(),
                "Fixture matched"
            ),
            None => warn!(home, away, "No fixture match above threshold"),
        }
        Ok(found)
    }
}
