//! Picking the scoreboard row that belongs to a selection

use crate::common::types::LivescoreMatch;
use crate::config::types::MatchingConfig;
use crate::fixtures::similarity::pair_similarity;

/// Best scoreboard row for a fixture
///
/// Each side must score strictly above `team_threshold` and the average
/// strictly above `combined_threshold`. The returned row carries the
/// average in `match_confidence`.
pub fn match_livescore(
    home: &str,
    away: &str,
    matches: &[LivescoreMatch],
    config: &MatchingConfig,
) -> Option<LivescoreMatch> {
    let mut best: Option<(f64, &LivescoreMatch)> = None;

    for candidate in matches {
        let (home_score, away_score) =
            pair_similarity(home, away, &candidate.home_team, &candidate.away_team);
        if home_score <= config.settlement_team_threshold
            || away_score <= config.settlement_team_threshold
        {
            continue;
        }
        let combined = (home_score + away_score) / 2.0;
        if best.map_or(true, |(score, _)| combined > score) {
            best = Some((combined, candidate));
        }
    }

    best.filter(|(score, _)| *score > config.settlement_combined_threshold)
        .map(|(score, row)| LivescoreMatch {
            match_confidence: score,
            ..row.clone()
        })
}
