//! Slip parser: turns provider output into a `ParsedSlip`
//!
//! Structured provider output only needs coercion and defaults. Raw OCR lines
//! go through a single forward scan: every team pair opens a short lookahead
//! window that collects market, pick, odds and kickoff, and a selection is
//! committed only when both a pick and odds were found.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::{debug, warn};

use super::classifier::{looks_like_team, split_team_pair, LineClassifier, LineKind};
use super::patterns;
use super::provider::{ProviderOutput, StructuredMatch, StructuredSlip};
use crate::common::errors::{PipelineError, Result};
use crate::common::types::{ParsedSlip, Selection, TextLine, DEFAULT_MARKET};

/// Lines inspected after a team pair
pub const LOOKAHEAD_LINES: usize = 8;

/// Confidence reported for structured provider output
pub const STRUCTURED_CONFIDENCE: f64 = 95.0;

/// Accepted odds range for a single selection
pub const MIN_SELECTION_ODDS: Decimal = dec!(1.01);
pub const MAX_SELECTION_ODDS: Decimal = dec!(999.99);

/// Slip chrome that never belongs to a selection
const SLIP_CHROME: &[&str] = &[
    "betslip", "bet slip", "total odds", "bet code", "booking code", "balance", "amount",
    "stake", "possible win", "potential win", "payout", "bonus",
];

/// Picks that mean "home, draw or away" without naming a market
const RESULT_PICKS: &[&str] = &["1", "x", "2", "1x", "x2", "12", "home", "draw", "away"];

#[derive(Debug, Clone, Copy, Default)]
pub struct SlipParser {
    classifier: LineClassifier,
}

/// What one lookahead window collected
#[derive(Debug, Default)]
struct Candidate {
    market: Option<String>,
    explicit_pick: Option<String>,
    implicit_pick: Option<String>,
    odds: Option<Decimal>,
    date_text: Option<String>,
    time_text: Option<String>,
}

impl Candidate {
    fn has_pick(&self) -> bool {
        self.explicit_pick.is_some() || self.implicit_pick.is_some() || self.market.is_some()
    }

    /// Resolve (market, pick). A lone text line is the pick, not the market.
    fn market_and_pick(self) -> Option<(String, String)> {
        let pick = self.explicit_pick.or(self.implicit_pick);
        match (self.market, pick) {
            (market, Some(pick)) => Some((market.unwrap_or_else(|| DEFAULT_MARKET.to_string()), pick)),
            (Some(line), None) => {
                let market = if RESULT_PICKS.contains(&line.to_lowercase().as_str()) {
                    DEFAULT_MARKET.to_string()
                } else {
                    line.clone()
                };
                Some((market, line))
            }
            (None, None) => None,
        }
    }
}

impl SlipParser {
    pub fn new() -> Self {
        Self {
            classifier: LineClassifier::new(),
        }
    }

    /// Parse provider output. Zero committed selections is an error.
    pub fn parse(&self, output: &ProviderOutput, now: DateTime<Utc>) -> Result<ParsedSlip> {
        let parsed = match output {
            ProviderOutput::Lines(lines) => self.parse_lines(lines, now),
            ProviderOutput::Structured(slip) => self.parse_structured(slip, now),
        };

        if parsed.selections.is_empty() {
            warn!("No selections extracted from betslip");
            return Err(PipelineError::EmptySlip);
        }
        Ok(parsed)
    }

    /// Line-scan mode
    pub fn parse_lines(&self, lines: &[TextLine], now: DateTime<Utc>) -> ParsedSlip {
        let joined = lines
            .iter()
            .map(|line| line.text.trim())
            .collect::<Vec<_>>()
            .join("\n");
        let kinds: Vec<LineKind> = lines
            .iter()
            .map(|line| self.classifier.classify(&line.text))
            .collect();

        let mut selections = Vec::new();
        let mut cursor = 0;
        while cursor < lines.len() {
            let (home, away, window_start) = match &kinds[cursor] {
                LineKind::TeamPair { home, away } => (home.clone(), away.clone(), cursor + 1),
                _ if starts_implicit_pair(lines, cursor) => (
                    lines[cursor].text.trim().to_string(),
                    lines[cursor + 1].text.trim().to_string(),
                    cursor + 2,
                ),
                _ => {
                    cursor += 1;
                    continue;
                }
            };

            match self.scan_window(lines, &kinds, window_start) {
                Some((candidate, last)) => {
                    let match_date = kickoff(&candidate, now);
                    let odds = candidate.odds;
                    if let (Some((market, pick)), Some(odds)) = (candidate.market_and_pick(), odds) {
                        debug!(%home, %away, %market, %pick, %odds, "Committed selection");
                        selections.push(
                            Selection::new(home, away, market, pick, odds).with_match_date(match_date),
                        );
                        cursor = last + 1;
                        continue;
                    }
                    cursor += 1;
                }
                None => {
                    debug!(%home, %away, "Team pair without pick and odds, skipped");
                    cursor += 1;
                }
            }
        }

        ParsedSlip {
            bet_code: patterns::extract_bet_code(&joined),
            total_odds: patterns::extract_total_odds(&joined),
            possible_win: patterns::extract_possible_win(&joined),
            selections,
            confidence: mean_confidence(lines),
        }
    }

    /// Walk the lookahead window up to the next team pair. Returns the
    /// candidate and the last line it covered.
    ///
    /// A `Pick:` line anywhere in the window beats a pick inferred from bare
    /// text, so only an explicit pick with odds ends the walk early.
    fn scan_window(
        &self,
        lines: &[TextLine],
        kinds: &[LineKind],
        start: usize,
    ) -> Option<(Candidate, usize)> {
        let end = (start + LOOKAHEAD_LINES).min(lines.len());
        let mut candidate = Candidate::default();
        let mut last = start;

        for index in start..end {
            if matches!(kinds[index], LineKind::TeamPair { .. }) || starts_implicit_pair(lines, index) {
                break;
            }
            last = index;

            let text = lines[index].text.trim();
            let lower = text.to_lowercase();
            if SLIP_CHROME.iter().any(|chrome| lower.contains(chrome)) {
                continue;
            }
            if patterns::contains_date(text) {
                candidate.date_text.get_or_insert_with(|| text.to_string());
                continue;
            }
            if patterns::is_time_only(text) {
                candidate.time_text.get_or_insert_with(|| text.to_string());
                continue;
            }

            match &kinds[index] {
                LineKind::Pick(pick) => {
                    let (label, odds) = split_odds(pick);
                    if !label.is_empty() && candidate.explicit_pick.is_none() {
                        candidate.explicit_pick = Some(label);
                    }
                    take_odds(&mut candidate, odds);
                }
                LineKind::Odds(odds) => take_odds(&mut candidate, Some(*odds)),
                // once priced, stray text cannot become the market or pick
                LineKind::Market(_) | LineKind::Noise if candidate.odds.is_some() && candidate.has_pick() => {}
                LineKind::Market(_) | LineKind::Noise => {
                    let (label, odds) = split_odds(text);
                    take_odds(&mut candidate, odds);
                    if !label.is_empty() {
                        take_text(&mut candidate, label);
                    }
                }
                LineKind::TeamPair { .. } => break,
            }

            if candidate.odds.is_some() && candidate.explicit_pick.is_some() {
                return Some((candidate, index));
            }
        }

        (candidate.odds.is_some() && candidate.has_pick()).then_some((candidate, last))
    }

    /// Structured mode: coercion and defaults only
    pub fn parse_structured(&self, slip: &StructuredSlip, now: DateTime<Utc>) -> ParsedSlip {
        let selections = slip
            .matches
            .iter()
            .filter_map(|entry| structured_selection(entry, now))
            .collect();

        ParsedSlip {
            bet_code: slip
                .bet_code
                .as_deref()
                .map(str::trim)
                .filter(|code| !code.is_empty())
                .map(str::to_string),
            total_odds: slip.summary.total_odds.as_ref().and_then(coerce_decimal),
            possible_win: slip.summary.possible_win.as_ref().and_then(coerce_decimal),
            selections,
            confidence: STRUCTURED_CONFIDENCE,
        }
    }
}

fn structured_selection(entry: &StructuredMatch, now: DateTime<Utc>) -> Option<Selection> {
    let (home, away) = match (non_empty(&entry.home_team), non_empty(&entry.away_team)) {
        (Some(home), Some(away)) => (home, away),
        _ => split_team_pair(non_empty(&entry.teams)?.as_str())?,
    };
    let pick = non_empty(&entry.pick)?;
    let odds = entry
        .odds
        .as_ref()
        .and_then(coerce_decimal)
        .filter(|odds| *odds > Decimal::ZERO)?;

    let market = non_empty(&entry.bet_type).unwrap_or_else(|| DEFAULT_MARKET.to_string());
    let match_date = entry
        .match_date
        .as_deref()
        .and_then(|date| patterns::parse_match_date(date, entry.match_time.as_deref()))
        .unwrap_or_else(|| now + Duration::days(1));

    Some(Selection::new(home, away, market, pick, odds).with_match_date(match_date))
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Accept odds sent as a JSON number or string
fn coerce_decimal(value: &serde_json::Value) -> Option<Decimal> {
    match value {
        serde_json::Value::Number(number) => patterns::parse_amount(&number.to_string()),
        serde_json::Value::String(text) => patterns::parse_amount(text),
        _ => None,
    }
}

fn starts_implicit_pair(lines: &[TextLine], index: usize) -> bool {
    index + 1 < lines.len()
        && looks_like_team(&lines[index].text)
        && looks_like_team(&lines[index + 1].text)
}

fn split_odds(text: &str) -> (String, Option<Decimal>) {
    match patterns::split_trailing_odds(text) {
        Some((label, odds)) => (label, Some(odds)),
        None => (text.trim().to_string(), None),
    }
}

/// First text line is the market, later ones (or a bare `1`/`2`) the pick
fn take_text(candidate: &mut Candidate, label: String) {
    let has_letters = label.chars().any(|c| c.is_alphabetic());
    let is_result_pick = RESULT_PICKS.contains(&label.to_lowercase().as_str());

    if !has_letters && !is_result_pick {
        return;
    }
    if candidate.market.is_none() && has_letters {
        candidate.market = Some(label);
    } else if candidate.implicit_pick.is_none() {
        candidate.implicit_pick = Some(label);
    }
}

fn take_odds(candidate: &mut Candidate, odds: Option<Decimal>) {
    if candidate.odds.is_some() {
        return;
    }
    candidate.odds = odds.filter(|odds| (MIN_SELECTION_ODDS..=MAX_SELECTION_ODDS).contains(odds));
}

/// Printed kickoff, or the "tomorrow" placeholder
fn kickoff(candidate: &Candidate, now: DateTime<Utc>) -> DateTime<Utc> {
    candidate
        .date_text
        .as_deref()
        .and_then(|date| patterns::parse_match_date(date, candidate.time_text.as_deref()))
        .unwrap_or_else(|| now + Duration::days(1))
}

fn mean_confidence(lines: &[TextLine]) -> f64 {
    if lines.is_empty() {
        return 0.0;
    }
    lines.iter().map(|line| line.confidence).sum::<f64>() / lines.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::types::UNKNOWN_LEAGUE;
    use crate::settlement::{MarketSettlementEngine, SettlementOutcome};
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 10, 10, 9, 0, 0).unwrap()
    }

    fn lines(texts: &[&str]) -> Vec<TextLine> {
        texts.iter().map(|text| TextLine::new(*text, 90.0)).collect()
    }

    fn parse(texts: &[&str]) -> ParsedSlip {
        SlipParser::new().parse_lines(&lines(texts), now())
    }

    #[test]
    fn test_labelled_fallback_slip() {
        let slip = parse(&[
            "Bet Code: FALLBACK123",
            "Team X - Team Y",
            "Pick: Home",
            "Odds: 2.00",
            "Total Odds: 2.00",
            "Possible Win: 200.00",
        ]);

        assert_eq!(slip.bet_code.as_deref(), Some("FALLBACK123"));
        assert_eq!(slip.total_odds, Some(dec!(2.00)));
        assert_eq!(slip.possible_win, Some(dec!(200.00)));
        assert_eq!(slip.selections.len(), 1);

        let selection = &slip.selections[0];
        assert_eq!(selection.home_team, "Team X");
        assert_eq!(selection.away_team, "Team Y");
        assert_eq!(selection.market, DEFAULT_MARKET);
        assert_eq!(selection.pick, "Home");
        assert_eq!(selection.odds, dec!(2.00));
        assert_eq!(selection.league, UNKNOWN_LEAGUE);
        assert_eq!(slip.confidence, 90.0);
    }

    #[test]
    fn test_two_fixture_accumulator() {
        let slip = parse(&[
            "Betslip",
            "Arsenal vs Chelsea",
            "Over/Under 2.5",
            "Over",
            "1.50",
            "Real Madrid - Barcelona",
            "3 Way",
            "Home 2.00",
            "Total Odds 3.00",
        ]);

        assert_eq!(slip.selections.len(), 2);
        assert_eq!(slip.selections[0].market, "Over/Under 2.5");
        assert_eq!(slip.selections[0].pick, "Over");
        assert_eq!(slip.selections[0].odds, dec!(1.50));
        assert_eq!(slip.selections[1].home_team, "Real Madrid");
        assert_eq!(slip.selections[1].market, "3 Way");
        assert_eq!(slip.selections[1].pick, "Home");
        assert_eq!(slip.selections[1].odds, dec!(2.00));
        assert_eq!(slip.total_odds, Some(dec!(3.00)));
    }

    #[test]
    fn test_lone_pick_line_uses_default_market() {
        let slip = parse(&["Gor Mahia - AFC Leopards", "Home", "1.85"]);
        assert_eq!(slip.selections.len(), 1);
        assert_eq!(slip.selections[0].market, DEFAULT_MARKET);
        assert_eq!(slip.selections[0].pick, "Home");
    }

    #[test]
    fn test_goal_line_is_not_odds() {
        let slip = parse(&["Inter - Milan", "Over 2.5", "1.72"]);
        assert_eq!(slip.selections.len(), 1);
        assert_eq!(slip.selections[0].market, "Over 2.5");
        assert_eq!(slip.selections[0].pick, "Over 2.5");
        assert_eq!(slip.selections[0].odds, dec!(1.72));
    }

    #[test]
    fn test_later_pick_line_beats_market_text() {
        let slip = parse(&[
            "Arsenal - Chelsea",
            "Over/Under 2.5",
            "1.85",
            "Pick: Under",
            "Napoli - Lazio",
            "Draw",
            "3.10",
        ]);
        assert_eq!(slip.selections.len(), 2);

        let selection = &slip.selections[0];
        assert_eq!(selection.market, "Over/Under 2.5");
        assert_eq!(selection.pick, "Under");
        assert_eq!(selection.odds, dec!(1.85));
        assert_eq!(
            MarketSettlementEngine::new().settle_selection(selection, 0, 0),
            SettlementOutcome::Won
        );
        assert_eq!(slip.selections[1].home_team, "Napoli");
    }

    #[test]
    fn test_text_after_odds_is_not_taken_as_pick() {
        let slip = parse(&["Inter - Milan", "Over 2.5", "1.72", "Serie A"]);
        assert_eq!(slip.selections.len(), 1);
        assert_eq!(slip.selections[0].market, "Over 2.5");
        assert_eq!(slip.selections[0].pick, "Over 2.5");
    }

    #[test]
    fn test_implicit_team_pair() {
        let slip = parse(&["Manchester United", "Liverpool", "GG", "Yes", "1.65"]);
        assert_eq!(slip.selections.len(), 1);
        assert_eq!(slip.selections[0].home_team, "Manchester United");
        assert_eq!(slip.selections[0].away_team, "Liverpool");
        assert_eq!(slip.selections[0].market, "GG");
        assert_eq!(slip.selections[0].pick, "Yes");
    }

    #[test]
    fn test_pair_without_odds_is_dropped() {
        let slip = parse(&["Arsenal - Chelsea", "Home", "Napoli - Lazio", "Draw", "3.10"]);
        assert_eq!(slip.selections.len(), 1);
        assert_eq!(slip.selections[0].home_team, "Napoli");
        assert_eq!(slip.selections[0].pick, "Draw");
    }

    #[test]
    fn test_printed_kickoff_is_used() {
        let slip = parse(&["Arsenal - Chelsea", "12/10/24", "19:45", "1X2", "Home", "1.50"]);
        let kickoff = slip.selections[0].match_date.unwrap();
        assert_eq!(kickoff, Utc.with_ymd_and_hms(2024, 10, 12, 19, 45, 0).unwrap());
    }

    #[test]
    fn test_missing_kickoff_defaults_to_tomorrow() {
        let slip = parse(&["Arsenal - Chelsea", "Home", "1.50"]);
        assert_eq!(slip.selections[0].match_date, Some(now() + Duration::days(1)));
    }

    #[test]
    fn test_odds_out_of_range_are_ignored() {
        let slip = parse(&["Arsenal - Chelsea", "Home", "1.00"]);
        assert!(slip.selections.is_empty());
    }

    #[test]
    fn test_empty_input() {
        let parser = SlipParser::new();
        let slip = parser.parse_lines(&[], now());
        assert_eq!(slip.confidence, 0.0);
        assert!(matches!(
            parser.parse(&ProviderOutput::Lines(Vec::new()), now()),
            Err(PipelineError::EmptySlip)
        ));
    }

    #[test]
    fn test_structured_mode_coerces_and_defaults() {
        let slip: StructuredSlip = serde_json::from_value(serde_json::json!({
            "matches": [
                {"home_team": "Arsenal", "away_team": "Chelsea", "pick": "Home", "odds": 1.5,
                 "match_date": "12/10/24", "match_time": "19:45"},
                {"teams": "Napoli - Lazio", "bet_type": "GG/NG", "pick": "GG", "odds": "2.00"},
                {"home_team": "No", "away_team": "Odds", "pick": "Home"},
                {"home_team": "No", "away_team": "Pick", "odds": "1.40"}
            ],
            "summary": {"total_odds": "3.00", "possible_win": "1,500.00"}
        }))
        .unwrap();

        let parsed = SlipParser::new()
            .parse(&ProviderOutput::Structured(slip), now())
            .unwrap();

        assert_eq!(parsed.selections.len(), 2);
        assert_eq!(parsed.confidence, STRUCTURED_CONFIDENCE);
        assert_eq!(parsed.total_odds, Some(dec!(3.00)));
        assert_eq!(parsed.possible_win, Some(dec!(1500.00)));

        let first = &parsed.selections[0];
        assert_eq!(first.market, DEFAULT_MARKET);
        assert_eq!(first.odds, dec!(1.5));
        assert_eq!(
            first.match_date,
            Some(Utc.with_ymd_and_hms(2024, 10, 12, 19, 45, 0).unwrap())
        );

        let second = &parsed.selections[1];
        assert_eq!((second.home_team.as_str(), second.away_team.as_str()), ("Napoli", "Lazio"));
        assert_eq!(second.league, UNKNOWN_LEAGUE);
        assert_eq!(second.match_date, Some(now() + Duration::days(1)));
    }
}
