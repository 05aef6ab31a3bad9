//! Closed set of settleable markets, normalized once from free text

use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::fixtures::similarity::team_similarity;

static OVER_UNDER_WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(over|under)\b").expect("valid over/under pattern"));

static FRACTIONAL_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d+\.\d+)\b").expect("valid goal line pattern"));

static WHOLE_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d+)\b").expect("valid goal line pattern"));

static SCORE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)\s*[:-]\s*(\d+)").expect("valid score pattern"));

static HANDICAP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([+-]?\d+(?:\.\d+)?)").expect("valid handicap pattern"));

const MATCH_RESULT_KEYWORDS: &[&str] = &[
    "1x2", "3 way", "3-way", "three way", "match result", "full time result", "match winner",
];

const BTTS_KEYWORDS: &[&str] = &["both teams", "btts", "gg"];

/// Similarity a handicap pick needs to name one of the teams
const TEAM_PICK_SIMILARITY: f64 = 75.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TotalSide {
    Over,
    Under,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultPick {
    Home,
    Draw,
    Away,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DoubleChancePick {
    /// 1X
    HomeOrDraw,
    /// X2
    DrawOrAway,
    /// 12
    HomeOrAway,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandicapSide {
    Home,
    Away,
}

/// A market with its pick already interpreted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum Market {
    OverUnder { side: TotalSide, line: Decimal },
    MatchResult { pick: ResultPick },
    BothTeamsToScore { yes: bool },
    DoubleChance { pick: DoubleChancePick },
    CorrectScore { home: u32, away: u32 },
    AsianHandicap { side: HandicapSide, handicap: Decimal },
    /// Text that no family recognised; never settles
    Unknown { market: String, pick: String },
}

impl Market {
    /// Normalize free-text market and pick
    ///
    /// Families are tried in a fixed order. A family whose keyword matches
    /// but whose pick cannot be read gives way to the next one.
    ///
    /// Without team names a handicap pick must say `1`/`2`/home/away.
    pub fn classify(market: &str, pick: &str) -> Self {
        Self::classify_with(market, pick, None)
    }

    /// Normalize a selection's market, letting picks name a team
    pub fn classify_for_teams(market: &str, pick: &str, home_team: &str, away_team: &str) -> Self {
        Self::classify_with(market, pick, Some((home_team, away_team)))
    }

    fn classify_with(market: &str, pick: &str, teams: Option<(&str, &str)>) -> Self {
        let m = market.trim().to_lowercase();
        let p = pick.trim().to_lowercase();

        over_under(&m, &p)
            .or_else(|| match_result(&m, &p))
            .or_else(|| both_teams_to_score(&m, &p))
            .or_else(|| double_chance(&m, &p))
            .or_else(|| correct_score(&m, &p))
            .or_else(|| asian_handicap(&m, &p, teams))
            .unwrap_or_else(|| Market::Unknown {
                market: market.trim().to_string(),
                pick: pick.trim().to_string(),
            })
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Market::Unknown { .. })
    }

    pub fn family(&self) -> &'static str {
        match self {
            Market::OverUnder { .. } => "over_under",
            Market::MatchResult { .. } => "match_result",
            Market::BothTeamsToScore { .. } => "both_teams_to_score",
            Market::DoubleChance { .. } => "double_chance",
            Market::CorrectScore { .. } => "correct_score",
            Market::AsianHandicap { .. } => "asian_handicap",
            Market::Unknown { .. } => "unknown",
        }
    }
}

fn over_under(m: &str, p: &str) -> Option<Market> {
    if !OVER_UNDER_WORD.is_match(m) && !OVER_UNDER_WORD.is_match(p) {
        return None;
    }
    let side = match OVER_UNDER_WORD.captures(p)?.get(1)?.as_str() {
        "over" => TotalSide::Over,
        _ => TotalSide::Under,
    };
    // a market without over/under words ("3-Way") carries no line
    let market_has_line = OVER_UNDER_WORD.is_match(m);
    let from_market = |pattern: &Regex| market_has_line.then(|| number(pattern, m)).flatten();

    let line = from_market(&FRACTIONAL_LINE)
        .or_else(|| number(&FRACTIONAL_LINE, p))
        .or_else(|| number(&WHOLE_LINE, p))
        .or_else(|| from_market(&WHOLE_LINE))?;
    Some(Market::OverUnder { side, line })
}

fn number(pattern: &Regex, text: &str) -> Option<Decimal> {
    pattern.captures(text).and_then(|caps| caps[1].parse().ok())
}

fn match_result(m: &str, p: &str) -> Option<Market> {
    if !MATCH_RESULT_KEYWORDS.iter().any(|k| m.contains(k)) {
        return None;
    }
    let pick = match p {
        "1" | "home" | "home win" => ResultPick::Home,
        "x" | "draw" => ResultPick::Draw,
        "2" | "away" | "away win" => ResultPick::Away,
        _ => return None,
    };
    Some(Market::MatchResult { pick })
}

fn both_teams_to_score(m: &str, p: &str) -> Option<Market> {
    let self_describing = p == "gg" || p == "ng";
    if !self_describing && !BTTS_KEYWORDS.iter().any(|k| m.contains(k)) {
        return None;
    }
    let first = p.split(|c: char| !c.is_alphanumeric()).find(|w| !w.is_empty())?;
    let yes = match first {
        "yes" | "gg" => true,
        "no" | "ng" => false,
        _ => return None,
    };
    Some(Market::BothTeamsToScore { yes })
}

fn double_chance(m: &str, p: &str) -> Option<Market> {
    let compact: String = p
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '/' && *c != '-')
        .collect();
    let pick = match compact.as_str() {
        "1x" | "x1" | "homeordraw" | "draworhome" => DoubleChancePick::HomeOrDraw,
        "x2" | "2x" | "draworaway" | "awayordraw" => DoubleChancePick::DrawOrAway,
        "12" | "21" | "homeoraway" | "awayorhome" => DoubleChancePick::HomeOrAway,
        _ => return None,
    };
    let self_describing = matches!(compact.as_str(), "1x" | "x2" | "12");
    if !self_describing && !m.contains("double chance") {
        return None;
    }
    Some(Market::DoubleChance { pick })
}

fn correct_score(m: &str, p: &str) -> Option<Market> {
    if !m.contains("correct score") && !m.contains("exact score") {
        return None;
    }
    let caps = SCORE.captures(p)?;
    Some(Market::CorrectScore {
        home: caps[1].parse().ok()?,
        away: caps[2].parse().ok()?,
    })
}

fn asian_handicap(m: &str, p: &str, teams: Option<(&str, &str)>) -> Option<Market> {
    if !m.contains("handicap") {
        return None;
    }
    // the last signed figure is the handicap; "2 (+0.5)" starts with the side
    let caps = HANDICAP.captures_iter(p).last()?;
    let handicap: Decimal = caps[1].trim_start_matches('+').parse().ok()?;

    let label = p[..caps.get(0)?.start()]
        .trim()
        .trim_end_matches(|c: char| c == '(' || c.is_whitespace())
        .to_string();
    let side = handicap_side(&label, teams)?;
    Some(Market::AsianHandicap { side, handicap })
}

/// Side named by the text before the handicap figure
///
/// A team name counts only when it is clearly closer to one side; anything
/// else leaves the market unknown rather than guessing.
fn handicap_side(label: &str, teams: Option<(&str, &str)>) -> Option<HandicapSide> {
    match label {
        "1" | "home" => return Some(HandicapSide::Home),
        "2" | "away" => return Some(HandicapSide::Away),
        "" => return None,
        _ => {}
    }
    let (home, away) = teams?;
    let home_score = team_similarity(label, home);
    let away_score = team_similarity(label, away);
    if home_score >= TEAM_PICK_SIMILARITY && home_score > away_score {
        Some(HandicapSide::Home)
    } else if away_score >= TEAM_PICK_SIMILARITY && away_score > home_score {
        Some(HandicapSide::Away)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    #[test]
    fn test_over_under_line_from_market_or_pick() {
        assert_eq!(
            Market::classify("Over 2.5", "Over"),
            Market::OverUnder { side: TotalSide::Over, line: dec!(2.5) }
        );
        assert_eq!(
            Market::classify("Over/Under", "Under 3.5"),
            Market::OverUnder { side: TotalSide::Under, line: dec!(3.5) }
        );
        assert_eq!(
            Market::classify("1st Half - Over/Under 1.5", "Over"),
            Market::OverUnder { side: TotalSide::Over, line: dec!(1.5) }
        );
    }

    #[test]
    fn test_over_under_priority_over_match_result() {
        // "3 Way" is a match-result keyword but the over/under family wins
        assert_eq!(
            Market::classify("3 Way Over 2.5", "Over"),
            Market::OverUnder { side: TotalSide::Over, line: dec!(2.5) }
        );
    }

    #[test]
    fn test_match_result_tokens() {
        assert_eq!(Market::classify("1X2", "Draw"), Market::MatchResult { pick: ResultPick::Draw });
        assert_eq!(Market::classify("3-Way", "1"), Market::MatchResult { pick: ResultPick::Home });
        assert_eq!(
            Market::classify("Full Time Result", "Away"),
            Market::MatchResult { pick: ResultPick::Away }
        );
    }

    #[test]
    fn test_self_describing_picks_under_default_market() {
        assert_eq!(Market::classify("3-Way", "GG"), Market::BothTeamsToScore { yes: true });
        assert_eq!(
            Market::classify("3-Way", "1X"),
            Market::DoubleChance { pick: DoubleChancePick::HomeOrDraw }
        );
    }

    #[test]
    fn test_btts_and_double_chance() {
        assert_eq!(Market::classify("GG/NG", "No"), Market::BothTeamsToScore { yes: false });
        assert_eq!(
            Market::classify("Both Teams To Score", "Yes"),
            Market::BothTeamsToScore { yes: true }
        );
        assert_eq!(
            Market::classify("Double Chance", "Away or Draw"),
            Market::DoubleChance { pick: DoubleChancePick::DrawOrAway }
        );
    }

    #[test]
    fn test_correct_score_and_handicap() {
        assert_eq!(
            Market::classify("Correct Score", "2:1"),
            Market::CorrectScore { home: 2, away: 1 }
        );
        assert_eq!(
            Market::classify("Asian Handicap", "Home -1.5"),
            Market::AsianHandicap { side: HandicapSide::Home, handicap: dec!(-1.5) }
        );
        assert_eq!(
            Market::classify("Asian Handicap", "2 (+0.5)"),
            Market::AsianHandicap { side: HandicapSide::Away, handicap: dec!(0.5) }
        );
    }

    #[test]
    fn test_goal_line_ignores_default_market_digit() {
        assert_eq!(
            Market::classify("3-Way", "Over 2.5"),
            Market::OverUnder { side: TotalSide::Over, line: dec!(2.5) }
        );
        assert_eq!(
            Market::classify("3-Way", "Under 3"),
            Market::OverUnder { side: TotalSide::Under, line: dec!(3) }
        );
        assert_eq!(
            Market::classify("Total Goals Over 3", "Over"),
            Market::OverUnder { side: TotalSide::Over, line: dec!(3) }
        );
    }

    #[test]
    fn test_handicap_pick_naming_a_team() {
        assert_eq!(
            Market::classify_for_teams("Asian Handicap", "Chelsea +1.5", "Arsenal", "Chelsea"),
            Market::AsianHandicap { side: HandicapSide::Away, handicap: dec!(1.5) }
        );
        assert_eq!(
            Market::classify_for_teams("Handicap", "Man Utd -1", "Manchester United", "Liverpool"),
            Market::AsianHandicap { side: HandicapSide::Home, handicap: dec!(-1) }
        );
    }

    #[test]
    fn test_handicap_side_is_never_guessed() {
        // no teams to compare against
        assert!(!Market::classify("Asian Handicap", "Chelsea +1.5").is_known());
        // names neither side
        assert!(!Market::classify_for_teams("Asian Handicap", "Everton +1.5", "Arsenal", "Chelsea").is_known());
        assert!(!Market::classify("Asian Handicap", "-1.5").is_known());
    }

    #[test]
    fn test_unknown_market_keeps_text() {
        let market = Market::classify("Corners 1st Half", "Odd");
        assert_eq!(
            market,
            Market::Unknown {
                market: "Corners 1st Half".to_string(),
                pick: "Odd".to_string()
            }
        );
        assert!(!market.is_known());

        // keyword matched but pick unreadable
        assert!(!Market::classify("Correct Score", "Any other").is_known());
    }
}
