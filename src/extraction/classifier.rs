//! Line classification for OCR output
//!
//! Each line is tested against ordered heuristics and the first match wins:
//!
//! 1. team pair (`Home - Away`, `Home vs Away`, `Home / Away`, `Home @ Away`, `Home x Away`)
//! 2. explicit pick (`Pick: Over 2.5`, `Your Pick: Home`)
//! 3. bare odds (`1.85`, also `Odds: 1.85` and `@ 1.85`)
//! 4. market label candidate (anything with at least three letters)
//! 5. noise

use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;

/// Separators tried in order; spaced dashes first so hyphenated names survive
static PAIR_SEPARATORS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"^(.+?)\s+[-–—]\s+(.+)$",
        r"(?i)^(.+?)\s+(?:vs\.?|v\.?)\s+(.+)$",
        r"^(.+?)\s+@\s+(.+)$",
        r"(?i)^(.+?)\s+x\s+(.+)$",
        r"^(.+?)\s*/\s*(.+)$",
        r"^(.+?)[-–](.+)$",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid separator pattern"))
    .collect()
});

static SIDE_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*(?:home|away)\s*:\s*").expect("valid prefix pattern"));

static TRAILING_ODDS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*\d+(?:[.,]\d+)?\s*$").expect("valid trailing odds pattern"));

static PICK_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*(?:your\s+)?pick\s*:\s*(.*)$").expect("valid pick pattern"));

static BARE_ODDS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{1,3}\.\d{2}$").expect("valid bare odds pattern"));

static LABELLED_ODDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:odds\s*[:=]?|@)\s*(\d{1,3}[.,]\d{2})$").expect("valid labelled odds pattern")
});

/// Words that on their own describe a market, never a team
const MARKET_VOCABULARY: &[&str] = &[
    "over", "under", "total", "totals", "goals", "goal", "full", "time", "half", "halftime",
    "fulltime", "number", "of", "both", "teams", "team", "to", "score", "yes", "no", "draw",
    "home", "away", "double", "chance", "handicap", "asian", "correct", "match", "result",
    "winner", "win", "1x2", "gg", "ng", "btts", "odds", "first", "second", "1st", "2nd", "and",
    "or", "way", "3", "pick", "selection", "market", "ft", "ht", "corners", "cards",
];

/// Fragments that mark a line as slip chrome or betting text rather than a team
const BETTING_KEYWORDS: &[&str] = &[
    "betslip", "bet slip", "odds", "stake", "amount", "balance", "possible win", "payout",
    "bet code", "booking code", "pick:", "total", "handicap",
    "double chance", "correct score", "both teams",
];

/// Competition words; a line containing one is a league header, not a team
const COMPETITION_WORDS: &[&str] = &[
    "league", "liga", "ligue", "cup", "division", "serie", "bundesliga", "championship",
];

/// Shortest accepted team name
pub const MIN_TEAM_LEN: usize = 3;
/// Longest accepted team name
pub const MAX_TEAM_LEN: usize = 50;

/// Classification of one text line
#[derive(Debug, Clone, PartialEq)]
pub enum LineKind {
    /// A fixture line, already split into home and away names
    TeamPair { home: String, away: String },
    /// An explicit `Pick:` line; the pick text may be empty
    Pick(String),
    /// A line carrying nothing but an odds value
    Odds(Decimal),
    /// Candidate market label (or any other text)
    Market(String),
    /// Nothing useful
    Noise,
}

/// Stateless classifier for OCR lines
#[derive(Debug, Clone, Copy, Default)]
pub struct LineClassifier;

impl LineClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Classify one line. Heuristics are applied in a fixed order.
    pub fn classify(&self, text: &str) -> LineKind {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return LineKind::Noise;
        }

        if let Some((home, away)) = split_team_pair(trimmed) {
            return LineKind::TeamPair { home, away };
        }

        if let Some(caps) = PICK_PREFIX.captures(trimmed) {
            return LineKind::Pick(caps[1].trim().to_string());
        }

        if let Some(odds) = odds_only(trimmed) {
            return LineKind::Odds(odds);
        }

        if trimmed.chars().filter(|c| c.is_alphabetic()).count() >= 3 {
            return LineKind::Market(trimmed.to_string());
        }

        LineKind::Noise
    }
}

/// Odds value if the whole line is an odds figure (optionally labelled)
pub fn odds_only(text: &str) -> Option<Decimal> {
    let trimmed = text.trim();
    if BARE_ODDS.is_match(trimmed) {
        return trimmed.parse().ok();
    }
    LABELLED_ODDS
        .captures(trimmed)
        .and_then(|caps| caps[1].replace(',', ".").parse().ok())
}

/// Split a line into cleaned home and away names, if it is a plausible fixture
pub fn split_team_pair(text: &str) -> Option<(String, String)> {
    PAIR_SEPARATORS.iter().find_map(|separator| {
        let caps = separator.captures(text)?;
        let home = clean_team_side(&caps[1]);
        let away = clean_team_side(&caps[2]);
        if is_valid_side(&home) && is_valid_side(&away) {
            Some((home, away))
        } else {
            None
        }
    })
}

fn clean_team_side(side: &str) -> String {
    let without_prefix = SIDE_PREFIX.replace(side, "");
    let without_odds = TRAILING_ODDS.replace(&without_prefix, "");
    without_odds
        .trim()
        .trim_matches(|c: char| c == ':' || c == ',' || c == '|')
        .trim()
        .to_string()
}

fn is_valid_side(side: &str) -> bool {
    let len = side.chars().count();
    (MIN_TEAM_LEN..=MAX_TEAM_LEN).contains(&len)
        && side.chars().any(|c| c.is_alphabetic())
        && !is_market_vocabulary(side)
}

/// True when every word of the text is generic market vocabulary
pub fn is_market_vocabulary(text: &str) -> bool {
    let words: Vec<String> = text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
        .collect();

    !words.is_empty()
        && words.iter().all(|word| {
            MARKET_VOCABULARY.contains(&word.as_str()) || word.chars().all(|c| c.is_ascii_digit())
        })
}

/// Whether a separator-less line could be a single team name
pub fn looks_like_team(text: &str) -> bool {
    let trimmed = text.trim();
    let len = trimmed.chars().count();
    if !(MIN_TEAM_LEN..=MAX_TEAM_LEN).contains(&len) {
        return false;
    }
    if trimmed.chars().filter(|c| c.is_alphabetic()).count() < MIN_TEAM_LEN {
        return false;
    }
    if trimmed.chars().any(|c| c.is_ascii_digit()) {
        return false;
    }
    let lower = trimmed.to_lowercase();
    if BETTING_KEYWORDS.iter().any(|keyword| lower.contains(keyword)) {
        return false;
    }
    if lower
        .split(|c: char| !c.is_alphanumeric())
        .any(|word| COMPETITION_WORDS.contains(&word))
    {
        return false;
    }
    if split_team_pair(trimmed).is_some() || PICK_PREFIX.is_match(trimmed) {
        return false;
    }
    !is_market_vocabulary(trimmed)
}
