//! Slip-wide text patterns: bet code, total odds, payout and dates

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;

/// Shortest string accepted as a bet code; shorter captures are usually dates
pub const MIN_BET_CODE_LEN: usize = 6;

/// Bet code patterns, most specific first
static BET_CODE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        // labelled codes
        r"\b(?i:bet\s*code|booking\s*code|share\s*code|code|reference|ref)\s*[:#]?\s*([A-Z0-9]{4,})",
        // bookmaker prefix + digits, e.g. SP1234567
        r"\b([A-Z]{2}\d{6,})\b",
        // generic numeric fallback
        r"\b(\d{8,})\b",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid bet code pattern"))
    .collect()
});

static TOTAL_ODDS_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)total\s+odds\s*[:\s]\s*([\d,]+\.?\d*)",
        r"(?i)\bodds\s*[:\s]\s*([\d,]+\.?\d*)",
        r"@\s*([\d,]+\.?\d*)",
        r"(?i)\btotal\s*[:\s]\s*([\d,]+\.?\d*)",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid total odds pattern"))
    .collect()
});

static POSSIBLE_WIN_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:possible|potential|max(?:imum)?)\s+(?:win(?:nings)?|payout|return)\s*[:\s]\s*(?:[A-Z]{2,4}\s*)?([\d,]+\.?\d*)")
        .expect("valid payout pattern")
});

static DATE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(\d{1,2})[/.-](\d{1,2})[/.-](\d{2}|\d{4})\b").expect("valid date pattern")
});

static TIME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b([01]?\d|2[0-3]):([0-5]\d)\b").expect("valid time pattern"));

static TIME_ONLY_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([01]?\d|2[0-3]):([0-5]\d)$").expect("valid time-only pattern"));

static TRAILING_ODDS_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(.*?)\s*@?\s*\b(\d{1,3}[.,]\d{2})$").expect("valid trailing odds pattern")
});

/// Parse a number that may carry thousands separators ("1,045.00")
pub fn parse_amount(raw: &str) -> Option<Decimal> {
    let cleaned = raw.trim().replace(',', "");
    if cleaned.is_empty() {
        return None;
    }
    cleaned.trim_end_matches('.').parse().ok()
}

/// Find the bet code in the concatenated slip text
pub fn extract_bet_code(text: &str) -> Option<String> {
    BET_CODE_PATTERNS.iter().find_map(|pattern| {
        pattern
            .captures_iter(text)
            .filter_map(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            .find(|code| is_valid_bet_code(code))
    })
}

fn is_valid_bet_code(code: &str) -> bool {
    code.len() >= MIN_BET_CODE_LEN
}

/// Find the stated total odds in the concatenated slip text
pub fn extract_total_odds(text: &str) -> Option<Decimal> {
    TOTAL_ODDS_PATTERNS.iter().find_map(|pattern| {
        pattern
            .captures_iter(text)
            .filter_map(|caps| caps.get(1))
            .find_map(|m| parse_amount(m.as_str()))
            .filter(|odds| *odds > Decimal::ZERO)
    })
}

/// Find the possible payout in the concatenated slip text
pub fn extract_possible_win(text: &str) -> Option<Decimal> {
    POSSIBLE_WIN_PATTERN
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| parse_amount(m.as_str()))
}

/// Split `"Home 1.85"` into `("Home", 1.85)`
///
/// Only a two-decimal figure at the very end counts, so goal lines such as
/// `"Over 2.5"` are left alone.
pub fn split_trailing_odds(text: &str) -> Option<(String, Decimal)> {
    let caps = TRAILING_ODDS_PATTERN.captures(text.trim())?;
    let odds = caps[2].replace(',', ".").parse().ok()?;
    Some((caps[1].trim().to_string(), odds))
}

/// Whether the line carries a calendar date
pub fn contains_date(text: &str) -> bool {
    DATE_PATTERN.is_match(text)
}

/// Whether the whole line is a kickoff time such as `19:45`
pub fn is_time_only(text: &str) -> bool {
    TIME_ONLY_PATTERN.is_match(text.trim())
}

/// Parse a `DD/MM/YY` or `DD/MM/YYYY` date with an optional `HH:MM` time
///
/// Two-digit years are taken as 20YY. Times are read as UTC.
pub fn parse_match_date(date_text: &str, time_text: Option<&str>) -> Option<DateTime<Utc>> {
    let caps = DATE_PATTERN.captures(date_text)?;
    let day: u32 = caps[1].parse().ok()?;
    let month: u32 = caps[2].parse().ok()?;
    let mut year: i32 = caps[3].parse().ok()?;
    if year < 100 {
        year += 2000;
    }
    let date = NaiveDate::from_ymd_opt(year, month, day)?;

    let time_source = time_text.unwrap_or(date_text);
    let time = TIME_PATTERN
        .captures(time_source)
        .and_then(|t| {
            let hour = t[1].parse().ok()?;
            let minute = t[2].parse().ok()?;
            NaiveTime::from_hms_opt(hour, minute, 0)
        })
        .unwrap_or_default();

    Utc.from_local_datetime(&date.and_time(time)).single()
}
