//! Fuzzy team-name similarity on a 0..=100 scale

use once_cell::sync::Lazy;
use std::collections::HashMap;
use strsim::normalized_levenshtein;

/// Bookmaker abbreviations mapped to the catalog's canonical names
static TEAM_ALIASES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("man utd", "manchester united"),
        ("man united", "manchester united"),
        ("man u", "manchester united"),
        ("man city", "manchester city"),
        ("spurs", "tottenham"),
        ("tottenham hotspur", "tottenham"),
        ("newcastle", "newcastle united"),
        ("west ham", "west ham united"),
        ("leicester", "leicester city"),
        ("brighton", "brighton hove albion"),
        ("brighton and hove albion", "brighton hove albion"),
        ("wolves", "wolverhampton wanderers"),
        ("nottm forest", "nottingham forest"),
        ("inter", "inter milan"),
        ("psg", "paris saint germain"),
    ])
});

/// Lowercase, strip punctuation, collapse whitespace, then apply aliases
pub fn normalize_team(name: &str) -> String {
    let cleaned = name
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() || c.is_whitespace() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");

    match TEAM_ALIASES.get(cleaned.as_str()) {
        Some(canonical) => (*canonical).to_string(),
        None => cleaned,
    }
}

/// Best of plain, partial and token-sorted edit similarity
pub fn team_similarity(a: &str, b: &str) -> f64 {
    let a = normalize_team(a);
    let b = normalize_team(b);
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    if a == b {
        return 100.0;
    }
    ratio(&a, &b)
        .max(partial_ratio(&a, &b))
        .max(token_sort_ratio(&a, &b))
}

/// Per-side similarity of a candidate pair against a target pair
pub fn pair_similarity(home: &str, away: &str, candidate_home: &str, candidate_away: &str) -> (f64, f64) {
    (
        team_similarity(home, candidate_home),
        team_similarity(away, candidate_away),
    )
}

fn ratio(a: &str, b: &str) -> f64 {
    normalized_levenshtein(a, b) * 100.0
}

/// Shorter string against every same-length window of the longer one
fn partial_ratio(a: &str, b: &str) -> f64 {
    let (short, long) = if a.chars().count() <= b.chars().count() {
        (a, b)
    } else {
        (b, a)
    };
    let short_len = short.chars().count();
    let long_chars: Vec<char> = long.chars().collect();
    if short_len == long_chars.len() {
        return ratio(short, long);
    }

    long_chars
        .windows(short_len)
        .map(|window| ratio(short, &window.iter().collect::<String>()))
        .fold(0.0, f64::max)
}

fn token_sort_ratio(a: &str, b: &str) -> f64 {
    ratio(&sorted_tokens(a), &sorted_tokens(b))
}

fn sorted_tokens(s: &str) -> String {
    let mut tokens: Vec<&str> = s.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}
