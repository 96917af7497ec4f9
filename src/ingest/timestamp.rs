use std::sync::LazyLock;

use regex::Regex;

/// `[H:]M:SS[.fff]`, `S.fff`, optionally wrapped in square brackets.
static TIMESTAMP_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[?(\d{1,3}(?::\d{1,2}){0,2})(?:[.,](\d+))?\]?$")
        .expect("invalid timestamp regex")
});

/// Stricter form for timestamp tags, at a line start or in the middle of
/// prose: bracketed, or a clock with a fractional part, or seconds with
/// exactly three fractional digits. `3.5` and `12:30` stay prose.
static TAG_TIMESTAMP_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\[[^\]]+\]|\d{1,3}(?::\d{1,2}){1,2}[.,]\d+|\d{1,2}[.,]\d{3})$")
        .expect("invalid tag timestamp regex")
});

/// Renders `M:SS.mmm` when at least a minute has elapsed, `S.mmm` otherwise.
pub fn format_timestamp(seconds: f64) -> String {
    let total_ms = (seconds.max(0.0) * 1000.0).round() as u64;
    let minutes = total_ms / 60_000;
    let secs = (total_ms % 60_000) / 1_000;
    let millis = total_ms % 1_000;
    if minutes > 0 {
        format!("{minutes}:{secs:02}.{millis:03}")
    } else {
        format!("{secs}.{millis:03}")
    }
}

/// Parses `[H:]M:SS[.fff]`, `H:MM:SS` and `S.fff` (comma decimals accepted).
/// Plain integers are not timestamps.
pub fn parse_timestamp(text: &str) -> Option<f64> {
    let caps = TIMESTAMP_PATTERN.captures(text.trim())?;
    let clock = caps.get(1)?.as_str();
    let fraction = caps.get(2).map(|m| m.as_str());
    let bracketed = text.trim().starts_with('[') && text.trim().ends_with(']');
    if text.trim().starts_with('[') != text.trim().ends_with(']') {
        return None;
    }

    let parts: Vec<u64> = clock
        .split(':')
        .map(|p| p.parse::<u64>().ok())
        .collect::<Option<_>>()?;
    if parts.len() == 1 && fraction.is_none() && !bracketed {
        return None;
    }
    // Every unit after the leading one must stay below 60.
    if parts.iter().skip(1).any(|&p| p >= 60) {
        return None;
    }

    let whole = parts.iter().fold(0u64, |acc, &p| acc * 60 + p) as f64;
    let frac = match fraction {
        Some(digits) => format!("0.{digits}").parse::<f64>().ok()?,
        None => 0.0,
    };
    Some(whole + frac)
}

/// Whether a whitespace-delimited token is a timestamp tag rather than a
/// number that belongs to the prose.
pub(crate) fn is_timestamp_tag(token: &str) -> bool {
    TAG_TIMESTAMP_PATTERN.is_match(token) && parse_timestamp(token).is_some()
}
