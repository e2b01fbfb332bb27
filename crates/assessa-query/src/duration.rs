//! Duration bound extraction.
//!
//! Patterns are tried in a fixed priority order and the first one that
//! matches anywhere in the query wins:
//!
//! 1. Ranges with a unit (`30-40 minutes`, `1 to 2 hours`); upper bound taken
//! 2. Minutes (`40 minutes`, `45 mins`, `30min`)
//! 3. Hours (`1 hour`, `2 hrs`, `an hour`)
//! 4. Unitless cues (`duration: 30`, `max 45`, `about 20`, `within 30`,
//!    `under 60`, `less than 40`), read as minutes
//!
//! Values may be decimal (`1.5 hours`, `2.5 mins`). Hour units convert to
//! minutes and the result is rounded to whole minutes. A match whose value
//! is zero or out of range does not end the search; the next pattern is
//! tried.

use std::sync::LazyLock;

use regex::{Captures, Regex};

#[derive(Debug, Clone, Copy)]
enum Unit {
    Minutes,
    Hours,
    FromCapture,
}

struct DurationPattern {
    regex: Regex,
    unit: Unit,
}

#[allow(clippy::expect_used)]
static PATTERNS: LazyLock<Vec<DurationPattern>> = LazyLock::new(|| {
    let compile = |pattern: &str, unit: Unit| DurationPattern {
        regex: Regex::new(pattern).expect("duration pattern is valid"),
        unit,
    };
    vec![
        compile(
            r"\b(\d+(?:\.\d+)?)\s*(?:-|–|—|to)\s*(\d+(?:\.\d+)?)\s*(minutes?|mins?|hours?|hrs?)\b",
            Unit::FromCapture,
        ),
        compile(r"\b(\d+(?:\.\d+)?)\s*(?:minutes?|mins?)\b", Unit::Minutes),
        compile(r"\b(\d+(?:\.\d+)?)\s*(?:hours?|hrs?)\b", Unit::Hours),
        compile(r"\ban\s+hour\b", Unit::Hours),
        compile(
            r"\b(?:duration|max|maximum|about|around|within|under|less\s+than)\s*[:\s]\s*(\d+)\b",
            Unit::Minutes,
        ),
    ]
});

/// Whole minutes for `value`, or `None` when the result is not a positive
/// `u32`.
fn to_minutes(value: f64, unit_text: Option<&str>, unit: Unit) -> Option<u32> {
    let hours = match unit {
        Unit::Hours => true,
        Unit::Minutes => false,
        Unit::FromCapture => unit_text.is_some_and(|u| u.starts_with('h')),
    };
    let minutes = if hours { value * 60.0 } else { value }.round();
    (minutes >= 1.0 && minutes <= f64::from(u32::MAX)).then_some(minutes as u32)
}

fn read_match(caps: &Captures<'_>, unit: Unit) -> Option<u32> {
    match unit {
        Unit::FromCapture => {
            let upper: f64 = caps.get(2)?.as_str().parse().ok()?;
            to_minutes(upper, caps.get(3).map(|m| m.as_str()), unit)
        }
        _ => {
            // "an hour" has no numeric capture.
            let value = match caps.get(1) {
                Some(m) => m.as_str().parse().ok()?,
                None => 1.0,
            };
            to_minutes(value, None, unit)
        }
    }
}

/// Extract the duration bound, in minutes, from normalized query text.
///
/// Returns `None` when no pattern yields a positive bound.
pub fn extract_duration(normalized_text: &str) -> Option<u32> {
    PATTERNS.iter().find_map(|pattern| {
        let caps = pattern.regex.captures(normalized_text)?;
        read_match(&caps, pattern.unit)
    })
}
