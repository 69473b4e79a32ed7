//! Alert message composition

use chrono::{DateTime, Utc};

use crate::models::{AlertMessage, Category};

/// Marker appended when advisory text is cut.
const ELLIPSIS: char = '…';

/// Compose the alert message for a classified reading.
///
/// The shape is fixed:
///
/// ```text
/// Alert: The current PM2.5 AQI is {value} which is considered '{label}'. {advisory}
/// ```
///
/// Advisory text comes from the category table verbatim. If the full text
/// would exceed `max_len` characters, the advisory (and only the advisory)
/// is truncated at a word boundary and suffixed with `…`; the category
/// label and value are never cut. Deterministic for a given input.
pub fn compose(
    value: f64,
    category: Category,
    max_len: usize,
    composed_at: DateTime<Utc>,
) -> AlertMessage {
    let advisory = category.advisory();
    let prefix = format!(
        "Alert: The current PM2.5 AQI is {} which is considered '{}'. ",
        format_value(value),
        category.label()
    );

    let prefix_len = prefix.chars().count();
    let text = if prefix_len + advisory.chars().count() <= max_len {
        format!("{prefix}{advisory}")
    } else {
        let budget = max_len.saturating_sub(prefix_len + 1);
        format!("{prefix}{}{ELLIPSIS}", truncate_words(advisory, budget))
    };

    AlertMessage {
        category,
        value,
        advisory_text: advisory.to_string(),
        text,
        composed_at,
    }
}

/// The feed reports AQI as whole numbers; render integral values without a
/// decimal point so `150.0` reads as `150`.
fn format_value(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value}")
    }
}

/// Longest prefix of `text` that fits in `budget` characters without
/// splitting a word.
fn truncate_words(text: &str, budget: usize) -> String {
    let mut out = String::new();
    let mut used = 0;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();
        let needed = if out.is_empty() { word_len } else { word_len + 1 };
        if used + needed > budget {
            break;
        }
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
        used += needed;
    }

    out
}
