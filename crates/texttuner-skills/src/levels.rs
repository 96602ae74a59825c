//! Style levels — the valid adjust range, the fixed display-label table,
//! and parsing of the detector's reply.

use texttuner_core::error::ValidationError;

/// Lowest level the adjust skill accepts.
pub const MIN_STYLE_LEVEL: i32 = -2;
/// Highest level the adjust skill accepts.
pub const MAX_STYLE_LEVEL: i32 = 2;

/// Label for any level outside the table.
pub const UNKNOWN_LABEL: &str = "未知";

/// Display names, one per level in `MIN_STYLE_LEVEL..=MAX_STYLE_LEVEL`.
const LEVEL_NAMES: &[(i32, &str)] = &[
    (-2, "返璞归真"),
    (-1, "简洁明了"),
    (0, "中规中矩"),
    (1, "小装一下"),
    (2, "装到极致"),
];

/// Display label for a level, e.g. `1` → `"小装一下 级别1"`.
///
/// Levels the table does not cover (the detector occasionally answers
/// `-3`) render as [`UNKNOWN_LABEL`].
pub fn level_label(level: i32) -> String {
    match LEVEL_NAMES.iter().find(|(l, _)| *l == level) {
        Some((_, name)) => format!("{name} 级别{level}"),
        None => UNKNOWN_LABEL.to_string(),
    }
}

/// Reject levels outside `MIN_STYLE_LEVEL..=MAX_STYLE_LEVEL`.
pub fn validate_style_level(level: i32) -> Result<i32, ValidationError> {
    if (MIN_STYLE_LEVEL..=MAX_STYLE_LEVEL).contains(&level) {
        Ok(level)
    } else {
        Err(ValidationError::LevelOutOfRange(level))
    }
}

/// Parse the detector's reply as a signed integer.
///
/// Reads a leading integer after trimming whitespace and quotes, so
/// `"1"`, `" -2\n"`, `"1级"`, and `"−1"` (U+2212) all parse; anything
/// without a leading number does not.
pub fn parse_level(reply: &str) -> Option<i32> {
    let trimmed = reply
        .trim()
        .trim_matches(|c| matches!(c, '"' | '\'' | '`' | '“' | '”'))
        .trim_start();

    let mut chars = trimmed.chars().peekable();
    let negative = match chars.peek() {
        Some('-') | Some('−') | Some('－') => {
            chars.next();
            true
        }
        Some('+') => {
            chars.next();
            false
        }
        _ => false,
    };

    let digits: String = chars.take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }

    let magnitude: i32 = digits.parse().ok()?;
    Some(if negative { -magnitude } else { magnitude })
}
