//! Duration and difficulty codec
//!
//! Knowledge points carry learning time as localized strings ("30分钟",
//! "2小时") and difficulty as ordinal labels. This module converts both
//! to comparable numbers and back so paths can be aggregated. Malformed
//! input degrades to defaults instead of failing.

use std::sync::LazyLock;

use regex::Regex;

/// Minutes assumed when a duration string carries no recognizable unit
pub const DEFAULT_MINUTES: u32 = 30;

/// Label returned when difficulty cannot be resolved
pub const DEFAULT_DIFFICULTY: &str = "中级";

/// Ordinal difficulty scale, lowest first
pub const DIFFICULTY_SCORES: &[(&str, u32)] = &[
    ("入门", 1),
    ("初级", 2),
    ("中级", 3),
    ("高级", 4),
    ("专家", 5),
];

static HOURS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)\s*小时").expect("hours regex"));
static MINUTES_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)\s*分钟").expect("minutes regex"));

/// Parse a localized duration string into minutes
///
/// The digit run immediately before each unit marker is used, so mixed
/// strings like "1小时30分钟" resolve to 90. Neither marker present
/// falls back to [`DEFAULT_MINUTES`].
pub fn parse_duration(text: &str) -> u32 {
    let hours = HOURS_RE
        .captures(text)
        .and_then(|c| c[1].parse::<u32>().ok())
        .unwrap_or(0);
    let minutes = MINUTES_RE
        .captures(text)
        .and_then(|c| c[1].parse::<u32>().ok())
        .unwrap_or(0);

    if hours == 0 && minutes == 0 && !HOURS_RE.is_match(text) && !MINUTES_RE.is_match(text) {
        return DEFAULT_MINUTES;
    }
    hours * 60 + minutes
}

/// Render minutes back into the localized form
pub fn format_duration(minutes: u32) -> String {
    if minutes >= 60 {
        let hours = minutes / 60;
        let rest = minutes % 60;
        if rest > 0 {
            format!("{hours}小时{rest}分钟")
        } else {
            format!("{hours}小时")
        }
    } else {
        format!("{minutes}分钟")
    }
}

/// Sum a collection of duration strings, in minutes
pub fn sum_durations<'a, I>(durations: I) -> u32
where
    I: IntoIterator<Item = &'a str>,
{
    durations.into_iter().map(parse_duration).sum()
}

/// Ordinal score for a difficulty label; unknown labels sit mid-scale
pub fn difficulty_score(label: &str) -> u32 {
    DIFFICULTY_SCORES
        .iter()
        .find(|(name, _)| *name == label)
        .map(|(_, score)| *score)
        .unwrap_or(3)
}

/// Average a set of difficulty labels back onto the ordinal scale
///
/// Returns the first label whose score is within 0.5 of the mean;
/// [`DEFAULT_DIFFICULTY`] when nothing is (or the input is empty).
pub fn average_difficulty<'a, I>(labels: I) -> &'static str
where
    I: IntoIterator<Item = &'a str>,
{
    let scores: Vec<u32> = labels.into_iter().map(difficulty_score).collect();
    if scores.is_empty() {
        return DEFAULT_DIFFICULTY;
    }
    let mean = scores.iter().sum::<u32>() as f64 / scores.len() as f64;

    for (label, score) in DIFFICULTY_SCORES {
        if (mean - *score as f64).abs() < 0.5 {
            return label;
        }
    }
    DEFAULT_DIFFICULTY
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_duration_minutes() {
        assert_eq!(parse_duration("30分钟"), 30);
        assert_eq!(parse_duration("大约45分钟左右"), 45);
    }

    #[test]
    fn test_parse_duration_hours() {
        assert_eq!(parse_duration("2小时"), 120);
        assert_eq!(parse_duration("2 小时"), 120);
    }

    #[test]
    fn test_parse_duration_mixed() {
        assert_eq!(parse_duration("1小时30分钟"), 90);
    }

    #[test]
    fn test_parse_duration_default() {
        assert_eq!(parse_duration(""), DEFAULT_MINUTES);
        assert_eq!(parse_duration("很久"), DEFAULT_MINUTES);
    }

    #[test]
    fn test_parse_duration_zero_with_marker() {
        // "0分钟" carries a marker, so it does not fall back to the default
        assert_eq!(parse_duration("0分钟"), 0);
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(90), "1小时30分钟");
        assert_eq!(format_duration(120), "2小时");
        assert_eq!(format_duration(45), "45分钟");
        assert_eq!(format_duration(0), "0分钟");
    }

    #[test]
    fn test_sum_durations() {
        assert_eq!(sum_durations(["30分钟", "1小时"]), 90);
        assert_eq!(sum_durations(["不知道"]), DEFAULT_MINUTES);
        assert_eq!(sum_durations([]), 0);
    }

    #[test]
    fn test_average_difficulty_midpoint() {
        // 入门=1, 中级=3 -> mean 2.0 -> 初级
        assert_eq!(average_difficulty(["入门", "中级"]), "初级");
    }

    #[test]
    fn test_average_difficulty_exact() {
        assert_eq!(average_difficulty(["高级"]), "高级");
    }

    #[test]
    fn test_average_difficulty_unknown_scores_as_mid() {
        assert_eq!(average_difficulty(["没听说过"]), "中级");
    }

    #[test]
    fn test_average_difficulty_empty() {
        assert_eq!(average_difficulty([]), DEFAULT_DIFFICULTY);
    }

    #[test]
    fn test_average_difficulty_no_label_within_half() {
        // 入门=1, 初级=2, 专家=5, 专家=5 -> mean 3.25 -> 中级 (|3.25-3| < 0.5)
        assert_eq!(average_difficulty(["入门", "初级", "专家", "专家"]), "中级");
        // 入门=1, 高级=4 -> mean 2.5 -> nothing within 0.5, default
        assert_eq!(average_difficulty(["入门", "高级"]), DEFAULT_DIFFICULTY);
    }

    proptest! {
        #[test]
        fn prop_duration_round_trip(minutes in 0u32..10_000) {
            prop_assert_eq!(parse_duration(&format_duration(minutes)), minutes);
        }
    }
}
