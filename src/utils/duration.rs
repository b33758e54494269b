//! Duration parsing for mute commands.
//!
//! Accepts loose text such as `10分`, `1h`, `1天2小时` or `2 days 3 hours`
//! and sums every `<number><unit>` token found. Anything else is ignored.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::MAX_MUTE_MS;
use crate::i18n::get_text;

const MINUTE_MS: u64 = 60 * 1000;
const HOUR_MS: u64 = 60 * MINUTE_MS;
const DAY_MS: u64 = 24 * HOUR_MS;

// Longer alternatives first: the regex crate picks the leftmost-first branch.
static TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"([0-9]+)\s*(分钟|分|小时|时|天|日|(?i:minutes|minute|mins|min|hours|hour|hrs|hr|h|days|day|d|m))",
    )
    .expect("duration token pattern is valid")
});

/// Parse a duration expression into milliseconds.
///
/// Returns 0 when no token is found. The result never exceeds
/// [`MAX_MUTE_MS`].
pub fn parse_duration(input: &str) -> u64 {
    let mut total: u64 = 0;

    for caps in TOKEN.captures_iter(input) {
        let (Some(whole), Some(number), Some(unit)) = (caps.get(0), caps.get(1), caps.get(2))
        else {
            continue;
        };

        // "5mx" is not a minute token
        if unit.as_str().is_ascii()
            && input[whole.end()..]
                .chars()
                .next()
                .is_some_and(|c| c.is_ascii_alphabetic())
        {
            continue;
        }

        let amount = number.as_str().parse::<u64>().unwrap_or(u64::MAX);
        total = total.saturating_add(amount.saturating_mul(unit_ms(unit.as_str())));
    }

    total.min(MAX_MUTE_MS)
}

fn unit_ms(unit: &str) -> u64 {
    match unit.chars().next().map(|c| c.to_ascii_lowercase()) {
        Some('分') | Some('m') => MINUTE_MS,
        Some('小') | Some('时') | Some('h') => HOUR_MS,
        _ => DAY_MS,
    }
}

/// Render milliseconds as days/hours/minutes in the given locale.
pub fn format_duration(ms: u64, locale: &str) -> String {
    let days = ms / DAY_MS;
    let hours = (ms % DAY_MS) / HOUR_MS;
    let minutes = (ms % HOUR_MS) / MINUTE_MS;

    let mut parts = Vec::new();
    for (value, key) in [
        (days, "duration.days"),
        (hours, "duration.hours"),
        (minutes, "duration.minutes"),
    ] {
        if value > 0 {
            parts.push(get_text(locale, key).replace("{n}", &value.to_string()));
        }
    }

    if parts.is_empty() {
        let seconds = (ms / 1000).to_string();
        return get_text(locale, "duration.seconds").replace("{n}", &seconds);
    }

    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration_units() {
        assert_eq!(parse_duration("10分"), 600_000);
        assert_eq!(parse_duration("10分钟"), 600_000);
        assert_eq!(parse_duration("1h"), 3_600_000);
        assert_eq!(parse_duration("1天2小时"), 93_600_000);
        assert_eq!(parse_duration("3 days"), 3 * DAY_MS);
        assert_eq!(parse_duration("2HRS 5min"), 2 * HOUR_MS + 5 * MINUTE_MS);
    }

    #[test]
    fn test_parse_duration_mixed_order() {
        assert_eq!(
            parse_duration("30m then 1d and 2时"),
            30 * MINUTE_MS + DAY_MS + 2 * HOUR_MS
        );
        assert_eq!(parse_duration("1h30m"), HOUR_MS + 30 * MINUTE_MS);
    }

    #[test]
    fn test_parse_duration_nothing_found() {
        assert_eq!(parse_duration(""), 0);
        assert_eq!(parse_duration("abc"), 0);
        assert_eq!(parse_duration("5mx"), 0);
        assert_eq!(parse_duration("分钟"), 0);
    }

    #[test]
    fn test_parse_duration_caps() {
        assert_eq!(parse_duration("30天"), MAX_MUTE_MS);
        assert_eq!(parse_duration("99999999999999999999999d"), 2_595_540_000);
        assert_eq!(parse_duration("29天23小时59分"), MAX_MUTE_MS);
    }

    #[test]
    fn test_parse_duration_is_pure() {
        let input = "1天 2小时 3分";
        assert_eq!(parse_duration(input), parse_duration(input));
    }

    #[test]
    fn test_format_duration() {
        crate::i18n::init();
        assert_eq!(format_duration(93_600_000, "en"), "1d 2h");
        assert_eq!(format_duration(600_000, "zh"), "10分钟");
        assert_eq!(format_duration(5_000, "en"), "5s");
    }
}
