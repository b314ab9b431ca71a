//! `HH:MM:SS.mmm` timecodes.
//!
//! Fade positions are usually fed to other tools as split points, for
//! example `mkvmerge --split timecodes:00:01:02.500,00:04:10.000`. These
//! helpers format event timestamps that way and parse them back from
//! command-line arguments.

use std::time::Duration;

use crate::error::FadeError;

/// Format a duration as `HH:MM:SS.mmm`, truncating to the millisecond.
///
/// Hours are not wrapped, so durations past 99 hours widen the first field.
///
/// ```
/// use std::time::Duration;
///
/// assert_eq!(fadescan::format_timecode(Duration::from_millis(3_723_045)), "01:02:03.045");
/// ```
pub fn format_timecode(duration: Duration) -> String {
    let total_millis = duration.as_millis();
    let millis = total_millis % 1000;
    let total_seconds = total_millis / 1000;
    let seconds = total_seconds % 60;
    let minutes = (total_seconds / 60) % 60;
    let hours = total_seconds / 3600;
    format!("{hours:02}:{minutes:02}:{seconds:02}.{millis:03}")
}

/// Parse a timecode.
///
/// Accepts plain seconds (`"12.5"`), `MM:SS[.fff]` and `HH:MM:SS[.fff]`.
/// Minute and second fields of the colon forms must be below 60.
///
/// # Errors
///
/// Returns [`FadeError::InvalidConfig`] for anything else, including
/// negative or non-finite values.
pub fn parse_timecode(text: &str) -> Result<Duration, FadeError> {
    let text = text.trim();
    let invalid = |reason: &str| {
        FadeError::invalid_config("timecode", format!("{reason}: {text:?}"))
    };

    let fields: Vec<&str> = text.split(':').collect();
    let (hours, minutes, seconds) = match fields.as_slice() {
        [seconds] => (0, 0, *seconds),
        [minutes, seconds] => (0, parse_whole(minutes).ok_or_else(|| invalid("bad minutes"))?, *seconds),
        [hours, minutes, seconds] => (
            parse_whole(hours).ok_or_else(|| invalid("bad hours"))?,
            parse_whole(minutes).ok_or_else(|| invalid("bad minutes"))?,
            *seconds,
        ),
        _ => return Err(invalid("too many fields")),
    };

    let seconds: f64 = seconds.parse().map_err(|_| invalid("bad seconds"))?;
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(invalid("seconds must be a non-negative number"));
    }
    if fields.len() > 1 && (minutes >= 60 || seconds >= 60.0) {
        return Err(invalid("minutes and seconds must be below 60"));
    }

    let whole = hours * 3600 + minutes * 60;
    Ok(Duration::from_secs(whole) + Duration::from_secs_f64(seconds))
}

fn parse_whole(field: &str) -> Option<u64> {
    if field.is_empty() || !field.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    field.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_zero_and_large_values() {
        assert_eq!(format_timecode(Duration::ZERO), "00:00:00.000");
        assert_eq!(format_timecode(Duration::from_millis(2502)), "00:00:02.502");
        assert_eq!(
            format_timecode(Duration::from_secs(100 * 3600 + 59)),
            "100:00:59.000"
        );
    }

    #[test]
    fn truncates_sub_millisecond_parts() {
        assert_eq!(format_timecode(Duration::from_micros(1_999)), "00:00:00.001");
    }

    #[test]
    fn parses_all_accepted_forms() {
        assert_eq!(parse_timecode("90").unwrap(), Duration::from_secs(90));
        assert_eq!(parse_timecode("1.5").unwrap(), Duration::from_millis(1500));
        assert_eq!(parse_timecode("01:30").unwrap(), Duration::from_secs(90));
        assert_eq!(
            parse_timecode("01:02:03.250").unwrap(),
            Duration::from_millis(3_723_250)
        );
    }

    #[test]
    fn parses_formatted_output() {
        let duration = Duration::from_millis(5_025_125);
        assert_eq!(parse_timecode(&format_timecode(duration)).unwrap(), duration);
    }

    #[test]
    fn rejects_malformed_input() {
        for text in ["", "abc", "1:2:3:4", "00:60", "00:00:61", "-5", "1:-2", "inf", "x:10"] {
            assert!(
                matches!(parse_timecode(text), Err(FadeError::InvalidConfig { .. })),
                "{text:?} should be rejected"
            );
        }
    }
}
