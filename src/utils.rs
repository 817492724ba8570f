use chrono::{DateTime, Local, NaiveDate, NaiveTime, TimeZone, Timelike, Utc};
use directories::ProjectDirs;
use std::path::PathBuf;

/// Profile mode for the application (dev or prod)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    Dev,
    Prod,
}

impl Profile {
    fn app_name(self) -> &'static str {
        match self {
            Profile::Dev => "sleeplog-dev",
            Profile::Prod => "sleeplog",
        }
    }
}

/// Get the configuration directory path for sleeplog
/// If profile is Dev, uses "sleeplog-dev" instead of "sleeplog"
pub fn get_config_dir(profile: Profile) -> Option<PathBuf> {
    ProjectDirs::from("com", "sleeplog", profile.app_name())
        .map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the data directory path (log files live here)
pub fn get_data_dir(profile: Profile) -> Option<PathBuf> {
    ProjectDirs::from("com", "sleeplog", profile.app_name())
        .map(|dirs| dirs.data_dir().to_path_buf())
}

/// Parse a date string in ISO 8601 format (YYYY-MM-DD)
pub fn parse_date(date_str: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
}

/// Format a date the way the backend expects it in query strings
pub fn format_query_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Parse a 24-hour "HH:MM" string as typed on the command line
pub fn parse_hour_minute(s: &str) -> Result<NaiveTime, chrono::ParseError> {
    NaiveTime::parse_from_str(s.trim(), "%H:%M")
}

pub const AM_LABEL: &str = "오전";
pub const PM_LABEL: &str = "오후";

/// Format a time as the backend's 12-hour label, e.g. `오후 11:00`.
///
/// The period labels are part of the wire format for sleep goals, so they
/// are not localised.
pub fn format_time_label(time: NaiveTime) -> String {
    let hours = time.hour();
    let period = if hours >= 12 { PM_LABEL } else { AM_LABEL };
    let hour12 = match hours % 12 {
        0 => 12,
        h => h,
    };
    format!("{} {}:{:02}", period, hour12, time.minute())
}

/// Parse a label produced by [`format_time_label`] back into a time.
/// Returns `None` for anything that does not match the pattern.
pub fn parse_time_label(label: &str) -> Option<NaiveTime> {
    let label = label.trim().trim_matches('"');
    let (period, clock) = label.split_once(' ')?;
    let (h, m) = clock.trim().split_once(':')?;
    let hour12: u32 = h.parse().ok()?;
    let minute: u32 = m.parse().ok()?;
    if !(1..=12).contains(&hour12) || minute > 59 {
        return None;
    }
    let hour = match period {
        AM_LABEL => hour12 % 12,
        PM_LABEL => hour12 % 12 + 12,
        _ => return None,
    };
    NaiveTime::from_hms_opt(hour, minute, 0)
}

/// Format an intake time for the caffeine endpoint: UTC, second precision,
/// no offset suffix.
pub fn format_api_datetime<Tz: TimeZone>(time: &DateTime<Tz>) -> String {
    time.with_timezone(&Utc).format("%Y-%m-%dT%H:%M:%S").to_string()
}

/// Drop seconds and sub-second precision from a local timestamp
pub fn truncate_to_minute(time: DateTime<Local>) -> DateTime<Local> {
    time.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(time)
}

/// Combine a calendar date with a wall-clock time in the local zone.
/// Falls back to the earliest valid instant around DST gaps.
pub fn local_datetime(date: NaiveDate, time: NaiveTime) -> DateTime<Local> {
    let naive = date.and_time(time);
    match Local.from_local_datetime(&naive) {
        chrono::LocalResult::Single(dt) => dt,
        chrono::LocalResult::Ambiguous(earliest, _) => earliest,
        chrono::LocalResult::None => Local.from_utc_datetime(&naive),
    }
}

/// Parsed key binding information
#[derive(Debug, Clone)]
pub struct ParsedKeyBinding {
    pub key_code: crossterm::event::KeyCode,
    pub requires_ctrl: bool,
}

/// Check if a key event has the primary modifier (Ctrl on Windows/Linux, Option/Alt on macOS)
pub fn has_primary_modifier(modifiers: crossterm::event::KeyModifiers) -> bool {
    #[cfg(target_os = "macos")]
    {
        modifiers.contains(crossterm::event::KeyModifiers::CONTROL)
            || modifiers.contains(crossterm::event::KeyModifiers::ALT)
    }

    #[cfg(not(target_os = "macos"))]
    {
        modifiers.contains(crossterm::event::KeyModifiers::CONTROL)
    }
}

/// Format a key binding string for display, showing the platform-appropriate modifier
pub fn format_key_binding_for_display(key_binding: &str) -> String {
    #[cfg(target_os = "macos")]
    {
        key_binding.replace("Ctrl+", "Opt+")
    }

    #[cfg(not(target_os = "macos"))]
    {
        key_binding.to_string()
    }
}

/// Parse a key binding string from config into a ParsedKeyBinding
/// Supports: single keys ("q", "n"), special keys ("Enter", "Left"), and "Ctrl+x"
pub fn parse_key_binding(key_str: &str) -> Result<ParsedKeyBinding, String> {
    let key_str = key_str.trim();

    if let Some(key_part) = key_str.strip_prefix("Ctrl+") {
        let key_code = parse_key_code(key_part)?;
        return Ok(ParsedKeyBinding {
            key_code,
            requires_ctrl: true,
        });
    }

    let key_code = parse_key_code(key_str)?;
    Ok(ParsedKeyBinding {
        key_code,
        requires_ctrl: false,
    })
}

/// Check whether a key event matches a configured binding string
pub fn key_matches(binding: &str, key_event: &crossterm::event::KeyEvent) -> bool {
    match parse_key_binding(binding) {
        Ok(parsed) => {
            parsed.key_code == key_event.code
                && parsed.requires_ctrl == has_primary_modifier(key_event.modifiers)
        }
        Err(_) => false,
    }
}

/// Parse a key code from a string (without modifiers)
fn parse_key_code(key_str: &str) -> Result<crossterm::event::KeyCode, String> {
    use crossterm::event::KeyCode;
    match key_str {
        "Enter" => Ok(KeyCode::Enter),
        "Esc" | "Escape" => Ok(KeyCode::Esc),
        "Backspace" => Ok(KeyCode::Backspace),
        "Tab" => Ok(KeyCode::Tab),
        "Space" | " " => Ok(KeyCode::Char(' ')),
        "Left" => Ok(KeyCode::Left),
        "Right" => Ok(KeyCode::Right),
        "Up" => Ok(KeyCode::Up),
        "Down" => Ok(KeyCode::Down),
        "Home" => Ok(KeyCode::Home),
        "End" => Ok(KeyCode::End),
        "PageUp" => Ok(KeyCode::PageUp),
        "PageDown" => Ok(KeyCode::PageDown),
        "Delete" => Ok(KeyCode::Delete),
        _ => {
            if let Some(n) = key_str.strip_prefix('F') {
                if let Ok(n) = n.parse::<u8>() {
                    if (1..=12).contains(&n) {
                        return Ok(KeyCode::F(n));
                    }
                }
            }
            let mut chars = key_str.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Ok(KeyCode::Char(c)),
                _ => Err(format!("Unknown key binding: {}", key_str)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    #[test]
    fn time_label_round_trips_every_minute() {
        for hour in 0..24 {
            for minute in 0..60 {
                let time = NaiveTime::from_hms_opt(hour, minute, 0).unwrap();
                let label = format_time_label(time);
                let parsed = parse_time_label(&label).unwrap();
                assert_eq!((parsed.hour(), parsed.minute()), (hour, minute), "{label}");
            }
        }
    }

    #[test]
    fn time_label_uses_twelve_hour_clock() {
        let eleven_pm = NaiveTime::from_hms_opt(23, 0, 0).unwrap();
        assert_eq!(format_time_label(eleven_pm), "오후 11:00");
        let midnight = NaiveTime::from_hms_opt(0, 5, 0).unwrap();
        assert_eq!(format_time_label(midnight), "오전 12:05");
        let noon = NaiveTime::from_hms_opt(12, 30, 0).unwrap();
        assert_eq!(format_time_label(noon), "오후 12:30");
    }

    #[test]
    fn malformed_time_labels_are_rejected() {
        assert!(parse_time_label("").is_none());
        assert!(parse_time_label("11:00").is_none());
        assert!(parse_time_label("PM 11:00").is_none());
        assert!(parse_time_label("오후 13:00").is_none());
        assert!(parse_time_label("오후 11:75").is_none());
        assert!(parse_time_label("오후 eleven").is_none());
    }

    #[test]
    fn quoted_time_label_is_accepted() {
        let parsed = parse_time_label("\"오후 11:00\"").unwrap();
        assert_eq!(parsed, NaiveTime::from_hms_opt(23, 0, 0).unwrap());
    }

    #[test]
    fn api_datetime_has_no_fractional_seconds() {
        let time = Utc.with_ymd_and_hms(2024, 5, 1, 13, 5, 9).unwrap()
            + chrono::Duration::nanoseconds(987_654_321);
        let formatted = format_api_datetime(&time);
        assert_eq!(formatted, "2024-05-01T13:05:09");
        assert!(!formatted.contains('.'));
    }

    #[test]
    fn parses_key_bindings() {
        let parsed = parse_key_binding("Ctrl+s").unwrap();
        assert!(parsed.requires_ctrl);
        assert_eq!(parsed.key_code, KeyCode::Char('s'));
        assert_eq!(parse_key_binding("F1").unwrap().key_code, KeyCode::F(1));
        assert!(parse_key_binding("Hyper+x").is_err());
    }

    #[test]
    fn key_matches_respects_modifier() {
        let plain = KeyEvent::new(KeyCode::Char('n'), KeyModifiers::NONE);
        assert!(key_matches("n", &plain));
        assert!(!key_matches("Ctrl+n", &plain));
    }
}
