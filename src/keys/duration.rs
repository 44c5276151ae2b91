use std::fmt;
use std::str::FromStr;

use chrono::Duration;

use super::KeyError;

/// Lifetimes a key can be issued with. Raw second counts are never accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyDuration {
    OneHour,
    OneDay,
    SevenDays,
    ThirtyDays,
}

impl KeyDuration {
    pub const ALL: [KeyDuration; 4] = [
        KeyDuration::OneHour,
        KeyDuration::OneDay,
        KeyDuration::SevenDays,
        KeyDuration::ThirtyDays,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OneHour => "1h",
            Self::OneDay => "24h",
            Self::SevenDays => "7d",
            Self::ThirtyDays => "30d",
        }
    }

    pub fn ttl(&self) -> Duration {
        match self {
            Self::OneHour => Duration::hours(1),
            Self::OneDay => Duration::hours(24),
            Self::SevenDays => Duration::days(7),
            Self::ThirtyDays => Duration::days(30),
        }
    }
}

impl FromStr for KeyDuration {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        KeyDuration::ALL
            .into_iter()
            .find(|d| d.as_str() == s)
            .ok_or_else(|| KeyError::InvalidDuration(s.to_string()))
    }
}

impl fmt::Display for KeyDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_supported_durations() {
        assert_eq!("1h".parse::<KeyDuration>().unwrap(), KeyDuration::OneHour);
        assert_eq!("24h".parse::<KeyDuration>().unwrap(), KeyDuration::OneDay);
        assert_eq!("7d".parse::<KeyDuration>().unwrap(), KeyDuration::SevenDays);
        assert_eq!("30d".parse::<KeyDuration>().unwrap(), KeyDuration::ThirtyDays);
    }

    #[test]
    fn test_parse_rejects_unknown_and_names_it() {
        let err = "invalid".parse::<KeyDuration>().unwrap_err();
        assert!(matches!(&err, KeyError::InvalidDuration(v) if v == "invalid"));
        assert!(err.to_string().contains("invalid"));
        assert_eq!(err.code(), "invalid_duration");

        // Close-but-wrong spellings are not normalized.
        assert!("1H".parse::<KeyDuration>().is_err());
        assert!(" 1h".parse::<KeyDuration>().is_err());
        assert!("3600".parse::<KeyDuration>().is_err());
        assert!("".parse::<KeyDuration>().is_err());
    }

    #[test]
    fn test_ttl_seconds() {
        assert_eq!(KeyDuration::OneHour.ttl().num_seconds(), 3_600);
        assert_eq!(KeyDuration::OneDay.ttl().num_seconds(), 86_400);
        assert_eq!(KeyDuration::SevenDays.ttl().num_seconds(), 604_800);
        assert_eq!(KeyDuration::ThirtyDays.ttl().num_seconds(), 2_592_000);
    }

    #[test]
    fn test_display_matches_wire_form() {
        for d in KeyDuration::ALL {
            assert_eq!(d.to_string().parse::<KeyDuration>().unwrap(), d);
        }
    }
}
