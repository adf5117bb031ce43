//! Race clock parsing and formatting.
//!
//! Race times are carried as whole milliseconds. The text form is
//! `H:MM:SS` or `H:MM:SS.fff` (1-2 digit hours, 2-digit minutes and seconds,
//! 1-3 digit fraction). `DNS`, `DNF`, `N/A` and the empty string are
//! sentinels meaning "no time".

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Pre-compiled pattern for race clock strings.
static RACE_TIME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,2}):(\d{2}):(\d{2})(?:\.(\d{1,3}))?$").expect("valid race time pattern")
});

/// Strings that stand for "no time recorded".
const SENTINELS: [&str; 3] = ["DNS", "DNF", "N/A"];

const MS_PER_SECOND: u64 = 1_000;
const MS_PER_MINUTE: u64 = 60 * MS_PER_SECOND;
const MS_PER_HOUR: u64 = 60 * MS_PER_MINUTE;

/// Why a string could not be read as a race time.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TimeParseError {
    /// A sentinel such as `DNF` or an empty string.
    #[error("no time recorded ({0:?})")]
    Sentinel(String),

    /// Text matching none of the accepted shapes.
    #[error("malformed race time: {0:?}")]
    MalformedDuration(String),
}

/// Display style for [`RaceTime::format`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeFormat {
    /// `H:MM:SS[.fff]`.
    #[default]
    Full,
    /// `MM:SS[.fff]` with hours folded into minutes, for short splits.
    MinutesSeconds,
}

/// An elapsed race duration with millisecond precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct RaceTime(u64);

impl RaceTime {
    /// Zero elapsed time.
    pub const ZERO: Self = Self(0);

    #[must_use]
    pub const fn from_millis(ms: u64) -> Self {
        Self(ms)
    }

    #[must_use]
    pub const fn from_hms(hours: u64, minutes: u64, seconds: u64) -> Self {
        Self(hours * MS_PER_HOUR + minutes * MS_PER_MINUTE + seconds * MS_PER_SECOND)
    }

    #[must_use]
    pub const fn as_millis(self) -> u64 {
        self.0
    }

    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_secs_f64(self) -> f64 {
        self.0 as f64 / MS_PER_SECOND as f64
    }

    /// Parses race clock text, returning `None` for sentinels and for
    /// malformed input.
    ///
    /// Use [`str::parse`] instead when the caller needs to tell the two apart.
    pub fn parse(text: &str) -> Option<Self> {
        match text.parse() {
            Ok(time) => Some(time),
            Err(TimeParseError::Sentinel(_)) => None,
            Err(err @ TimeParseError::MalformedDuration(_)) => {
                tracing::warn!(error = %err, "ignoring unparseable race time");
                None
            }
        }
    }

    /// Formats the time in the requested style.
    ///
    /// Minutes and seconds are always zero-padded. The fraction is printed
    /// with three digits and only when it is non-zero, so canonical strings
    /// survive a parse/format round trip.
    #[must_use]
    pub fn format(self, style: TimeFormat) -> String {
        let hours = self.0 / MS_PER_HOUR;
        let minutes = (self.0 % MS_PER_HOUR) / MS_PER_MINUTE;
        let seconds = (self.0 % MS_PER_MINUTE) / MS_PER_SECOND;
        let millis = self.0 % MS_PER_SECOND;

        let mut out = match style {
            TimeFormat::Full => format!("{hours}:{minutes:02}:{seconds:02}"),
            TimeFormat::MinutesSeconds => {
                let total_minutes = self.0 / MS_PER_MINUTE;
                format!("{total_minutes:02}:{seconds:02}")
            }
        };
        if millis != 0 {
            out.push_str(&format!(".{millis:03}"));
        }
        out
    }

    /// Time behind `leader`, saturating at zero.
    #[must_use]
    pub const fn gap_to(self, leader: Self) -> Self {
        Self(self.0.saturating_sub(leader.0))
    }

    /// Adds two durations, saturating on overflow.
    #[must_use]
    pub const fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }
}

/// Seconds between `a` and `b` (`a - b`).
///
/// Callers pass the slower time first; the result is clamped at zero.
pub fn gap_seconds(a: RaceTime, b: RaceTime) -> f64 {
    a.gap_to(b).as_secs_f64()
}

impl FromStr for RaceTime {
    type Err = TimeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        if text.is_empty()
            || SENTINELS
                .iter()
                .any(|sentinel| text.eq_ignore_ascii_case(sentinel))
        {
            return Err(TimeParseError::Sentinel(text.to_string()));
        }

        let malformed = || TimeParseError::MalformedDuration(text.to_string());
        let caps = RACE_TIME_RE.captures(text).ok_or_else(malformed)?;

        let field = |idx: usize| -> Result<u64, TimeParseError> {
            caps[idx].parse::<u64>().map_err(|_| malformed())
        };
        let hours = field(1)?;
        let minutes = field(2)?;
        let seconds = field(3)?;
        if minutes >= 60 || seconds >= 60 {
            return Err(malformed());
        }

        // ".5" is half a second, ".05" fifty milliseconds
        let millis = match caps.get(4) {
            Some(frac) => format!("{:0<3}", frac.as_str())
                .parse::<u64>()
                .map_err(|_| malformed())?,
            None => 0,
        };

        Ok(Self::from_hms(hours, minutes, seconds).saturating_add(Self(millis)))
    }
}

impl fmt::Display for RaceTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format(TimeFormat::Full))
    }
}

impl Serialize for RaceTime {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for RaceTime {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Serde adapter for optional times in externally supplied records.
///
/// Sentinels and malformed strings deserialize to `None` instead of failing
/// the whole document.
pub mod lenient {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::RaceTime;

    #[allow(clippy::ref_option)]
    pub fn serialize<S>(value: &Option<RaceTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<RaceTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = Option::<String>::deserialize(deserializer)?;
        Ok(text.as_deref().and_then(RaceTime::parse))
    }
}
