//! Per-athlete race timing records.
//!
//! A [`RaceRecord`] is the loosely shaped data that arrives from the timing
//! feed: any subset of splits, a finish time, a placement and record flags.
//! [`RaceRecord::outcome`] resolves it once into a [`RaceOutcome`] so scoring
//! never has to guess which fields are meaningful.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::time::RaceTime;
use crate::types::{AthleteId, Gender};

/// Full marathon distance in kilometres.
pub const MARATHON_KM: f64 = 42.195;

/// Intermediate timing checkpoints, in course order.
///
/// Deserialization goes through [`FromStr`], so config values and feed keys
/// accept the same spellings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum Split {
    #[serde(rename = "5K")]
    FiveK,
    #[serde(rename = "10K")]
    TenK,
    #[serde(rename = "HALF")]
    Half,
    #[serde(rename = "30K")]
    ThirtyK,
    #[serde(rename = "35K")]
    ThirtyFiveK,
    #[serde(rename = "40K")]
    FortyK,
}

impl Split {
    /// Every checkpoint, earliest first.
    pub const ALL: [Self; 6] = [
        Self::FiveK,
        Self::TenK,
        Self::Half,
        Self::ThirtyK,
        Self::ThirtyFiveK,
        Self::FortyK,
    ];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::FiveK => "5K",
            Self::TenK => "10K",
            Self::Half => "HALF",
            Self::ThirtyK => "30K",
            Self::ThirtyFiveK => "35K",
            Self::FortyK => "40K",
        }
    }

    /// Distance from the start line in kilometres.
    #[must_use]
    pub const fn distance_km(self) -> f64 {
        match self {
            Self::FiveK => 5.0,
            Self::TenK => 10.0,
            Self::Half => MARATHON_KM / 2.0,
            Self::ThirtyK => 30.0,
            Self::ThirtyFiveK => 35.0,
            Self::FortyK => 40.0,
        }
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Error type for unknown split names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownSplit(String);

impl fmt::Display for UnknownSplit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown split: {}", self.0)
    }
}

impl std::error::Error for UnknownSplit {}

impl FromStr for Split {
    type Err = UnknownSplit;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "5K" => Ok(Self::FiveK),
            "10K" => Ok(Self::TenK),
            "HALF" | "21K" | "HALF_MARATHON" => Ok(Self::Half),
            "30K" => Ok(Self::ThirtyK),
            "35K" => Ok(Self::ThirtyFiveK),
            "40K" => Ok(Self::FortyK),
            _ => Err(UnknownSplit(s.to_string())),
        }
    }
}

impl TryFrom<String> for Split {
    type Error = UnknownSplit;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// A split checkpoint together with the elapsed time recorded there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitMark {
    pub split: Split,
    pub time: RaceTime,
}

/// Split times reported for one athlete, keyed by checkpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SplitTimes(BTreeMap<Split, RaceTime>);

impl SplitTimes {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, split: Split, time: RaceTime) {
        self.0.insert(split, time);
    }

    #[must_use]
    pub fn get(&self, split: Split) -> Option<RaceTime> {
        self.0.get(&split).copied()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The furthest checkpoint reached.
    #[must_use]
    pub fn last(&self) -> Option<SplitMark> {
        self.0
            .iter()
            .next_back()
            .map(|(&split, &time)| SplitMark { split, time })
    }

    pub fn iter(&self) -> impl Iterator<Item = SplitMark> + '_ {
        self.0.iter().map(|(&split, &time)| SplitMark { split, time })
    }
}

impl FromIterator<(Split, RaceTime)> for SplitTimes {
    fn from_iter<I: IntoIterator<Item = (Split, RaceTime)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'de> Deserialize<'de> for SplitTimes {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        // Timing feeds send sentinels and stray checkpoints; keep what parses.
        let raw = BTreeMap::<String, Option<String>>::deserialize(deserializer)?;
        let mut splits = BTreeMap::new();
        for (name, value) in raw {
            let split = match name.parse::<Split>() {
                Ok(split) => split,
                Err(err) => {
                    tracing::warn!(error = %err, "ignoring unknown split");
                    continue;
                }
            };
            if let Some(time) = value.as_deref().and_then(RaceTime::parse) {
                splits.insert(split, time);
            }
        }
        Ok(Self(splits))
    }
}

/// Which records an athlete's finish time broke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordType {
    #[default]
    None,
    World,
    Course,
    Both,
}

impl RecordType {
    #[must_use]
    pub const fn includes_world(self) -> bool {
        matches!(self, Self::World | Self::Both)
    }

    #[must_use]
    pub const fn includes_course(self) -> bool {
        matches!(self, Self::Course | Self::Both)
    }
}

impl FromStr for RecordType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "none" => Ok(Self::None),
            "world" => Ok(Self::World),
            "course" => Ok(Self::Course),
            "both" => Ok(Self::Both),
            other => Err(format!("unknown record kind: {other}")),
        }
    }
}

/// Whether a record has been ratified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    #[default]
    Provisional,
    Confirmed,
}

impl FromStr for RecordStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "provisional" => Ok(Self::Provisional),
            "confirmed" => Ok(Self::Confirmed),
            other => Err(format!("unknown record status: {other}")),
        }
    }
}

/// Record flags attached to a race record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RecordClaim {
    #[serde(default, deserialize_with = "lenient::flag")]
    pub kind: RecordType,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub status: RecordStatus,
}

/// Timing facts for one athlete as supplied by the results feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaceRecord {
    pub athlete_id: AthleteId,

    pub gender: Gender,

    #[serde(default, with = "crate::time::lenient")]
    pub finish_time: Option<RaceTime>,

    #[serde(default)]
    pub splits: SplitTimes,

    /// Rank among finishers (1-based).
    #[serde(default, deserialize_with = "lenient::placement")]
    pub placement: Option<u32>,

    #[serde(default, deserialize_with = "lenient::claim")]
    pub record: RecordClaim,
}

/// Deserializers for feed fields where one bad value must not reject the
/// whole results file. Unreadable values fall back to "absent" with a warning.
mod lenient {
    use std::fmt::Display;
    use std::str::FromStr;

    use serde::de::IgnoredAny;
    use serde::{Deserialize, Deserializer};

    use super::RecordClaim;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawPlacement {
        Rank(u32),
        Text(String),
        Other(IgnoredAny),
    }

    pub fn placement<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let placement = match Option::<RawPlacement>::deserialize(deserializer)? {
            None => None,
            Some(RawPlacement::Rank(rank)) => Some(rank),
            Some(RawPlacement::Text(text)) => match text.trim().parse::<u32>() {
                Ok(rank) => Some(rank),
                Err(_) => {
                    tracing::warn!(value = %text, "ignoring unreadable placement");
                    None
                }
            },
            Some(RawPlacement::Other(_)) => {
                tracing::warn!("ignoring non-numeric placement");
                None
            }
        };
        Ok(placement)
    }

    pub fn flag<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: FromStr + Default,
        T::Err: Display,
    {
        let Some(text) = Option::<String>::deserialize(deserializer)? else {
            return Ok(T::default());
        };
        Ok(text.parse().unwrap_or_else(|err| {
            tracing::warn!(error = %err, "ignoring unreadable record flag");
            T::default()
        }))
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawClaim {
        Claim(RecordClaim),
        Other(IgnoredAny),
    }

    pub fn claim<'de, D>(deserializer: D) -> Result<RecordClaim, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<RawClaim>::deserialize(deserializer)? {
            Some(RawClaim::Claim(claim)) => Ok(claim),
            None => Ok(RecordClaim::default()),
            Some(RawClaim::Other(_)) => {
                tracing::warn!("ignoring malformed record claim");
                Ok(RecordClaim::default())
            }
        }
    }
}

/// Data available for an athlete who crossed the finish line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finish {
    pub time: RaceTime,
    pub placement: Option<u32>,
    pub splits: SplitTimes,
    pub record: RecordClaim,
}

/// A race record resolved into the shape scoring works with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RaceOutcome {
    /// No finish time and no split.
    DidNotStart,
    /// At least one split but no finish time.
    DidNotFinish { last_split: Option<SplitMark> },
    Finished(Finish),
}

impl RaceRecord {
    /// Creates an empty record for an athlete.
    pub fn new(athlete_id: AthleteId, gender: Gender) -> Self {
        Self {
            athlete_id,
            gender,
            finish_time: None,
            splits: SplitTimes(BTreeMap::new()),
            placement: None,
            record: RecordClaim {
                kind: RecordType::None,
                status: RecordStatus::Provisional,
            },
        }
    }

    #[must_use]
    pub fn with_finish(mut self, time: RaceTime) -> Self {
        self.finish_time = Some(time);
        self
    }

    #[must_use]
    pub fn with_split(mut self, split: Split, time: RaceTime) -> Self {
        self.splits.insert(split, time);
        self
    }

    #[must_use]
    pub fn with_placement(mut self, placement: u32) -> Self {
        self.placement = Some(placement);
        self
    }

    #[must_use]
    pub fn with_record(mut self, kind: RecordType, status: RecordStatus) -> Self {
        self.record = RecordClaim { kind, status };
        self
    }

    /// Whether the athlete has any timing data at all.
    #[must_use]
    pub fn has_started(&self) -> bool {
        self.finish_time.is_some() || !self.splits.is_empty()
    }

    /// Resolves the record into a [`RaceOutcome`].
    ///
    /// A placement of zero is not a valid rank and is dropped.
    #[must_use]
    pub fn outcome(&self) -> RaceOutcome {
        match self.finish_time {
            Some(time) => RaceOutcome::Finished(Finish {
                time,
                placement: self.placement.filter(|&p| p > 0),
                splits: self.splits.clone(),
                record: self.record,
            }),
            None if self.splits.is_empty() => RaceOutcome::DidNotStart,
            None => RaceOutcome::DidNotFinish {
                last_split: self.splits.last(),
            },
        }
    }
}
