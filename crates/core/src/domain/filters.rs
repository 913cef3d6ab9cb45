use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::dataset::SegmentId;

/// Window length, in days, at or above which a series is returned whole.
pub const FULL_HISTORY_DAYS: u32 = 365;

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum SegmentFilter {
    #[default]
    All,
    Segment(SegmentId),
}

impl SegmentFilter {
    pub fn parse(value: &str) -> Self {
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("all") {
            Self::All
        } else {
            Self::Segment(trimmed.to_string())
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }

    pub fn segment_id(&self) -> Option<&str> {
        match self {
            Self::All => None,
            Self::Segment(id) => Some(id.as_str()),
        }
    }

    pub fn as_str(&self) -> &str {
        self.segment_id().unwrap_or("all")
    }
}

impl fmt::Display for SegmentFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for SegmentFilter {
    fn from(value: &str) -> Self {
        Self::parse(value)
    }
}

impl Serialize for SegmentFilter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for SegmentFilter {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}

/// The two user-controlled inputs to a derivation pass.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Filters {
    pub period_days: u32,
    pub segment: SegmentFilter,
}

impl Filters {
    pub fn new(period_days: u32, segment: SegmentFilter) -> Self {
        Self { period_days, segment }
    }

    pub fn with_period_days(&self, period_days: u32) -> Self {
        Self { period_days, segment: self.segment.clone() }
    }

    pub fn with_segment(&self, segment: SegmentFilter) -> Self {
        Self { period_days: self.period_days, segment }
    }
}
