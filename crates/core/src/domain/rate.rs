use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RateRecordId(pub i64);

/// Routing category of a rate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "CC")]
    Cc,
    #[serde(rename = "CLI")]
    Cli,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cc => "CC",
            Self::Cli => "CLI",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Profile {
    #[serde(rename = "IVR")]
    Ivr,
    Outbound,
}

impl Profile {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ivr => "IVR",
            Self::Outbound => "Outbound",
        }
    }
}

/// Fixed quality vocabulary. Declaration order is the order tags are reported in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum QualityTag {
    Local,
    International,
    Random,
    Correct,
    Mobile,
    Fix,
}

impl QualityTag {
    pub const ALL: [QualityTag; 6] = [
        Self::Local,
        Self::International,
        Self::Random,
        Self::Correct,
        Self::Mobile,
        Self::Fix,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "Local",
            Self::International => "International",
            Self::Random => "Random",
            Self::Correct => "Correct",
            Self::Mobile => "Mobile",
            Self::Fix => "Fix",
        }
    }

    /// Lower-case keyword searched for in normalized messages.
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::International => "international",
            Self::Random => "random",
            Self::Correct => "correct",
            Self::Mobile => "mobile",
            Self::Fix => "fix",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RateStatus {
    Active,
    Inactive,
}

impl RateStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Inactive => "Inactive",
        }
    }
}

macro_rules! display_as_str {
    ($($ty:ty),+) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        })+
    };
}

display_as_str!(Category, Profile, QualityTag, RateStatus);

/// One row of the rate table. Text columns are stored as free text, so anything
/// other than the country may be absent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RateRecord {
    pub id: RateRecordId,
    pub country: String,
    pub country_code: Option<String>,
    pub category: Option<String>,
    pub quality_description: Option<String>,
    pub profile: Option<String>,
    pub billing_cycle: Option<String>,
    pub rate: Option<f64>,
    pub status: Option<String>,
    pub added_time: DateTime<Utc>,
}
