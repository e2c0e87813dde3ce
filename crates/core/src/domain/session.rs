use serde::{Deserialize, Serialize};

use crate::domain::rate::{Category, Profile, QualityTag, RateStatus};

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Slot {
    Country,
    Category,
    Profile,
    Quality,
    Status,
    Rate,
}

impl Slot {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Country => "country",
            Self::Category => "category",
            Self::Profile => "profile",
            Self::Quality => "quality",
            Self::Status => "status",
            Self::Rate => "rate",
        }
    }
}

/// Values pulled out of a single message. Every field is independent; `None`
/// (or an empty `quality`) means the extractor found nothing.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedSlots {
    pub country: Option<String>,
    pub category: Option<Category>,
    pub profile: Option<Profile>,
    pub quality: Vec<QualityTag>,
    pub status: Option<RateStatus>,
    pub rate: Option<f64>,
}

/// Slot values accumulated over the turns of one conversation.
///
/// An empty `quality` means the user has not answered yet. There is no
/// separate "no preference" value.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub country: Option<String>,
    pub category: Option<Category>,
    pub profile: Option<Profile>,
    pub quality: Vec<QualityTag>,
    pub status: Option<RateStatus>,
    pub rate: Option<f64>,
}

impl SessionState {
    /// Adopts extracted values for slots that are still empty. Filled slots are
    /// never overwritten. Returns the slots that were filled by this call.
    pub fn merge(&mut self, extracted: ExtractedSlots) -> Vec<Slot> {
        let mut filled = Vec::new();

        if fill(&mut self.country, extracted.country) {
            filled.push(Slot::Country);
        }
        if fill(&mut self.category, extracted.category) {
            filled.push(Slot::Category);
        }
        if fill(&mut self.profile, extracted.profile) {
            filled.push(Slot::Profile);
        }
        if self.quality.is_empty() && !extracted.quality.is_empty() {
            self.quality = extracted.quality;
            filled.push(Slot::Quality);
        }
        if fill(&mut self.status, extracted.status) {
            filled.push(Slot::Status);
        }
        if fill(&mut self.rate, extracted.rate) {
            filled.push(Slot::Rate);
        }

        filled
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

fn fill<T>(slot: &mut Option<T>, candidate: Option<T>) -> bool {
    if slot.is_some() || candidate.is_none() {
        return false;
    }
    *slot = candidate;
    true
}
