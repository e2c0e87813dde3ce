use serde::{Deserialize, Serialize};

use crate::domain::rate::{Category, Profile, QualityTag, RateStatus};
use crate::domain::session::{SessionState, Slot};

/// A slot that must be filled before a lookup can run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequiredSlot {
    Country,
    Category,
    Profile,
    Quality,
}

/// Prompt priority. The first unfilled entry is the one the user is asked about.
pub const REQUIRED_SLOTS: [RequiredSlot; 4] =
    [RequiredSlot::Country, RequiredSlot::Category, RequiredSlot::Profile, RequiredSlot::Quality];

impl RequiredSlot {
    pub fn slot(&self) -> Slot {
        match self {
            Self::Country => Slot::Country,
            Self::Category => Slot::Category,
            Self::Profile => Slot::Profile,
            Self::Quality => Slot::Quality,
        }
    }

    pub fn is_filled(&self, state: &SessionState) -> bool {
        match self {
            Self::Country => state.country.is_some(),
            Self::Category => state.category.is_some(),
            Self::Profile => state.profile.is_some(),
            Self::Quality => !state.quality.is_empty(),
        }
    }

    pub fn prompt(&self, state: &SessionState) -> String {
        match self {
            Self::Country => "Please specify the destination country.".to_string(),
            Self::Category => format!(
                "Share which quality of {}? (CC or CLI)",
                state.country.as_deref().unwrap_or_default()
            ),
            Self::Profile => "Specify your profile (IVR or Outbound).".to_string(),
            Self::Quality => {
                "Do you want Local or International, Random or Correct, Mobile, or Fix?".to_string()
            }
        }
    }
}

/// Everything the lookup needs, taken from a session whose required slots are filled.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchCriteria {
    pub country: String,
    pub category: Category,
    pub profile: Profile,
    pub quality: Vec<QualityTag>,
    pub status: Option<RateStatus>,
    pub rate: Option<f64>,
}

impl SearchCriteria {
    pub fn from_state(state: &SessionState) -> Option<Self> {
        let (Some(country), Some(category), Some(profile)) =
            (state.country.as_ref(), state.category, state.profile)
        else {
            return None;
        };
        if state.quality.is_empty() {
            return None;
        }

        Some(Self {
            country: country.clone(),
            category,
            profile,
            quality: state.quality.clone(),
            status: state.status,
            rate: state.rate,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum DialogueStep {
    Prompt { slot: RequiredSlot, message: String },
    Ready(SearchCriteria),
}

/// Result of merging one message into a session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TurnOutcome {
    pub filled: Vec<Slot>,
    pub step: DialogueStep,
}
