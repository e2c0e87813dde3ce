use crate::dialogue::states::{
    DialogueStep, RequiredSlot, SearchCriteria, TurnOutcome, REQUIRED_SLOTS,
};
use crate::domain::session::{ExtractedSlots, SessionState};
use crate::errors::DomainError;

/// Drives the slot-filling conversation. Stateless: all state lives in the
/// `SessionState` handed to each call.
#[derive(Clone, Debug)]
pub struct DialogueEngine {
    checklist: &'static [RequiredSlot],
}

impl Default for DialogueEngine {
    fn default() -> Self {
        Self { checklist: &REQUIRED_SLOTS }
    }
}

impl DialogueEngine {
    pub fn first_missing(&self, state: &SessionState) -> Option<RequiredSlot> {
        self.checklist.iter().copied().find(|slot| !slot.is_filled(state))
    }

    pub fn next_step(&self, state: &SessionState) -> Result<DialogueStep, DomainError> {
        if let Some(slot) = self.first_missing(state) {
            return Ok(DialogueStep::Prompt { slot, message: slot.prompt(state) });
        }

        SearchCriteria::from_state(state).map(DialogueStep::Ready).ok_or_else(|| {
            DomainError::InvariantViolation(
                "required slots reported filled but search criteria are incomplete".to_string(),
            )
        })
    }

    /// Merges `extracted` into `state` (first write wins) and decides what happens next.
    pub fn apply(
        &self,
        state: &mut SessionState,
        extracted: ExtractedSlots,
    ) -> Result<TurnOutcome, DomainError> {
        let filled = state.merge(extracted);
        let step = self.next_step(state)?;
        Ok(TurnOutcome { filled, step })
    }
}
