pub mod engine;
pub mod states;

pub use engine::DialogueEngine;
pub use states::{DialogueStep, RequiredSlot, SearchCriteria, TurnOutcome, REQUIRED_SLOTS};
