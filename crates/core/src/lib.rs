pub mod config;
pub mod dialogue;
pub mod domain;
pub mod errors;
pub mod query;
pub mod report;
pub mod source;

pub use dialogue::{DialogueEngine, DialogueStep, RequiredSlot, SearchCriteria, TurnOutcome};
pub use domain::rate::{Category, Profile, QualityTag, RateRecord, RateRecordId, RateStatus};
pub use domain::session::{ExtractedSlots, SessionId, SessionState, Slot};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use query::{build_query, FilterOp, FilterValue, Predicate, RateField, RecordQuery};
pub use source::{RecordSource, RecordSourceError};
