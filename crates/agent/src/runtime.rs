use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, warn};

use ratedesk_core::dialogue::{DialogueEngine, DialogueStep, RequiredSlot};
use ratedesk_core::domain::session::SessionId;
use ratedesk_core::errors::{ApplicationError, DomainError};
use ratedesk_core::query::build_query;
use ratedesk_core::report;
use ratedesk_core::source::{RecordSource, RecordSourceError};

use crate::conversation::{normalize_text, SlotExtractor};
use crate::session::SessionStore;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TurnError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("rate lookup failed: {0}")]
    RecordSource(#[from] RecordSourceError),
    #[error("rate lookup timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },
}

impl From<TurnError> for ApplicationError {
    fn from(value: TurnError) -> Self {
        match value {
            TurnError::Domain(error) => Self::Domain(error),
            TurnError::RecordSource(error) => Self::from(error),
            TurnError::Timeout { timeout_secs } => Self::Timeout { timeout_secs },
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ReplyKind {
    Prompt(RequiredSlot),
    Report { record_count: usize },
    NotFound,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TurnReply {
    pub kind: ReplyKind,
    pub text: String,
}

#[derive(Clone, Debug)]
pub struct RuntimeSettings {
    pub default_session_id: SessionId,
    pub query_timeout: Duration,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            default_session_id: SessionId::from("default"),
            query_timeout: Duration::from_secs(10),
        }
    }
}

/// Answers chat turns: extracts slots, asks for what is missing and runs the
/// rate lookup once the required slots are filled.
pub struct AgentRuntime {
    sessions: Arc<dyn SessionStore>,
    source: Arc<dyn RecordSource>,
    engine: DialogueEngine,
    extractor: SlotExtractor,
    settings: RuntimeSettings,
}

impl AgentRuntime {
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        source: Arc<dyn RecordSource>,
        settings: RuntimeSettings,
    ) -> Self {
        Self {
            sessions,
            source,
            engine: DialogueEngine::default(),
            extractor: SlotExtractor::new(settings.query_timeout),
            settings,
        }
    }

    pub fn sessions(&self) -> &Arc<dyn SessionStore> {
        &self.sessions
    }

    pub fn default_session_id(&self) -> &SessionId {
        &self.settings.default_session_id
    }

    /// Reply text for `message`. A missing session id falls back to the
    /// configured default session.
    pub async fn answer(
        &self,
        message: &str,
        session_id: Option<&str>,
    ) -> Result<String, TurnError> {
        let session_id = session_id
            .filter(|id| !id.trim().is_empty())
            .map(SessionId::from)
            .unwrap_or_else(|| self.settings.default_session_id.clone());
        self.handle_turn(message, &session_id).await.map(|reply| reply.text)
    }

    pub async fn handle_turn(
        &self,
        message: &str,
        session_id: &SessionId,
    ) -> Result<TurnReply, TurnError> {
        let text = normalize_text(message);
        let handle = self.sessions.session(session_id).await;
        let mut entry = handle.lock().await;
        entry.touch();

        let extracted = self.extractor.extract(&text, &entry.state, self.source.as_ref()).await;
        let outcome = self.engine.apply(&mut entry.state, extracted)?;
        if !outcome.filled.is_empty() {
            debug!(
                event_name = "dialogue.slots_filled",
                session_id = session_id.as_str(),
                slots = ?outcome.filled.iter().map(|slot| slot.as_str()).collect::<Vec<_>>(),
                "slots filled from message"
            );
        }

        let criteria = match outcome.step {
            DialogueStep::Prompt { slot, message } => {
                debug!(
                    event_name = "dialogue.prompt",
                    session_id = session_id.as_str(),
                    slot = slot.slot().as_str(),
                    "asking for missing slot"
                );
                return Ok(TurnReply { kind: ReplyKind::Prompt(slot), text: message });
            }
            DialogueStep::Ready(criteria) => criteria,
        };

        let query = build_query(&criteria);
        info!(
            event_name = "dialogue.lookup.start",
            session_id = session_id.as_str(),
            country = %criteria.country,
            predicate_count = query.predicates.len(),
            "running rate lookup"
        );

        let lookup = tokio::time::timeout(self.settings.query_timeout, self.source.find(&query));
        let records = match lookup.await {
            Ok(Ok(records)) => records,
            Ok(Err(error)) => {
                warn!(
                    event_name = "dialogue.lookup.failed",
                    session_id = session_id.as_str(),
                    error = %error,
                    "rate lookup failed; session kept for retry"
                );
                return Err(TurnError::RecordSource(error));
            }
            Err(_) => {
                let timeout_secs = self.settings.query_timeout.as_secs();
                warn!(
                    event_name = "dialogue.lookup.timeout",
                    session_id = session_id.as_str(),
                    timeout_secs,
                    "rate lookup timed out; session kept for retry"
                );
                return Err(TurnError::Timeout { timeout_secs });
            }
        };

        let reply = TurnReply {
            kind: if records.is_empty() {
                ReplyKind::NotFound
            } else {
                ReplyKind::Report { record_count: records.len() }
            },
            text: report::render(&criteria.country, &records),
        };
        entry.reset();

        info!(
            event_name = "dialogue.lookup.completed",
            session_id = session_id.as_str(),
            record_count = records.len(),
            "rate lookup completed; session reset"
        );
        Ok(reply)
    }
}
