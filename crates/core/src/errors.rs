use thiserror::Error;

use crate::source::RecordSourceError;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("domain invariant violation: {0}")]
    InvariantViolation(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("persistence failure: {0}")]
    Persistence(String),
    #[error("record lookup timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },
}

impl From<RecordSourceError> for ApplicationError {
    fn from(value: RecordSourceError) -> Self {
        Self::Persistence(value.to_string())
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("service unavailable: {message}")]
    ServiceUnavailable { message: String, correlation_id: String },
    #[error("internal error: {message}")]
    Internal { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::ServiceUnavailable { .. } => {
                "The rate lookup is temporarily unavailable. Please retry shortly."
            }
            Self::Internal { .. } => "An unexpected internal error occurred.",
        }
    }

    pub fn correlation_id(&self) -> &str {
        match self {
            Self::ServiceUnavailable { correlation_id, .. }
            | Self::Internal { correlation_id, .. } => correlation_id,
        }
    }
}

impl ApplicationError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        let mut mapped = InterfaceError::from(self);
        match &mut mapped {
            InterfaceError::ServiceUnavailable { correlation_id: id, .. }
            | InterfaceError::Internal { correlation_id: id, .. } => *id = correlation_id,
        }
        mapped
    }
}

impl From<ApplicationError> for InterfaceError {
    fn from(value: ApplicationError) -> Self {
        match value {
            ApplicationError::Domain(DomainError::InvariantViolation(message)) => {
                Self::Internal { message, correlation_id: "unassigned".to_owned() }
            }
            ApplicationError::Persistence(message) => {
                Self::ServiceUnavailable { message, correlation_id: "unassigned".to_owned() }
            }
            timeout @ ApplicationError::Timeout { .. } => Self::ServiceUnavailable {
                message: timeout.to_string(),
                correlation_id: "unassigned".to_owned(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::errors::{ApplicationError, DomainError, InterfaceError};
    use crate::source::RecordSourceError;

    #[test]
    fn record_source_failure_maps_to_service_unavailable() {
        let interface = ApplicationError::from(RecordSourceError::Unavailable(
            "pool timed out while waiting for an open connection".to_owned(),
        ))
        .into_interface("req-1");

        assert!(matches!(
            interface,
            InterfaceError::ServiceUnavailable {
                ref correlation_id,
                ..
            } if correlation_id == "req-1"
        ));
        assert_eq!(
            interface.user_message(),
            "The rate lookup is temporarily unavailable. Please retry shortly."
        );
    }

    #[test]
    fn timeout_maps_to_service_unavailable() {
        let interface = ApplicationError::Timeout { timeout_secs: 5 }.into_interface("req-2");

        assert!(matches!(interface, InterfaceError::ServiceUnavailable { .. }));
        assert_eq!(interface.correlation_id(), "req-2");
        assert!(interface.to_string().contains("timed out after 5s"));
    }

    #[test]
    fn invariant_violation_maps_to_internal() {
        let interface = ApplicationError::from(DomainError::InvariantViolation(
            "criteria incomplete".to_owned(),
        ))
        .into_interface("req-3");

        assert!(matches!(interface, InterfaceError::Internal { .. }));
        assert_eq!(interface.user_message(), "An unexpected internal error occurred.");
    }

    #[test]
    fn user_message_never_claims_zero_matches() {
        let interface = ApplicationError::Persistence("disk I/O error".to_owned())
            .into_interface("req-4");

        assert!(!interface.user_message().contains("No records found"));
    }
}
