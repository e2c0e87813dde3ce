use std::collections::BTreeSet;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::rate::RateRecord;
use crate::query::{RateField, RecordQuery};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RecordSourceError {
    #[error("record source unavailable: {0}")]
    Unavailable(String),
    #[error("record source returned malformed data: {0}")]
    Decode(String),
}

/// Read-only access to the rate table.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Records matching every predicate, in the requested order.
    async fn find(&self, query: &RecordQuery) -> Result<Vec<RateRecord>, RecordSourceError>;

    /// Distinct non-empty values stored in a text column.
    async fn distinct_values(&self, field: RateField)
        -> Result<BTreeSet<String>, RecordSourceError>;

    /// Country whose stored code is `digits` or `+digits`.
    async fn country_for_code(&self, digits: &str) -> Result<Option<String>, RecordSourceError>;
}
