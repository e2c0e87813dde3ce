use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use ratedesk_core::domain::rate::RateRecordId;
use ratedesk_core::source::{RecordSource, RecordSourceError};

pub mod memory;
pub mod rate;

pub use memory::InMemoryRateRepository;
pub use rate::SqlRateRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

impl From<RepositoryError> for RecordSourceError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::Database(error) => Self::Unavailable(error.to_string()),
            RepositoryError::Decode(message) => Self::Decode(message),
        }
    }
}

/// A rate row before the table assigns its id.
#[derive(Clone, Debug, PartialEq)]
pub struct NewRateRecord {
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

/// Write side of the rate table, used by seeding and tests. Chat turns only
/// ever go through [`RecordSource`].
#[async_trait]
pub trait RateRepository: RecordSource {
    async fn insert(&self, record: NewRateRecord) -> Result<RateRecordId, RepositoryError>;
    async fn count(&self) -> Result<u64, RepositoryError>;
}
