use std::cmp::Ordering;
use std::collections::BTreeSet;

use async_trait::async_trait;
use tokio::sync::RwLock;

use ratedesk_core::domain::rate::{RateRecord, RateRecordId};
use ratedesk_core::query::{OrderBy, RateField, RecordQuery, SortDirection};
use ratedesk_core::source::{RecordSource, RecordSourceError};

use super::{NewRateRecord, RateRepository, RepositoryError};

/// Rate table held in memory. Filtering and ordering mirror
/// [`super::SqlRateRepository`], including `None` sorting below any value.
#[derive(Default)]
pub struct InMemoryRateRepository {
    records: RwLock<Vec<RateRecord>>,
}

impl InMemoryRateRepository {
    pub fn with_records(records: Vec<RateRecord>) -> Self {
        Self { records: RwLock::new(records) }
    }
}

#[async_trait]
impl RecordSource for InMemoryRateRepository {
    async fn find(&self, query: &RecordQuery) -> Result<Vec<RateRecord>, RecordSourceError> {
        let records = self.records.read().await;
        let mut found =
            records.iter().filter(|record| query.matches(record)).cloned().collect::<Vec<_>>();
        found.sort_by(|left, right| compare(left, right, query.order_by));
        Ok(found)
    }

    async fn distinct_values(
        &self,
        field: RateField,
    ) -> Result<BTreeSet<String>, RecordSourceError> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .filter_map(|record| column_text(record, field))
            .filter(|value| !value.trim().is_empty())
            .collect())
    }

    async fn country_for_code(&self, digits: &str) -> Result<Option<String>, RecordSourceError> {
        let prefixed = format!("+{digits}");
        let records = self.records.read().await;
        Ok(records
            .iter()
            .filter(|record| !record.country.trim().is_empty())
            .filter(|record| {
                let code = record.country_code.as_deref();
                code.is_some_and(|code| code == digits || code == prefixed)
            })
            .min_by_key(|record| record.id.0)
            .map(|record| record.country.clone()))
    }
}

#[async_trait]
impl RateRepository for InMemoryRateRepository {
    async fn insert(&self, record: NewRateRecord) -> Result<RateRecordId, RepositoryError> {
        let mut records = self.records.write().await;
        let id = RateRecordId(records.iter().map(|existing| existing.id.0).max().unwrap_or(0) + 1);
        records.push(RateRecord {
            id: id.clone(),
            country: record.country,
            country_code: record.country_code,
            category: record.category,
            quality_description: record.quality_description,
            profile: record.profile,
            billing_cycle: record.billing_cycle,
            rate: record.rate,
            status: record.status,
            added_time: record.added_time,
        });
        Ok(id)
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        Ok(self.records.read().await.len() as u64)
    }
}

fn compare(left: &RateRecord, right: &RateRecord, order_by: OrderBy) -> Ordering {
    let ordering = match order_by.field {
        RateField::AddedTime => left.added_time.cmp(&right.added_time),
        RateField::Rate => left.rate.partial_cmp(&right.rate).unwrap_or(Ordering::Equal),
        field => column_text(left, field).cmp(&column_text(right, field)),
    };
    let ordering = match order_by.direction {
        SortDirection::Ascending => ordering,
        SortDirection::Descending => ordering.reverse(),
    };
    ordering.then_with(|| left.id.0.cmp(&right.id.0))
}

fn column_text(record: &RateRecord, field: RateField) -> Option<String> {
    match field {
        RateField::Country => Some(record.country.clone()),
        RateField::CountryCode => record.country_code.clone(),
        RateField::Category => record.category.clone(),
        RateField::QualityDescription => record.quality_description.clone(),
        RateField::Profile => record.profile.clone(),
        RateField::BillingCycle => record.billing_cycle.clone(),
        RateField::Rate => record.rate.map(|rate| rate.to_string()),
        RateField::Status => record.status.clone(),
        RateField::AddedTime => Some(record.added_time.to_rfc3339()),
    }
}
