//! Typed filter predicates for the rate table.
//!
//! Field names come from the closed [`RateField`] enum and values are carried as
//! [`FilterValue`]s, so a record source can bind every value as a parameter and
//! never splice user text into query text.

use serde::{Deserialize, Serialize};

use crate::dialogue::states::SearchCriteria;
use crate::domain::rate::RateRecord;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateField {
    Country,
    CountryCode,
    Category,
    QualityDescription,
    Profile,
    BillingCycle,
    Rate,
    Status,
    AddedTime,
}

impl RateField {
    /// Column name in the `rate_record` table.
    pub fn column(&self) -> &'static str {
        match self {
            Self::Country => "country",
            Self::CountryCode => "country_code",
            Self::Category => "category",
            Self::QualityDescription => "quality_description",
            Self::Profile => "profile",
            Self::BillingCycle => "billing_cycle",
            Self::Rate => "rate",
            Self::Status => "status",
            Self::AddedTime => "added_time",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOp {
    Equals,
    /// Case-insensitive substring match.
    Contains,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Text(String),
    Number(f64),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Predicate {
    pub field: RateField,
    pub op: FilterOp,
    pub value: FilterValue,
}

impl Predicate {
    pub fn equals(field: RateField, value: impl Into<String>) -> Self {
        Self { field, op: FilterOp::Equals, value: FilterValue::Text(value.into()) }
    }

    pub fn contains(field: RateField, value: impl Into<String>) -> Self {
        Self { field, op: FilterOp::Contains, value: FilterValue::Text(value.into()) }
    }

    pub fn equals_number(field: RateField, value: f64) -> Self {
        Self { field, op: FilterOp::Equals, value: FilterValue::Number(value) }
    }

    /// Evaluates the predicate against an in-memory record. A missing column
    /// never matches.
    pub fn matches(&self, record: &RateRecord) -> bool {
        match (&self.value, self.op) {
            (FilterValue::Number(expected), FilterOp::Equals) => {
                self.field == RateField::Rate && record.rate == Some(*expected)
            }
            (FilterValue::Number(_), FilterOp::Contains) => false,
            (FilterValue::Text(expected), op) => {
                let Some(actual) = text_column(record, self.field) else {
                    return false;
                };
                match op {
                    FilterOp::Equals => actual == *expected,
                    FilterOp::Contains => {
                        actual.to_lowercase().contains(&expected.to_lowercase())
                    }
                }
            }
        }
    }
}

fn text_column(record: &RateRecord, field: RateField) -> Option<String> {
    match field {
        RateField::Country => Some(record.country.clone()),
        RateField::CountryCode => record.country_code.clone(),
        RateField::Category => record.category.clone(),
        RateField::QualityDescription => record.quality_description.clone(),
        RateField::Profile => record.profile.clone(),
        RateField::BillingCycle => record.billing_cycle.clone(),
        RateField::Status => record.status.clone(),
        RateField::Rate => record.rate.map(|rate| rate.to_string()),
        RateField::AddedTime => Some(record.added_time.to_rfc3339()),
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Ascending,
    Descending,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    pub field: RateField,
    pub direction: SortDirection,
}

/// Conjunction of predicates plus a sort key.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecordQuery {
    pub predicates: Vec<Predicate>,
    pub order_by: OrderBy,
}

impl RecordQuery {
    pub fn matches(&self, record: &RateRecord) -> bool {
        self.predicates.iter().all(|predicate| predicate.matches(record))
    }
}

/// Newest records first.
pub const NEWEST_FIRST: OrderBy =
    OrderBy { field: RateField::AddedTime, direction: SortDirection::Descending };

/// Translates filled search criteria into the rate-table query. Predicate order
/// is fixed: country, category, profile, one per quality tag, rate, status.
pub fn build_query(criteria: &SearchCriteria) -> RecordQuery {
    let mut predicates = vec![
        Predicate::equals(RateField::Country, criteria.country.clone()),
        Predicate::equals(RateField::Category, criteria.category.as_str()),
        Predicate::contains(RateField::Profile, criteria.profile.as_str()),
    ];

    predicates.extend(
        criteria
            .quality
            .iter()
            .map(|tag| Predicate::contains(RateField::QualityDescription, tag.as_str())),
    );

    if let Some(rate) = criteria.rate {
        predicates.push(Predicate::equals_number(RateField::Rate, rate));
    }
    if let Some(status) = criteria.status {
        predicates.push(Predicate::equals(RateField::Status, status.as_str()));
    }

    RecordQuery { predicates, order_by: NEWEST_FIRST }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use crate::dialogue::states::SearchCriteria;
    use crate::domain::rate::{
        Category, Profile, QualityTag, RateRecord, RateRecordId, RateStatus,
    };

    use super::{build_query, FilterOp, Predicate, RateField, SortDirection, NEWEST_FIRST};

    fn criteria() -> SearchCriteria {
        SearchCriteria {
            country: "Germany".to_string(),
            category: Category::Cc,
            profile: Profile::Ivr,
            quality: vec![QualityTag::Local, QualityTag::Mobile],
            status: None,
            rate: None,
        }
    }

    fn record() -> RateRecord {
        RateRecord {
            id: RateRecordId(1),
            country: "Germany".to_string(),
            country_code: Some("+49".to_string()),
            category: Some("CC".to_string()),
            quality_description: Some("Local mobile, correct CLI".to_string()),
            profile: Some("IVR / Outbound".to_string()),
            billing_cycle: Some("60/60".to_string()),
            rate: Some(0.05),
            status: Some("Active".to_string()),
            added_time: Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).single().expect("timestamp"),
        }
    }

    #[test]
    fn required_slots_only_produce_core_predicates() {
        let query = build_query(&criteria());

        assert_eq!(
            query.predicates,
            vec![
                Predicate::equals(RateField::Country, "Germany"),
                Predicate::equals(RateField::Category, "CC"),
                Predicate::contains(RateField::Profile, "IVR"),
                Predicate::contains(RateField::QualityDescription, "Local"),
                Predicate::contains(RateField::QualityDescription, "Mobile"),
            ]
        );
        assert_eq!(query.order_by, NEWEST_FIRST);
        assert_eq!(query.order_by.direction, SortDirection::Descending);
    }

    #[test]
    fn optional_slots_append_rate_then_status() {
        let query = build_query(&SearchCriteria {
            status: Some(RateStatus::Active),
            rate: Some(0.05),
            ..criteria()
        });

        let tail = &query.predicates[query.predicates.len() - 2..];
        assert_eq!(tail[0], Predicate::equals_number(RateField::Rate, 0.05));
        assert_eq!(tail[1], Predicate::equals(RateField::Status, "Active"));
    }

    #[test]
    fn user_text_only_reaches_values() {
        let query = build_query(&SearchCriteria {
            country: "x' OR '1'='1".to_string(),
            ..criteria()
        });

        assert_eq!(query.predicates[0].field.column(), "country");
        assert_eq!(query.predicates[0].op, FilterOp::Equals);
    }

    #[test]
    fn in_memory_matching_mirrors_operators() {
        let record = record();

        assert!(Predicate::contains(RateField::Profile, "ivr").matches(&record));
        assert!(Predicate::contains(RateField::QualityDescription, "MOBILE").matches(&record));
        assert!(!Predicate::equals(RateField::Country, "germany").matches(&record));
        assert!(Predicate::equals_number(RateField::Rate, 0.05).matches(&record));
        assert!(!Predicate::equals_number(RateField::Rate, 0.5).matches(&record));
        assert!(build_query(&criteria()).matches(&record));

        let missing = RateRecord { status: None, ..record };
        assert!(!Predicate::equals(RateField::Status, "Active").matches(&missing));
    }
}
