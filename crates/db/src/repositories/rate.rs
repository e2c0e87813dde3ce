use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteRow, Executor, QueryBuilder, Row, Sqlite};

use ratedesk_core::domain::rate::{RateRecord, RateRecordId};
use ratedesk_core::query::{
    FilterOp, FilterValue, OrderBy, Predicate, RateField, RecordQuery, SortDirection,
};
use ratedesk_core::source::{RecordSource, RecordSourceError};

use super::{NewRateRecord, RateRepository, RepositoryError};
use crate::DbPool;

const SELECT_RATE_RECORD: &str = "SELECT id, country, country_code, category, \
     quality_description, profile, billing_cycle, rate, status, added_time FROM rate_record";

pub struct SqlRateRepository {
    pool: DbPool,
}

impl SqlRateRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn fetch_matching(
        &self,
        query: &RecordQuery,
    ) -> Result<Vec<RateRecord>, RepositoryError> {
        let mut builder = QueryBuilder::<Sqlite>::new(SELECT_RATE_RECORD);
        push_predicates(&mut builder, &query.predicates);
        push_order_by(&mut builder, query.order_by);

        let rows = builder.build().fetch_all(&self.pool).await?;
        rows.iter().map(row_to_record).collect()
    }

    async fn fetch_distinct(&self, field: RateField) -> Result<BTreeSet<String>, RepositoryError> {
        let column = field.column();
        let sql = format!(
            "SELECT DISTINCT CAST({column} AS TEXT) FROM rate_record \
             WHERE {column} IS NOT NULL AND TRIM(CAST({column} AS TEXT)) <> ''"
        );

        let values: Vec<String> = sqlx::query_scalar(&sql).fetch_all(&self.pool).await?;
        Ok(values.into_iter().collect())
    }

    async fn fetch_country_for_code(
        &self,
        digits: &str,
    ) -> Result<Option<String>, RepositoryError> {
        let country = sqlx::query_scalar(
            "SELECT country FROM rate_record \
             WHERE country_code IN (?1, ?2) AND TRIM(country) <> '' \
             ORDER BY id ASC LIMIT 1",
        )
        .bind(digits)
        .bind(format!("+{digits}"))
        .fetch_optional(&self.pool)
        .await?;
        Ok(country)
    }
}

/// Appends `WHERE` with one `AND` clause per predicate. Columns come from
/// [`RateField::column`] and every value is bound.
fn push_predicates(builder: &mut QueryBuilder<'_, Sqlite>, predicates: &[Predicate]) {
    builder.push(" WHERE 1=1");

    for predicate in predicates {
        let column = predicate.field.column();
        match (predicate.op, &predicate.value) {
            (FilterOp::Equals, FilterValue::Text(value)) => {
                builder.push(format!(" AND {column} = "));
                builder.push_bind(value.clone());
            }
            (FilterOp::Equals, FilterValue::Number(value)) => {
                builder.push(format!(" AND {column} = "));
                builder.push_bind(*value);
            }
            (FilterOp::Contains, FilterValue::Text(value)) => {
                builder.push(format!(" AND {column} LIKE "));
                builder.push_bind(like_pattern(value));
                builder.push(" ESCAPE '\\'");
            }
            (FilterOp::Contains, FilterValue::Number(_)) => {
                builder.push(" AND 0");
            }
        }
    }
}

fn push_order_by(builder: &mut QueryBuilder<'_, Sqlite>, order_by: OrderBy) {
    let direction = match order_by.direction {
        SortDirection::Ascending => "ASC",
        SortDirection::Descending => "DESC",
    };
    builder.push(format!(" ORDER BY {} {direction}, id ASC", order_by.field.column()));
}

/// `%value%` with LIKE wildcards in `value` matched literally.
fn like_pattern(value: &str) -> String {
    let mut pattern = String::with_capacity(value.len() + 2);
    pattern.push('%');
    for ch in value.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

fn row_to_record(row: &SqliteRow) -> Result<RateRecord, RepositoryError> {
    let decode = |error: sqlx::Error| RepositoryError::Decode(error.to_string());

    let added_time_raw: String = row.try_get("added_time").map_err(decode)?;
    let added_time = DateTime::parse_from_rfc3339(&added_time_raw)
        .map(|timestamp| timestamp.with_timezone(&Utc))
        .map_err(|error| {
            RepositoryError::Decode(format!("invalid added_time `{added_time_raw}`: {error}"))
        })?;

    Ok(RateRecord {
        id: RateRecordId(row.try_get("id").map_err(decode)?),
        country: row.try_get("country").map_err(decode)?,
        country_code: row.try_get("country_code").map_err(decode)?,
        category: row.try_get("category").map_err(decode)?,
        quality_description: row.try_get("quality_description").map_err(decode)?,
        profile: row.try_get("profile").map_err(decode)?,
        billing_cycle: row.try_get("billing_cycle").map_err(decode)?,
        rate: row.try_get("rate").map_err(decode)?,
        status: row.try_get("status").map_err(decode)?,
        added_time,
    })
}

#[async_trait]
impl RecordSource for SqlRateRepository {
    async fn find(&self, query: &RecordQuery) -> Result<Vec<RateRecord>, RecordSourceError> {
        Ok(self.fetch_matching(query).await?)
    }

    async fn distinct_values(
        &self,
        field: RateField,
    ) -> Result<BTreeSet<String>, RecordSourceError> {
        Ok(self.fetch_distinct(field).await?)
    }

    async fn country_for_code(&self, digits: &str) -> Result<Option<String>, RecordSourceError> {
        Ok(self.fetch_country_for_code(digits).await?)
    }
}

#[async_trait]
impl RateRepository for SqlRateRepository {
    async fn insert(&self, record: NewRateRecord) -> Result<RateRecordId, RepositoryError> {
        insert_record(&self.pool, &record).await
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        count_records(&self.pool).await
    }
}

/// Inserts one row through any executor, so seeding can share a transaction.
pub(crate) async fn insert_record<'e, E>(
    executor: E,
    record: &NewRateRecord,
) -> Result<RateRecordId, RepositoryError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        "INSERT INTO rate_record (
            country, country_code, category, quality_description, profile,
            billing_cycle, rate, status, added_time
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
    )
    .bind(record.country.clone())
    .bind(record.country_code.clone())
    .bind(record.category.clone())
    .bind(record.quality_description.clone())
    .bind(record.profile.clone())
    .bind(record.billing_cycle.clone())
    .bind(record.rate)
    .bind(record.status.clone())
    .bind(record.added_time.to_rfc3339())
    .execute(executor)
    .await?;

    Ok(RateRecordId(result.last_insert_rowid()))
}

pub(crate) async fn count_records<'e, E>(executor: E) -> Result<u64, RepositoryError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM rate_record").fetch_one(executor).await?;
    Ok(count.max(0) as u64)
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use ratedesk_core::dialogue::SearchCriteria;
    use ratedesk_core::domain::rate::{Category, Profile, QualityTag, RateStatus};
    use ratedesk_core::query::{build_query, Predicate, RateField, RecordQuery, NEWEST_FIRST};
    use ratedesk_core::source::{RecordSource, RecordSourceError};

    use super::{like_pattern, SqlRateRepository};
    use crate::repositories::{NewRateRecord, RateRepository};
    use crate::{connect_with_settings, migrations};

    async fn repository() -> SqlRateRepository {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        SqlRateRepository::new(pool)
    }

    fn rate(country: &str, code: &str, quality: &str, status: &str, day: u32) -> NewRateRecord {
        NewRateRecord {
            country: country.to_string(),
            country_code: Some(code.to_string()),
            category: Some("CC".to_string()),
            quality_description: Some(quality.to_string()),
            profile: Some("IVR".to_string()),
            billing_cycle: Some("60/60".to_string()),
            rate: Some(0.05),
            status: Some(status.to_string()),
            added_time: Utc.with_ymd_and_hms(2025, 3, day, 12, 0, 0).single().expect("timestamp"),
        }
    }

    fn germany_cc_ivr(quality: Vec<QualityTag>) -> SearchCriteria {
        SearchCriteria {
            country: "Germany".to_string(),
            category: Category::Cc,
            profile: Profile::Ivr,
            quality,
            status: None,
            rate: None,
        }
    }

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("Local"), "%Local%");
        assert_eq!(like_pattern("100%_x\\"), "%100\\%\\_x\\\\%");
    }

    #[tokio::test]
    async fn insert_then_count() {
        let repo = repository().await;
        let first =
            repo.insert(rate("Germany", "+49", "Local", "Active", 1)).await.expect("insert");
        let second =
            repo.insert(rate("France", "+33", "Local", "Active", 1)).await.expect("insert");

        assert!(second.0 > first.0);
        assert_eq!(repo.count().await.expect("count"), 2);
    }

    #[tokio::test]
    async fn find_applies_every_predicate_newest_first() {
        let repo = repository().await;
        repo.insert(rate("Germany", "+49", "Local Mobile", "Active", 1)).await.expect("insert");
        repo.insert(rate("Germany", "+49", "local mobile CLI", "Active", 5)).await.expect("insert");
        repo.insert(rate("Germany", "+49", "International Fix", "Active", 9))
            .await
            .expect("insert");
        repo.insert(rate("France", "+33", "Local Mobile", "Active", 7)).await.expect("insert");

        let query = build_query(&germany_cc_ivr(vec![QualityTag::Local, QualityTag::Mobile]));
        let found = repo.find(&query).await.expect("find");

        assert_eq!(found.len(), 2);
        assert_eq!(found[0].quality_description.as_deref(), Some("local mobile CLI"));
        assert_eq!(found[1].quality_description.as_deref(), Some("Local Mobile"));
        assert!(found.iter().all(|record| record.country == "Germany"));
    }

    #[tokio::test]
    async fn equal_timestamps_fall_back_to_id_order() {
        let repo = repository().await;
        let first =
            repo.insert(rate("Germany", "+49", "Local", "Active", 2)).await.expect("insert");
        let second =
            repo.insert(rate("Germany", "+49", "Local", "Active", 2)).await.expect("insert");

        let found = repo.find(&build_query(&germany_cc_ivr(vec![]))).await.expect("find");

        let ids = found.iter().map(|record| record.id.clone()).collect::<Vec<_>>();
        assert_eq!(ids, vec![first, second]);
    }

    #[tokio::test]
    async fn status_and_rate_are_exact_matches() {
        let repo = repository().await;
        repo.insert(rate("Germany", "+49", "Local", "Active", 1)).await.expect("insert");
        let mut inactive = rate("Germany", "+49", "Local", "Inactive", 2);
        inactive.rate = Some(0.07);
        repo.insert(inactive).await.expect("insert");

        let mut criteria = germany_cc_ivr(vec![QualityTag::Local]);
        criteria.status = Some(RateStatus::Inactive);
        let found = repo.find(&build_query(&criteria)).await.expect("find");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].rate, Some(0.07));

        criteria.status = None;
        criteria.rate = Some(0.05);
        let found = repo.find(&build_query(&criteria)).await.expect("find");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].status.as_deref(), Some("Active"));
    }

    #[tokio::test]
    async fn null_columns_never_match_predicates() {
        let repo = repository().await;
        let mut bare = rate("Germany", "+49", "Local", "Active", 1);
        bare.profile = None;
        repo.insert(bare).await.expect("insert");

        let found = repo.find(&build_query(&germany_cc_ivr(vec![]))).await.expect("find");
        assert!(found.is_empty());

        let all_germany = RecordQuery {
            predicates: vec![Predicate::equals(RateField::Country, "Germany")],
            order_by: NEWEST_FIRST,
        };
        let found = repo.find(&all_germany).await.expect("find");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].profile, None);
    }

    #[tokio::test]
    async fn user_text_is_bound_not_spliced() {
        let repo = repository().await;
        repo.insert(rate("Germany", "+49", "Local", "Active", 1)).await.expect("insert");

        let hostile = RecordQuery {
            predicates: vec![Predicate::equals(RateField::Country, "x' OR '1'='1")],
            order_by: NEWEST_FIRST,
        };
        assert!(repo.find(&hostile).await.expect("find").is_empty());
        assert_eq!(repo.count().await.expect("count"), 1);
    }

    #[tokio::test]
    async fn distinct_values_skip_blank_entries() {
        let repo = repository().await;
        repo.insert(rate("Germany", "+49", "Local", "Active", 1)).await.expect("insert");
        repo.insert(rate("Germany", "+49", "Local", "Active", 2)).await.expect("insert");
        repo.insert(rate("India", "91", "Local", "Active", 1)).await.expect("insert");
        repo.insert(rate("  ", "", "Local", "Active", 1)).await.expect("insert");

        let countries = repo.distinct_values(RateField::Country).await.expect("distinct");
        assert_eq!(countries.into_iter().collect::<Vec<_>>(), vec!["Germany", "India"]);
    }

    #[tokio::test]
    async fn country_code_matches_with_or_without_plus() {
        let repo = repository().await;
        repo.insert(rate("Germany", "+49", "Local", "Active", 1)).await.expect("insert");
        repo.insert(rate("India", "91", "Local", "Active", 1)).await.expect("insert");

        assert_eq!(
            repo.country_for_code("49").await.expect("lookup").as_deref(),
            Some("Germany")
        );
        assert_eq!(repo.country_for_code("91").await.expect("lookup").as_deref(), Some("India"));
        assert_eq!(repo.country_for_code("44").await.expect("lookup"), None);
    }

    #[tokio::test]
    async fn country_code_skips_blank_country_names() {
        let repo = repository().await;
        repo.insert(rate(" ", "+49", "Local", "Active", 1)).await.expect("insert");
        assert_eq!(repo.country_for_code("49").await.expect("lookup"), None);

        repo.insert(rate("Germany", "49", "Local", "Active", 2)).await.expect("insert");
        assert_eq!(
            repo.country_for_code("49").await.expect("lookup").as_deref(),
            Some("Germany")
        );
    }

    #[tokio::test]
    async fn missing_table_surfaces_as_unavailable() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        let repo = SqlRateRepository::new(pool);

        let error = repo.country_for_code("49").await.expect_err("no table");
        assert!(matches!(error, RecordSourceError::Unavailable(_)));
    }
}
