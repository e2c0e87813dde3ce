use std::collections::HashSet;

use ratedesk_core::query::{Predicate, RateField, RecordQuery, NEWEST_FIRST};
use ratedesk_core::source::RecordSource;
use ratedesk_db::repositories::SqlRateRepository;
use ratedesk_db::{connect_with_settings, migrations, DemoRateDataset};

async fn seeded_repository() -> SqlRateRepository {
    let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
    migrations::run_pending(&pool).await.expect("migrations");
    DemoRateDataset::load(&pool).await.expect("seed");
    SqlRateRepository::new(pool)
}

#[test]
fn demo_records_cover_every_reported_column() {
    for record in DemoRateDataset::records() {
        assert!(!record.country.trim().is_empty());
        assert!(record.country_code.is_some(), "{} has no dialing code", record.country);
        assert!(record.category.is_some());
        assert!(record.quality_description.is_some());
        assert!(record.profile.is_some());
        assert!(record.billing_cycle.is_some());
        assert!(record.rate.is_some());
        assert!(record.status.is_some());
    }
}

#[test]
fn demo_records_use_both_dialing_code_forms() {
    let codes = DemoRateDataset::records()
        .into_iter()
        .filter_map(|record| record.country_code)
        .collect::<HashSet<_>>();

    assert!(codes.iter().any(|code| code.starts_with('+')));
    assert!(codes.iter().any(|code| !code.starts_with('+')));
}

#[test]
fn demo_records_include_both_statuses() {
    let statuses = DemoRateDataset::records()
        .into_iter()
        .filter_map(|record| record.status)
        .collect::<HashSet<_>>();

    assert!(statuses.contains("Active"));
    assert!(statuses.contains("Inactive"));
}

#[tokio::test]
async fn seeded_country_rows_come_back_newest_first() {
    let repo = seeded_repository().await;

    let germany = repo
        .find(&RecordQuery {
            predicates: vec![Predicate::equals(RateField::Country, "Germany")],
            order_by: NEWEST_FIRST,
        })
        .await
        .expect("find");

    assert_eq!(germany.len(), 4);
    assert!(germany.windows(2).all(|pair| pair[0].added_time >= pair[1].added_time));
}

#[tokio::test]
async fn seeded_codes_resolve_to_countries() {
    let repo = seeded_repository().await;

    let expected = [("49", "Germany"), ("91", "India"), ("234", "Nigeria"), ("227", "Niger")];
    for (digits, country) in expected {
        assert_eq!(
            repo.country_for_code(digits).await.expect("lookup").as_deref(),
            Some(country),
            "dialing code {digits}"
        );
    }
}
