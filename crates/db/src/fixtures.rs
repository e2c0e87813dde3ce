use chrono::{DateTime, TimeZone, Utc};

use crate::repositories::rate::{count_records, insert_record};
use crate::repositories::{NewRateRecord, RepositoryError};
use crate::DbPool;

struct SeedRate {
    country: &'static str,
    country_code: &'static str,
    category: &'static str,
    quality_description: &'static str,
    profile: &'static str,
    billing_cycle: &'static str,
    rate: f64,
    status: &'static str,
    added_on: (i32, u32, u32),
}

const SEED_RATES: &[SeedRate] = &[
    SeedRate {
        country: "Germany",
        country_code: "+49",
        category: "CC",
        quality_description: "Local Mobile CLI",
        profile: "IVR",
        billing_cycle: "60/60",
        rate: 0.05,
        status: "Active",
        added_on: (2025, 1, 6),
    },
    SeedRate {
        country: "Germany",
        country_code: "+49",
        category: "CC",
        quality_description: "Local Mobile, Correct CLI",
        profile: "IVR / Outbound",
        billing_cycle: "60/60",
        rate: 0.048,
        status: "Active",
        added_on: (2025, 2, 14),
    },
    SeedRate {
        country: "Germany",
        country_code: "+49",
        category: "CC",
        quality_description: "International Fix",
        profile: "IVR",
        billing_cycle: "1/1",
        rate: 0.07,
        status: "Inactive",
        added_on: (2024, 11, 2),
    },
    SeedRate {
        country: "Germany",
        country_code: "+49",
        category: "CLI",
        quality_description: "Random CLI Mobile",
        profile: "Outbound",
        billing_cycle: "30/30",
        rate: 0.031,
        status: "Active",
        added_on: (2025, 1, 20),
    },
    SeedRate {
        country: "India",
        country_code: "91",
        category: "CC",
        quality_description: "Local Mobile",
        profile: "IVR",
        billing_cycle: "60/60",
        rate: 0.02,
        status: "Active",
        added_on: (2025, 3, 1),
    },
    SeedRate {
        country: "India",
        country_code: "91",
        category: "CLI",
        quality_description: "Correct CLI Fix",
        profile: "Outbound",
        billing_cycle: "60/60",
        rate: 0.018,
        status: "Active",
        added_on: (2025, 2, 3),
    },
    SeedRate {
        country: "France",
        country_code: "+33",
        category: "CC",
        quality_description: "International Mobile",
        profile: "IVR",
        billing_cycle: "60/60",
        rate: 0.06,
        status: "Active",
        added_on: (2025, 1, 11),
    },
    SeedRate {
        country: "United Kingdom",
        country_code: "+44",
        category: "CLI",
        quality_description: "Local Fix",
        profile: "Outbound",
        billing_cycle: "1/1",
        rate: 0.012,
        status: "Active",
        added_on: (2025, 2, 27),
    },
    SeedRate {
        country: "Nigeria",
        country_code: "+234",
        category: "CC",
        quality_description: "Local Mobile Random CLI",
        profile: "IVR",
        billing_cycle: "60/60",
        rate: 0.11,
        status: "Active",
        added_on: (2025, 1, 30),
    },
    SeedRate {
        country: "Niger",
        country_code: "+227",
        category: "CC",
        quality_description: "International Mobile",
        profile: "IVR",
        billing_cycle: "60/60",
        rate: 0.19,
        status: "Inactive",
        added_on: (2024, 12, 18),
    },
];

/// Deterministic demo rate table for local runs and smoke checks.
pub struct DemoRateDataset;

#[derive(Debug, PartialEq, Eq)]
pub struct SeedResult {
    pub inserted: usize,
    /// `true` when the table already held rows and nothing was written.
    pub skipped_existing: bool,
}

impl DemoRateDataset {
    pub fn records() -> Vec<NewRateRecord> {
        SEED_RATES
            .iter()
            .map(|seed| NewRateRecord {
                country: seed.country.to_string(),
                country_code: Some(seed.country_code.to_string()),
                category: Some(seed.category.to_string()),
                quality_description: Some(seed.quality_description.to_string()),
                profile: Some(seed.profile.to_string()),
                billing_cycle: Some(seed.billing_cycle.to_string()),
                rate: Some(seed.rate),
                status: Some(seed.status.to_string()),
                added_time: seed_timestamp(seed.added_on),
            })
            .collect()
    }

    /// Loads the dataset into an empty `rate_record` table. A table that
    /// already has rows is left untouched.
    pub async fn load(pool: &DbPool) -> Result<SeedResult, RepositoryError> {
        let mut tx = pool.begin().await?;

        if count_records(&mut *tx).await? > 0 {
            tx.rollback().await?;
            return Ok(SeedResult { inserted: 0, skipped_existing: true });
        }

        let records = Self::records();
        for record in &records {
            insert_record(&mut *tx, record).await?;
        }

        tx.commit().await?;
        Ok(SeedResult { inserted: records.len(), skipped_existing: false })
    }
}

fn seed_timestamp((year, month, day): (i32, u32, u32)) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 9, 0, 0).single().unwrap_or_default()
}
