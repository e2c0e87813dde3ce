use ratedesk_db::{DemoRateDataset, SeedResult};

use crate::commands::{async_runtime, load_config, open_database, CommandResult, StepFailure};

pub fn run() -> CommandResult {
    let config = match load_config("seed") {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    let runtime = match async_runtime("seed") {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    let result = runtime.block_on(async {
        let pool = open_database(&config).await?;
        let seeded = DemoRateDataset::load(&pool)
            .await
            .map_err(|error| ("seed_execution", error.to_string(), 5u8))?;
        pool.close().await;
        Ok::<SeedResult, StepFailure>(seeded)
    });

    match result {
        Ok(SeedResult { skipped_existing: true, .. }) => CommandResult::success(
            "seed",
            "rate table already has records; demo dataset not loaded",
        ),
        Ok(SeedResult { inserted, .. }) => {
            CommandResult::success("seed", format!("loaded {inserted} demo rate records"))
        }
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("seed", error_class, message, exit_code)
        }
    }
}
