use std::sync::Arc;
use std::time::Duration;

use ratedesk_agent::{AgentRuntime, InMemorySessionStore, RuntimeSettings};
use ratedesk_core::config::{AppConfig, ConfigError};
use ratedesk_core::domain::session::SessionId;
use ratedesk_db::repositories::SqlRateRepository;
use ratedesk_db::{connect_with_settings, migrations, DbPool};
use thiserror::Error;
use tracing::info;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub runtime: Arc<AgentRuntime>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );
    config.validate()?;

    let db_pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        "database migrations applied"
    );

    let runtime = Arc::new(build_runtime(&config, db_pool.clone()));
    Ok(Application { config, db_pool, runtime })
}

pub fn build_runtime(config: &AppConfig, db_pool: DbPool) -> AgentRuntime {
    AgentRuntime::new(
        Arc::new(InMemorySessionStore::new()),
        Arc::new(SqlRateRepository::new(db_pool)),
        RuntimeSettings {
            default_session_id: SessionId::from(config.dialogue.default_session_id.as_str()),
            query_timeout: Duration::from_secs(config.database.query_timeout_secs),
        },
    )
}

#[cfg(test)]
mod tests {
    use ratedesk_core::config::AppConfig;
    use ratedesk_db::DemoRateDataset;

    use crate::bootstrap::{bootstrap_with_config, BootstrapError};

    fn in_memory_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.database.url = "sqlite::memory:".to_string();
        config
    }

    #[tokio::test]
    async fn bootstrap_rejects_invalid_config_before_connecting() {
        let mut config = in_memory_config();
        config.database.url = "postgres://localhost/rates".to_string();

        let result = bootstrap_with_config(config).await;

        assert!(matches!(result, Err(BootstrapError::Config(_))));
    }

    #[tokio::test]
    async fn bootstrap_applies_migrations() {
        let app = bootstrap_with_config(in_memory_config()).await.expect("bootstrap");

        let (table_count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'rate_record'",
        )
        .fetch_one(&app.db_pool)
        .await
        .expect("expected rate table after bootstrap");
        assert_eq!(table_count, 1);
    }

    #[tokio::test]
    async fn bootstrapped_runtime_answers_from_the_database() {
        let app = bootstrap_with_config(in_memory_config()).await.expect("bootstrap");
        DemoRateDataset::load(&app.db_pool).await.expect("seed");

        let reply = app.runtime.answer("cc ivr local mobile germany", None).await.expect("turn");

        assert!(reply.starts_with("Country"));
        assert!(reply.contains("Germany"));
        assert!(reply.contains("Local Mobile CLI"));
    }

    #[tokio::test]
    async fn bootstrapped_runtime_uses_configured_default_session() {
        let mut config = in_memory_config();
        config.dialogue.default_session_id = "kiosk".to_string();
        let app = bootstrap_with_config(config).await.expect("bootstrap");

        assert_eq!(app.runtime.default_session_id().as_str(), "kiosk");
    }
}
