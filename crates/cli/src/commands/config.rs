use std::env;
use std::fs;
use std::path::Path;

use ratedesk_core::config::{resolve_config_path, AppConfig, LoadOptions};
use toml::Value;

/// Key path, value, and the env vars that can override it (first wins).
type ConfigLine = (&'static str, String, &'static [&'static str]);

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = resolve_config_path(None);
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    lines.extend(effective_values(&config).into_iter().map(|(key, value, env_keys)| {
        render_line(
            key,
            &value,
            field_source(key, env_keys, config_file_doc.as_ref(), config_file_path.as_deref()),
        )
    }));

    lines.join("\n")
}

fn effective_values(config: &AppConfig) -> Vec<ConfigLine> {
    let database = &config.database;
    let server = &config.server;
    let dialogue = &config.dialogue;
    let logging = &config.logging;

    vec![
        line("database.url", &database.url, &["RATEDESK_DATABASE_URL"]),
        line(
            "database.max_connections",
            database.max_connections,
            &["RATEDESK_DATABASE_MAX_CONNECTIONS"],
        ),
        line("database.timeout_secs", database.timeout_secs, &["RATEDESK_DATABASE_TIMEOUT_SECS"]),
        line(
            "database.query_timeout_secs",
            database.query_timeout_secs,
            &["RATEDESK_DATABASE_QUERY_TIMEOUT_SECS"],
        ),
        line("server.bind_address", &server.bind_address, &["RATEDESK_SERVER_BIND_ADDRESS"]),
        line("server.port", server.port, &["RATEDESK_SERVER_PORT"]),
        line(
            "server.graceful_shutdown_secs",
            server.graceful_shutdown_secs,
            &["RATEDESK_SERVER_GRACEFUL_SHUTDOWN_SECS"],
        ),
        line(
            "dialogue.default_session_id",
            &dialogue.default_session_id,
            &["RATEDESK_DIALOGUE_DEFAULT_SESSION_ID"],
        ),
        line(
            "dialogue.session_idle_ttl_secs",
            dialogue.session_idle_ttl_secs,
            &["RATEDESK_DIALOGUE_SESSION_IDLE_TTL_SECS"],
        ),
        line("logging.level", &logging.level, &["RATEDESK_LOGGING_LEVEL", "RATEDESK_LOG_LEVEL"]),
        line(
            "logging.format",
            format!("{:?}", logging.format),
            &["RATEDESK_LOGGING_FORMAT", "RATEDESK_LOG_FORMAT"],
        ),
    ]
}

fn line(
    key: &'static str,
    value: impl ToString,
    env_keys: &'static [&'static str],
) -> ConfigLine {
    (key, value.to_string(), env_keys)
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}
