use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use kunan_core::config::{AppConfig, LoadOptions};
use secrecy::{ExposeSecret, SecretString};
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    render(&config, detect_config_path().as_deref())
}

pub fn render(config: &AppConfig, config_file_path: Option<&Path>) -> String {
    let config_file_doc = load_config_file_doc(config_file_path);
    let source = |key_path: &str, env_keys: &[&str]| {
        field_source(key_path, env_keys, config_file_doc.as_ref(), config_file_path)
    };

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];

    lines.push(render_line(
        "llm.base_url",
        &config.llm.base_url,
        source("llm.base_url", &["KUNAN_LLM_BASE_URL"]),
    ));
    lines.push(render_line(
        "llm.model",
        &config.llm.model,
        source("llm.model", &["KUNAN_LLM_MODEL"]),
    ));
    lines.push(render_line(
        "llm.temperature",
        &config.llm.temperature.to_string(),
        source("llm.temperature", &["KUNAN_LLM_TEMPERATURE"]),
    ));
    lines.push(render_line(
        "llm.api_key",
        &redact_optional(config.llm.api_key.as_ref()),
        source("llm.api_key", &["KUNAN_LLM_API_KEY", "GROQ_API_KEY"]),
    ));

    lines.push(render_line(
        "storage.backend",
        &format!("{:?}", config.storage.backend),
        source("storage.backend", &["KUNAN_STORAGE_BACKEND"]),
    ));
    lines.push(render_line(
        "storage.endpoint",
        config.storage.endpoint.as_deref().unwrap_or("<unset>"),
        source("storage.endpoint", &["KUNAN_STORAGE_ENDPOINT", "APPWRITE_ENDPOINT"]),
    ));
    lines.push(render_line(
        "storage.project_id",
        config.storage.project_id.as_deref().unwrap_or("<unset>"),
        source("storage.project_id", &["KUNAN_STORAGE_PROJECT_ID", "APPWRITE_PROJECT_ID"]),
    ));
    lines.push(render_line(
        "storage.api_key",
        &redact_optional(config.storage.api_key.as_ref()),
        source("storage.api_key", &["KUNAN_STORAGE_API_KEY", "APPWRITE_API_KEY"]),
    ));
    lines.push(render_line(
        "storage.database_id",
        &config.storage.database_id,
        source("storage.database_id", &["KUNAN_STORAGE_DATABASE_ID"]),
    ));
    lines.push(render_line(
        "storage.collection_id",
        &config.storage.collection_id,
        source("storage.collection_id", &["KUNAN_STORAGE_COLLECTION_ID"]),
    ));

    lines.push(render_line(
        "server.bind_address",
        &config.server.bind_address,
        source("server.bind_address", &["KUNAN_SERVER_BIND_ADDRESS"]),
    ));
    lines.push(render_line(
        "server.port",
        &config.server.port.to_string(),
        source("server.port", &["KUNAN_SERVER_PORT"]),
    ));
    lines.push(render_line(
        "server.graceful_shutdown_secs",
        &config.server.graceful_shutdown_secs.to_string(),
        source("server.graceful_shutdown_secs", &["KUNAN_SERVER_GRACEFUL_SHUTDOWN_SECS"]),
    ));

    lines.push(render_line(
        "logging.level",
        &config.logging.level,
        source("logging.level", &["KUNAN_LOGGING_LEVEL", "KUNAN_LOG_LEVEL"]),
    ));
    lines.push(render_line(
        "logging.format",
        &format!("{:?}", config.logging.format),
        source("logging.format", &["KUNAN_LOGGING_FORMAT", "KUNAN_LOG_FORMAT"]),
    ));

    lines.join("\n")
}

fn detect_config_path() -> Option<PathBuf> {
    let root = PathBuf::from("kunan.toml");
    if root.exists() {
        return Some(root);
    }

    let nested = PathBuf::from("config/kunan.toml");
    if nested.exists() {
        return Some(nested);
    }

    None
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
    for env_key in env_keys {
        if env::var(env_key).is_ok_and(|value| !value.trim().is_empty()) {
            return format!("env ({env_key})");
        }
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

fn redact_optional(secret: Option<&SecretString>) -> String {
    secret.map(|secret| redact_token(secret.expose_secret())).unwrap_or_else(|| "<unset>".to_string())
}

fn redact_token(token: &str) -> String {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    if let Some((prefix, _)) = trimmed.split_once(&['-', '_'][..]) {
        return format!("{prefix}_***");
    }

    "<redacted>".to_string()
}
