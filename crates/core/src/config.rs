use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub llm: LlmConfig,
    pub storage: StorageConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct LlmConfig {
    pub api_key: Option<SecretString>,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
}

#[derive(Clone, Debug)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub endpoint: Option<String>,
    pub project_id: Option<String>,
    pub api_key: Option<SecretString>,
    pub database_id: String,
    pub collection_id: String,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub graceful_shutdown_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    Document,
    Memory,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub log_level: Option<String>,
    pub llm_api_key: Option<String>,
    pub llm_base_url: Option<String>,
    pub llm_model: Option<String>,
    pub storage_backend: Option<StorageBackend>,
    pub storage_endpoint: Option<String>,
    pub storage_project_id: Option<String>,
    pub storage_api_key: Option<String>,
    pub server_port: Option<u16>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

/// Which external collaborators have enough settings to be called.
///
/// Missing settings never fail startup; the affected client fails at call time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct IntegrationStatus {
    pub completion_configured: bool,
    pub storage_configured: bool,
}

impl IntegrationStatus {
    pub fn all_configured(&self) -> bool {
        self.completion_configured && self.storage_configured
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            llm: LlmConfig {
                api_key: None,
                base_url: "https://api.groq.com/openai/v1".to_string(),
                model: "llama-3.3-70b-versatile".to_string(),
                temperature: 0.2,
            },
            storage: StorageConfig {
                backend: StorageBackend::Document,
                endpoint: None,
                project_id: None,
                api_key: None,
                database_id: "kunan_db".to_string(),
                collection_id: "orders".to_string(),
            },
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 3000,
                graceful_shutdown_secs: 15,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for StorageBackend {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "document" | "appwrite" => Ok(Self::Document),
            "memory" => Ok(Self::Memory),
            other => Err(ConfigError::Validation(format!(
                "unsupported storage backend `{other}` (expected document|memory)"
            ))),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("kunan.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    pub fn integration_status(&self) -> IntegrationStatus {
        let completion_configured = has_secret(self.llm.api_key.as_ref());
        let storage_configured = match self.storage.backend {
            StorageBackend::Memory => true,
            StorageBackend::Document => {
                has_text(self.storage.endpoint.as_deref())
                    && has_text(self.storage.project_id.as_deref())
                    && has_secret(self.storage.api_key.as_ref())
            }
        };
        IntegrationStatus { completion_configured, storage_configured }
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.bind_address, self.server.port)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(llm) = patch.llm {
            if let Some(llm_api_key_value) = llm.api_key {
                self.llm.api_key = Some(secret_value(llm_api_key_value));
            }
            if let Some(base_url) = llm.base_url {
                self.llm.base_url = base_url;
            }
            if let Some(model) = llm.model {
                self.llm.model = model;
            }
            if let Some(temperature) = llm.temperature {
                self.llm.temperature = temperature;
            }
        }

        if let Some(storage) = patch.storage {
            if let Some(backend) = storage.backend {
                self.storage.backend = backend;
            }
            if let Some(endpoint) = storage.endpoint {
                self.storage.endpoint = Some(endpoint);
            }
            if let Some(project_id) = storage.project_id {
                self.storage.project_id = Some(project_id);
            }
            if let Some(storage_api_key_value) = storage.api_key {
                self.storage.api_key = Some(secret_value(storage_api_key_value));
            }
            if let Some(database_id) = storage.database_id {
                self.storage.database_id = database_id;
            }
            if let Some(collection_id) = storage.collection_id {
                self.storage.collection_id = collection_id;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("KUNAN_LLM_API_KEY").or_else(|| read_env("GROQ_API_KEY")) {
            self.llm.api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("KUNAN_LLM_BASE_URL") {
            self.llm.base_url = value;
        }
        if let Some(value) = read_env("KUNAN_LLM_MODEL") {
            self.llm.model = value;
        }
        if let Some(value) = read_env("KUNAN_LLM_TEMPERATURE") {
            self.llm.temperature = parse_f32("KUNAN_LLM_TEMPERATURE", &value)?;
        }

        if let Some(value) = read_env("KUNAN_STORAGE_BACKEND") {
            self.storage.backend = value.parse()?;
        }
        let endpoint =
            read_env("KUNAN_STORAGE_ENDPOINT").or_else(|| read_env("APPWRITE_ENDPOINT"));
        if let Some(value) = endpoint {
            self.storage.endpoint = Some(value);
        }
        let project_id =
            read_env("KUNAN_STORAGE_PROJECT_ID").or_else(|| read_env("APPWRITE_PROJECT_ID"));
        if let Some(value) = project_id {
            self.storage.project_id = Some(value);
        }
        let storage_api_key =
            read_env("KUNAN_STORAGE_API_KEY").or_else(|| read_env("APPWRITE_API_KEY"));
        if let Some(value) = storage_api_key {
            self.storage.api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("KUNAN_STORAGE_DATABASE_ID") {
            self.storage.database_id = value;
        }
        if let Some(value) = read_env("KUNAN_STORAGE_COLLECTION_ID") {
            self.storage.collection_id = value;
        }

        if let Some(value) = read_env("KUNAN_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("KUNAN_SERVER_PORT") {
            self.server.port = parse_u16("KUNAN_SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("KUNAN_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_u64("KUNAN_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }

        let log_level = read_env("KUNAN_LOGGING_LEVEL").or_else(|| read_env("KUNAN_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format = read_env("KUNAN_LOGGING_FORMAT").or_else(|| read_env("KUNAN_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(llm_api_key) = overrides.llm_api_key {
            self.llm.api_key = Some(secret_value(llm_api_key));
        }
        if let Some(llm_base_url) = overrides.llm_base_url {
            self.llm.base_url = llm_base_url;
        }
        if let Some(llm_model) = overrides.llm_model {
            self.llm.model = llm_model;
        }
        if let Some(storage_backend) = overrides.storage_backend {
            self.storage.backend = storage_backend;
        }
        if let Some(storage_endpoint) = overrides.storage_endpoint {
            self.storage.endpoint = Some(storage_endpoint);
        }
        if let Some(storage_project_id) = overrides.storage_project_id {
            self.storage.project_id = Some(storage_project_id);
        }
        if let Some(storage_api_key) = overrides.storage_api_key {
            self.storage.api_key = Some(secret_value(storage_api_key));
        }
        if let Some(server_port) = overrides.server_port {
            self.server.port = server_port;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_llm(&self.llm)?;
        validate_storage(&self.storage)?;
        validate_server(&self.server)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("kunan.toml"), PathBuf::from("config/kunan.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_llm(llm: &LlmConfig) -> Result<(), ConfigError> {
    if !is_http_url(&llm.base_url) {
        return Err(ConfigError::Validation(
            "llm.base_url must start with http:// or https://".to_string(),
        ));
    }

    if llm.model.trim().is_empty() {
        return Err(ConfigError::Validation("llm.model must not be empty".to_string()));
    }

    if !(0.0..=2.0).contains(&llm.temperature) {
        return Err(ConfigError::Validation(
            "llm.temperature must be in range 0.0..=2.0".to_string(),
        ));
    }

    Ok(())
}

fn validate_storage(storage: &StorageConfig) -> Result<(), ConfigError> {
    if let Some(endpoint) = &storage.endpoint {
        if !is_http_url(endpoint) {
            return Err(ConfigError::Validation(
                "storage.endpoint must start with http:// or https://".to_string(),
            ));
        }
    }

    if storage.database_id.trim().is_empty() || storage.collection_id.trim().is_empty() {
        return Err(ConfigError::Validation(
            "storage.database_id and storage.collection_id must not be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn is_http_url(value: &str) -> bool {
    let value = value.trim();
    value.starts_with("http://") || value.starts_with("https://")
}

fn has_text(value: Option<&str>) -> bool {
    value.map(|value| !value.trim().is_empty()).unwrap_or(false)
}

fn has_secret(value: Option<&SecretString>) -> bool {
    value.map(|value| !value.expose_secret().trim().is_empty()).unwrap_or(false)
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_f32(key: &str, value: &str) -> Result<f32, ConfigError> {
    value.parse::<f32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    llm: Option<LlmPatch>,
    storage: Option<StoragePatch>,
    server: Option<ServerPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct LlmPatch {
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    temperature: Option<f32>,
}

#[derive(Debug, Default, Deserialize)]
struct StoragePatch {
    backend: Option<StorageBackend>,
    endpoint: Option<String>,
    project_id: Option<String>,
    api_key: Option<String>,
    database_id: Option<String>,
    collection_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::io;
    use std::sync::{Mutex, OnceLock};

    use secrecy::ExposeSecret;
    use tempfile::TempDir;

    use super::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat, StorageBackend};

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    const ENV_KEYS: &[&str] = &[
        "KUNAN_LLM_API_KEY",
        "GROQ_API_KEY",
        "KUNAN_LLM_BASE_URL",
        "KUNAN_LLM_MODEL",
        "KUNAN_LLM_TEMPERATURE",
        "KUNAN_STORAGE_BACKEND",
        "KUNAN_STORAGE_ENDPOINT",
        "APPWRITE_ENDPOINT",
        "KUNAN_STORAGE_PROJECT_ID",
        "APPWRITE_PROJECT_ID",
        "KUNAN_STORAGE_API_KEY",
        "APPWRITE_API_KEY",
        "KUNAN_SERVER_PORT",
        "KUNAN_LOG_LEVEL",
        "KUNAN_LOG_FORMAT",
        "KUNAN_LOGGING_LEVEL",
        "KUNAN_LOGGING_FORMAT",
    ];

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars() {
        for var in ENV_KEYS {
            env::remove_var(var);
        }
    }

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    #[test]
    fn missing_credentials_do_not_fail_loading() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars();

        let config = AppConfig::load(LoadOptions::default())
            .map_err(|err| format!("config load failed: {err}"))?;
        let status = config.integration_status();

        ensure(!status.completion_configured, "completion should report unconfigured")?;
        ensure(!status.storage_configured, "storage should report unconfigured")?;
        ensure(!status.all_configured(), "nothing should be fully configured")?;
        ensure(config.storage.database_id == "kunan_db", "default database id")?;
        ensure(config.storage.collection_id == "orders", "default collection id")
    }

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars();

        env::set_var("TEST_KUNAN_GROQ_KEY", "gsk-from-env");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("kunan.toml");
            fs::write(
                &path,
                r#"
[llm]
api_key = "${TEST_KUNAN_GROQ_KEY}"
temperature = 0.1

[storage]
endpoint = "https://cloud.appwrite.io/v1"
project_id = "kunan"
api_key = "standard_key"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.llm.api_key.as_ref().map(|key| key.expose_secret() == "gsk-from-env")
                    == Some(true),
                "llm api key should be interpolated from environment",
            )?;
            ensure((config.llm.temperature - 0.1).abs() < f32::EPSILON, "temperature from file")?;
            ensure(config.integration_status().all_configured(), "both integrations configured")
        })();

        env::remove_var("TEST_KUNAN_GROQ_KEY");
        result
    }

    #[test]
    fn vendor_env_aliases_are_supported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars();

        env::set_var("GROQ_API_KEY", "gsk-alias");
        env::set_var("APPWRITE_ENDPOINT", "https://cloud.appwrite.io/v1");
        env::set_var("APPWRITE_PROJECT_ID", "kunan-project");
        env::set_var("KUNAN_LOG_LEVEL", "warn");
        env::set_var("KUNAN_LOG_FORMAT", "pretty");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.integration_status().completion_configured, "groq alias sets api key")?;
            ensure(
                config.storage.endpoint.as_deref() == Some("https://cloud.appwrite.io/v1"),
                "appwrite endpoint alias",
            )?;
            ensure(
                config.storage.project_id.as_deref() == Some("kunan-project"),
                "appwrite project alias",
            )?;
            ensure(
                !config.integration_status().storage_configured,
                "storage without api key is not configured",
            )?;
            ensure(config.logging.level == "warn", "log level alias")?;
            ensure(matches!(config.logging.format, LogFormat::Pretty), "log format alias")
        })();

        clear_vars();
        result
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars();

        env::set_var("KUNAN_LLM_MODEL", "model-from-env");
        env::set_var("KUNAN_SERVER_PORT", "4000");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("kunan.toml");
            fs::write(
                &path,
                r#"
[llm]
model = "model-from-file"

[server]
port = 5000

[logging]
level = "warn"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    log_level: Some("debug".to_string()),
                    server_port: Some(6000),
                    storage_backend: Some(StorageBackend::Memory),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.llm.model == "model-from-env", "env model should win over file")?;
            ensure(config.server.port == 6000, "override port should win")?;
            ensure(config.logging.level == "debug", "override log level should win")?;
            ensure(
                config.integration_status().storage_configured,
                "memory storage is always configured",
            )
        })();

        clear_vars();
        result
    }

    #[test]
    fn validation_rejects_malformed_values() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars();

        env::set_var("KUNAN_STORAGE_ENDPOINT", "cloud.appwrite.io");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => {
                    return Err("expected validation failure but config load succeeded".to_string())
                }
                Err(error) => error,
            };
            let has_message = matches!(
                error,
                ConfigError::Validation(ref message) if message.contains("storage.endpoint")
            );
            ensure(has_message, "validation failure should mention storage.endpoint")
        })();

        clear_vars();
        result
    }

    #[test]
    fn invalid_numeric_env_override_is_reported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars();

        env::set_var("KUNAN_SERVER_PORT", "not-a-port");
        let result = match AppConfig::load(LoadOptions::default()) {
            Err(ConfigError::InvalidEnvOverride { key, .. }) => {
                ensure(key == "KUNAN_SERVER_PORT", "error should name the env key")
            }
            other => Err(format!("unexpected result: {other:?}")),
        };

        clear_vars();
        result
    }

    #[test]
    fn secret_values_are_not_leaked_by_debug() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars();

        env::set_var("KUNAN_LLM_API_KEY", "gsk-secret-value");
        env::set_var("KUNAN_STORAGE_API_KEY", "appwrite-secret-value");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;
            let debug = format!("{config:?}");

            ensure(!debug.contains("gsk-secret-value"), "debug output leaked llm key")?;
            ensure(!debug.contains("appwrite-secret-value"), "debug output leaked storage key")?;
            ensure(
                matches!(config.logging.format, LogFormat::Compact),
                "default logging format should be compact",
            )
        })();

        clear_vars();
        result
    }
}
