use std::sync::Arc;

use kunan_agent::{AgentRuntime, ChatCompletionClient};
use kunan_core::config::{AppConfig, ConfigError, LoadOptions};
use kunan_db::{order_repository_from_config, OrderRepository};
use thiserror::Error;
use tracing::{info, warn};

pub struct Application {
    pub config: AppConfig,
    pub agent_runtime: Arc<AgentRuntime>,
    pub orders: Arc<dyn OrderRepository>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    Ok(bootstrap_with_config(config))
}

pub fn bootstrap_with_config(config: AppConfig) -> Application {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        model = %config.llm.model,
        storage_backend = ?config.storage.backend,
        "starting application bootstrap"
    );

    let integrations = config.integration_status();
    if !integrations.completion_configured {
        warn!(
            event_name = "system.bootstrap.completion_unconfigured",
            correlation_id = "bootstrap",
            "llm.api_key is not set; quote requests will fail until it is configured"
        );
    }
    if !integrations.storage_configured {
        warn!(
            event_name = "system.bootstrap.storage_unconfigured",
            correlation_id = "bootstrap",
            "document store settings are incomplete; order writes will fail"
        );
    }

    let llm = Arc::new(ChatCompletionClient::from_config(&config.llm));
    let agent_runtime = Arc::new(AgentRuntime::from_config(llm, &config.llm));
    let orders = order_repository_from_config(&config.storage);

    info!(
        event_name = "system.bootstrap.ready",
        correlation_id = "bootstrap",
        completion_configured = integrations.completion_configured,
        storage_configured = integrations.storage_configured,
        "application bootstrap complete"
    );

    Application { config, agent_runtime, orders }
}
