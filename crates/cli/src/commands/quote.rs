use std::sync::Arc;

use kunan_agent::{AgentRuntime, ChatCompletionClient};
use kunan_core::config::{AppConfig, LoadOptions};
use kunan_core::errors::ApplicationError;

use crate::commands::{current_thread_runtime, CommandResult};

const COMMAND: &str = "quote";

pub fn run(text: &str) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return failure(ApplicationError::Configuration(error.to_string())),
    };
    let runtime = match current_thread_runtime(COMMAND) {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };

    let llm = Arc::new(ChatCompletionClient::from_config(&config.llm));
    let agent = AgentRuntime::from_config(llm, &config.llm);
    runtime.block_on(execute(&agent, text))
}

pub async fn execute(agent: &AgentRuntime, text: &str) -> CommandResult {
    match agent.quote_request(text).await {
        Ok(quote) => {
            let message = format!(
                "{} | {} | {} | {}",
                quote.task,
                quote.formatted_price(),
                quote.eta,
                quote.category
            );
            CommandResult::success_with_data(COMMAND, message, serde_json::to_value(&quote).ok())
        }
        Err(error) => failure(error),
    }
}

fn failure(error: ApplicationError) -> CommandResult {
    let (error_class, exit_code) = match &error {
        ApplicationError::Validation(_)
        | ApplicationError::InvalidQuote(_)
        | ApplicationError::Domain(_) => ("validation", 2),
        ApplicationError::Generation(_) => ("invalid_model_response", 3),
        ApplicationError::Integration(_) => ("completion_unavailable", 4),
        ApplicationError::Persistence(_) => ("persistence", 5),
        ApplicationError::Configuration(_) => ("config_validation", 2),
    };
    CommandResult::failure(COMMAND, error_class, error.to_string(), exit_code)
}
