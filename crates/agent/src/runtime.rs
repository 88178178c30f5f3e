use std::sync::Arc;

use tracing::{info, warn};

use kunan_core::config::LlmConfig;
use kunan_core::domain::quote::Quote;
use kunan_core::errors::ApplicationError;
use kunan_core::extraction::extract_quote;

use crate::llm::{CompletionRequest, LlmClient};
use crate::prompt::SYSTEM_PROMPT;

pub const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";
pub const DEFAULT_TEMPERATURE: f32 = 0.2;

pub struct AgentRuntime {
    llm: Arc<dyn LlmClient>,
    model: String,
    temperature: f32,
}

impl AgentRuntime {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm, model: DEFAULT_MODEL.to_string(), temperature: DEFAULT_TEMPERATURE }
    }

    pub fn from_config(llm: Arc<dyn LlmClient>, config: &LlmConfig) -> Self {
        Self { llm, model: config.model.clone(), temperature: config.temperature }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub async fn quote_request(&self, text: &str) -> Result<Quote, ApplicationError> {
        self.quote_request_traced(text, "local").await
    }

    /// Turns a free-text request into a quote with exactly one completion call.
    pub async fn quote_request_traced(
        &self,
        text: &str,
        correlation_id: &str,
    ) -> Result<Quote, ApplicationError> {
        let request = text.trim();
        if request.is_empty() {
            return Err(ApplicationError::Validation("request text is empty".to_string()));
        }

        info!(
            event_name = "agent.quote.requested",
            correlation_id,
            model = %self.model,
            request_chars = request.chars().count(),
            "requesting quote"
        );

        let completion = CompletionRequest {
            model: self.model.clone(),
            system: SYSTEM_PROMPT.to_string(),
            user: request.to_string(),
            temperature: self.temperature,
        };

        let raw = self.llm.complete(&completion).await.map_err(|error| {
            warn!(
                event_name = "agent.quote.completion_failed",
                correlation_id,
                error = %format!("{error:#}"),
                "completion call failed"
            );
            ApplicationError::Integration(format!("{error:#}"))
        })?;

        let quote = extract_quote(&raw).map_err(|error| {
            warn!(
                event_name = "agent.quote.extraction_failed",
                correlation_id,
                error = %error,
                response_chars = raw.chars().count(),
                "completion did not contain a usable quote"
            );
            ApplicationError::from(error)
        })?;

        info!(
            event_name = "agent.quote.generated",
            correlation_id,
            category = %quote.category,
            price = quote.price,
            declined = quote.is_declined(),
            "quote generated"
        );
        Ok(quote)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::{Arc, Mutex};

    use anyhow::{anyhow, Result};
    use async_trait::async_trait;

    use kunan_core::domain::quote::ServiceTier;
    use kunan_core::errors::ApplicationError;
    use kunan_core::extraction::ExtractionError;

    use super::AgentRuntime;
    use crate::llm::{CompletionRequest, LlmClient};
    use crate::prompt::SYSTEM_PROMPT;

    /// Replies with queued responses in order and records every request.
    #[derive(Default)]
    pub(crate) struct CannedLlm {
        responses: Mutex<Vec<Result<String, String>>>,
        pub(crate) requests: Mutex<Vec<CompletionRequest>>,
    }

    impl CannedLlm {
        pub(crate) fn replying(responses: Vec<Result<&str, &str>>) -> Arc<Self> {
            let mut queued: Vec<Result<String, String>> = responses
                .into_iter()
                .map(|response| response.map(str::to_string).map_err(str::to_string))
                .collect();
            queued.reverse();
            Arc::new(Self { responses: Mutex::new(queued), requests: Mutex::new(Vec::new()) })
        }

        pub(crate) fn calls(&self) -> usize {
            self.requests.lock().map(|requests| requests.len()).unwrap_or(0)
        }
    }

    #[async_trait]
    impl LlmClient for CannedLlm {
        async fn complete(&self, request: &CompletionRequest) -> Result<String> {
            self.requests.lock().map_err(|_| anyhow!("poisoned"))?.push(request.clone());
            let next = self.responses.lock().map_err(|_| anyhow!("poisoned"))?.pop();
            match next {
                Some(Ok(content)) => Ok(content),
                Some(Err(message)) => Err(anyhow!(message)),
                None => Err(anyhow!("no canned response left")),
            }
        }
    }

    pub(crate) const FLASH_REPLY: &str = "Claro, aquí está la cotización:\n```json\n{\"task\": \"Llevar llaves a 10 cuadras en Miraflores\", \"price\": 10, \"eta\": \"20 minutos\", \"category\": \"Flash\", \"justification\": \"Recorrido corto en moto dentro de Miraflores\"}\n```";

    #[tokio::test]
    async fn miraflores_keys_request_yields_flash_quote() {
        let llm = CannedLlm::replying(vec![Ok(FLASH_REPLY)]);
        let runtime = AgentRuntime::new(llm.clone());

        let quote = runtime
            .quote_request("  Llevar llaves a 10 cuadras en Miraflores ")
            .await
            .expect("quote");

        assert_eq!(quote.tier(), Some(ServiceTier::Flash));
        assert!(quote.price > 0.0);

        let requests = llm.requests.lock().expect("requests lock");
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].user, "Llevar llaves a 10 cuadras en Miraflores");
        assert_eq!(requests[0].system, SYSTEM_PROMPT);
        assert_eq!(requests[0].model, "llama-3.3-70b-versatile");
        assert!((requests[0].temperature - 0.2).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn blank_request_is_rejected_without_calling_the_model() {
        let llm = CannedLlm::replying(vec![Ok(FLASH_REPLY)]);
        let runtime = AgentRuntime::new(llm.clone());

        let error = runtime.quote_request(" \n\t ").await.expect_err("blank request");

        assert!(matches!(error, ApplicationError::Validation(_)));
        assert_eq!(llm.calls(), 0);
    }

    #[tokio::test]
    async fn prose_only_reply_is_a_generation_failure() {
        let llm = CannedLlm::replying(vec![Ok("Lo siento, no puedo ayudar con eso.")]);
        let runtime = AgentRuntime::new(llm);

        let error = runtime.quote_request("Llevar un sofá a Barranco").await.expect_err("prose");

        assert_eq!(error, ApplicationError::Generation(ExtractionError::MissingObject));
    }

    #[tokio::test]
    async fn transport_failure_is_an_integration_error() {
        let llm = CannedLlm::replying(vec![Err("connection reset by peer")]);
        let runtime = AgentRuntime::new(llm);

        let error = runtime.quote_request("Comprar pan en San Isidro").await.expect_err("transport");

        assert!(matches!(error, ApplicationError::Integration(ref detail) if detail.contains("reset")));
    }

    #[tokio::test]
    async fn declined_requests_come_back_with_zero_price() {
        let llm = CannedLlm::replying(vec![Ok(
            "{\"task\":\"Pedido rechazado\",\"price\":0,\"eta\":\"-\",\"category\":\"Flash\",\"justification\":\"No realizamos ese tipo de encargos.\"}",
        )]);
        let runtime = AgentRuntime::new(llm);

        let quote = runtime.quote_request("Comprar algo ilegal").await.expect("declined quote");

        assert!(quote.is_declined());
    }
}
