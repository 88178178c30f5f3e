//! Quote generation and order session orchestration.
//!
//! `runtime` turns a free-text request into a [`kunan_core::Quote`] through a
//! chat-completion call and the quote extractor. `session` drives the order
//! lifecycle state machine against the runtime and an order repository.
//!
//! The model only proposes a quote. Whether a quote is usable and when an
//! order is written are decided by the lifecycle rules in `kunan_core::flows`.

pub mod llm;
pub mod prompt;
pub mod runtime;
pub mod session;

pub use llm::{ChatCompletionClient, CompletionRequest, LlmClient};
pub use runtime::AgentRuntime;
pub use session::OrderSession;
