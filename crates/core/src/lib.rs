pub mod config;
pub mod domain;
pub mod errors;
pub mod extraction;
pub mod flows;

pub use config::{AppConfig, IntegrationStatus, LoadOptions, LogFormat, StorageBackend};
pub use domain::order::{Order, OrderId, OrderPayload, OrderStatus};
pub use domain::quote::{Quote, ServiceTier};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use extraction::{extract_quote, ExtractionError};
pub use flows::{
    FlowAction, FlowEngine, FlowTransitionError, OrderFlow, SessionEvent, SessionState, Stage,
};
