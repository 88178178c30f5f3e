use std::collections::VecDeque;
use std::sync::Arc;

use tracing::{info, warn};

use kunan_core::domain::order::OrderId;
use kunan_core::errors::{ApplicationError, DomainError};
use kunan_core::flows::{FlowAction, FlowEngine, OrderFlow, SessionEvent, SessionState};
use kunan_db::OrderRepository;

use crate::runtime::AgentRuntime;

/// Shown when an order could not be written; the quote stays available for retry.
pub const PERSIST_FAILURE_MESSAGE: &str = "No pudimos guardar el pedido. Intenta otra vez.";

/// Drives one customer's order lifecycle against the quote runtime and order store.
///
/// Every outbound call is awaited before the completion event is applied, so
/// at most one call is in flight per session.
pub struct OrderSession {
    engine: FlowEngine<OrderFlow>,
    runtime: Arc<AgentRuntime>,
    orders: Arc<dyn OrderRepository>,
    state: SessionState,
    session_id: String,
}

impl OrderSession {
    pub fn new(runtime: Arc<AgentRuntime>, orders: Arc<dyn OrderRepository>) -> Self {
        let engine = FlowEngine::default();
        let state = engine.initial_state();
        Self {
            engine,
            runtime,
            orders,
            state,
            session_id: OrderId::generate().0,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Starts a fresh cycle, dropping whatever the current state holds.
    pub fn reset(&mut self) {
        self.state = self.engine.initial_state();
    }

    pub async fn submit(&mut self, text: &str) -> Result<&SessionState, ApplicationError> {
        self.dispatch(SessionEvent::Submit { text: text.to_string() }).await
    }

    pub async fn edit(&mut self) -> Result<&SessionState, ApplicationError> {
        self.dispatch(SessionEvent::Edit).await
    }

    pub async fn open_payment(&mut self) -> Result<&SessionState, ApplicationError> {
        self.dispatch(SessionEvent::OpenPayment).await
    }

    pub async fn close_payment(&mut self) -> Result<&SessionState, ApplicationError> {
        self.dispatch(SessionEvent::ClosePayment).await
    }

    pub async fn confirm_payment(&mut self) -> Result<&SessionState, ApplicationError> {
        self.dispatch(SessionEvent::ConfirmPayment { order_id: OrderId::generate() }).await
    }

    async fn dispatch(&mut self, event: SessionEvent) -> Result<&SessionState, ApplicationError> {
        let mut pending = VecDeque::from([event]);

        while let Some(event) = pending.pop_front() {
            let outcome = self.engine.apply(&self.state, &event).map_err(DomainError::from)?;
            info!(
                event_name = "session.transition",
                correlation_id = %self.session_id,
                from = ?outcome.from,
                to = ?outcome.to.stage(),
                trigger = outcome.event.name(),
                "session transition applied"
            );
            self.state = outcome.to;

            for action in outcome.actions {
                pending.push_back(self.perform(action).await);
            }
        }

        Ok(&self.state)
    }

    async fn perform(&self, action: FlowAction) -> SessionEvent {
        match action {
            FlowAction::RequestQuote { request } => {
                match self.runtime.quote_request_traced(&request, &self.session_id).await {
                    Ok(quote) => SessionEvent::QuoteReceived(quote),
                    Err(error) => {
                        let reason =
                            error.into_interface(self.session_id.clone()).user_message().to_string();
                        SessionEvent::QuoteFailed { reason }
                    }
                }
            }
            FlowAction::PersistOrder(order) => match self.orders.create(&order).await {
                Ok(()) => SessionEvent::OrderPersisted,
                Err(error) => {
                    warn!(
                        event_name = "session.order.persist_failed",
                        correlation_id = %self.session_id,
                        order_id = %order.id.0,
                        error = %error,
                        "order could not be saved"
                    );
                    SessionEvent::PersistFailed { reason: PERSIST_FAILURE_MESSAGE.to_string() }
                }
            },
        }
    }
}
