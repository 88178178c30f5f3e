use thiserror::Error;

use crate::domain::order::Order;
use crate::flows::states::{FlowAction, SessionEvent, SessionState, Stage, TransitionOutcome};

/// Requests must be strictly longer than this (after trimming) to be submitted.
pub const MIN_REQUEST_CHARS: usize = 6;

/// Shown when the quote service answered without a usable task.
pub const GENERIC_QUOTE_ERROR: &str = "No pudimos procesar el pedido.";

pub trait FlowDefinition {
    fn initial_state(&self) -> SessionState;
    fn transition(
        &self,
        current: &SessionState,
        event: &SessionEvent,
    ) -> Result<TransitionOutcome, FlowTransitionError>;
}

/// Linear ordering flow: idle -> loading -> quote -> confirm.
#[derive(Clone, Debug, Default)]
pub struct OrderFlow;

impl FlowDefinition for OrderFlow {
    fn initial_state(&self) -> SessionState {
        SessionState::Idle { last_error: None }
    }

    fn transition(
        &self,
        current: &SessionState,
        event: &SessionEvent,
    ) -> Result<TransitionOutcome, FlowTransitionError> {
        transition_order(current, event)
    }
}

pub struct FlowEngine<F> {
    flow: F,
}

impl<F> FlowEngine<F>
where
    F: FlowDefinition,
{
    pub fn new(flow: F) -> Self {
        Self { flow }
    }

    pub fn initial_state(&self) -> SessionState {
        self.flow.initial_state()
    }

    pub fn apply(
        &self,
        current: &SessionState,
        event: &SessionEvent,
    ) -> Result<TransitionOutcome, FlowTransitionError> {
        self.flow.transition(current, event)
    }
}

impl Default for FlowEngine<OrderFlow> {
    fn default() -> Self {
        Self::new(OrderFlow)
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FlowTransitionError {
    #[error("request must be longer than {min_chars} characters")]
    RequestTooShort { min_chars: usize },
    #[error("invalid transition from {stage:?} using event `{event}`")]
    InvalidTransition { stage: Stage, event: &'static str },
}

fn transition_order(
    current: &SessionState,
    event: &SessionEvent,
) -> Result<TransitionOutcome, FlowTransitionError> {
    use FlowAction::{PersistOrder, RequestQuote};
    use SessionEvent::{
        ClosePayment, ConfirmPayment, Edit, OpenPayment, OrderPersisted, PersistFailed,
        QuoteFailed, QuoteReceived, Submit,
    };
    use SessionState::{Confirmed, Idle, Loading, Quoted};

    let (to, actions) = match (current, event) {
        (Idle { .. }, Submit { text }) => {
            let request = text.trim();
            if request.chars().count() <= MIN_REQUEST_CHARS {
                return Err(FlowTransitionError::RequestTooShort { min_chars: MIN_REQUEST_CHARS });
            }
            (
                Loading { request: request.to_owned() },
                vec![RequestQuote { request: request.to_owned() }],
            )
        }
        (Loading { .. }, QuoteReceived(quote)) => {
            if quote.task.trim().is_empty() {
                (Idle { last_error: Some(GENERIC_QUOTE_ERROR.to_owned()) }, Vec::new())
            } else {
                (
                    Quoted {
                        quote: quote.clone(),
                        payment_open: false,
                        pending_order: None,
                        last_error: None,
                    },
                    Vec::new(),
                )
            }
        }
        (Loading { .. }, QuoteFailed { reason }) => {
            (Idle { last_error: Some(reason.clone()) }, Vec::new())
        }
        (Quoted { pending_order: None, .. }, Edit) => (Idle { last_error: None }, Vec::new()),
        (Quoted { quote, pending_order: None, .. }, OpenPayment) => (
            Quoted { quote: quote.clone(), payment_open: true, pending_order: None, last_error: None },
            Vec::new(),
        ),
        (Quoted { quote, pending_order: None, last_error, .. }, ClosePayment) => (
            Quoted {
                quote: quote.clone(),
                payment_open: false,
                pending_order: None,
                last_error: last_error.clone(),
            },
            Vec::new(),
        ),
        // A save is already outstanding for this quote: swallow the repeat.
        (Quoted { pending_order: Some(_), .. }, ConfirmPayment { .. }) => {
            (current.clone(), Vec::new())
        }
        (Quoted { quote, payment_open: true, pending_order: None, .. }, ConfirmPayment { order_id }) => {
            let order = Order::from_quote(order_id.clone(), quote.clone());
            (
                Quoted {
                    quote: quote.clone(),
                    payment_open: true,
                    pending_order: Some(order_id.clone()),
                    last_error: None,
                },
                vec![PersistOrder(order)],
            )
        }
        (Quoted { quote, pending_order: Some(order_id), .. }, OrderPersisted) => {
            (Confirmed { order: Order::from_quote(order_id.clone(), quote.clone()) }, Vec::new())
        }
        (Quoted { quote, pending_order: Some(_), .. }, PersistFailed { reason }) => (
            Quoted {
                quote: quote.clone(),
                payment_open: true,
                pending_order: None,
                last_error: Some(reason.clone()),
            },
            Vec::new(),
        ),
        _ => {
            return Err(FlowTransitionError::InvalidTransition {
                stage: current.stage(),
                event: event.name(),
            });
        }
    };

    Ok(TransitionOutcome { from: current.stage(), to, event: event.clone(), actions })
}
