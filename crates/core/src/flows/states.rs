use serde::{Deserialize, Serialize};

use crate::domain::order::{Order, OrderId};
use crate::domain::quote::Quote;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Idle,
    Loading,
    Quote,
    Confirm,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum SessionState {
    Idle {
        last_error: Option<String>,
    },
    Loading {
        request: String,
    },
    Quoted {
        quote: Quote,
        payment_open: bool,
        pending_order: Option<OrderId>,
        last_error: Option<String>,
    },
    Confirmed {
        order: Order,
    },
}

impl SessionState {
    pub fn stage(&self) -> Stage {
        match self {
            Self::Idle { .. } => Stage::Idle,
            Self::Loading { .. } => Stage::Loading,
            Self::Quoted { .. } => Stage::Quote,
            Self::Confirmed { .. } => Stage::Confirm,
        }
    }

    pub fn quote(&self) -> Option<&Quote> {
        match self {
            Self::Quoted { quote, .. } => Some(quote),
            Self::Confirmed { order } => Some(&order.quote),
            Self::Idle { .. } | Self::Loading { .. } => None,
        }
    }

    pub fn last_error(&self) -> Option<&str> {
        match self {
            Self::Idle { last_error } | Self::Quoted { last_error, .. } => last_error.as_deref(),
            Self::Loading { .. } | Self::Confirmed { .. } => None,
        }
    }

    pub fn payment_open(&self) -> bool {
        matches!(self, Self::Quoted { payment_open: true, .. })
    }

    pub fn is_saving(&self) -> bool {
        matches!(self, Self::Quoted { pending_order: Some(_), .. })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum SessionEvent {
    Submit { text: String },
    QuoteReceived(Quote),
    QuoteFailed { reason: String },
    Edit,
    OpenPayment,
    ClosePayment,
    ConfirmPayment { order_id: OrderId },
    OrderPersisted,
    PersistFailed { reason: String },
}

impl SessionEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Submit { .. } => "submit",
            Self::QuoteReceived(_) => "quote_received",
            Self::QuoteFailed { .. } => "quote_failed",
            Self::Edit => "edit",
            Self::OpenPayment => "open_payment",
            Self::ClosePayment => "close_payment",
            Self::ConfirmPayment { .. } => "confirm_payment",
            Self::OrderPersisted => "order_persisted",
            Self::PersistFailed { .. } => "persist_failed",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum FlowAction {
    RequestQuote { request: String },
    PersistOrder(Order),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransitionOutcome {
    pub from: Stage,
    pub to: SessionState,
    pub event: SessionEvent,
    pub actions: Vec<FlowAction>,
}
