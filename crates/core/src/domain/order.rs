use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::quote::Quote;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderId(pub String);

impl OrderId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
        }
    }
}

/// A confirmed quote, ready to be written to the order store.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    #[serde(flatten)]
    pub quote: Quote,
    pub status: OrderStatus,
}

impl Order {
    pub fn from_quote(id: OrderId, quote: Quote) -> Self {
        Self { id, quote, status: OrderStatus::Pending }
    }

    /// Document body as stored: the quote fields plus `status`, without the id.
    pub fn payload(&self) -> OrderPayload<'_> {
        OrderPayload { quote: &self.quote, status: self.status }
    }
}

#[derive(Debug, Serialize)]
pub struct OrderPayload<'a> {
    #[serde(flatten)]
    pub quote: &'a Quote,
    pub status: OrderStatus,
}
