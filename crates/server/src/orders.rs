use std::sync::Arc;

use axum::{body::Bytes, extract::State, http::StatusCode, routing::post, Json, Router};
use serde::Serialize;
use serde_json::Value;
use tracing::{error, info, warn};
use uuid::Uuid;

use kunan_agent::AgentRuntime;
use kunan_core::domain::order::{Order, OrderId};
use kunan_core::domain::quote::Quote;
use kunan_core::errors::{ApplicationError, InterfaceError};
use kunan_db::OrderRepository;

#[derive(Clone)]
pub struct OrdersState {
    runtime: Arc<AgentRuntime>,
    orders: Arc<dyn OrderRepository>,
}

impl OrdersState {
    pub fn new(runtime: Arc<AgentRuntime>, orders: Arc<dyn OrderRepository>) -> Self {
        Self { runtime, orders }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
}

type ApiError = (StatusCode, Json<ErrorBody>);

pub fn router(state: OrdersState) -> Router {
    Router::new()
        .route("/api/process-order", post(process_order))
        .route("/api/orders", post(create_order))
        .with_state(state)
}

/// Quotes a free-text request. Body: `{ "request": string }`.
pub async fn process_order(
    State(state): State<OrdersState>,
    body: Bytes,
) -> Result<Json<Quote>, ApiError> {
    let correlation_id = Uuid::new_v4().to_string();

    let payload: Value = serde_json::from_slice(&body).map_err(|error| {
        warn!(
            event_name = "api.process_order.unreadable_body",
            correlation_id = %correlation_id,
            error = %error,
            "request body is not valid json"
        );
        error_response(InterfaceError::Internal {
            message: format!("unreadable body: {error}"),
            correlation_id: correlation_id.clone(),
        })
    })?;
    // A missing or non-string `request` counts as empty.
    let request = payload.get("request").and_then(Value::as_str).unwrap_or_default();

    info!(
        event_name = "api.process_order.received",
        correlation_id = %correlation_id,
        request_chars = request.trim().chars().count(),
        "quote request received"
    );

    state
        .runtime
        .quote_request_traced(request, &correlation_id)
        .await
        .map(Json)
        .map_err(|error| application_error_response(error, &correlation_id))
}

/// Persists a confirmed quote as a pending order. Body: quote JSON.
pub async fn create_order(
    State(state): State<OrdersState>,
    body: Bytes,
) -> Result<(StatusCode, Json<Order>), ApiError> {
    let correlation_id = Uuid::new_v4().to_string();

    let quote: Quote = serde_json::from_slice(&body).map_err(|error| {
        application_error_response(
            ApplicationError::InvalidQuote(format!("unreadable quote body: {error}")),
            &correlation_id,
        )
    })?;
    quote.validate().map_err(|error| {
        application_error_response(ApplicationError::InvalidQuote(error.to_string()), &correlation_id)
    })?;

    let order = Order::from_quote(OrderId::generate(), quote);
    state
        .orders
        .create(&order)
        .await
        .map_err(|error| application_error_response(error.into(), &correlation_id))?;

    info!(
        event_name = "api.orders.created",
        correlation_id = %correlation_id,
        order_id = %order.id.0,
        status = order.status.as_str(),
        "order persisted"
    );
    Ok((StatusCode::CREATED, Json(order)))
}

fn application_error_response(error: ApplicationError, correlation_id: &str) -> ApiError {
    let interface = error.into_interface(correlation_id);
    match &interface {
        InterfaceError::Internal { message, .. }
        | InterfaceError::ServiceUnavailable { message, .. } => {
            error!(
                event_name = "api.request.failed",
                correlation_id = %correlation_id,
                error = %message,
                "request failed"
            );
        }
        InterfaceError::BadRequest { message, .. }
        | InterfaceError::InvalidQuote { message, .. }
        | InterfaceError::BadGateway { message, .. } => {
            warn!(
                event_name = "api.request.rejected",
                correlation_id = %correlation_id,
                error = %message,
                "request rejected"
            );
        }
    }
    error_response(interface)
}

fn error_response(error: InterfaceError) -> ApiError {
    let status = match error {
        InterfaceError::BadRequest { .. } | InterfaceError::InvalidQuote { .. } => {
            StatusCode::BAD_REQUEST
        }
        InterfaceError::BadGateway { .. } => StatusCode::BAD_GATEWAY,
        InterfaceError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        InterfaceError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(ErrorBody { error: error.user_message() }))
}
