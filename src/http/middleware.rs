//! Admission middleware for the HTTP boundary.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::{ConnectInfo, Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::admission::AdmissionGate;

/// JSON body used for both the API greeting and the rejection response.
#[derive(Debug, Serialize, Deserialize)]
pub struct Message {
    pub status: String,
    pub body: String,
}

impl Message {
    /// Body sent with a 429 when a client is over its rate limit.
    pub fn capacity_exhausted() -> Self {
        Self {
            status: "Request Failed".to_string(),
            body: "The API is at capacity, try again later.".to_string(),
        }
    }
}

/// Per-client admission check applied to every route.
///
/// The client identity is the transport source address with the port
/// stripped. A request whose source address cannot be determined is
/// short-circuited with a 500 before the gate is consulted; a denied request
/// gets a 429 with a JSON body. The gate itself never writes a response.
pub async fn admission_middleware(
    State(gate): State<Arc<AdmissionGate>>,
    request: Request,
    next: Next,
) -> Response {
    let addr = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0);

    let Some(addr) = addr else {
        warn!("Request carries no source address, rejecting before admission");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    };

    let client_id = addr.ip().to_string();

    if gate.admit(&client_id, Instant::now()).is_allow() {
        next.run(request).await
    } else {
        warn!(client = %client_id, "Rejecting request over rate limit");
        (
            StatusCode::TOO_MANY_REQUESTS,
            Json(Message::capacity_exhausted()),
        )
            .into_response()
    }
}
