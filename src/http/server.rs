//! HTTP server implementation.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::StatusCode;
use axum::middleware;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use tracing::info;

use super::middleware::{admission_middleware, Message};
use crate::admission::AdmissionGate;
use crate::error::Result;

/// HTTP server fronting the admission gate.
pub struct HttpServer {
    /// Address to bind to
    addr: SocketAddr,
    /// The admission gate applied to every route
    gate: Arc<AdmissionGate>,
}

impl HttpServer {
    /// Create a new HTTP server.
    pub fn new(addr: SocketAddr, gate: Arc<AdmissionGate>) -> Self {
        Self { addr, gate }
    }

    fn router(&self) -> Router {
        Router::new()
            .route("/ping", get(ping_handler))
            .layer(middleware::from_fn_with_state(
                Arc::clone(&self.gate),
                admission_middleware,
            ))
    }

    /// Start the HTTP server.
    ///
    /// This method will block until the server is shut down.
    pub async fn serve(self) -> Result<()> {
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        info!(addr = %self.addr, "Starting HTTP server");

        axum::serve(
            listener,
            self.router()
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await?;

        Ok(())
    }

    /// Start the HTTP server with graceful shutdown.
    ///
    /// The server will shut down when the provided signal resolves.
    pub async fn serve_with_shutdown<F>(self, signal: F) -> Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        info!(addr = %self.addr, "Starting HTTP server with graceful shutdown");

        axum::serve(
            listener,
            self.router()
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(signal)
        .await?;

        Ok(())
    }
}

async fn ping_handler() -> impl IntoResponse {
    let message = Message {
        status: "Successful".to_string(),
        body: "Hi! You've reached the API. How may I help you?".to_string(),
    };
    (StatusCode::OK, Json(message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admission::{BucketPolicy, ClientRegistry};
    use axum::body::Body;
    use axum::extract::ConnectInfo;
    use axum::http::Request;
    use tower::Service;

    fn test_server() -> HttpServer {
        let gate = Arc::new(AdmissionGate::new(
            Arc::new(ClientRegistry::new()),
            BucketPolicy::default(),
        ));
        HttpServer::new("127.0.0.1:8000".parse().unwrap(), gate)
    }

    #[test]
    fn test_server_creation() {
        let _server = test_server();
    }

    #[tokio::test]
    async fn test_ping_returns_greeting() {
        let mut app = test_server().router();

        let mut request = Request::builder()
            .uri("/ping")
            .method("GET")
            .body(Body::empty())
            .unwrap();
        let addr: SocketAddr = "203.0.113.9:50000".parse().unwrap();
        request.extensions_mut().insert(ConnectInfo(addr));

        let response = app.call(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        let message: Message = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(message.status, "Successful");
    }
}
