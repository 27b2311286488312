// src/services/api_server.rs
//! API server of the verification gateway.
//!
//! Exposes a single endpoint that accepts a signed attribute-disclosure
//! message and answers with the verified attributes as a flat JSON object.
//!
//! The server is a thin adapter: it decodes the request, hands the message
//! to the trust provider together with the current configuration snapshot,
//! and maps the outcome to a status code. Every non-valid outcome gets the
//! same empty 400, so callers learn nothing about why a proof was rejected.

use crate::services::trust_store::TrustStore;
use crate::trust::{TrustProvider, VerificationOutcome};
use axum::{
    body::Body,
    extract::{rejection::BytesRejection, DefaultBodyLimit, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use bytes::Bytes;
use log::{debug, error, info, warn};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::timeout::TimeoutLayer;

/// API server state shared by all requests
pub struct ApiServer<P: TrustProvider> {
    /// Source of configuration snapshots; never written by request handlers
    trust_store: Arc<TrustStore<P>>,

    /// Largest accepted request body
    max_body_bytes: usize,

    /// Upper bound on handling one request
    request_timeout: Duration,
}

// Derive would require `P: Clone`
impl<P: TrustProvider> Clone for ApiServer<P> {
    fn clone(&self) -> Self {
        ApiServer {
            trust_store: Arc::clone(&self.trust_store),
            max_body_bytes: self.max_body_bytes,
            request_timeout: self.request_timeout,
        }
    }
}

impl<P: TrustProvider> ApiServer<P> {
    /// Creates a new instance of the API server
    ///
    /// # Arguments
    /// * `trust_store` - Initialized trust store
    /// * `max_body_bytes` - Request body limit; larger bodies get 413
    /// * `request_timeout` - Per-request timeout; slower requests get 408
    pub fn new(
        trust_store: Arc<TrustStore<P>>,
        max_body_bytes: usize,
        request_timeout: Duration,
    ) -> Self {
        ApiServer {
            trust_store,
            max_body_bytes,
            request_timeout,
        }
    }

    /// Builds the router with all routes and layers.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/api/verify", post(Self::verify_handler))
            .layer(DefaultBodyLimit::max(self.max_body_bytes))
            .layer(TimeoutLayer::with_status_code(
                StatusCode::REQUEST_TIMEOUT,
                self.request_timeout,
            ))
            .with_state(Arc::new(self.clone()))
    }

    /// Binds `addr` and serves requests until the server fails.
    ///
    /// # Errors
    /// Returns `Err` if the address cannot be bound or the server stops
    /// with an I/O error.
    pub async fn run(&self, addr: SocketAddr) -> std::io::Result<()> {
        let app = self.router();

        let listener = tokio::net::TcpListener::bind(addr).await?;
        info!("verification gateway listening on http://{}", listener.local_addr()?);

        axum::serve(listener, app).await
    }

    /// Verifies a signed attribute-disclosure message
    ///
    /// # Endpoint
    /// POST /api/verify
    ///
    /// # Request Body
    /// JSON encoding of the provider's signed message
    ///
    /// # Responses
    /// - 200 OK: JSON object mapping attribute identifiers to raw values
    /// - 400 Bad Request: Malformed JSON or any failed verification (empty body)
    /// - 413 Payload Too Large: Body exceeds the configured limit
    /// - 500 Internal Server Error: Body unreadable or response encoding failed
    async fn verify_handler(
        State(state): State<Arc<ApiServer<P>>>,
        body: Result<Bytes, BytesRejection>,
    ) -> Response {
        let body = match body {
            Ok(body) => body,
            Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                debug!("rejecting request body: {}", rejection.body_text());
                return StatusCode::PAYLOAD_TOO_LARGE.into_response();
            }
            Err(rejection) => {
                error!("failed to read request body: {}", rejection.body_text());
                return StatusCode::INTERNAL_SERVER_ERROR.into_response();
            }
        };

        let message: P::Message = match serde_json::from_slice(&body) {
            Ok(message) => message,
            Err(e) => {
                debug!("malformed signed message: {}", e);
                return StatusCode::BAD_REQUEST.into_response();
            }
        };

        let store = Arc::clone(&state.trust_store);
        let configuration = store.current_configuration();
        let verification =
            tokio::task::spawn_blocking(move || store.provider().verify(&configuration, &message))
                .await;

        let attributes = match verification {
            Ok(VerificationOutcome::Valid(attributes)) => attributes,
            Ok(VerificationOutcome::Invalid(status)) => {
                info!("signed message rejected: {}", status);
                return StatusCode::BAD_REQUEST.into_response();
            }
            Ok(VerificationOutcome::Error(e)) => {
                warn!("signed message verification error: {}", e);
                return StatusCode::BAD_REQUEST.into_response();
            }
            Err(e) => {
                warn!("verification task failed: {}", e);
                return StatusCode::BAD_REQUEST.into_response();
            }
        };
        debug!(
            "verified {} attribute(s) in {} disclosure group(s)",
            attributes.attribute_count(),
            attributes.groups().len()
        );

        match serde_json::to_vec(&attributes.flatten()) {
            Ok(encoded) => Response::builder()
                .status(StatusCode::OK)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(encoded))
                .unwrap_or_else(|e| {
                    error!("failed to build response: {}", e);
                    StatusCode::INTERNAL_SERVER_ERROR.into_response()
                }),
            Err(e) => {
                error!("failed to encode verified attributes: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}
