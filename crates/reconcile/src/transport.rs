//! Transport seam for sending the observation request.
//!
//! The core never opens connections itself. Callers plug in a [`Transport`]
//! (a blocking HTTP client in the CLI, [`MockTransport`] in tests).
//!
//! # Testing
//!
//! ```
//! use reconcile::{HttpRequest, HttpResponse, MockTransport, Method, Transport};
//!
//! let mock = MockTransport::new();
//! mock.respond(Method::Get, "https://api.example.com/users/1", HttpResponse {
//!     status_code: 200,
//!     body: r#"{"name":"r1"}"#.to_string(),
//!     ..Default::default()
//! });
//!
//! let request = HttpRequest {
//!     method: Method::Get,
//!     url: "https://api.example.com/users/1".to_string(),
//!     ..Default::default()
//! };
//! let response = mock.send(&request, false).unwrap();
//! assert_eq!(response.status_code, 200);
//! assert_eq!(mock.calls().len(), 1);
//! ```

use crate::http::{HttpRequest, HttpResponse, Method};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

/// A failed exchange.
///
/// Carries whatever response was received before the failure, so a verdict
/// can still be derived from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{message}")]
pub struct TransportError {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<HttpResponse>,
}

impl TransportError {
    /// A failure with no response at all.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            response: None,
        }
    }

    /// A failure after part of the response was received.
    pub fn with_response(message: impl Into<String>, response: HttpResponse) -> Self {
        Self {
            message: message.into(),
            response: Some(response),
        }
    }
}

/// Sends one HTTP request and returns the response.
///
/// Implementations must return non-2xx responses as `Ok` values; only
/// failures to complete the exchange are errors. Timeouts and cancellation
/// are the implementation's concern.
pub trait Transport: Send + Sync {
    fn send(
        &self,
        request: &HttpRequest,
        insecure_skip_tls_verify: bool,
    ) -> Result<HttpResponse, TransportError>;
}

type CannedResponses = HashMap<(Method, String), Result<HttpResponse, TransportError>>;

/// In-memory transport for tests.
///
/// Unconfigured requests fail with a [`TransportError`]. Every request is
/// recorded and can be inspected with [`MockTransport::calls`].
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    responses: Arc<Mutex<CannedResponses>>,
    calls: Arc<Mutex<Vec<HttpRequest>>>,
}

impl MockTransport {
    /// Create a mock with no canned responses.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return `response` for requests with this method and URL.
    pub fn respond(&self, method: Method, url: impl Into<String>, response: HttpResponse) {
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((method, url.into()), Ok(response));
    }

    /// Fail requests with this method and URL.
    pub fn fail(&self, method: Method, url: impl Into<String>, error: TransportError) {
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((method, url.into()), Err(error));
    }

    /// Requests sent so far, oldest first.
    pub fn calls(&self) -> Vec<HttpRequest> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Transport for MockTransport {
    fn send(
        &self,
        request: &HttpRequest,
        _insecure_skip_tls_verify: bool,
    ) -> Result<HttpResponse, TransportError> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());

        let responses = self.responses.lock().unwrap_or_else(PoisonError::into_inner);
        responses
            .get(&(request.method, request.url.clone()))
            .cloned()
            .unwrap_or_else(|| {
                Err(TransportError::new(format!(
                    "mock response not configured: {} {}",
                    request.method, request.url
                )))
            })
    }
}
