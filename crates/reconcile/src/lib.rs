//! # Reconcile
//!
//! Decide whether an HTTP-addressable resource is already in the state its
//! owner declared.
//!
//! Given a request resource (its mappings plus the last recorded response),
//! the [`Evaluator`] fetches the current remote state with a GET, renders the
//! body a PUT would send as the desired state, and hands both to the
//! [`Comparator`]. The verdict tells the outer control loop whether any
//! corrective action is needed this pass.
//!
//! ## Core Concepts
//!
//! - **Request**: The declared resource: method mappings, payload, last status
//! - **CompareType**: Tag selecting how the two bodies are compared
//! - **CompareStrategy**: One comparison rule for two JSON objects
//! - **ObserveResult**: The verdict plus the exchange it was computed from
//!
//! ## Example
//!
//! ```
//! use reconcile::{
//!     Evaluator, HttpResponse, Mapping, Method, MockTransport, Request,
//! };
//!
//! let mut request = Request::default();
//! request.name = "user-1".into();
//! request.for_provider.payload.base_url = "https://api.example.com/users".into();
//! request.for_provider.mappings = vec![
//!     Mapping {
//!         method: Method::Get,
//!         url: "{{ payload.base_url }}/1".into(),
//!         ..Default::default()
//!     },
//!     Mapping {
//!         method: Method::Put,
//!         url: "{{ payload.base_url }}/1".into(),
//!         body: r#"{"name":"r1"}"#.into(),
//!         ..Default::default()
//!     },
//! ];
//! request.status.response = HttpResponse {
//!     status_code: 200,
//!     body: r#"{"id":1}"#.into(),
//!     ..Default::default()
//! };
//!
//! let transport = MockTransport::new();
//! transport.respond(Method::Get, "https://api.example.com/users/1", HttpResponse {
//!     status_code: 200,
//!     body: r#"{"id":1,"name":"r1"}"#.into(),
//!     ..Default::default()
//! });
//!
//! let result = Evaluator::new(transport).evaluate(&request)?;
//! assert!(result.synced);
//! # Ok::<(), reconcile::Error>(())
//! ```
//!
//! ## Provider Traits
//!
//! - [`Transport`]: Sends the observation GET
//! - [`RequestRenderer`]: Turns a mapping into concrete request details
//! - [`CompareStrategy`]: Compares two JSON bodies for one compare type
//!
//! Nothing here performs retries or mutation; callers own scheduling and
//! recovery.

pub mod compare;
pub mod error;
pub mod evaluator;
pub mod http;
pub mod json;
pub mod requestgen;
pub mod transport;
pub mod types;

// Re-export main types at crate root
pub use compare::{
    Comparator, CompareStrategy, ContainmentStrategy, ContentHashStrategy, StrategyRegistry,
};
pub use error::{Error, ErrorCategory, JsonSubject, Result};
pub use evaluator::Evaluator;
pub use http::{Headers, HttpDetails, HttpRequest, HttpResponse, Method};
pub use json::JsonMap;
pub use requestgen::{RequestDetails, RequestRenderer, TemplateRenderer, request_details};
pub use transport::{MockTransport, Transport, TransportError};
pub use types::{CompareType, Mapping, ObserveResult, Payload, Request, RequestParameters, RequestStatus};
