//! Observation evaluator - is a request resource up to date?

use crate::compare::Comparator;
use crate::error::{Error, Result};
use crate::http::{HttpDetails, HttpRequest, HttpResponse, Method, NOT_FOUND};
use crate::requestgen::{RequestRenderer, TemplateRenderer, request_details};
use crate::transport::{Transport, TransportError};
use crate::types::{ObserveResult, Request};

/// Runs the up-to-date check for request resources.
///
/// Holds no per-resource state, so one evaluator can check many resources
/// concurrently.
pub struct Evaluator {
    transport: Box<dyn Transport>,
    renderer: Box<dyn RequestRenderer>,
    comparator: Comparator,
}

impl Evaluator {
    /// Create an evaluator with the default renderer and built-in strategies.
    pub fn new(transport: impl Transport + 'static) -> Self {
        Self {
            transport: Box::new(transport),
            renderer: Box::new(TemplateRenderer),
            comparator: Comparator::default(),
        }
    }

    /// Use a different request renderer.
    pub fn with_renderer(mut self, renderer: impl RequestRenderer + 'static) -> Self {
        self.renderer = Box::new(renderer);
        self
    }

    /// Use a comparator with a custom strategy registry.
    pub fn with_comparator(mut self, comparator: Comparator) -> Self {
        self.comparator = comparator;
        self
    }

    /// Check whether the remote resource matches the desired state.
    ///
    /// Steps:
    /// 1. Reject resources with no prior observation (no I/O)
    /// 2. GET the current state; a 404 means the object is gone
    /// 3. Render the PUT body as the desired state
    /// 4. Compare using the resource's effective compare type
    ///
    /// A transport failure on the GET is attached to the result rather than
    /// returned as an error.
    pub fn evaluate(&self, request: &Request) -> Result<ObserveResult> {
        if !request.is_valid_for_observation() {
            log::debug!("{}: no prior observation to compare against", request.name);
            return Err(Error::ObjectNotFound);
        }

        let get = request_details(request, Method::Get, self.renderer.as_ref())?;
        let http_request = HttpRequest {
            method: Method::Get,
            url: get.url,
            body: get.body,
            headers: get.headers,
        };

        let (response, transport_err) = self.send(request, &http_request);
        if response.status_code == NOT_FOUND {
            log::debug!("{}: remote reports {} for {}", request.name, NOT_FOUND, http_request.url);
            return Err(Error::ObjectNotFound);
        }

        let desired = self.desired_state(request)?;
        let compare_type = request.effective_compare_type();
        log::debug!("{}: comparing with compare type {compare_type}", request.name);

        let details = HttpDetails {
            request: http_request,
            response,
        };
        let result = self
            .comparator
            .compare(details, transport_err, &desired, &compare_type)?;

        log::debug!("{}: synced={}", request.name, result.synced);
        Ok(result)
    }

    /// The body a PUT would send: the desired representation.
    pub fn desired_state(&self, request: &Request) -> Result<String> {
        request_details(request, Method::Put, self.renderer.as_ref()).map(|d| d.body)
    }

    fn send(
        &self,
        request: &Request,
        http_request: &HttpRequest,
    ) -> (HttpResponse, Option<TransportError>) {
        match self
            .transport
            .send(http_request, request.for_provider.insecure_skip_tls_verify)
        {
            Ok(response) => (response, None),
            Err(err) => {
                log::warn!("{}: GET {} failed: {err}", request.name, http_request.url);
                (err.response.clone().unwrap_or_default(), Some(err))
            }
        }
    }
}
