//! Blocking HTTP transport backed by ureq.

use crate::config::TransportConfig;
use reconcile::{Headers, HttpRequest, HttpResponse, Transport, TransportError};
use ureq::http::{self, HeaderMap};
use ureq::tls::TlsConfig;
use ureq::{Agent, AsSendBody};

/// Sends observation requests over the network.
///
/// Non-2xx responses come back as values. A second agent with certificate
/// verification disabled serves resources that opt into it.
pub struct UreqTransport {
    agent: Agent,
    insecure_agent: Agent,
    user_agent: String,
}

impl UreqTransport {
    pub fn new(config: &TransportConfig) -> Self {
        Self {
            agent: build_agent(config, false),
            insecure_agent: build_agent(config, true),
            user_agent: config.user_agent.clone(),
        }
    }

    fn request_builder(&self, request: &HttpRequest) -> http::request::Builder {
        let mut builder = http::Request::builder()
            .method(request.method.as_str())
            .uri(request.url.as_str())
            .header("User-Agent", self.user_agent.as_str());

        for (name, values) in &request.headers {
            for value in values {
                builder = builder.header(name.as_str(), value.as_str());
            }
        }
        builder
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new(&TransportConfig::default())
    }
}

impl Transport for UreqTransport {
    fn send(
        &self,
        request: &HttpRequest,
        insecure_skip_tls_verify: bool,
    ) -> Result<HttpResponse, TransportError> {
        let agent = if insecure_skip_tls_verify {
            &self.insecure_agent
        } else {
            &self.agent
        };

        log::debug!("{} {}", request.method, request.url);
        let builder = self.request_builder(request);

        if request.body.is_empty() {
            run(agent, builder.body(()))
        } else {
            run(agent, builder.body(request.body.as_str()))
        }
    }
}

fn build_agent(config: &TransportConfig, insecure: bool) -> Agent {
    let tls = TlsConfig::builder().disable_verification(insecure).build();
    let config = Agent::config_builder()
        .timeout_global(Some(config.timeout))
        .http_status_as_error(false)
        .tls_config(tls)
        .build();
    Agent::new_with_config(config)
}

fn run<B: AsSendBody>(
    agent: &Agent,
    request: Result<http::Request<B>, http::Error>,
) -> Result<HttpResponse, TransportError> {
    let request = request.map_err(|e| TransportError::new(format!("invalid request: {e}")))?;
    let mut response = agent
        .run(request)
        .map_err(|e| TransportError::new(e.to_string()))?;

    let status_code = response.status().as_u16();
    let headers = collect_headers(response.headers());
    log::debug!("  -> {status_code}");

    match response.body_mut().read_to_string() {
        Ok(body) => Ok(HttpResponse {
            status_code,
            body,
            headers,
        }),
        Err(e) => Err(TransportError::with_response(
            format!("failed to read response body: {e}"),
            HttpResponse {
                status_code,
                body: String::new(),
                headers,
            },
        )),
    }
}

/// Group header values by name. Values that aren't visible ASCII are dropped.
fn collect_headers(map: &HeaderMap) -> Headers {
    let mut headers = Headers::new();
    for (name, value) in map {
        if let Ok(value) = value.to_str() {
            headers
                .entry(name.as_str().to_string())
                .or_default()
                .push(value.to_string());
        }
    }
    headers
}
