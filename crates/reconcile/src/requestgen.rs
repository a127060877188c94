//! Request-detail generation from a resource's mappings.
//!
//! A mapping's url, body and header values may contain placeholders such as
//! `{{ payload.base_url }}` or `{{ .payload.body.name }}` which are expanded
//! against the resource payload.

use crate::error::{Error, Result};
use crate::http::{Headers, Method};
use crate::types::{Mapping, Payload, Request};
use serde_json::Value;
use std::sync::LazyLock;

/// A rendered request, ready to hand to the transport.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestDetails {
    pub url: String,
    pub body: String,
    pub headers: Headers,
}

/// Turns a mapping into concrete request details.
pub trait RequestRenderer: Send + Sync {
    fn render(&self, request: &Request, mapping: &Mapping) -> Result<RequestDetails>;
}

/// Look up the mapping for `method` and render it.
pub fn request_details(
    request: &Request,
    method: Method,
    renderer: &dyn RequestRenderer,
) -> Result<RequestDetails> {
    let mapping = request
        .mapping_for(method)
        .ok_or(Error::MappingNotFound { method })?;

    renderer.render(request, mapping)
}

/// Default renderer: `{{ payload.* }}` placeholder expansion.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateRenderer;

impl RequestRenderer for TemplateRenderer {
    fn render(&self, request: &Request, mapping: &Mapping) -> Result<RequestDetails> {
        let payload = &request.for_provider.payload;

        let url = expand(&mapping.url, payload)?;
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(Error::Render(format!(
                "{} mapping rendered an invalid URL: {url:?}",
                mapping.method
            )));
        }

        let body = expand(&mapping.body, payload)?;

        let mut headers = request.for_provider.headers.clone();
        for (name, values) in &mapping.headers {
            headers.insert(name.clone(), values.clone());
        }
        for values in headers.values_mut() {
            for value in values.iter_mut() {
                *value = expand(value, payload)?;
            }
        }

        Ok(RequestDetails { url, body, headers })
    }
}

static PLACEHOLDER_RE: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r"\{\{\s*\.?payload((?:\.[A-Za-z0-9_-]+)+)\s*\}\}").unwrap()
});

/// Expand every placeholder in `template`.
fn expand(template: &str, payload: &Payload) -> Result<String> {
    let mut out = String::with_capacity(template.len());
    let mut last = 0;

    for caps in PLACEHOLDER_RE.captures_iter(template) {
        let (Some(whole), Some(path)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        out.push_str(&template[last..whole.start()]);
        out.push_str(&resolve(payload, &path.as_str()[1..])?);
        last = whole.end();
    }

    out.push_str(&template[last..]);
    Ok(out)
}

/// Resolve a dotted path below `payload`.
fn resolve(payload: &Payload, path: &str) -> Result<String> {
    let mut segments = path.split('.');
    let unknown = || Error::Render(format!("unknown placeholder: payload.{path}"));

    match segments.next() {
        Some("baseUrl" | "base_url") if segments.clone().next().is_none() => {
            Ok(payload.base_url.clone())
        }
        Some("body") => {
            let rest: Vec<&str> = segments.collect();
            if rest.is_empty() {
                return Ok(payload.body.clone());
            }

            let body: Value = serde_json::from_str(&payload.body).map_err(|_| {
                Error::Render(format!(
                    "payload.{path} indexes into a body that is not JSON"
                ))
            })?;

            let mut current = &body;
            for segment in rest {
                current = match current {
                    Value::Object(map) => map.get(segment),
                    Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
                    _ => None,
                }
                .ok_or_else(unknown)?;
            }

            Ok(match current {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
        }
        _ => Err(unknown()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> Request {
        let mut request = Request::default();
        request.for_provider.payload = Payload {
            base_url: "https://api.example.com/users".to_string(),
            body: r#"{"id": 7, "name": "r1", "tags": ["a", "b"], "meta": {"x": 1}}"#.to_string(),
        };
        request
            .for_provider
            .headers
            .insert("Accept".to_string(), vec!["application/json".to_string()]);
        request
            .for_provider
            .headers
            .insert("X-Owner".to_string(), vec!["{{ payload.body.name }}".to_string()]);
        request
    }

    fn mapping(method: Method, url: &str, body: &str) -> Mapping {
        Mapping {
            method,
            url: url.to_string(),
            body: body.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_render_expands_payload() {
        let m = mapping(
            Method::Put,
            "{{ payload.base_url }}/{{ .payload.body.id }}",
            r#"{"name": "{{payload.body.name}}", "meta": {{ payload.body.meta }}}"#,
        );
        let details = TemplateRenderer.render(&request(), &m).unwrap();

        assert_eq!(details.url, "https://api.example.com/users/7");
        assert_eq!(details.body, r#"{"name": "r1", "meta": {"x":1}}"#);
        assert_eq!(details.headers["X-Owner"], vec!["r1".to_string()]);
    }

    #[test]
    fn test_render_array_index_and_whole_body() {
        let m = mapping(
            Method::Post,
            "{{ payload.base_url }}?tag={{ payload.body.tags.1 }}",
            "{{ payload.body }}",
        );
        let r = request();
        let details = TemplateRenderer.render(&r, &m).unwrap();
        assert_eq!(details.url, "https://api.example.com/users?tag=b");
        assert_eq!(details.body, r.for_provider.payload.body);
    }

    #[test]
    fn test_render_accepts_camel_case_base_url() {
        let m = mapping(Method::Get, "{{ payload.baseUrl }}/1", "");
        let details = TemplateRenderer.render(&request(), &m).unwrap();
        assert_eq!(details.url, "https://api.example.com/users/1");
    }

    #[test]
    fn test_mapping_headers_override_resource_headers() {
        let mut m = mapping(Method::Get, "{{ payload.base_url }}", "");
        m.headers
            .insert("Accept".to_string(), vec!["text/plain".to_string()]);

        let details = TemplateRenderer.render(&request(), &m).unwrap();
        assert_eq!(details.headers["Accept"], vec!["text/plain".to_string()]);
        assert!(details.headers.contains_key("X-Owner"));
    }

    #[test]
    fn test_unknown_placeholder_fails() {
        let m = mapping(Method::Get, "{{ payload.base_url }}/{{ payload.body.missing }}", "");
        let err = TemplateRenderer.render(&request(), &m).unwrap_err();
        assert!(matches!(err, Error::Render(msg) if msg.contains("payload.body.missing")));

        let m = mapping(Method::Get, "{{ payload.secret }}", "");
        assert!(TemplateRenderer.render(&request(), &m).is_err());
    }

    #[test]
    fn test_invalid_url_fails() {
        let m = mapping(Method::Get, "api.example.com/users", "");
        let err = TemplateRenderer.render(&request(), &m).unwrap_err();
        assert!(matches!(err, Error::Render(_)));
    }

    #[test]
    fn test_request_details_mapping_not_found() {
        let err = request_details(&request(), Method::Get, &TemplateRenderer).unwrap_err();
        assert_eq!(
            err,
            Error::MappingNotFound {
                method: Method::Get
            }
        );
    }

    #[test]
    fn test_request_details_uses_method_mapping() {
        let mut r = request();
        r.for_provider.mappings = vec![
            mapping(Method::Post, "{{ payload.base_url }}", "{{ payload.body }}"),
            mapping(Method::Get, "{{ payload.base_url }}/{{ payload.body.id }}", ""),
        ];

        let details = request_details(&r, Method::Get, &TemplateRenderer).unwrap();
        assert_eq!(details.url, "https://api.example.com/users/7");
        assert!(details.body.is_empty());
    }
}
