//! Core types for observing HTTP resources

use crate::http::{Headers, HttpDetails, HttpRequest, HttpResponse, Method, is_error};
use crate::transport::TransportError;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Tag selecting how desired and observed state are compared
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CompareType {
    /// Subset containment of the desired body in the response body
    #[default]
    Default,
    /// Content hash comparison for GitLab repository files
    GitlabFile,
    /// Containment ignoring Harbor robot account bookkeeping fields
    HarborRobot,
    /// A tag with no built-in strategy; resolved through the registry
    Custom(String),
}

impl CompareType {
    /// The tag as written in a mapping (empty for the default)
    pub fn as_str(&self) -> &str {
        match self {
            Self::Default => "",
            Self::GitlabFile => "gitlab-file",
            Self::HarborRobot => "harbor-robot",
            Self::Custom(tag) => tag,
        }
    }

    /// Check if this is the default tag
    pub fn is_default(&self) -> bool {
        matches!(self, Self::Default)
    }
}

impl From<&str> for CompareType {
    fn from(s: &str) -> Self {
        match s {
            "" | "default" => Self::Default,
            "gitlab-file" => Self::GitlabFile,
            "harbor-robot" => Self::HarborRobot,
            other => Self::Custom(other.to_string()),
        }
    }
}

impl From<String> for CompareType {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl From<CompareType> for String {
    fn from(t: CompareType) -> Self {
        t.as_str().to_string()
    }
}

impl FromStr for CompareType {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

impl fmt::Display for CompareType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => write!(f, "default"),
            other => write!(f, "{}", other.as_str()),
        }
    }
}

/// How to build the request for one HTTP method
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mapping {
    pub method: Method,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub headers: Headers,
    #[serde(default, skip_serializing_if = "CompareType::is_default")]
    pub compare_type: CompareType,
}

/// Values mappings can refer to through placeholders
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payload {
    #[serde(default, alias = "baseUrl")]
    pub base_url: String,
    /// Raw body text; placeholders can index into it when it is JSON
    #[serde(default)]
    pub body: String,
}

/// User-declared parameters of a request resource
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestParameters {
    #[serde(default)]
    pub payload: Payload,
    /// Headers sent with every mapping, overridden per mapping
    #[serde(default)]
    pub headers: Headers,
    #[serde(default)]
    pub mappings: Vec<Mapping>,
    #[serde(default)]
    pub insecure_skip_tls_verify: bool,
}

/// Last recorded observation of a request resource
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestStatus {
    #[serde(default)]
    pub response: HttpResponse,
    #[serde(default)]
    pub request_details: HttpRequest,
}

/// A declaratively managed HTTP resource
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub name: String,
    pub for_provider: RequestParameters,
    #[serde(default)]
    pub status: RequestStatus,
}

impl Request {
    /// First mapping declared for a method
    pub fn mapping_for(&self, method: Method) -> Option<&Mapping> {
        self.for_provider.mappings.iter().find(|m| m.method == method)
    }

    /// The compare type in effect: the first non-default tag among the
    /// mappings, in declaration order.
    pub fn effective_compare_type(&self) -> CompareType {
        self.for_provider
            .mappings
            .iter()
            .map(|m| &m.compare_type)
            .find(|t| !t.is_default())
            .cloned()
            .unwrap_or_default()
    }

    /// Whether there is a prior observation worth comparing against.
    ///
    /// Requires a recorded response body, and rejects a failed POST since a
    /// creation that errored leaves nothing on the remote to observe.
    pub fn is_valid_for_observation(&self) -> bool {
        let status = &self.status;
        !status.response.body.is_empty()
            && !(status.request_details.method == Method::Post
                && is_error(status.response.status_code))
    }
}

/// Outcome of an up-to-date check
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ObserveResult {
    /// No corrective action is needed this pass
    pub synced: bool,
    /// The GET exchange the verdict was computed from
    pub details: HttpDetails,
    /// Transport failure carried through from the GET
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_error: Option<TransportError>,
}

impl ObserveResult {
    /// Create a result from an exchange
    pub fn new(details: HttpDetails, response_error: Option<TransportError>, synced: bool) -> Self {
        Self {
            synced,
            details,
            response_error,
        }
    }

    /// The result returned alongside every error
    pub fn failed() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping(method: Method, compare_type: &str) -> Mapping {
        Mapping {
            method,
            compare_type: compare_type.into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_compare_type_tags() {
        assert_eq!(CompareType::from(""), CompareType::Default);
        assert_eq!(CompareType::from("gitlab-file"), CompareType::GitlabFile);
        assert_eq!(CompareType::from("harbor-robot"), CompareType::HarborRobot);
        assert_eq!(
            CompareType::from("vault-kv"),
            CompareType::Custom("vault-kv".to_string())
        );
        assert_eq!(CompareType::HarborRobot.as_str(), "harbor-robot");
        assert_eq!(CompareType::Default.to_string(), "default");
    }

    #[test]
    fn test_compare_type_display_round_trips() {
        for tag in [
            CompareType::Default,
            CompareType::GitlabFile,
            CompareType::HarborRobot,
            CompareType::Custom("vault-kv".to_string()),
        ] {
            let parsed: CompareType = tag.to_string().parse().unwrap();
            assert_eq!(parsed, tag);
        }
        assert_eq!(String::from(CompareType::from("default")), "");
    }

    #[test]
    fn test_payload_base_url_field_name() {
        let payload: Payload =
            serde_json::from_str(r#"{"base_url":"https://a.example.com"}"#).unwrap();
        assert_eq!(payload.base_url, "https://a.example.com");

        let legacy: Payload =
            serde_json::from_str(r#"{"baseUrl":"https://b.example.com"}"#).unwrap();
        assert_eq!(legacy.base_url, "https://b.example.com");

        let json = serde_json::to_string(&payload).unwrap();
        assert!(json.contains("\"base_url\""));
    }

    #[test]
    fn test_compare_type_serde_as_tag() {
        let m: Mapping =
            serde_json::from_str(r#"{"method":"PUT","compare_type":"gitlab-file"}"#).unwrap();
        assert_eq!(m.compare_type, CompareType::GitlabFile);

        let json = serde_json::to_string(&mapping(Method::Get, "harbor-robot")).unwrap();
        assert!(json.contains("\"compare_type\":\"harbor-robot\""));
    }

    #[test]
    fn test_effective_compare_type_first_non_empty_wins() {
        let mut request = Request::default();
        request.for_provider.mappings = vec![
            mapping(Method::Post, ""),
            mapping(Method::Get, "gitlab-file"),
            mapping(Method::Put, "harbor-robot"),
        ];
        assert_eq!(request.effective_compare_type(), CompareType::GitlabFile);
    }

    #[test]
    fn test_effective_compare_type_defaults() {
        let mut request = Request::default();
        assert_eq!(request.effective_compare_type(), CompareType::Default);

        request.for_provider.mappings = vec![mapping(Method::Get, ""), mapping(Method::Put, "")];
        assert_eq!(request.effective_compare_type(), CompareType::Default);
    }

    #[test]
    fn test_mapping_for_takes_first() {
        let mut request = Request::default();
        let mut first = mapping(Method::Get, "");
        first.url = "first".to_string();
        let mut second = mapping(Method::Get, "");
        second.url = "second".to_string();
        request.for_provider.mappings = vec![first, second];

        assert_eq!(request.mapping_for(Method::Get).unwrap().url, "first");
        assert!(request.mapping_for(Method::Delete).is_none());
    }

    #[test]
    fn test_valid_for_observation() {
        let mut request = Request::default();
        assert!(!request.is_valid_for_observation());

        request.status.response.body = r#"{"id":1}"#.to_string();
        request.status.response.status_code = 200;
        request.status.request_details.method = Method::Post;
        assert!(request.is_valid_for_observation());

        request.status.response.status_code = 500;
        assert!(!request.is_valid_for_observation());

        // A failed PUT still leaves the object in place
        request.status.request_details.method = Method::Put;
        assert!(request.is_valid_for_observation());
    }

    #[test]
    fn test_failed_sentinel() {
        let failed = ObserveResult::failed();
        assert!(!failed.synced);
        assert!(failed.response_error.is_none());
        assert_eq!(failed.details, HttpDetails::default());
    }
}
