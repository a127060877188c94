//! State comparison between an observed response and the desired body.
//!
//! Both bodies are classified first. Two JSON objects are compared by the
//! [`CompareStrategy`] registered for the resource's [`CompareType`]; two
//! plain-text bodies by substring containment. A JSON body paired with a
//! non-JSON body is an error, since no sound comparison exists.
//!
//! ## Adding a compare type
//!
//! ```
//! use reconcile::{CompareStrategy, Comparator, JsonMap, StrategyRegistry};
//! use reconcile::http::is_success;
//!
//! /// Only checks the `version` field.
//! struct VersionOnly;
//!
//! impl CompareStrategy for VersionOnly {
//!     fn compare(&self, response: &JsonMap, desired: &JsonMap, status: u16) -> reconcile::Result<bool> {
//!         Ok(response.get("version") == desired.get("version") && is_success(status))
//!     }
//! }
//!
//! let mut registry = StrategyRegistry::with_builtins();
//! registry.register("version-only", VersionOnly);
//! let comparator = Comparator::new(registry);
//! assert!(comparator.registry().contains("version-only"));
//! ```

use crate::error::{JsonSubject, Result};
use crate::http::{HttpDetails, is_success};
use crate::json::{self, JsonMap, contains_map, get_str, parse_to_map};
use crate::transport::TransportError;
use crate::types::{CompareType, ObserveResult};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;

/// A comparison strategy for two JSON objects.
///
/// Implementations must be pure: no I/O, no mutation of the inputs.
pub trait CompareStrategy: Send + Sync {
    fn compare(&self, response: &JsonMap, desired: &JsonMap, status: u16) -> Result<bool>;
}

/// Drop ignored keys from each side, then check subset containment.
#[derive(Debug, Clone, Default)]
pub struct ContainmentStrategy {
    /// Keys removed from the response before comparing
    pub response_ignore: Vec<String>,
    /// Keys removed from the desired body before comparing
    pub desired_ignore: Vec<String>,
}

impl ContainmentStrategy {
    /// Containment with no filtering.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ignore `key` on both sides.
    pub fn ignore(mut self, key: impl Into<String>) -> Self {
        let key = key.into();
        self.response_ignore.push(key.clone());
        self.desired_ignore.push(key);
        self
    }

    /// Ignore `key` in the desired body only, for write-only fields the
    /// remote never echoes back.
    pub fn ignore_desired(mut self, key: impl Into<String>) -> Self {
        self.desired_ignore.push(key.into());
        self
    }

    /// Strategy for Harbor robot accounts.
    pub fn harbor_robot() -> Self {
        Self::new().ignore("update_time").ignore_desired("secret")
    }
}

impl CompareStrategy for ContainmentStrategy {
    fn compare(&self, response: &JsonMap, desired: &JsonMap, status: u16) -> Result<bool> {
        let response = without(response, &self.response_ignore);
        let desired = without(desired, &self.desired_ignore);
        Ok(contains_map(&response, &desired) && is_success(status))
    }
}

/// Clone of `map` minus `keys`.
fn without(map: &JsonMap, keys: &[String]) -> JsonMap {
    map.iter()
        .filter(|(k, _)| !keys.contains(*k))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

/// Compare the SHA-256 of a desired field against a digest the remote
/// reports, for targets that never echo raw content back.
#[derive(Debug, Clone)]
pub struct ContentHashStrategy {
    /// Desired field holding the raw content
    pub content_field: String,
    /// Response field holding the hex digest
    pub digest_field: String,
}

impl ContentHashStrategy {
    /// Strategy for GitLab repository files.
    pub fn gitlab_file() -> Self {
        Self {
            content_field: "content".to_string(),
            digest_field: "content_sha256".to_string(),
        }
    }
}

impl CompareStrategy for ContentHashStrategy {
    fn compare(&self, response: &JsonMap, desired: &JsonMap, status: u16) -> Result<bool> {
        let content = get_str(desired, &self.content_field)?;
        let digest = get_str(response, &self.digest_field)?;
        Ok(sha256_hex(content) == digest && is_success(status))
    }
}

/// Lower-case hex SHA-256 of `content`.
pub fn sha256_hex(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Strategies keyed by compare type tag.
pub struct StrategyRegistry {
    default: Box<dyn CompareStrategy>,
    strategies: HashMap<String, Box<dyn CompareStrategy>>,
}

impl StrategyRegistry {
    /// Registry with only the default containment strategy.
    pub fn new() -> Self {
        Self {
            default: Box::new(ContainmentStrategy::new()),
            strategies: HashMap::new(),
        }
    }

    /// Registry with every built-in compare type.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(
            CompareType::GitlabFile.as_str(),
            ContentHashStrategy::gitlab_file(),
        );
        registry.register(
            CompareType::HarborRobot.as_str(),
            ContainmentStrategy::harbor_robot(),
        );
        registry
    }

    /// Add or replace the strategy for `tag`. The empty tag replaces the
    /// default.
    pub fn register(&mut self, tag: impl Into<String>, strategy: impl CompareStrategy + 'static) {
        let tag = tag.into();
        if tag.is_empty() {
            self.default = Box::new(strategy);
        } else {
            self.strategies.insert(tag, Box::new(strategy));
        }
    }

    /// Strategy for a compare type; unregistered tags get the default.
    pub fn resolve(&self, compare_type: &CompareType) -> &dyn CompareStrategy {
        match self.strategies.get(compare_type.as_str()) {
            Some(strategy) => strategy.as_ref(),
            None => {
                if !compare_type.is_default() {
                    log::debug!("No strategy for compare type {compare_type}, using default");
                }
                self.default.as_ref()
            }
        }
    }

    /// Check if a tag has its own strategy.
    pub fn contains(&self, tag: &str) -> bool {
        self.strategies.contains_key(tag)
    }

    /// Registered tags, sorted.
    pub fn tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.strategies.keys().map(String::as_str).collect();
        tags.sort_unstable();
        tags
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl fmt::Debug for StrategyRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StrategyRegistry")
            .field("tags", &self.tags())
            .finish_non_exhaustive()
    }
}

/// Decides whether an observed exchange matches a desired body.
#[derive(Debug, Default)]
pub struct Comparator {
    registry: StrategyRegistry,
}

impl Comparator {
    /// Create a comparator over a strategy registry.
    pub fn new(registry: StrategyRegistry) -> Self {
        Self { registry }
    }

    /// The strategies this comparator dispatches to.
    pub fn registry(&self) -> &StrategyRegistry {
        &self.registry
    }

    /// Compare the observed exchange with the desired body.
    ///
    /// A transport error doesn't stop the comparison; it's attached to the
    /// result. Any error returned pairs with [`ObserveResult::failed`].
    pub fn compare(
        &self,
        details: HttpDetails,
        transport_err: Option<TransportError>,
        desired: &str,
        compare_type: &CompareType,
    ) -> Result<ObserveResult> {
        let body = details.response.body.as_str();
        let status = details.response.status_code;

        let synced = match (json::is_json_string(body), json::is_json_string(desired)) {
            (true, true) => {
                let response_map = parse_to_map(body, JsonSubject::ResponseBody)?;
                let desired_map = parse_to_map(desired, JsonSubject::PutMappingResult)?;
                log::debug!("Comparing JSON bodies with {compare_type} strategy");
                self.registry
                    .resolve(compare_type)
                    .compare(&response_map, &desired_map, status)?
            }
            (false, true) => {
                return Err(crate::Error::not_valid_json(JsonSubject::ResponseBody, body));
            }
            (true, false) => {
                return Err(crate::Error::not_valid_json(
                    JsonSubject::PutMappingResult,
                    desired,
                ));
            }
            (false, false) => {
                log::debug!("Comparing plain-text bodies by containment");
                body.contains(desired) && is_success(status)
            }
        };

        Ok(ObserveResult::new(details, transport_err, synced))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use crate::http::HttpResponse;

    fn details(status: u16, body: &str) -> HttpDetails {
        HttpDetails {
            response: HttpResponse {
                status_code: status,
                body: body.to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn check(status: u16, body: &str, desired: &str, compare_type: &str) -> Result<bool> {
        Comparator::default()
            .compare(details(status, body), None, desired, &compare_type.into())
            .map(|r| r.synced)
    }

    #[test]
    fn test_default_subset_containment() {
        assert!(check(200, r#"{"a":1,"b":2}"#, r#"{"a":1}"#, "").unwrap());
        assert!(!check(200, r#"{"a":1,"b":2}"#, r#"{"a":2}"#, "").unwrap());
        assert!(!check(200, r#"{"a":1}"#, r#"{"a":1,"b":2}"#, "").unwrap());
    }

    #[test]
    fn test_default_requires_success_status() {
        assert!(!check(500, r#"{"a":1}"#, r#"{"a":1}"#, "").unwrap());
        assert!(!check(301, r#"{"a":1}"#, r#"{"a":1}"#, "").unwrap());
        assert!(check(201, r#"{"a":1}"#, r#"{"a":1}"#, "").unwrap());
    }

    #[test]
    fn test_unknown_tag_uses_default() {
        assert!(check(200, r#"{"a":1,"b":2}"#, r#"{"a":1}"#, "something-new").unwrap());
        assert!(!check(200, r#"{"a":1}"#, r#"{"a":2}"#, "something-new").unwrap());
    }

    #[test]
    fn test_gitlab_file_hash() {
        let digest = sha256_hex("hello");
        assert_eq!(
            digest,
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );

        let response = format!(r#"{{"content_sha256":"{digest}"}}"#);
        assert!(check(200, &response, r#"{"content":"hello"}"#, "gitlab-file").unwrap());
        assert!(!check(404, &response, r#"{"content":"hello"}"#, "gitlab-file").unwrap());

        let wrong = r#"{"content_sha256":"deadbeef"}"#;
        assert!(!check(200, wrong, r#"{"content":"hello"}"#, "gitlab-file").unwrap());
    }

    #[test]
    fn test_gitlab_file_field_type_errors() {
        let err = check(200, r#"{"content_sha256":"x"}"#, r#"{"content":5}"#, "gitlab-file")
            .unwrap_err();
        assert!(matches!(err, Error::InvalidFieldType { ref field, .. } if field == "content"));

        let err = check(200, r#"{"id":1}"#, r#"{"content":"hello"}"#, "gitlab-file").unwrap_err();
        assert!(
            matches!(err, Error::InvalidFieldType { ref field, found, .. } if field == "content_sha256" && found == "missing")
        );
    }

    #[test]
    fn test_harbor_robot_ignores_bookkeeping() {
        let response = r#"{"name":"r1","update_time":"t2"}"#;
        let desired = r#"{"name":"r1","secret":"x","update_time":"t1"}"#;
        assert!(check(200, response, desired, "harbor-robot").unwrap());

        // Without the strategy both fields count
        assert!(!check(200, response, desired, "").unwrap());

        let renamed = r#"{"name":"r2","secret":"x"}"#;
        assert!(!check(200, response, renamed, "harbor-robot").unwrap());
    }

    #[test]
    fn test_format_mismatch_names_offending_side() {
        let err = check(200, "not json", r#"{"a":1}"#, "").unwrap_err();
        assert_eq!(err, Error::not_valid_json(JsonSubject::ResponseBody, "not json"));
        assert!(err.to_string().contains("response body"));

        let err = check(200, r#"{"a":1}"#, "plain", "").unwrap_err();
        assert_eq!(
            err,
            Error::not_valid_json(JsonSubject::PutMappingResult, "plain")
        );
        assert!(err.to_string().contains("PUT mapping result"));
    }

    #[test]
    fn test_null_body_compares_as_empty_object() {
        // A null response holds none of the desired fields
        assert!(!check(200, "null", r#"{"a":1}"#, "").unwrap());
        // A null desired body asks for nothing
        assert!(check(200, r#"{"a":1}"#, "null", "").unwrap());
        assert!(!check(500, r#"{"a":1}"#, "null", "").unwrap());

        let err = check(200, "null", r#"{"content":"hello"}"#, "gitlab-file").unwrap_err();
        assert!(matches!(err, Error::InvalidFieldType { ref field, .. } if field == "content_sha256"));
    }

    #[test]
    fn test_plain_text_substring() {
        assert!(check(200, "prefix-hello-suffix", "hello", "").unwrap());
        assert!(!check(404, "prefix-hello-suffix", "hello", "").unwrap());
        assert!(!check(200, "prefix-hello-suffix", "bye", "").unwrap());
        // Non-object JSON is plain text
        assert!(check(200, "[1, 2, 3]", "2, 3", "").unwrap());
    }

    #[test]
    fn test_transport_error_carried_through() {
        let err = TransportError::new("connection reset");
        let result = Comparator::default()
            .compare(
                details(200, r#"{"a":1}"#),
                Some(err.clone()),
                r#"{"a":1}"#,
                &CompareType::Default,
            )
            .unwrap();

        assert!(result.synced);
        assert_eq!(result.response_error, Some(err));
        assert_eq!(result.details.response.status_code, 200);
    }

    #[test]
    fn test_registry_register_and_replace_default() {
        struct Never;
        impl CompareStrategy for Never {
            fn compare(&self, _: &JsonMap, _: &JsonMap, _: u16) -> Result<bool> {
                Ok(false)
            }
        }

        let mut registry = StrategyRegistry::with_builtins();
        assert_eq!(registry.tags(), vec!["gitlab-file", "harbor-robot"]);

        registry.register("never", Never);

        let comparator = Comparator::new(registry);
        assert!(comparator.registry().contains("never"));
        let result = comparator
            .compare(details(200, "{}"), None, "{}", &"never".into())
            .unwrap();
        assert!(!result.synced);

        let mut registry = StrategyRegistry::new();
        registry.register("", Never);
        let result = Comparator::new(registry)
            .compare(details(200, "{}"), None, "{}", &CompareType::Default)
            .unwrap();
        assert!(!result.synced);
    }

    #[test]
    fn test_containment_strategy_does_not_mutate_inputs() {
        let mut response = JsonMap::new();
        response.insert("update_time".to_string(), "t".into());
        let desired = response.clone();

        let strategy = ContainmentStrategy::harbor_robot();
        assert!(strategy.compare(&response, &desired, 200).unwrap());
        assert!(response.contains_key("update_time"));
        assert!(desired.contains_key("update_time"));
    }
}
