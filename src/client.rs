//! Typed API client with uniform HTTP error normalization.
//!
//! The response body is materialized exactly once into a `String` before any
//! inspection, so the "body already read" class of bug cannot occur. Every
//! failure becomes one `ApiError` carrying message, status, parsed body and
//! an error-type tag.

use reqwest::Method;
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Error, Debug)]
#[error("{message}")]
pub struct ApiError {
    pub message: String,
    /// HTTP status; 408 for timeouts, 0 for transport failures.
    pub status: u16,
    pub body: Value,
    pub error_type: String,
}

impl ApiError {
    pub fn is_timeout(&self) -> bool {
        self.error_type == "TIMEOUT"
    }

    fn timeout() -> Self {
        ApiError {
            message: "Request timeout".into(),
            status: 408,
            body: json!({}),
            error_type: "TIMEOUT".into(),
        }
    }

    fn network(e: &reqwest::Error) -> Self {
        ApiError {
            message: e.to_string(),
            status: 0,
            body: json!({}),
            error_type: "NETWORK_ERROR".into(),
        }
    }
}

/// Parse a body that was read exactly once. Empty text is an empty object,
/// non-JSON text is wrapped as `{"message": text}`.
pub fn normalize_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return json!({});
    }
    serde_json::from_str(text).unwrap_or_else(|_| json!({ "message": text }))
}

/// Status-specific default body for error responses that carried no detail,
/// so callers never see an undefined error message.
pub fn default_error_body(status: u16) -> Value {
    let (error, message) = match status {
        400 => (
            "Bad Request: Invalid data provided".to_string(),
            "The request contains invalid or missing data".to_string(),
        ),
        404 => (
            "Not Found: Resource does not exist".to_string(),
            "The requested resource was not found".to_string(),
        ),
        409 => (
            "Conflict: Data already exists or violates constraints".to_string(),
            "The requested operation conflicts with existing data".to_string(),
        ),
        500 => (
            "Internal Server Error".to_string(),
            "An error occurred on the server".to_string(),
        ),
        other => (
            format!("HTTP {other}"),
            format!("Server returned {other} without error details"),
        ),
    };
    json!({
        "error": error,
        "message": message,
        "errorType": "EMPTY_RESPONSE",
        "suggestion": "Check server logs for more information",
        "status": status,
    })
}

fn is_empty_object(v: &Value) -> bool {
    matches!(v, Value::Null) || v.as_object().map(|m| m.is_empty()).unwrap_or(false)
}

/// Build the typed error for a failed status from the already-parsed body.
pub fn error_from_response(status: u16, body: Value) -> ApiError {
    let body = if is_empty_object(&body) {
        default_error_body(status)
    } else {
        body
    };
    let detail = body
        .get("error")
        .and_then(Value::as_str)
        .or_else(|| body.get("message").and_then(Value::as_str))
        .map(String::from)
        .unwrap_or_else(|| format!("HTTP {status}"));
    let error_type = body
        .get("errorType")
        .and_then(Value::as_str)
        .map(String::from)
        .unwrap_or_else(|| {
            if status == 409 {
                "CONFLICT".into()
            } else {
                "HTTP_ERROR".into()
            }
        });
    ApiError {
        message: format!("HTTP {status}: {detail}"),
        status,
        body,
        error_type,
    }
}

#[derive(Debug, Clone)]
pub struct ApiClientConfig {
    pub base_url: String,
    pub timeout: Duration,
}

pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl ApiClient {
    pub fn new(config: ApiClientConfig) -> Self {
        ApiClient {
            http: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout: config.timeout,
        }
    }

    pub async fn get(&self, path: &str, params: &[(&str, &str)]) -> Result<Value, ApiError> {
        self.request(Method::GET, path, params, None, None).await
    }

    pub async fn post(&self, path: &str, body: Option<&Value>) -> Result<Value, ApiError> {
        self.request(Method::POST, path, &[], body, None).await
    }

    pub async fn put(&self, path: &str, body: Option<&Value>) -> Result<Value, ApiError> {
        self.request(Method::PUT, path, &[], body, None).await
    }

    pub async fn patch(&self, path: &str, body: Option<&Value>) -> Result<Value, ApiError> {
        self.request(Method::PATCH, path, &[], body, None).await
    }

    pub async fn delete(&self, path: &str, params: &[(&str, &str)]) -> Result<Value, ApiError> {
        self.request(Method::DELETE, path, params, None, None).await
    }

    /// Issue one request. `timeout` overrides the client default for this
    /// call. The body stream is consumed once; a failed read counts as empty.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, &str)],
        body: Option<&Value>,
        timeout: Option<Duration>,
    ) -> Result<Value, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        let mut req = self
            .http
            .request(method, &url)
            .timeout(timeout.unwrap_or(self.timeout));
        if !params.is_empty() {
            req = req.query(params);
        }
        if let Some(body) = body {
            req = req.json(body);
        }

        let resp = match req.send().await {
            Ok(resp) => resp,
            Err(e) if e.is_timeout() => return Err(ApiError::timeout()),
            Err(e) => return Err(ApiError::network(&e)),
        };

        let status = resp.status().as_u16();
        let text = match resp.text().await {
            Ok(text) => text,
            Err(e) if e.is_timeout() => return Err(ApiError::timeout()),
            Err(_) => String::new(),
        };
        let parsed = normalize_body(&text);

        if (200..300).contains(&status) {
            return Ok(parsed);
        }
        Err(error_from_response(status, parsed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_or_consumed_body_parses_to_empty_object() {
        assert_eq!(normalize_body(""), json!({}));
        assert_eq!(normalize_body("   "), json!({}));
    }

    #[test]
    fn non_json_body_is_wrapped_as_message() {
        assert_eq!(normalize_body("gateway exploded"), json!({"message": "gateway exploded"}));
    }

    #[test]
    fn json_body_passes_through() {
        let v = normalize_body("{\"success\":false,\"error\":\"nope\"}");
        assert_eq!(v["error"], "nope");
    }

    #[test]
    fn default_bodies_are_status_specific() {
        let texts: Vec<String> = [400u16, 404, 409, 500]
            .iter()
            .map(|s| default_error_body(*s)["error"].as_str().unwrap().to_string())
            .collect();
        let mut unique = texts.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), texts.len(), "default texts must be distinct");
    }

    #[test]
    fn empty_error_body_is_synthesized() {
        let err = error_from_response(409, json!({}));
        assert_eq!(err.status, 409);
        assert_eq!(err.error_type, "EMPTY_RESPONSE");
        assert!(err.message.contains("Conflict"));
        assert!(err.body.get("suggestion").is_some());
    }

    #[test]
    fn error_type_from_body_wins() {
        let err = error_from_response(409, json!({"error": "dup", "errorType": "DUPLICATE_ERROR"}));
        assert_eq!(err.error_type, "DUPLICATE_ERROR");
        assert_eq!(err.message, "HTTP 409: dup");
    }

    #[test]
    fn conflict_without_tag_defaults_to_conflict() {
        let err = error_from_response(409, json!({"error": "dup"}));
        assert_eq!(err.error_type, "CONFLICT");
    }

    #[test]
    fn other_statuses_default_to_http_error() {
        let err = error_from_response(422, json!({"message": "bad"}));
        assert_eq!(err.error_type, "HTTP_ERROR");
        assert_eq!(err.message, "HTTP 422: bad");
    }

    #[test]
    fn timeout_error_is_distinct() {
        let err = ApiError::timeout();
        assert!(err.is_timeout());
        assert_eq!(err.status, 408);
        assert_ne!(err.error_type, "NETWORK_ERROR");
    }
}
