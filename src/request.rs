// Normalization of the host framework's loosely-typed request object.
//
// Host frameworks hand requests over in several shapes; everything past
// this boundary works with one normalized form. Extraction follows a
// fixed fallback order per part, documented on `normalize_request`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{PayloadAuthError, Result};

/// The request shape the rest of the crate consumes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NormalizedRequest {
    pub method: String,
    pub url: String,
    pub headers: HashMap<String, String>,
    pub body: Option<serde_json::Value>,
}

/// Extract method, URL, headers, and body from a host request value.
///
/// Fallback order per part:
/// - method: `method`, then `httpMethod`, then `"GET"`.
/// - url: `url`, then `originalUrl`, then `path` with `query` appended
///   when present.
/// - headers: the `headers` object; non-string values are skipped.
/// - body: `body` as-is when structured; when `body` is a string it is
///   parsed as JSON, falling back to the raw string; absent `body` ⇒
///   `None`.
///
/// A non-object input is a configuration defect and fails outright.
pub fn normalize_request(raw: &serde_json::Value) -> Result<NormalizedRequest> {
    let obj = raw.as_object().ok_or_else(|| {
        PayloadAuthError::Config("request object must be a JSON object".to_string())
    })?;

    let method = obj
        .get("method")
        .or_else(|| obj.get("httpMethod"))
        .and_then(|v| v.as_str())
        .unwrap_or("GET")
        .to_uppercase();

    let url = match obj
        .get("url")
        .or_else(|| obj.get("originalUrl"))
        .and_then(|v| v.as_str())
    {
        Some(url) => url.to_string(),
        None => {
            let path = obj.get("path").and_then(|v| v.as_str()).unwrap_or("/");
            match obj.get("query").and_then(|v| v.as_str()) {
                Some(query) if !query.is_empty() => format!("{path}?{query}"),
                _ => path.to_string(),
            }
        }
    };

    let headers = obj
        .get("headers")
        .and_then(|v| v.as_object())
        .map(|map| {
            map.iter()
                .filter_map(|(k, v)| Some((k.to_lowercase(), v.as_str()?.to_string())))
                .collect()
        })
        .unwrap_or_default();

    let body = match obj.get("body") {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => {
            Some(serde_json::from_str(s).unwrap_or_else(|_| serde_json::Value::String(s.clone())))
        }
        Some(other) => Some(other.clone()),
    };

    Ok(NormalizedRequest {
        method,
        url,
        headers,
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalizes_full_request() {
        let req = normalize_request(&json!({
            "method": "post",
            "url": "/api/auth/sign-in",
            "headers": {"Content-Type": "application/json", "X-N": 3},
            "body": {"email": "a@b.c"}
        }))
        .unwrap();
        assert_eq!(req.method, "POST");
        assert_eq!(req.url, "/api/auth/sign-in");
        assert_eq!(req.headers.get("content-type").unwrap(), "application/json");
        assert!(!req.headers.contains_key("x-n"));
        assert_eq!(req.body, Some(json!({"email": "a@b.c"})));
    }

    #[test]
    fn test_fallback_order() {
        let req = normalize_request(&json!({
            "httpMethod": "delete",
            "path": "/sessions",
            "query": "limit=5"
        }))
        .unwrap();
        assert_eq!(req.method, "DELETE");
        assert_eq!(req.url, "/sessions?limit=5");
        assert!(req.body.is_none());
    }

    #[test]
    fn test_string_body_parsed_as_json() {
        let req = normalize_request(&json!({"body": "{\"token\": \"abc\"}"})).unwrap();
        assert_eq!(req.body, Some(json!({"token": "abc"})));

        let raw = normalize_request(&json!({"body": "plain text"})).unwrap();
        assert_eq!(raw.body, Some(json!("plain text")));
    }

    #[test]
    fn test_non_object_is_rejected() {
        assert!(normalize_request(&json!("nope")).is_err());
    }
}
