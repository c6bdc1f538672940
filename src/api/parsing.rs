use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use cookie::Cookie;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;

use super::error::HttpError;

/// The parts of an API Gateway event the handlers look at.
#[derive(Debug, Clone, Default)]
pub struct ApiRequest {
    pub method: String,
    pub path: String,
    pub query: HashMap<String, String>,
    pub headers: Value,
    pub cookies: Vec<String>,
    pub body: Option<String>,
}

impl ApiRequest {
    /// Build a request from an HTTP API (2.0) event, falling back to the
    /// REST API (1.0) field names.
    ///
    /// # Errors
    ///
    /// Returns a 400 when the body is flagged as base64 but does not decode.
    pub fn from_event(payload: &Value) -> Result<Self, HttpError> {
        let method = v_str(payload, &["requestContext", "http", "method"])
            .or_else(|| v_str(payload, &["httpMethod"]))
            .unwrap_or("GET")
            .to_ascii_uppercase();

        let path = v_str(payload, &["rawPath"])
            .or_else(|| v_str(payload, &["path"]))
            .unwrap_or("/")
            .to_string();

        let query = match v_str(payload, &["rawQueryString"]) {
            Some(raw) => parse_query(raw),
            None => payload
                .get("queryStringParameters")
                .and_then(Value::as_object)
                .map(|m| {
                    m.iter()
                        .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                        .collect()
                })
                .unwrap_or_default(),
        };

        let headers = payload.get("headers").cloned().unwrap_or(Value::Null);

        let mut cookies: Vec<String> = payload
            .get("cookies")
            .and_then(Value::as_array)
            .map(|arr| {
                arr.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        if cookies.is_empty() {
            if let Some(header) = get_header_value(&headers, "Cookie") {
                cookies = header.split(';').map(|c| c.trim().to_string()).collect();
            }
        }

        let body = match payload.get("body").and_then(Value::as_str) {
            Some(raw) if payload.get("isBase64Encoded").and_then(Value::as_bool) == Some(true) => {
                let bytes = STANDARD
                    .decode(raw)
                    .map_err(|_| HttpError::bad_request())?;
                Some(String::from_utf8(bytes).map_err(|_| HttpError::bad_request())?)
            }
            Some(raw) => Some(raw.to_string()),
            None => None,
        };

        Ok(Self {
            method,
            path,
            query,
            headers,
            cookies,
            body,
        })
    }

    /// Non-empty query parameter.
    #[must_use]
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    #[must_use]
    pub fn cookie(&self, name: &str) -> Option<String> {
        self.cookies
            .iter()
            .filter_map(|raw| Cookie::parse(raw.as_str()).ok())
            .find(|c| c.name() == name)
            .map(|c| c.value().to_string())
    }

    /// Decode the JSON body.
    ///
    /// # Errors
    ///
    /// Returns a 400 when the body is missing or is not valid JSON for `T`.
    pub fn json_body<T: DeserializeOwned>(&self) -> Result<T, HttpError> {
        let body = self
            .body
            .as_deref()
            .filter(|b| !b.trim().is_empty())
            .ok_or_else(HttpError::bad_request)?;
        serde_json::from_str(body).map_err(|_| HttpError::bad_request())
    }

    /// Last path segment, so that stage prefixes (`/prod/info`) route like `/info`.
    #[must_use]
    pub fn route(&self) -> &str {
        self.path
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or("")
    }
}

fn parse_query(raw: &str) -> HashMap<String, String> {
    url::form_urlencoded::parse(raw.as_bytes())
        .into_owned()
        .collect()
}

pub fn v_path<'a>(root: &'a Value, path: &[&str]) -> Option<&'a Value> {
    let mut cur = root;
    for key in path {
        cur = cur.get(*key)?;
    }
    Some(cur)
}

pub fn v_str<'a>(root: &'a Value, path: &[&str]) -> Option<&'a str> {
    v_path(root, path).and_then(|v| v.as_str())
}

pub fn get_header_value<'a>(headers: &'a serde_json::Value, name: &str) -> Option<&'a str> {
    if let Some(v) = headers.get(name).and_then(|s| s.as_str()) {
        return Some(v);
    }
    headers.as_object().and_then(|map| {
        map.iter().find_map(|(k, v)| {
            if k.eq_ignore_ascii_case(name) {
                v.as_str()
            } else {
                None
            }
        })
    })
}
