//! Cross-origin policy evaluation.
//!
//! The front door consults the policy before any pipeline work:
//! preflights are answered outright, everything else picks up the
//! policy's headers and continues. Requests from disallowed origins
//! are not rejected here — they pass through without cross-origin
//! headers, and the browser enforces the denial.

use http::Method;
use serde::{Deserialize, Serialize};

use crate::headers::{
    HeaderMap, ALLOW_CREDENTIALS_HEADER, ALLOW_METHODS_HEADER, ALLOW_ORIGIN_HEADER,
};
use crate::request::HttpRequest;

/// Origins allowed when none are configured — local browsers talking
/// to a local daemon.
pub const LOCALHOST_ORIGINS: [&str; 4] = [
    "http://127.0.0.1",
    "https://127.0.0.1",
    "http://localhost",
    "https://localhost",
];

const DEFAULT_METHODS: [&str; 3] = ["GET", "POST", "PUT"];

/// Operator-facing cross-origin options. `None` fields take the
/// defaults at policy construction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CorsOptions {
    pub allowed_origins: Option<Vec<String>>,
    pub allowed_methods: Option<Vec<String>>,
    #[serde(default)]
    pub allow_credentials: bool,
}

/// Policy decision for one inbound request.
#[derive(Debug, PartialEq, Eq)]
pub enum CorsDecision {
    /// A preflight: answer it directly with these headers, the
    /// pipeline never runs.
    Preflight(HeaderMap),
    /// Continue into the pipeline after adding these headers.
    Forward(HeaderMap),
}

/// Evaluates requests against the configured cross-origin policy.
#[derive(Debug, Clone)]
pub struct CorsPolicy {
    origins: Vec<String>,
    methods: Vec<String>,
    allow_credentials: bool,
}

impl CorsPolicy {
    /// Build a policy, filling unset options with the defaults: GET,
    /// POST and PUT from the four localhost origins.
    pub fn new(options: &CorsOptions) -> Self {
        let origins = options
            .allowed_origins
            .clone()
            .unwrap_or_else(|| LOCALHOST_ORIGINS.iter().map(|s| s.to_string()).collect());
        let methods = options
            .allowed_methods
            .clone()
            .unwrap_or_else(|| DEFAULT_METHODS.iter().map(|s| s.to_string()).collect());
        Self { origins, methods, allow_credentials: options.allow_credentials }
    }

    /// Evaluate one request. Every forwarded response varies on
    /// `Origin`; cross-origin headers are added only for allowed
    /// origins.
    pub fn evaluate(&self, request: &HttpRequest) -> CorsDecision {
        if request.method == Method::OPTIONS
            && request.header("Access-Control-Request-Method").is_some()
        {
            return CorsDecision::Preflight(self.preflight_headers(request));
        }

        let mut headers = HeaderMap::new();
        // Vary goes on every forwarded response, with or without an
        // Origin header on the request.
        headers.insert("Vary", "Origin");
        if let Some(origin) = request.header("Origin") {
            if self.origin_allowed(origin) {
                headers.insert(ALLOW_ORIGIN_HEADER, self.origin_value(origin));
                if self.allow_credentials {
                    headers.insert(ALLOW_CREDENTIALS_HEADER, "true");
                }
            }
        }
        CorsDecision::Forward(headers)
    }

    fn preflight_headers(&self, request: &HttpRequest) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("Vary", "Origin");

        let Some(origin) = request.header("Origin") else {
            return headers;
        };
        let Some(requested) = request.header("Access-Control-Request-Method") else {
            return headers;
        };
        if !self.origin_allowed(origin) || !self.method_allowed(requested) {
            return headers;
        }

        headers.insert(ALLOW_ORIGIN_HEADER, self.origin_value(origin));
        // Echo the single method the preflight asked about, not the
        // whole allow list.
        headers.insert(ALLOW_METHODS_HEADER, requested.to_ascii_uppercase());
        if self.allow_credentials {
            headers.insert(ALLOW_CREDENTIALS_HEADER, "true");
        }
        headers
    }

    fn origin_allowed(&self, origin: &str) -> bool {
        self.origins.iter().any(|o| o == "*" || o.eq_ignore_ascii_case(origin))
    }

    fn method_allowed(&self, method: &str) -> bool {
        self.methods.iter().any(|m| m.eq_ignore_ascii_case(method))
    }

    fn origin_value(&self, origin: &str) -> String {
        if self.origins.iter().any(|o| o == "*") {
            "*".to_string()
        } else {
            origin.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(method: Method, headers: &[(&str, &str)]) -> HttpRequest {
        let mut map = HeaderMap::new();
        for (name, value) in headers {
            map.insert(*name, *value);
        }
        HttpRequest { method, target: "/api/v0/version".to_string(), headers: map }
    }

    #[test]
    fn no_origin_still_varies() {
        let policy = CorsPolicy::new(&CorsOptions::default());
        let decision = policy.evaluate(&request(Method::GET, &[]));

        let CorsDecision::Forward(headers) = decision else { panic!("expected forward") };
        assert_eq!(headers.get("Vary"), Some("Origin"));
        assert_eq!(headers.get(ALLOW_ORIGIN_HEADER), None);
        assert_eq!(headers.len(), 1);
    }

    #[test]
    fn default_origins_are_localhost() {
        let policy = CorsPolicy::new(&CorsOptions::default());
        let decision =
            policy.evaluate(&request(Method::GET, &[("Origin", "http://localhost")]));

        let CorsDecision::Forward(headers) = decision else { panic!("expected forward") };
        assert_eq!(headers.get(ALLOW_ORIGIN_HEADER), Some("http://localhost"));
        assert_eq!(headers.get("Vary"), Some("Origin"));
    }

    #[test]
    fn disallowed_origin_forwards_without_cors_headers() {
        let policy = CorsPolicy::new(&CorsOptions::default());
        let decision =
            policy.evaluate(&request(Method::GET, &[("Origin", "http://evil.example")]));

        let CorsDecision::Forward(headers) = decision else { panic!("expected forward") };
        assert_eq!(headers.get(ALLOW_ORIGIN_HEADER), None);
        // Vary still marks the response as origin-dependent.
        assert_eq!(headers.get("Vary"), Some("Origin"));
    }

    #[test]
    fn origin_match_is_exact_but_case_insensitive() {
        let policy = CorsPolicy::new(&CorsOptions::default());

        let ok = policy.evaluate(&request(Method::GET, &[("Origin", "HTTP://LOCALHOST")]));
        let CorsDecision::Forward(headers) = ok else { panic!("expected forward") };
        assert!(headers.get(ALLOW_ORIGIN_HEADER).is_some());

        // Same host, different port: not a configured origin.
        let miss =
            policy.evaluate(&request(Method::GET, &[("Origin", "http://localhost:3000")]));
        let CorsDecision::Forward(headers) = miss else { panic!("expected forward") };
        assert_eq!(headers.get(ALLOW_ORIGIN_HEADER), None);
    }

    #[test]
    fn wildcard_origin_answers_star() {
        let options = CorsOptions {
            allowed_origins: Some(vec!["*".to_string()]),
            ..CorsOptions::default()
        };
        let policy = CorsPolicy::new(&options);
        let decision =
            policy.evaluate(&request(Method::GET, &[("Origin", "http://anywhere.example")]));

        let CorsDecision::Forward(headers) = decision else { panic!("expected forward") };
        assert_eq!(headers.get(ALLOW_ORIGIN_HEADER), Some("*"));
    }

    #[test]
    fn preflight_is_answered_for_allowed_method() {
        let policy = CorsPolicy::new(&CorsOptions::default());
        let decision = policy.evaluate(&request(
            Method::OPTIONS,
            &[("Origin", "http://localhost"), ("Access-Control-Request-Method", "post")],
        ));

        let CorsDecision::Preflight(headers) = decision else { panic!("expected preflight") };
        assert_eq!(headers.get(ALLOW_ORIGIN_HEADER), Some("http://localhost"));
        assert_eq!(headers.get(ALLOW_METHODS_HEADER), Some("POST"));
    }

    #[test]
    fn preflight_for_disallowed_method_gets_no_cors_headers() {
        let policy = CorsPolicy::new(&CorsOptions::default());
        let decision = policy.evaluate(&request(
            Method::OPTIONS,
            &[("Origin", "http://localhost"), ("Access-Control-Request-Method", "DELETE")],
        ));

        let CorsDecision::Preflight(headers) = decision else { panic!("expected preflight") };
        assert_eq!(headers.get(ALLOW_ORIGIN_HEADER), None);
        assert_eq!(headers.get(ALLOW_METHODS_HEADER), None);
    }

    #[test]
    fn options_without_preflight_marker_is_not_preflight() {
        let policy = CorsPolicy::new(&CorsOptions::default());
        let decision =
            policy.evaluate(&request(Method::OPTIONS, &[("Origin", "http://localhost")]));
        assert!(matches!(decision, CorsDecision::Forward(_)));
    }

    #[test]
    fn credentials_flag_adds_header() {
        let options = CorsOptions { allow_credentials: true, ..CorsOptions::default() };
        let policy = CorsPolicy::new(&options);
        let decision =
            policy.evaluate(&request(Method::GET, &[("Origin", "http://localhost")]));

        let CorsDecision::Forward(headers) = decision else { panic!("expected forward") };
        assert_eq!(headers.get(ALLOW_CREDENTIALS_HEADER), Some("true"));
    }
}
