//! Caller origin allow-listing. The same policy drives the gate that rejects
//! disallowed callers and the `CorsLayer` that emits response headers.
use axum::{
    extract::{Request, State},
    http::{header::ORIGIN, request::Parts, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::warn;

use crate::models::ErrorBody;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid origin policy '{0}' (expected any, exact:<list>, prefix:<list> or domains:<list>)")]
pub struct OriginPolicyError(String);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OriginRule {
    Any,
    Exact(Vec<String>),
    Prefix(Vec<String>),
    /// Host equals the domain or is a subdomain of it.
    Domains(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginPolicy {
    pub rule: OriginRule,
    pub allow_missing_origin: bool,
}

impl OriginPolicy {
    pub fn new(rule: OriginRule, allow_missing_origin: bool) -> Self {
        Self { rule, allow_missing_origin }
    }

    pub fn permissive() -> Self {
        Self::new(OriginRule::Any, true)
    }

    pub fn allows(&self, origin: Option<&str>) -> bool {
        let Some(origin) = origin else {
            return self.allow_missing_origin;
        };
        match &self.rule {
            OriginRule::Any => true,
            OriginRule::Exact(list) => list.iter().any(|o| o == origin),
            OriginRule::Prefix(list) => list.iter().any(|p| origin.starts_with(p.as_str())),
            OriginRule::Domains(list) => {
                let host = origin_host(origin);
                list.iter().any(|d| host == d.as_str() || host.ends_with(&format!(".{}", d)))
            }
        }
    }
}

/// Response-header side of the policy; preflights are answered here.
pub fn cors_layer(policy: Arc<OriginPolicy>) -> CorsLayer {
    let allow_origin = if policy.rule == OriginRule::Any {
        AllowOrigin::any()
    } else {
        AllowOrigin::predicate(move |origin: &HeaderValue, _: &Parts| {
            origin.to_str().map(|o| policy.allows(Some(o))).unwrap_or(false)
        })
    };
    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any)
}

impl FromStr for OriginRule {
    type Err = OriginPolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s == "*" || s.eq_ignore_ascii_case("any") {
            return Ok(OriginRule::Any);
        }
        let (kind, rest) = s.split_once(':').ok_or_else(|| OriginPolicyError(s.to_string()))?;
        let list: Vec<String> = rest
            .split(',')
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .filter(|v| !v.is_empty())
            .collect();
        if list.is_empty() {
            return Err(OriginPolicyError(s.to_string()));
        }
        match kind.to_ascii_lowercase().as_str() {
            "exact" => Ok(OriginRule::Exact(list)),
            "prefix" => Ok(OriginRule::Prefix(list)),
            "domains" | "domain" => Ok(OriginRule::Domains(list)),
            _ => Err(OriginPolicyError(s.to_string())),
        }
    }
}

fn origin_host(origin: &str) -> &str {
    let rest = origin.split_once("://").map(|(_, r)| r).unwrap_or(origin);
    let end = rest.find(|c: char| c == ':' || c == '/').unwrap_or(rest.len());
    &rest[..end]
}

/// Rejects requests whose `Origin` the policy does not allow.
pub async fn origin_gate(State(policy): State<Arc<OriginPolicy>>, req: Request, next: Next) -> Response {
    let origin = req.headers().get(ORIGIN).map(|v| v.to_str().unwrap_or(""));
    if !policy.allows(origin) {
        warn!("🚫 Rejected origin: {}", origin.unwrap_or("<none>"));
        let body = ErrorBody { error: "Not allowed by CORS".to_string() };
        return (StatusCode::FORBIDDEN, Json(body)).into_response();
    }
    next.run(req).await
}
