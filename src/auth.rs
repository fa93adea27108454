//! Credential resolution for every inbound request.
//!
//! A caller supplies its upstream API key either as `Authorization: Bearer <key>`
//! or as the first path segment in front of the routing marker
//! (`/<key>/mcp/...`). The middleware resolves it once, rewrites embedded-key
//! paths to their canonical form, and hands the handler a `RequestContext`
//! through the request's own extensions, so nothing outlives the request.

use crate::error::AppError;
use axum::{
    extract::Request,
    http::{header::AUTHORIZATION, uri::PathAndQuery, HeaderMap, Uri},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::fmt;

/// Path served without authentication.
pub const HEALTH_PATH: &str = "/healthcheck";

/// Path segment that introduces the tool protocol routes.
pub const ROUTING_MARKER: &str = "mcp";

pub const MISSING_CREDENTIAL_MESSAGE: &str =
    "Missing API key. Use path format /{API_KEY}/mcp or the header Authorization: Bearer {API_KEY}";

const BEARER_SCHEME: &str = "Bearer";

/// Opaque upstream API key. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The raw key, for forwarding upstream only.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// Where the credential was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    Header,
    Path,
}

impl CredentialSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            CredentialSource::Header => "header",
            CredentialSource::Path => "path",
        }
    }
}

/// Per-request state produced by the resolver and consumed by tool handlers.
#[derive(Debug, Clone)]
pub struct RequestContext {
    credential: Credential,
    source: CredentialSource,
}

impl RequestContext {
    pub fn new(credential: Credential, source: CredentialSource) -> Self {
        Self { credential, source }
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    pub fn source(&self) -> CredentialSource {
        self.source
    }
}

/// Outcome of credential resolution.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub context: RequestContext,
    /// Canonical path (and query) when the credential was embedded in the path.
    pub rewritten: Option<String>,
}

/// Token from an `Authorization: Bearer <token>` header, if present and non-empty.
///
/// The scheme name is matched case-insensitively.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim_start().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case(BEARER_SCHEME) {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Split `/<key>/mcp/rest` into the key and the canonical `/mcp/rest`.
fn path_credential(path: &str) -> Option<(&str, &str)> {
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    let mut segments = trimmed.splitn(3, '/');
    let first = segments.next()?;
    let second = segments.next()?;
    if first.is_empty() || second != ROUTING_MARKER {
        return None;
    }
    // Everything after "<key>" still starts with "/mcp".
    let canonical = &trimmed[first.len()..];
    Some((first, canonical))
}

/// Resolve the caller's credential. The bearer header takes precedence over the path.
pub fn resolve_credential(headers: &HeaderMap, uri: &Uri) -> Result<Resolution, AppError> {
    if let Some(token) = bearer_token(headers) {
        return Ok(Resolution {
            context: RequestContext::new(Credential::new(token), CredentialSource::Header),
            rewritten: None,
        });
    }

    if let Some((key, canonical)) = path_credential(uri.path()) {
        let rewritten = match uri.query() {
            Some(query) => format!("{}?{}", canonical, query),
            None => canonical.to_string(),
        };
        return Ok(Resolution {
            context: RequestContext::new(Credential::new(key), CredentialSource::Path),
            rewritten: Some(rewritten),
        });
    }

    Err(AppError::Unauthorized(MISSING_CREDENTIAL_MESSAGE.to_string()))
}

fn rewrite_uri(uri: &Uri, path_and_query: &str) -> Result<Uri, AppError> {
    let mut parts = uri.clone().into_parts();
    parts.path_and_query = Some(
        PathAndQuery::try_from(path_and_query)
            .map_err(|e| AppError::ValidationError(format!("Invalid request path: {}", e)))?,
    );
    Uri::from_parts(parts).map_err(|e| AppError::ValidationError(format!("Invalid request path: {}", e)))
}

/// Middleware resolving the credential before routing.
///
/// Must wrap the router as a service (not `Router::layer`) so the rewritten
/// path is what routing sees.
pub async fn credential_middleware(mut req: Request, next: Next) -> Response {
    if req.uri().path() == HEALTH_PATH {
        return next.run(req).await;
    }

    let resolution = match resolve_credential(req.headers(), req.uri()) {
        Ok(resolution) => resolution,
        Err(err) => return err.into_response(),
    };

    if let Some(rewritten) = &resolution.rewritten {
        match rewrite_uri(req.uri(), rewritten) {
            Ok(uri) => *req.uri_mut() = uri,
            Err(err) => return err.into_response(),
        }
    }

    tracing::debug!(
        source = resolution.context.source().as_str(),
        path = %req.uri().path(),
        "Credential resolved"
    );

    req.extensions_mut().insert(resolution.context);
    next.run(req).await
}
