//! Reduce a wrapped upstream failure to the most specific diagnostic available.

use crate::error::UpstreamError;

/// Maximum number of cause links inspected.
pub const MAX_CAUSE_DEPTH: usize = 10;

/// Best-effort diagnostic string for `err`.
///
/// Walks at most `MAX_CAUSE_DEPTH` links of the cause chain. The first link
/// carrying an HTTP response wins: its body is pretty-printed when it decodes
/// as JSON, returned raw otherwise, and skipped when empty or missing. If no
/// link yields a body, the outermost error's message (which includes its
/// causes) is returned.
pub fn normalize_error(err: &UpstreamError) -> String {
    let mut current = Some(err);

    for _ in 0..MAX_CAUSE_DEPTH {
        let Some(link) = current else {
            break;
        };

        if let Some(body) = link.response().and_then(|r| r.body.as_deref()) {
            if let Ok(decoded) = serde_json::from_str::<serde_json::Value>(body) {
                if let Ok(pretty) = serde_json::to_string_pretty(&decoded) {
                    return pretty;
                }
            }
            if !body.trim().is_empty() {
                return body.to_string();
            }
        }

        current = link.cause();
    }

    err.to_string()
}

/// First HTTP status found along the cause chain, within the same depth bound.
pub fn http_status(err: &UpstreamError) -> Option<u16> {
    let mut current = Some(err);
    for _ in 0..MAX_CAUSE_DEPTH {
        let link = current?;
        if let Some(response) = link.response() {
            return Some(response.status);
        }
        current = link.cause();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wrap_n(inner: UpstreamError, n: usize) -> UpstreamError {
        (0..n).fold(inner, |err, i| UpstreamError::wrap(format!("layer {}", i), err))
    }

    #[test]
    fn test_innermost_decodable_body_wins() {
        let inner = UpstreamError::status(400, Some(r#"{"error":"Missing query `q` parameter."}"#.into()));
        let err = wrap_n(inner, 3);

        let normalized = normalize_error(&err);

        assert_eq!(normalized, "{\n  \"error\": \"Missing query `q` parameter.\"\n}");
        assert!(!normalized.contains("layer"));
    }

    #[test]
    fn test_raw_body_when_not_json() {
        let err = wrap_n(UpstreamError::status(502, Some("Bad Gateway".into())), 1);
        assert_eq!(normalize_error(&err), "Bad Gateway");
    }

    #[test]
    fn test_bodyless_response_falls_back_to_full_message() {
        let err = UpstreamError::wrap("search failed", UpstreamError::status(500, None));
        assert_eq!(normalize_error(&err), "search failed: upstream returned HTTP 500");
    }

    #[test]
    fn test_fallback_keeps_transport_reason() {
        let err = UpstreamError::wrap(
            "Search request to engine 'bing' failed",
            UpstreamError::transport("error sending request: connection refused"),
        );
        assert_eq!(
            normalize_error(&err),
            "Search request to engine 'bing' failed: error sending request: connection refused"
        );
    }

    #[test]
    fn test_chain_longer_than_bound_returns_outer_message() {
        let err = wrap_n(UpstreamError::transport("connection reset"), MAX_CAUSE_DEPTH + 5);
        let outer = err.to_string();
        assert_eq!(normalize_error(&err), outer);
    }

    #[test]
    fn test_response_beyond_bound_is_not_reached() {
        let inner = UpstreamError::status(418, Some(r#"{"deep":true}"#.into()));
        let err = wrap_n(inner, MAX_CAUSE_DEPTH);
        assert_eq!(normalize_error(&err), err.to_string());
        assert_eq!(http_status(&err), None);
    }

    #[test]
    fn test_http_status_found_through_wrappers() {
        let err = wrap_n(UpstreamError::status(429, None), 4);
        assert_eq!(http_status(&err), Some(429));
        assert_eq!(http_status(&UpstreamError::transport("dns")), None);
    }
}
