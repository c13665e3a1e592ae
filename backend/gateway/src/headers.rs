use axum::http::{HeaderMap, HeaderName, HeaderValue};
use tracelog::{REQUEST_ID_HEADER, TraceContext};

/// Name of the calling service on inter-service requests.
pub const SERVICE_NAME_HEADER: &str = "x-service-name";

/// Authenticated user, when an upstream gateway provides one.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Older spelling of [`USER_ID_HEADER`] still sent by some gateways.
pub const LEGACY_USER_ID_HEADER: &str = "user-id";

/// Client address set by gateways that do not use `x-forwarded-for`.
pub const CLIENT_IP_HEADER: &str = "client-ip";

/// Non-empty `x-request-id` from `headers`.
pub fn request_id_from(headers: &HeaderMap) -> Option<String> {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

/// Headers to attach to a downstream call made on behalf of `ctx`.
///
/// Values that are not valid header text are left out.
pub fn propagate_headers(ctx: &TraceContext, service_name: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    if let Some(value) = ctx.request_id().and_then(|id| HeaderValue::from_str(id).ok()) {
        headers.insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
    }
    if let Ok(value) = HeaderValue::from_str(service_name) {
        headers.insert(HeaderName::from_static(SERVICE_NAME_HEADER), value);
    }
    headers
}

/// First hop of `x-forwarded-for`, then `x-real-ip`, then `client-ip`.
pub(crate) fn forwarded_client_ip(headers: &HeaderMap) -> Option<String> {
    let forwarded = non_empty(headers, "x-forwarded-for")
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    forwarded
        .or_else(|| non_empty(headers, "x-real-ip"))
        .or_else(|| non_empty(headers, CLIENT_IP_HEADER))
        .map(str::to_owned)
}

/// `x-user-id`, falling back to `user-id`.
pub(crate) fn user_id(headers: &HeaderMap) -> String {
    non_empty(headers, USER_ID_HEADER)
        .or_else(|| non_empty(headers, LEGACY_USER_ID_HEADER))
        .unwrap_or_default()
        .to_string()
}

pub(crate) fn header_str(headers: &HeaderMap, name: &str) -> String {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

fn non_empty<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}
