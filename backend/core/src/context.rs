//! Correlation context carried through a call chain.

/// HTTP/RPC header carrying the correlation id between services.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Encoded field key for the correlation id.
pub const REQUEST_ID_FIELD: &str = "x_request_id";

/// Pure data: the correlation id of the current request, if any.
///
/// An empty context is valid; records built from it simply omit the
/// correlation field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct TraceContext {
    request_id: Option<String>,
}

impl TraceContext {
    /// A context with no correlation id.
    pub fn background() -> Self {
        Self::default()
    }

    pub fn with_request_id(request_id: impl Into<String>) -> Self {
        Self {
            request_id: Some(request_id.into()),
        }
    }

    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }
}
