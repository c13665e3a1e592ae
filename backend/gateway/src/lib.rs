//! `tracelog-http`: HTTP edge of the tracelog runtime.
//!
//! - [`with_request_logging`]: request-id propagation, one access log line
//!   per request, and panic recovery logged at ERROR
//! - [`propagate_headers`]: headers for outgoing calls to other services

pub mod headers;
pub mod panic;
pub mod request_log;

use std::sync::Arc;

use axum::Router;
use axum::middleware::from_fn_with_state;
use tower_http::catch_panic::CatchPanicLayer;
use tracelog::Logger;

pub use headers::{SERVICE_NAME_HEADER, USER_ID_HEADER, propagate_headers, request_id_from};
pub use panic::{PanicMessage, PanicResponder};
pub use request_log::{RequestLogState, request_log};

/// Wrap `router` so every request gets a [`tracelog::TraceContext`]
/// extension, an access log line, and panic recovery.
pub fn with_request_logging<S>(router: Router<S>, logger: Logger, service_name: impl Into<Arc<str>>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    let state = RequestLogState::new(logger, service_name);
    router
        .layer(CatchPanicLayer::custom(PanicResponder))
        .layer(from_fn_with_state(state, request_log))
}
