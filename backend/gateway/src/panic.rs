//! Panic recovery for handlers.

use std::any::Any;

use axum::body::Body;
use axum::http::{Response, StatusCode, header};
use tower_http::catch_panic::ResponseForPanic;

/// Panic payload attached to the 500 response so the request logger can
/// report it.
#[derive(Debug, Clone)]
pub struct PanicMessage(pub String);

/// Turns a caught handler panic into a plain 500.
#[derive(Debug, Clone, Copy, Default)]
pub struct PanicResponder;

impl ResponseForPanic for PanicResponder {
    type ResponseBody = Body;

    fn response_for_panic(&mut self, err: Box<dyn Any + Send + 'static>) -> Response<Self::ResponseBody> {
        let message = if let Some(s) = err.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = err.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic".to_string()
        };

        let mut response = Response::new(Body::from("internal server error"));
        *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
        response
            .headers_mut()
            .insert(header::CONTENT_TYPE, header::HeaderValue::from_static("text/plain; charset=utf-8"));
        response.extensions_mut().insert(PanicMessage(message));
        response
    }
}
