//! Access logging middleware.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::{ConnectInfo, Request, State};
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::Response;
use tracelog::{Field, Logger, REQUEST_ID_HEADER, TraceContext};
use uuid::Uuid;

use crate::headers::{SERVICE_NAME_HEADER, forwarded_client_ip, header_str, request_id_from, user_id};
use crate::panic::PanicMessage;

#[derive(Clone)]
pub struct RequestLogState {
    logger: Logger,
    service_name: Arc<str>,
}

impl RequestLogState {
    pub fn new(logger: Logger, service_name: impl Into<Arc<str>>) -> Self {
        Self {
            logger,
            service_name: service_name.into(),
        }
    }
}

/// Attach a [`TraceContext`], echo `x-request-id`, and log one INFO line
/// per request. A response carrying a [`PanicMessage`] is also logged at
/// ERROR.
pub async fn request_log(State(state): State<RequestLogState>, mut req: Request, next: Next) -> Response {
    let started = Instant::now();
    let request_id = request_id_from(req.headers()).unwrap_or_else(|| Uuid::new_v4().to_string());
    let ctx = TraceContext::with_request_id(request_id.clone());

    let method = req.method().to_string();
    let path = req.uri().path().to_string();
    let query = req.uri().query().unwrap_or_default().to_string();
    let user = user_id(req.headers());
    let from_service = header_str(req.headers(), SERVICE_NAME_HEADER);
    let client_ip = forwarded_client_ip(req.headers())
        .or_else(|| {
            req.extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string())
        })
        .unwrap_or_default();

    req.extensions_mut().insert(ctx.clone());
    let mut response = next.run(req).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    if let Some(PanicMessage(message)) = response.extensions().get::<PanicMessage>() {
        state.logger.error(
            &ctx,
            "http handler unknown error",
            vec![
                Field::str("panic", message.clone()),
                Field::str("method", method.clone()),
                Field::str("request_path", path.clone()),
            ],
        );
    }

    state.logger.info(
        &ctx,
        "user request logged",
        vec![
            Field::str("method", method),
            Field::str("request_path", path),
            Field::str("request_query_params", query),
            Field::str("user_id", user),
            Field::str("client_ip", client_ip),
            Field::str("from_service_name", from_service),
            Field::str("to_service_name", state.service_name.to_string()),
            Field::new("response_http_status", response.status().as_u16()),
            Field::new("elapsed_ms", started.elapsed().as_millis() as u64),
        ],
    );
    tracing::debug!(service = %state.service_name, "Request logged");
    response
}
