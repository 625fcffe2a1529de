//! Request logging middleware: one structured line per request/response pair
//! with method, path, status, and duration, keyed by a generated request id.

use std::time::Instant;

use axum::{extract::Request, middleware::Next, response::Response};
use tracing::info;
use uuid::Uuid;

pub async fn log_requests(request: Request, next: Next) -> Response {
    let request_id = Uuid::new_v4();
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    let response = next.run(request).await;

    let duration_ms = start.elapsed().as_millis() as u64;
    info!(
        %request_id,
        %method,
        path,
        status = response.status().as_u16(),
        duration_ms,
        "request"
    );

    response
}
