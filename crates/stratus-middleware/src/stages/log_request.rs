//! Request logging.
//!
//! Runs the rest of the chain first, then writes one event per request.
//! Successful requests log at `INFO` with the method, path, status, request
//! id and duration. Responses with status 400 or above log at `ERROR` and
//! also carry the response body and everything the context learned about
//! the request, which is usually enough to replay it.

use stratus_core::{BoxFuture, GatewayRequest, GatewayResponse, RequestContext};

use crate::middleware::{Middleware, Next};

/// Logs every request once, after the response is known.
///
/// The response is returned unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogRequest;

impl Middleware for LogRequest {
    fn name(&self) -> &'static str {
        "log_request"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        request: GatewayRequest,
        next: Next<'a>,
    ) -> BoxFuture<'a, GatewayResponse> {
        Box::pin(async move {
            let method = request.http_method.clone();
            let path = request.path.clone();
            let request_id = request.request_context.request_id.clone();

            let response = next.run(ctx, request).await;

            let request_id = ctx.request_id().unwrap_or(request_id.as_str());
            let duration_ms = ctx.elapsed().as_secs_f64() * 1000.0;
            let status = response.status_code;

            if status >= 400 {
                let context = serde_json::Value::Object(ctx.populated());
                tracing::error!(
                    request_id,
                    http.method = %method,
                    http.path = %path,
                    http.status_code = status,
                    duration_ms,
                    response = %response.body,
                    context = %context,
                    "request failed"
                );
            } else {
                tracing::info!(
                    request_id,
                    http.method = %method,
                    http.path = %path,
                    http.status_code = status,
                    duration_ms,
                    "request completed"
                );
            }

            response
        })
    }
}
