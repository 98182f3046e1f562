//! CORS preflight short-circuit.

use stratus_core::{BoxFuture, GatewayRequest, GatewayResponse, RequestContext};

use crate::middleware::{Middleware, Next};

/// Answers `OPTIONS` requests with an empty 200 and stops there.
///
/// CORS headers come from the responder like on every other response, so a
/// preflight gets the configured `Access-Control-Allow-*` values. Any other
/// method passes through untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowOptions;

impl Middleware for AllowOptions {
    fn name(&self) -> &'static str {
        "allow_options"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        request: GatewayRequest,
        next: Next<'a>,
    ) -> BoxFuture<'a, GatewayResponse> {
        Box::pin(async move {
            if request.http_method.eq_ignore_ascii_case("OPTIONS") {
                tracing::debug!(path = %request.path, "answering preflight");
                return ctx.responder().empty();
            }
            next.run(ctx, request).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use stratus_core::{CorsConfig, Handler, Responder, ResponseConfig};

    fn counting(calls: Arc<AtomicUsize>) -> impl Handler {
        move |ctx: RequestContext, _req: GatewayRequest| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move { Ok::<_, anyhow::Error>(ctx.responder().success("handled")) }
        }
    }

    #[tokio::test]
    async fn test_options_short_circuits() {
        let calls = Arc::new(AtomicUsize::new(0));
        let handler = counting(Arc::clone(&calls));
        let responder = Responder::new(ResponseConfig::default().with_cors(CorsConfig::permissive()));
        let mut ctx = RequestContext::new(responder);

        let response = AllowOptions
            .process(&mut ctx, GatewayRequest::new("OPTIONS", "/books"), Next::handler(&handler))
            .await;

        assert_eq!(response.status_code, 200);
        assert_eq!(response.body, "{}");
        assert_eq!(response.header("Access-Control-Allow-Origin"), Some("*"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_other_methods_pass_through() {
        let calls = Arc::new(AtomicUsize::new(0));
        let handler = counting(Arc::clone(&calls));
        let mut ctx = RequestContext::default();

        for method in ["GET", "POST", "DELETE"] {
            let response = AllowOptions
                .process(&mut ctx, GatewayRequest::new(method, "/books"), Next::handler(&handler))
                .await;
            assert_eq!(response.body, r#""handled""#);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
