//! Lambda-style request dispatch.
//!
//! [`LambdaRouter`] owns every `(method, template)` binding of a function.
//! Each binding carries its own middleware and a terminal handler. Global
//! middleware wraps the whole dispatch, including the 404 and 405 answers,
//! so request logging and CORS preflights work for unknown routes too.
//!
//! ```text
//! event ─▶ global stages ─▶ match ─▶ route stages ─▶ handler
//!                             │
//!                             └─▶ 404 / 405
//! ```
//!
//! # Example
//!
//! ```rust
//! use http::Method;
//! use stratus_core::{GatewayRequest, HandlerResult, RequestContext};
//! use stratus_middleware::{InjectContext, LogRequest};
//! use stratus_server::{IntoShared, LambdaRouter};
//!
//! async fn get_book(ctx: RequestContext, _req: GatewayRequest) -> HandlerResult {
//!     Ok(ctx.responder().success(&serde_json::json!({ "id": ctx.id() })))
//! }
//!
//! # tokio_test::block_on(async {
//! let mut router = LambdaRouter::new().with_middleware(LogRequest);
//! router
//!     .route(Method::GET, "/books/{id}", get_book, [InjectContext.into_shared()])
//!     .unwrap();
//!
//! let response = router.handle(GatewayRequest::new("GET", "/books/7")).await;
//! assert_eq!(response.body, r#"{"id":"7"}"#);
//!
//! let response = router.handle(GatewayRequest::new("DELETE", "/books/7")).await;
//! assert_eq!(response.status_code, 405);
//! assert_eq!(response.header("Allow"), Some("GET"));
//! # });
//! ```

use std::fmt;
use std::sync::Arc;

use http::Method;
use stratus_core::{
    BoxFuture, GatewayRequest, GatewayResponse, Handler, HandlerResult, RequestContext, Responder,
    ResponseConfig, StratusError,
};
use stratus_middleware::{BoxedMiddleware, Endpoint, Middleware, Pipeline};
use stratus_router::{MatchError, RouteError, RouteMatch, Router};

/// Header listing the methods a path supports.
pub const ALLOW: &str = "Allow";

/// Wraps a middleware for use in route stacks.
pub trait IntoShared {
    /// Boxes the middleware behind an `Arc`.
    fn into_shared(self) -> BoxedMiddleware;
}

impl<M: Middleware> IntoShared for M {
    fn into_shared(self) -> BoxedMiddleware {
        Arc::new(self)
    }
}

struct Route {
    template: String,
    pipeline: Pipeline,
    handler: Arc<dyn Handler>,
}

/// Dispatches gateway events to registered handlers.
pub struct LambdaRouter {
    routes: Router<Route>,
    global: Pipeline,
    responder: Responder,
}

impl fmt::Debug for LambdaRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LambdaRouter")
            .field("routes", &self.routes.len())
            .field("global", &self.global)
            .field("responder", &self.responder)
            .finish()
    }
}

impl Default for LambdaRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl LambdaRouter {
    /// An empty router with the default response configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_responder(Responder::default())
    }

    /// An empty router that builds responses from `config`.
    #[must_use]
    pub fn with_config(config: ResponseConfig) -> Self {
        Self::with_responder(Responder::new(config))
    }

    /// An empty router that builds responses with `responder`.
    #[must_use]
    pub fn with_responder(responder: Responder) -> Self {
        Self {
            routes: Router::new(),
            global: Pipeline::new(),
            responder,
        }
    }

    /// Adds a global stage inside the ones already added.
    #[must_use]
    pub fn with_middleware(mut self, middleware: impl Middleware) -> Self {
        self.global.push(middleware);
        self
    }

    /// The responder handed to every request context.
    #[must_use]
    pub fn responder(&self) -> &Responder {
        &self.responder
    }

    /// Binds `handler` to `method` and `template`, wrapped in `middleware`
    /// (outermost first).
    ///
    /// # Errors
    ///
    /// [`RouteError::Conflict`] when the pair is already bound and
    /// [`RouteError::InvalidTemplate`] when the template is malformed.
    pub fn route<H, I>(
        &mut self,
        method: Method,
        template: &str,
        handler: H,
        middleware: I,
    ) -> Result<&mut Self, RouteError>
    where
        H: Handler,
        I: IntoIterator<Item = BoxedMiddleware>,
    {
        let pipeline: Pipeline = middleware.into_iter().collect();
        let route = Route {
            template: template.to_string(),
            pipeline,
            handler: Arc::new(handler),
        };
        let normalized = self.routes.insert(method.clone(), template, route)?;
        tracing::debug!(%method, template = %normalized, "route registered");
        Ok(self)
    }

    /// Number of registered `(method, template)` bindings.
    #[must_use]
    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    /// Handles one event. Never fails: every problem becomes a response.
    pub async fn handle(&self, request: GatewayRequest) -> GatewayResponse {
        let mut ctx = RequestContext::new(self.responder.clone());
        self.global.run_endpoint(&mut ctx, request, self).await
    }

    async fn dispatch(&self, ctx: &mut RequestContext, request: GatewayRequest) -> GatewayResponse {
        let method = match Method::from_bytes(request.http_method.to_ascii_uppercase().as_bytes()) {
            Ok(method) => method,
            Err(_) => {
                let err = StratusError::bad_request(format!(
                    "invalid HTTP method '{}'",
                    request.http_method
                ));
                return ctx.responder().error(err);
            }
        };

        match self.routes.at(&method, &request.path) {
            Ok(found) => {
                let handler = found.value.handler.as_ref();
                self.run_route(ctx, request, &found, &method, handler).await
            }
            Err(MatchError::NotFound) => ctx.responder().error(StratusError::NotFound {
                path: request.path,
            }),
            Err(MatchError::MethodNotAllowed { allowed }) => {
                let allow = allowed
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                let mut refusal = ctx.responder().error(StratusError::MethodNotAllowed {
                    method: method.to_string(),
                    path: request.path.clone(),
                    allowed: allowed.iter().map(ToString::to_string).collect(),
                });
                refusal.set_header(ALLOW, allow);

                // A preflight runs through the stages of a route bound to the
                // same path, so a route-level AllowOptions can answer it.
                if method == Method::OPTIONS {
                    if let Some(found) = allowed
                        .iter()
                        .find_map(|bound| self.routes.at(bound, &request.path).ok())
                    {
                        let fallback = Refusal(refusal);
                        return self.run_route(ctx, request, &found, &method, &fallback).await;
                    }
                }
                refusal
            }
        }
    }

    async fn run_route(
        &self,
        ctx: &mut RequestContext,
        mut request: GatewayRequest,
        found: &RouteMatch<'_, Route>,
        method: &Method,
        handler: &dyn Handler,
    ) -> GatewayResponse {
        let route = found.value;
        for (name, value) in &found.params {
            request
                .path_parameters
                .entry(name.to_string())
                .or_insert_with(|| value.to_string());
        }
        tracing::trace!(%method, template = %route.template, "route matched");
        route.pipeline.run(ctx, request, handler).await
    }
}

/// Terminal stage for a preflight that no route stage answered.
struct Refusal(GatewayResponse);

impl Handler for Refusal {
    fn call(&self, _ctx: RequestContext, _request: GatewayRequest) -> BoxFuture<'static, HandlerResult> {
        let response = self.0.clone();
        Box::pin(async move { Ok(response) })
    }
}

impl Endpoint for LambdaRouter {
    fn serve<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        request: GatewayRequest,
    ) -> BoxFuture<'a, GatewayResponse> {
        Box::pin(self.dispatch(ctx, request))
    }
}
