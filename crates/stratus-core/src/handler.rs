//! Terminal handler trait.
//!
//! A [`Handler`] receives the request context built by the middleware and
//! the gateway event, and returns a response or an error. Errors are turned
//! into responses by the pipeline, so handlers are free to use `?` on
//! anything that converts into [`anyhow::Error`].
//!
//! Async closures and functions with the right signature implement the
//! trait automatically:
//!
//! ```
//! use stratus_core::{GatewayRequest, Handler, HandlerResult, HttpError, RequestContext};
//!
//! async fn get_book(ctx: RequestContext, _req: GatewayRequest) -> HandlerResult {
//!     let id = ctx.id().ok_or_else(|| HttpError::bad_request("missing id"))?;
//!     Ok(ctx.responder().success(&serde_json::json!({ "id": id })))
//! }
//!
//! fn assert_handler<H: Handler>(_: H) {}
//! assert_handler(get_book);
//! ```

use std::future::Future;
use std::pin::Pin;

use crate::context::RequestContext;
use crate::event::{GatewayRequest, GatewayResponse};

/// A boxed, sendable future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// What a handler returns.
pub type HandlerResult = anyhow::Result<GatewayResponse>;

/// The innermost stage of a route: turns a request into a response.
pub trait Handler: Send + Sync + 'static {
    /// Handles one request.
    fn call(&self, ctx: RequestContext, request: GatewayRequest) -> BoxFuture<'static, HandlerResult>;
}

impl<F, Fut> Handler for F
where
    F: Fn(RequestContext, GatewayRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    fn call(&self, ctx: RequestContext, request: GatewayRequest) -> BoxFuture<'static, HandlerResult> {
        Box::pin(self(ctx, request))
    }
}
