//! Core middleware trait and continuation.
//!
//! A [`Middleware`] receives the mutable [`RequestContext`], the gateway
//! event and a [`Next`] continuation. It may change the context, answer on
//! its own, or call `next.run(..)` exactly once and post-process the
//! response that comes back.
//!
//! # Example
//!
//! ```
//! use stratus_core::{BoxFuture, GatewayRequest, GatewayResponse, RequestContext};
//! use stratus_middleware::{Middleware, Next};
//!
//! struct Stamp;
//!
//! impl Middleware for Stamp {
//!     fn name(&self) -> &'static str {
//!         "stamp"
//!     }
//!
//!     fn process<'a>(
//!         &'a self,
//!         ctx: &'a mut RequestContext,
//!         request: GatewayRequest,
//!         next: Next<'a>,
//!     ) -> BoxFuture<'a, GatewayResponse> {
//!         Box::pin(async move {
//!             let mut response = next.run(ctx, request).await;
//!             response.set_header("X-Stamp", "1");
//!             response
//!         })
//!     }
//! }
//! ```

use stratus_core::{BoxFuture, GatewayRequest, GatewayResponse, Handler, RequestContext};

/// One stage of a pipeline.
///
/// Stages never fail: anything that goes wrong is turned into a response
/// with the context's responder.
pub trait Middleware: Send + Sync + 'static {
    /// Stage name, used in logs and by [`Pipeline::stage_names`](crate::Pipeline::stage_names).
    fn name(&self) -> &'static str;

    /// Processes the request, usually by delegating to `next`.
    fn process<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        request: GatewayRequest,
        next: Next<'a>,
    ) -> BoxFuture<'a, GatewayResponse>;
}

/// The innermost step of a chain when it is not a plain [`Handler`].
///
/// Unlike a handler, an endpoint shares the caller's context, so whatever
/// it records is visible to the stages wrapped around it. The router uses
/// this to run route-level middleware inside the global stages.
pub trait Endpoint: Send + Sync {
    /// Produces the response.
    fn serve<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        request: GatewayRequest,
    ) -> BoxFuture<'a, GatewayResponse>;
}

/// Continuation handed to a middleware.
///
/// Consumed by [`run`](Self::run), so it can be invoked at most once.
pub struct Next<'a> {
    inner: NextInner<'a>,
}

enum NextInner<'a> {
    Chain {
        middleware: &'a dyn Middleware,
        next: Box<Next<'a>>,
    },
    Handler(&'a dyn Handler),
    Endpoint(&'a dyn Endpoint),
}

impl<'a> Next<'a> {
    pub(crate) fn new(middleware: &'a dyn Middleware, next: Next<'a>) -> Self {
        Self {
            inner: NextInner::Chain {
                middleware,
                next: Box::new(next),
            },
        }
    }

    /// A continuation that calls `handler`.
    ///
    /// The handler gets its own copy of the context. An `Err` from the
    /// handler is converted with the context's responder.
    pub fn handler(handler: &'a dyn Handler) -> Self {
        Self {
            inner: NextInner::Handler(handler),
        }
    }

    /// A continuation that calls `endpoint`.
    pub fn endpoint(endpoint: &'a dyn Endpoint) -> Self {
        Self {
            inner: NextInner::Endpoint(endpoint),
        }
    }

    /// Runs the rest of the chain.
    pub async fn run(self, ctx: &mut RequestContext, request: GatewayRequest) -> GatewayResponse {
        match self.inner {
            NextInner::Chain { middleware, next } => middleware.process(ctx, request, *next).await,
            NextInner::Handler(handler) => match handler.call(ctx.clone(), request).await {
                Ok(response) => response,
                Err(err) => ctx.responder().error(err),
            },
            NextInner::Endpoint(endpoint) => endpoint.serve(ctx, request).await,
        }
    }
}
