//! Ordered middleware pipeline.
//!
//! A [`Pipeline`] is an immutable list of stages. The first stage listed is
//! the outermost: it sees the request first and the response last.
//!
//! ```text
//! request ─▶ stage[0] ─▶ stage[1] ─▶ … ─▶ handler
//! response ◀─ stage[0] ◀─ stage[1] ◀─ … ◀─┘
//! ```

use std::fmt;
use std::sync::Arc;

use stratus_core::{GatewayRequest, GatewayResponse, Handler, RequestContext};

use crate::middleware::{Endpoint, Middleware, Next};

/// A shareable middleware stage.
pub type BoxedMiddleware = Arc<dyn Middleware>;

/// An immutable, ordered list of middleware stages.
///
/// # Example
///
/// ```
/// use stratus_core::{GatewayRequest, HandlerResult, RequestContext};
/// use stratus_middleware::{AllowOptions, InjectContext, Pipeline};
///
/// async fn hello(ctx: RequestContext, _req: GatewayRequest) -> HandlerResult {
///     Ok(ctx.responder().success("hello"))
/// }
///
/// # tokio_test::block_on(async {
/// let pipeline = Pipeline::builder()
///     .stage(AllowOptions)
///     .stage(InjectContext)
///     .build();
/// assert_eq!(pipeline.stage_names(), ["allow_options", "inject_context"]);
///
/// let mut ctx = RequestContext::default();
/// let response = pipeline.run(&mut ctx, GatewayRequest::new("OPTIONS", "/"), &hello).await;
/// assert_eq!(response.body, "{}");
/// # });
/// ```
#[derive(Clone, Default)]
pub struct Pipeline {
    stages: Vec<BoxedMiddleware>,
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("stages", &self.stage_names())
            .finish()
    }
}

impl Pipeline {
    /// An empty pipeline: requests go straight to the handler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts building a pipeline.
    #[must_use]
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    /// Appends a stage inside the ones already present.
    ///
    /// Pipelines are meant to be assembled at startup; once shared behind an
    /// `Arc` they can no longer change.
    pub fn push(&mut self, middleware: impl Middleware) {
        self.stages.push(Arc::new(middleware));
    }

    /// Runs the request through every stage and then `handler`.
    pub async fn run(
        &self,
        ctx: &mut RequestContext,
        request: GatewayRequest,
        handler: &dyn Handler,
    ) -> GatewayResponse {
        self.chain(Next::handler(handler)).run(ctx, request).await
    }

    /// Runs the request through every stage and then `endpoint`.
    pub async fn run_endpoint(
        &self,
        ctx: &mut RequestContext,
        request: GatewayRequest,
        endpoint: &dyn Endpoint,
    ) -> GatewayResponse {
        self.chain(Next::endpoint(endpoint)).run(ctx, request).await
    }

    fn chain<'a>(&'a self, terminal: Next<'a>) -> Next<'a> {
        self.stages
            .iter()
            .rev()
            .fold(terminal, |next, stage| Next::new(stage.as_ref(), next))
    }

    /// Stage names, outermost first.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }

    /// Number of stages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Whether there are no stages.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

impl From<Vec<BoxedMiddleware>> for Pipeline {
    fn from(stages: Vec<BoxedMiddleware>) -> Self {
        Self { stages }
    }
}

impl FromIterator<BoxedMiddleware> for Pipeline {
    fn from_iter<I: IntoIterator<Item = BoxedMiddleware>>(iter: I) -> Self {
        Self {
            stages: iter.into_iter().collect(),
        }
    }
}

/// Builder for [`Pipeline`].
#[derive(Default)]
pub struct PipelineBuilder {
    stages: Vec<BoxedMiddleware>,
}

impl PipelineBuilder {
    /// Appends a stage inside the ones already added.
    #[must_use]
    pub fn stage(mut self, middleware: impl Middleware) -> Self {
        self.stages.push(Arc::new(middleware));
        self
    }

    /// Appends an already shared stage.
    #[must_use]
    pub fn shared(mut self, middleware: BoxedMiddleware) -> Self {
        self.stages.push(middleware);
        self
    }

    /// Finishes the pipeline.
    #[must_use]
    pub fn build(self) -> Pipeline {
        Pipeline {
            stages: self.stages,
        }
    }
}
