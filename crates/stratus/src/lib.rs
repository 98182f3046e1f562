//! # Stratus
//!
//! **Request dispatch for API Gateway style functions**
//!
//! Stratus turns a gateway event into a JSON response:
//!
//! - **Routing** – path templates such as `/books/{id}` with 404 and 405 answers
//! - **Middleware** – preflight handling, identifier injection, bearer-token claims, request logs
//! - **Responses** – JSON bodies, CORS headers, redacted server errors, binary files
//! - **Local serving** – the same router behind a hyper HTTP/1 server
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use stratus::prelude::*;
//!
//! async fn get_book(ctx: RequestContext, _req: GatewayRequest) -> HandlerResult {
//!     Ok(ctx.responder().success(&serde_json::json!({ "id": ctx.id() })))
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConfigLoader::new().load()?;
//!     init_logging(&config.log_config())?;
//!
//!     let mut router = LambdaRouter::with_config(config.response_config())
//!         .with_middleware(LogRequest)
//!         .with_middleware(AllowOptions);
//!     router.route(Method::GET, "/books/{id}", get_book, [InjectContext.into_shared()])?;
//!
//!     let server_config = ServerConfig::builder()
//!         .http_addr(config.server.http_addr.clone())
//!         .build();
//!     Server::new(server_config, router).run().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! HTTP ─▶ adapter ─▶ global stages ─▶ router ─▶ route stages ─▶ handler
//!                                                                 │
//! HTTP ◀─ adapter ◀────────────── Responder ◀─────────────────────┘
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub use stratus_config as config;
pub use stratus_core as core;
pub use stratus_jwt as jwt;
pub use stratus_middleware as middleware;
pub use stratus_router as router;
pub use stratus_server as server;
pub use stratus_telemetry as telemetry;

/// Prelude module for convenient imports.
///
/// ```rust
/// use stratus::prelude::*;
///
/// let responder = Responder::new(ResponseConfig::default().with_cors(CorsConfig::permissive()));
/// assert_eq!(responder.empty().body, "{}");
/// ```
pub mod prelude {
    pub use stratus_core::{
        Claims, ExpandedClaims, GatewayRequest, GatewayResponse, Handler, HandlerResult,
        HttpError, RequestContext, Responder, ResponseConfig, StandardClaims, StratusError,
        StratusResult,
    };

    pub use stratus_core::CorsConfig;

    pub use stratus_middleware::{
        AllowOptions, DecodeClaims, InjectContext, LogRequest, Middleware, Next,
    };

    pub use stratus_jwt::{Algorithm, HmacVerifier, TokenVerifier};

    pub use stratus_server::{
        IntoShared, LambdaRouter, Server, ServerConfig, ShutdownSignal,
    };

    pub use stratus_config::{ConfigLoader, StratusConfig};

    pub use stratus_telemetry::{init_logging, LogConfig};

    pub use stratus_router::RouteError;

    pub use http::Method;
}
