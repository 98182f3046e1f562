//! Built-in middleware stages.
//!
//! A typical route stack, outermost first:
//!
//! 1. [`LogRequest`] - one log event per request
//! 2. [`AllowOptions`] - answer CORS preflights
//! 3. [`InjectContext`] - copy event data into the context
//! 4. [`DecodeClaims`] - verify the bearer token and store its claims

mod allow_options;
mod decode_claims;
mod inject_context;
mod log_request;

pub use allow_options::AllowOptions;
pub use decode_claims::DecodeClaims;
pub use inject_context::InjectContext;
pub use log_request::LogRequest;
