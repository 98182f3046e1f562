//! Request context population.
//!
//! Copies what the gateway event says about the request into the
//! [`RequestContext`] so later stages and the handler can read typed values
//! instead of digging through the raw event:
//!
//! | Context value        | Source                                        |
//! |----------------------|-----------------------------------------------|
//! | request id           | `requestContext.requestId`                    |
//! | method, path         | `httpMethod`, `path`                          |
//! | path params          | `pathParameters`                              |
//! | query params         | `queryStringParameters`                       |
//! | multi query params   | `multiValueQueryStringParameters`             |
//! | id, userId, userType | [`IdentifierParams`] (longest candidate wins) |

use stratus_core::{BoxFuture, GatewayRequest, GatewayResponse, IdentifierParams, RequestContext};

use crate::middleware::{Middleware, Next};

/// Fills the context from the event. Never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct InjectContext;

impl InjectContext {
    fn populate(ctx: &mut RequestContext, request: &GatewayRequest) {
        ctx.set_request_id(request.request_context.request_id.as_str());
        ctx.set_method(request.http_method.as_str());
        ctx.set_path(request.path.as_str());
        ctx.extend_path_params(
            request
                .path_parameters
                .iter()
                .map(|(k, v)| (k.as_str(), v.as_str())),
        );
        ctx.extend_query_params(
            request
                .query_string_parameters
                .iter()
                .map(|(k, v)| (k.as_str(), v.as_str())),
        );
        ctx.extend_multi_query_params(
            request
                .multi_value_query_string_parameters
                .iter()
                .map(|(k, v)| (k.as_str(), v.clone())),
        );

        let ids = IdentifierParams::from_request(request);
        ctx.set_id(ids.id());
        ctx.set_user_id(ids.user_id());
        ctx.set_user_type(ids.user_type());
    }
}

impl Middleware for InjectContext {
    fn name(&self) -> &'static str {
        "inject_context"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        request: GatewayRequest,
        next: Next<'a>,
    ) -> BoxFuture<'a, GatewayResponse> {
        Box::pin(async move {
            Self::populate(ctx, &request);
            next.run(ctx, request).await
        })
    }
}
