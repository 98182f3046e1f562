//! The built-in stages attached to individual routes.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use http::Method;
use serde_json::{json, Value};
use stratus_core::{
    CorsConfig, ExpandedClaims, GatewayRequest, GatewayResponse, HandlerResult, HttpError,
    RequestContext, ResponseConfig, StandardClaims,
};
use stratus_jwt::HmacVerifier;
use stratus_middleware::{AllowOptions, DecodeClaims, InjectContext, LogRequest};
use stratus_server::{IntoShared, LambdaRouter};

const SECRET: &str = "route-stack-secret";

fn now() -> i64 {
    i64::try_from(SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs()).unwrap()
}

async fn whoami(ctx: RequestContext, _req: GatewayRequest) -> HandlerResult {
    let claims = ctx
        .expanded_claims()
        .ok_or_else(|| HttpError::internal("claims missing"))?;
    Ok(ctx.responder().success(claims))
}

fn router(verifier: Arc<HmacVerifier>) -> LambdaRouter {
    let mut router = LambdaRouter::with_config(
        ResponseConfig::default().with_cors(CorsConfig::permissive()),
    );
    router
        .route(
            Method::GET,
            "/users/{userId}/profile",
            whoami,
            [
                LogRequest.into_shared(),
                AllowOptions.into_shared(),
                InjectContext.into_shared(),
                DecodeClaims::expanded(verifier).into_shared(),
            ],
        )
        .unwrap();
    router
}

fn assert_cors(response: &GatewayResponse) {
    for name in [
        "Access-Control-Allow-Headers",
        "Access-Control-Allow-Methods",
        "Access-Control-Allow-Origin",
    ] {
        assert_eq!(response.header(name), Some("*"), "{name}");
    }
}

#[tokio::test]
async fn test_preflight_on_get_only_route() {
    let router = router(Arc::new(HmacVerifier::new(SECRET)));

    let response = router
        .handle(GatewayRequest::new("OPTIONS", "/users/u-1/profile"))
        .await;

    assert_eq!(response.status_code, 200);
    assert_eq!(response.body, "{}");
    assert_cors(&response);
}

#[tokio::test]
async fn test_missing_token_is_400_with_cors() {
    let router = router(Arc::new(HmacVerifier::new(SECRET)));

    let response = router
        .handle(GatewayRequest::new("GET", "/users/u-1/profile"))
        .await;

    assert_eq!(response.status_code, 400);
    assert_cors(&response);
    assert_eq!(
        response.json::<Value>().unwrap(),
        json!({"status": 400, "message": "no authorization header"})
    );
}

#[tokio::test]
async fn test_expanded_claims_round_trip() {
    let verifier = Arc::new(HmacVerifier::new(SECRET));
    let issued = ExpandedClaims {
        standard: StandardClaims {
            audience: "books-api".to_string(),
            expires_at: now() + 3600,
            id: "jti-7".to_string(),
            issued_at: now(),
            issuer: "auth".to_string(),
            not_before: now() - 10,
            subject: "u-1".to_string(),
        },
        email: "grace@example.com".to_string(),
        first_name: "Grace".to_string(),
        full_name: "Grace Hopper".to_string(),
        level: "admin".to_string(),
        user_type: "author".to_string(),
    };
    let token = verifier.sign(&issued).unwrap();
    let router = router(verifier);

    let response = router
        .handle(
            GatewayRequest::new("GET", "/users/u-1/profile")
                .with_header("Authorization", format!("Bearer {token}")),
        )
        .await;

    assert_eq!(response.status_code, 200);
    assert_cors(&response);
    let echoed: ExpandedClaims = response.json().unwrap();
    assert_eq!(echoed, issued);
}

#[tokio::test]
async fn test_other_methods_are_still_refused() {
    let router = router(Arc::new(HmacVerifier::new(SECRET)));

    let response = router
        .handle(GatewayRequest::new("POST", "/users/u-1/profile"))
        .await;

    assert_eq!(response.status_code, 405);
    assert_eq!(response.header("Allow"), Some("GET"));
}
