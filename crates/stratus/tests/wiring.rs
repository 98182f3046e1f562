//! Configuration flowing into a router.

use serde_json::json;
use stratus::prelude::*;

async fn boom(_ctx: RequestContext, _req: GatewayRequest) -> HandlerResult {
    Err(StratusError::internal("database password rejected").into())
}

async fn whoami(ctx: RequestContext, _req: GatewayRequest) -> HandlerResult {
    Ok(ctx.responder().success(&json!({ "userId": ctx.user_id() })))
}

fn router_from(config: &StratusConfig) -> LambdaRouter {
    let mut router = LambdaRouter::with_config(config.response_config())
        .with_middleware(LogRequest)
        .with_middleware(AllowOptions);
    router
        .route(Method::GET, "/boom", boom, [])
        .unwrap()
        .route(Method::GET, "/users/{userId}", whoami, [InjectContext.into_shared()])
        .unwrap();
    router
}

#[tokio::test]
async fn test_production_config_redacts_errors() {
    let config = ConfigLoader::new()
        .with_production()
        .with_vars([("STRATUS__CORS__ORIGIN", "https://books.example")])
        .load()
        .unwrap();
    let router = router_from(&config);

    let response = router.handle(GatewayRequest::new("GET", "/boom")).await;
    assert_eq!(response.status_code, 500);
    assert_eq!(response.header("Access-Control-Allow-Origin"), Some("https://books.example"));
    assert_eq!(
        response.json::<serde_json::Value>().unwrap(),
        json!({"status": 500, "message": "Internal Server Error"})
    );
}

#[tokio::test]
async fn test_development_config_is_permissive() {
    let config = ConfigLoader::new()
        .with_development()
        .with_vars(Vec::<(String, String)>::new())
        .load()
        .unwrap();
    let router = router_from(&config);

    let response = router.handle(GatewayRequest::new("GET", "/boom")).await;
    assert_eq!(response.json::<serde_json::Value>().unwrap()["message"], "database password rejected");

    let response = router.handle(GatewayRequest::new("GET", "/users/u-3")).await;
    assert_eq!(response.status_code, 200);
    assert_eq!(response.header("Access-Control-Allow-Methods"), Some("*"));
    assert_eq!(response.json::<serde_json::Value>().unwrap(), json!({"userId": "u-3"}));
}
