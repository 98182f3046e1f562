//! Books API served through the Stratus router.
//!
//! The handlers are the ones a deployed function would register; here they
//! run behind the local hyper server. Configuration comes from `.env`, an
//! optional `stratus.toml` and `STRATUS__*` variables.
//!
//! ```text
//! STRATUS__JWT__SECRET=dev-secret cargo run -p stratus-local-server
//! curl localhost:8080/books
//! ```

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use http::StatusCode;
use serde::{Deserialize, Serialize};
use stratus::prelude::*;
use tracing::{info, warn};
use uuid::Uuid;

// =============================================================================
// Types
// =============================================================================

/// A stored book.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Book {
    id: String,
    title: String,
    author: String,
    owner_id: Option<String>,
}

/// Body of `POST /books`.
#[derive(Debug, Deserialize)]
struct NewBook {
    title: String,
    author: String,
}

/// Body of `PUT /books/{id}`.
#[derive(Debug, Deserialize)]
struct BookUpdate {
    title: Option<String>,
    author: Option<String>,
}

type Store = Arc<RwLock<HashMap<String, Book>>>;

// =============================================================================
// Handlers
// =============================================================================

fn book_id(ctx: &RequestContext) -> Result<String, HttpError> {
    ctx.id()
        .map(str::to_string)
        .ok_or_else(|| HttpError::bad_request("missing book id"))
}

fn not_found(id: &str) -> HttpError {
    HttpError::not_found(format!("book {id} not found"))
}

fn poisoned<T>(_: T) -> HttpError {
    HttpError::internal("book store is unavailable")
}

async fn health(ctx: RequestContext, _req: GatewayRequest) -> HandlerResult {
    Ok(ctx.responder().success(&serde_json::json!({ "status": "ok" })))
}

async fn list_books(store: Store, ctx: RequestContext, req: GatewayRequest) -> HandlerResult {
    let books = store.read().map_err(poisoned)?;
    let mut books: Vec<&Book> = books.values().collect();
    books.sort_by(|a, b| a.id.cmp(&b.id));

    if let Some(author) = req.query_string_parameters.get("author") {
        books.retain(|book| &book.author == author);
    }
    Ok(ctx.responder().success(&books))
}

async fn create_book(store: Store, ctx: RequestContext, req: GatewayRequest) -> HandlerResult {
    let input: NewBook = req.json()?;
    if input.title.trim().is_empty() {
        return Err(HttpError::bad_request("title must not be empty").into());
    }

    let book = Book {
        id: Uuid::now_v7().to_string(),
        title: input.title,
        author: input.author,
        owner_id: ctx.standard_claims().map(|claims| claims.subject.clone()),
    };
    store
        .write()
        .map_err(poisoned)?
        .insert(book.id.clone(), book.clone());

    info!(book.id = %book.id, "book created");
    Ok(ctx.responder().custom(StatusCode::CREATED, None, &book))
}

async fn get_book(store: Store, ctx: RequestContext) -> HandlerResult {
    let id = book_id(&ctx)?;
    let books = store.read().map_err(poisoned)?;
    let book = books.get(&id).ok_or_else(|| not_found(&id))?;
    Ok(ctx.responder().success(book))
}

async fn update_book(store: Store, ctx: RequestContext, req: GatewayRequest) -> HandlerResult {
    let id = book_id(&ctx)?;
    let update: BookUpdate = req.json()?;
    let caller = ctx.standard_claims().map(|claims| claims.subject.as_str());

    let mut books = store.write().map_err(poisoned)?;
    let book = books.get_mut(&id).ok_or_else(|| not_found(&id))?;
    if book.owner_id.is_some() && book.owner_id.as_deref() != caller {
        return Err(HttpError::new(StatusCode::FORBIDDEN, "only the owner may edit this book").into());
    }

    if let Some(title) = update.title {
        book.title = title;
    }
    if let Some(author) = update.author {
        book.author = author;
    }
    Ok(ctx.responder().success(book))
}

async fn delete_book(store: Store, ctx: RequestContext) -> HandlerResult {
    let id = book_id(&ctx)?;
    store
        .write()
        .map_err(poisoned)?
        .remove(&id)
        .ok_or_else(|| not_found(&id))?;
    Ok(ctx.responder().empty())
}

async fn download_book(store: Store, ctx: RequestContext) -> HandlerResult {
    let id = book_id(&ctx)?;
    let books = store.read().map_err(poisoned)?;
    let book = books.get(&id).ok_or_else(|| not_found(&id))?;

    let bytes = serde_json::to_vec_pretty(book)?;
    let headers = HashMap::from([(
        "Content-Disposition".to_string(),
        format!("attachment; filename=\"{id}.json\""),
    )]);
    Ok(ctx
        .responder()
        .file_b64("application/octet-stream", Some(headers), &bytes))
}

// =============================================================================
// Wiring
// =============================================================================

fn books_router(
    config: &StratusConfig,
    verifier: Arc<dyn TokenVerifier>,
) -> Result<LambdaRouter, RouteError> {
    let store = Store::default();
    let mut router = LambdaRouter::with_config(config.response_config())
        .with_middleware(LogRequest)
        .with_middleware(AllowOptions);

    let s = store.clone();
    router.route(
        Method::GET,
        "/books",
        move |ctx: RequestContext, req: GatewayRequest| list_books(s.clone(), ctx, req),
        [],
    )?;

    let s = store.clone();
    router.route(
        Method::POST,
        "/books",
        move |ctx: RequestContext, req: GatewayRequest| create_book(s.clone(), ctx, req),
        [DecodeClaims::standard(verifier.clone()).into_shared()],
    )?;

    let s = store.clone();
    router.route(
        Method::GET,
        "/books/{id}",
        move |ctx: RequestContext, _req: GatewayRequest| get_book(s.clone(), ctx),
        [InjectContext.into_shared()],
    )?;

    let s = store.clone();
    router.route(
        Method::PUT,
        "/books/{id}",
        move |ctx: RequestContext, req: GatewayRequest| update_book(s.clone(), ctx, req),
        [
            InjectContext.into_shared(),
            DecodeClaims::standard(verifier.clone()).into_shared(),
        ],
    )?;

    let s = store.clone();
    router.route(
        Method::DELETE,
        "/books/{id}",
        move |ctx: RequestContext, _req: GatewayRequest| delete_book(s.clone(), ctx),
        [
            InjectContext.into_shared(),
            DecodeClaims::standard(verifier).into_shared(),
        ],
    )?;

    let s = store;
    router.route(
        Method::GET,
        "/books/{id}/download",
        move |ctx: RequestContext, _req: GatewayRequest| download_book(s.clone(), ctx),
        [InjectContext.into_shared()],
    )?;

    router.route(Method::GET, "/health", health, [])?;
    Ok(router)
}

fn token_verifier(config: &StratusConfig) -> anyhow::Result<Arc<dyn TokenVerifier>> {
    let secret = if config.jwt.secret.is_empty() {
        warn!("jwt.secret is not set, using a random secret for this run");
        Uuid::now_v7().to_string()
    } else {
        config.jwt.secret.clone()
    };

    let algorithm: Algorithm = config.jwt.algorithm.parse()?;
    let verifier = HmacVerifier::new(secret)
        .with_algorithm(algorithm)?
        .with_leeway(config.jwt.leeway_secs);
    Ok(Arc::new(verifier))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ConfigLoader::new()
        .with_dotenv()?
        .with_optional_file("stratus.toml")?
        .load()?;
    init_logging(&config.log_config())?;

    let router = books_router(&config, token_verifier(&config)?)?;
    let server_config = ServerConfig::builder()
        .http_addr(config.server.http_addr.clone())
        .shutdown_timeout(config.shutdown_timeout())
        .request_timeout(config.request_timeout())
        .build();

    info!(
        addr = %config.server.http_addr,
        routes = router.route_count(),
        "books api starting"
    );
    Server::new(server_config, router).run().await?;
    Ok(())
}
