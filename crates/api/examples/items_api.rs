//! A small items api dispatched against a few sample events.
//!
//! A lambda host would call `handle` once per invocation; the registry lives in a static so cached
//! dependencies survive across warm invocations.

use std::collections::BTreeMap;
use std::convert::Infallible;
use std::sync::{Mutex, PoisonError};

use http::StatusCode;
use lambda_api::decorator::stack;
use lambda_api::middleware::{AuthMiddleware, CorsConfig, CorsMiddleware};
use lambda_api::{Api, BindError, BoxError, Dependency, DependencyRegistry, HttpException, Json, Param, ResponseHandle, Router, SerializedResponse, handler_fn};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

static REGISTRY: Lazy<Mutex<DependencyRegistry>> = Lazy::new(|| Mutex::new(DependencyRegistry::new()));

#[derive(Debug, Clone, Serialize)]
struct Item {
    id: i64,
    name: String,
}

#[derive(Debug, Deserialize)]
struct NewItem {
    name: String,
}

type Catalog = BTreeMap<i64, Item>;

fn catalog() -> Dependency {
    Dependency::new("catalog", [], |_args| {
        info!("loading catalog");
        let items = [(1, "apple"), (2, "pear")].map(|(id, name)| (id, Item { id, name: name.to_owned() }));
        Ok::<_, Infallible>(Catalog::from(items))
    })
    .cached()
}

fn api() -> Api {
    let catalog = catalog();
    let mut router = Router::new();

    router
        .get("/items", handler_fn([Param::depends("catalog", &catalog), Param::int("limit").default(10)], |args| {
            let catalog = args.object::<Catalog>("catalog")?;
            let limit = usize::try_from(args.get::<i64>("limit")?).unwrap_or_default();
            Ok::<_, BindError>(Json(catalog.values().take(limit).cloned().collect::<Vec<_>>()))
        }))
        .expect("valid route");

    router
        .get("/items/{id}", handler_fn([Param::int("id"), Param::depends("catalog", &catalog)], |args| -> Result<_, BoxError> {
            let id = args.get::<i64>("id")?;
            let catalog = args.object::<Catalog>("catalog")?;
            match catalog.get(&id) {
                Some(item) => Ok(Json(item.clone())),
                None => Err(HttpException::not_found(format!("no item {id}")).into()),
            }
        }))
        .expect("valid route");

    router
        .post("/items", handler_fn([Param::body::<NewItem>("item"), Param::response("response")], |args| {
            let item = args.object::<NewItem>("item")?;
            args.get::<ResponseHandle>("response")?.set_status(StatusCode::CREATED);
            Ok::<_, BindError>(Json(Item { id: 3, name: item.name.clone() }))
        }))
        .expect("valid route");

    Api::builder()
        .router(router)
        .middleware(stack(
            CorsMiddleware::new(CorsConfig::from_env()),
            AuthMiddleware::new(|req| !req.path().starts_with("/admin")),
        ))
        .build()
        .expect("router is set")
}

fn handle(api: &Api, event: &Value) -> SerializedResponse {
    let mut registry = REGISTRY.lock().unwrap_or_else(PoisonError::into_inner);
    api.dispatch(event, json!({ "aws_request_id": "demo", "function_name": "items-api" }), &mut registry)
}

fn main() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::DEBUG).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let api = api();
    let events = [
        json!({ "httpMethod": "GET", "path": "/items", "queryStringParameters": { "limit": "1" }, "headers": { "origin": "http://localhost:3001" } }),
        json!({ "httpMethod": "GET", "path": "/items/2", "headers": {} }),
        json!({ "httpMethod": "GET", "path": "/items/9", "headers": {} }),
        json!({ "httpMethod": "POST", "path": "/items", "headers": {}, "body": r#"{"name":"plum"}"# }),
        json!({ "httpMethod": "POST", "path": "/items", "headers": {}, "body": r#"{"title":"plum"}"# }),
        json!({ "version": "2.0", "rawPath": "/admin", "requestContext": { "http": { "method": "GET" } } }),
    ];

    for event in &events {
        let response = handle(&api, event);
        info!(status = response.status_code, body = %response.body, "dispatched");
    }
}
