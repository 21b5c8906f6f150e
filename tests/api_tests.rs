//! HTTP API tests
//!
//! Drives the router in-process with `tower::ServiceExt::oneshot`.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::routing::get;
use axum::{Json, Router};
use pokedex::network::{router, AppState, ErrorBody};
use pokedex::seed::{PokeResponse, SmallPokemon};
use pokedex::store::DocumentCollection;
use pokedex::{Pokemon, PokemonService, ReqwestAdapter, SeedService};
use serde_json::{json, Value};
use tower::ServiceExt;

// =============================================================================
// Helper Functions
// =============================================================================

fn app_with_seed_url(seed_url: &str) -> Router {
    let collection = Arc::new(DocumentCollection::in_memory(Pokemon::collection_options()));
    let pokemon = PokemonService::new(collection.clone());
    let seed = SeedService::new(collection, ReqwestAdapter::new()).with_source_url(seed_url);
    router(AppState::new(pokemon, seed))
}

fn app() -> Router {
    app_with_seed_url("http://127.0.0.1:1/unused")
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(value) => {
            builder = builder.header("content-type", "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, value)
}

async fn create(app: &Router, no: u32, name: &str) -> Value {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/v2/pokemon",
        Some(json!({ "no": no, "name": name })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body
}

fn error_body(value: Value) -> ErrorBody {
    serde_json::from_value(value).unwrap()
}

// =============================================================================
// Create
// =============================================================================

#[tokio::test]
async fn test_post_creates_record() {
    let app = app();

    let body = create(&app, 25, "Pikachu").await;

    assert_eq!(body["name"], json!("pikachu"));
    assert_eq!(body["no"], json!(25));
    assert_eq!(body["__v"], json!(0));
    assert_eq!(body["_id"].as_str().unwrap().len(), 24);
}

#[tokio::test]
async fn test_post_duplicate_is_bad_request() {
    let app = app();
    create(&app, 25, "pikachu").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v2/pokemon",
        Some(json!({ "no": 26, "name": "PIKACHU" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let error = error_body(body);
    assert_eq!(error.status_code, 400);
    assert_eq!(error.error, "Bad Request");
    assert_eq!(error.message, r#"Pokemon already exists in db {"name":"pikachu"}"#);
}

#[tokio::test]
async fn test_post_invalid_payload_is_bad_request() {
    let app = app();

    let (missing_name, _) = send(&app, Method::POST, "/api/v2/pokemon", Some(json!({ "no": 1 }))).await;
    let (zero_no, body) = send(
        &app,
        Method::POST,
        "/api/v2/pokemon",
        Some(json!({ "no": 0, "name": "x" })),
    )
    .await;
    let (empty_name, _) = send(
        &app,
        Method::POST,
        "/api/v2/pokemon",
        Some(json!({ "no": 1, "name": "" })),
    )
    .await;

    assert_eq!(missing_name, StatusCode::BAD_REQUEST);
    assert_eq!(zero_no, StatusCode::BAD_REQUEST);
    assert_eq!(error_body(body).message, "no must be a positive integer");
    assert_eq!(empty_name, StatusCode::BAD_REQUEST);
}

// =============================================================================
// Read
// =============================================================================

#[tokio::test]
async fn test_list_paginates_by_no() {
    let app = app();
    for no in 1..=12 {
        create(&app, no, &format!("mon{}", no)).await;
    }

    let (status, body) = send(&app, Method::GET, "/api/v2/pokemon?limit=5&offset=2", None).await;

    assert_eq!(status, StatusCode::OK);
    let numbers: Vec<u64> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["no"].as_u64().unwrap())
        .collect();
    assert_eq!(numbers, vec![6, 7, 8, 9, 10]);
    assert!(body[0].get("__v").is_none());

    let (_, first) = send(&app, Method::GET, "/api/v2/pokemon", None).await;
    assert_eq!(first.as_array().unwrap().len(), 10);
}

#[tokio::test]
async fn test_list_rejects_bad_query() {
    let app = app();

    let (zero, _) = send(&app, Method::GET, "/api/v2/pokemon?limit=0", None).await;
    let (word, _) = send(&app, Method::GET, "/api/v2/pokemon?offset=abc", None).await;

    assert_eq!(zero, StatusCode::BAD_REQUEST);
    assert_eq!(word, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_get_by_number_id_and_name() {
    let app = app();
    let created = create(&app, 25, "pikachu").await;
    let id = created["_id"].as_str().unwrap();

    for term in ["25", id, "PIKACHU"] {
        let (status, body) = send(&app, Method::GET, &format!("/api/v2/pokemon/{}", term), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["_id"], created["_id"]);
    }
}

#[tokio::test]
async fn test_get_missing_is_not_found() {
    let app = app();

    let (status, body) = send(&app, Method::GET, "/api/v2/pokemon/missingno", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    let error = error_body(body);
    assert_eq!(error.status_code, 404);
    assert_eq!(error.error, "Not Found");
    assert_eq!(error.message, "Pokemon with id/name missingno not found");
}

// =============================================================================
// Update / Delete
// =============================================================================

#[tokio::test]
async fn test_patch_updates_record() {
    let app = app();
    create(&app, 25, "pikachu").await;

    let (status, body) = send(
        &app,
        Method::PATCH,
        "/api/v2/pokemon/25",
        Some(json!({ "name": "Raichu" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], json!("raichu"));

    let (status, _) = send(&app, Method::GET, "/api/v2/pokemon/raichu", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_patch_conflict_is_bad_request() {
    let app = app();
    create(&app, 1, "bulbasaur").await;
    create(&app, 4, "charmander").await;

    let (status, _) = send(
        &app,
        Method::PATCH,
        "/api/v2/pokemon/charmander",
        Some(json!({ "no": 1 })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_record() {
    let app = app();
    let created = create(&app, 25, "pikachu").await;
    let uri = format!("/api/v2/pokemon/{}", created["_id"].as_str().unwrap());

    let (first, _) = send(&app, Method::DELETE, &uri, None).await;
    let (second, _) = send(&app, Method::DELETE, &uri, None).await;

    assert_eq!(first, StatusCode::OK);
    assert_eq!(second, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_invalid_id_is_bad_request() {
    let app = app();

    let (status, body) = send(&app, Method::DELETE, "/api/v2/pokemon/pikachu", None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_body(body).message, "pikachu is not a valid MongoID");
}

// =============================================================================
// Seed
// =============================================================================

#[tokio::test]
async fn test_seed_route() {
    let list = PokeResponse {
        count: 2,
        next: None,
        previous: None,
        results: vec![
            SmallPokemon {
                name: "bulbasaur".to_string(),
                url: "https://pokeapi.co/api/v2/pokemon/1/".to_string(),
            },
            SmallPokemon {
                name: "ivysaur".to_string(),
                url: "https://pokeapi.co/api/v2/pokemon/2/".to_string(),
            },
        ],
    };
    let upstream = Router::new().route(
        "/pokemon",
        get(move || {
            let list = list.clone();
            async move { Json(list) }
        }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, upstream).await.unwrap();
    });

    let app = app_with_seed_url(&format!("http://{}/pokemon", addr));

    let (status, body) = send(&app, Method::GET, "/api/v2/seed", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!("Seed Executed"));

    let (_, found) = send(&app, Method::GET, "/api/v2/pokemon/2", None).await;
    assert_eq!(found["name"], json!("ivysaur"));
}

#[tokio::test]
async fn test_seed_route_upstream_down_is_internal_error() {
    let app = app();

    let (status, body) = send(&app, Method::GET, "/api/v2/seed", None).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        error_body(body).message,
        "This is an error - check server logs"
    );
}
