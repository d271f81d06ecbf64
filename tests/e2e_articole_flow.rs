use articole::{
    repository::Repository,
    rest::{router, AppState},
    storage::{Relation, SqliteStorage},
    types::{Articol, ArticolWithReferences, Reference},
};
use axum::{
    body::Body,
    http::{header::CONTENT_TYPE, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use tempfile::TempDir;
use tower::ServiceExt;

fn app(dir: &TempDir) -> Router {
    let storage = SqliteStorage::new(dir.path().join("articole.sqlite"), Relation::default());
    storage.init().expect("init storage");
    router(
        AppState::new(Repository::new(storage), dir.path().join("exported")),
        "http://localhost:3000".parse().unwrap(),
    )
}

async fn call(app: &Router, method: &str, uri: &str, json: Option<&str>) -> (StatusCode, Vec<u8>) {
    let mut request = Request::builder().method(method).uri(uri);
    let body = match json {
        Some(json) => {
            request = request.header(CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    let response = app
        .clone()
        .oneshot(request.body(body).unwrap())
        .await
        .expect("router call");
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, bytes.to_vec())
}

#[tokio::test]
async fn articol_with_one_reference_round_trip() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir);

    let (status, body) = call(
        &app,
        "POST",
        "/add-articol",
        Some(r#"{"ArticolTitlu":"Five Char Title","ArticolRezumat":"Longer summary text","ArticolData":"2024-01-01"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let articol: Articol = serde_json::from_slice(&body).unwrap();
    assert_eq!(articol.articol_id, 1);

    let (status, body) = call(
        &app,
        "POST",
        "/add-reference/1",
        Some(r#"{"ReferenceTitlu":"Ref Title One","ReferenceData":"2024-02-01","ListaAutori":"A. One"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let reference: Reference = serde_json::from_slice(&body).unwrap();
    assert_eq!(reference.reference_id, 1);
    assert_eq!(reference.articol_id, 1);

    let (status, body) = call(&app, "GET", "/get-articole-full", None).await;
    assert_eq!(status, StatusCode::OK);
    let full: Vec<ArticolWithReferences> = serde_json::from_slice(&body).unwrap();
    assert_eq!(full.len(), 1);
    assert_eq!(full[0].articol, articol);
    assert_eq!(full[0].references, vec![reference]);

    let raw: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(raw[0]["Reference"][0]["ListaAutori"], "A. One");
}

#[tokio::test]
async fn fetch_by_id_returns_what_was_created() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir);

    let (_, body) = call(
        &app,
        "POST",
        "/add-articol",
        Some(r#"{"ArticolTitlu":"Property title","ArticolRezumat":"Summary within bounds","ArticolData":"2020-02-29"}"#),
    )
    .await;
    let created: Articol = serde_json::from_slice(&body).unwrap();

    let (status, body) = call(&app, "GET", "/get-articole-by-id/1", None).await;
    assert_eq!(status, StatusCode::OK);
    let fetched: Articol = serde_json::from_slice(&body).unwrap();
    assert_eq!(fetched, created);
    assert_eq!(fetched.articol_titlu, "Property title");
    assert_eq!(fetched.articol_rezumat, "Summary within bounds");
    assert_eq!(fetched.articol_data.to_string(), "2020-02-29");
}

#[tokio::test]
async fn state_survives_a_new_router_over_the_same_file() {
    let dir = TempDir::new().unwrap();
    {
        let app = app(&dir);
        let (status, _) = call(
            &app,
            "POST",
            "/add-articol",
            Some(r#"{"ArticolTitlu":"Persisted title","ArticolRezumat":"Persisted summary","ArticolData":"2024-01-01"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let app = app(&dir);
    let (status, body) = call(&app, "GET", "/get-articole", None).await;
    assert_eq!(status, StatusCode::OK);
    let listed: Vec<Articol> = serde_json::from_slice(&body).unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].articol_titlu, "Persisted title");
}
