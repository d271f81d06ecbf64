use std::{any::Any, net::SocketAddr, path::PathBuf};

use axum::{
    http::{
        header::{CONTENT_TYPE, ORIGIN},
        HeaderValue, Method,
    },
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer};

use crate::{repository::Repository, storage::Storage};

mod error;
mod handlers;
mod models;
mod payload;

use error::ApiError;
use handlers::{
    add_articol, add_reference, create_schema, delete_articol, delete_reference,
    export_articole_full, get_articol_by_id, get_articole, get_articole_filter, get_articole_full,
    get_articole_sortate_dupa_data, get_reference_by_articol, get_references,
    get_references_by_articol, health, not_found, update_articol, update_reference,
};

#[derive(Clone)]
pub struct AppState<S: Storage> {
    pub repo: Repository<S>,
    pub export_dir: PathBuf,
    pub started_at: std::time::SystemTime,
}

impl<S: Storage> AppState<S> {
    pub fn new(repo: Repository<S>, export_dir: PathBuf) -> Self {
        Self {
            repo,
            export_dir,
            started_at: std::time::SystemTime::now(),
        }
    }
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    log::error!("[ERROR]: handler panicked: {}", detail);
    ApiError::internal("500 - Server Error").into_response()
}

fn cors(origin: HeaderValue) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([CONTENT_TYPE, ORIGIN])
}

/// Fallback, panic guard and CORS shared by every route.
fn with_middleware(routes: Router, cors_origin: HeaderValue) -> Router {
    routes
        .fallback(not_found)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(cors(cors_origin))
}

pub fn router<S: Storage + Clone + Send + Sync + 'static>(
    state: AppState<S>,
    cors_origin: HeaderValue,
) -> Router {
    let routes = Router::new()
        .route("/health", get(health::<S>))
        .route("/create", get(create_schema::<S>))
        .route("/get-articole-full", get(get_articole_full::<S>))
        .route("/get-articole", get(get_articole::<S>))
        .route("/get-articole-by-id/:id", get(get_articol_by_id::<S>))
        .route("/get-references", get(get_references::<S>))
        .route(
            "/get-references-by-articol/:id_articol",
            get(get_references_by_articol::<S>),
        )
        .route(
            "/get-reference-by-articol/:id_articol/:id_reference",
            get(get_reference_by_articol::<S>),
        )
        .route("/get-articole-filter", get(get_articole_filter::<S>))
        .route(
            "/get-articole-sortate-dupa-data",
            get(get_articole_sortate_dupa_data::<S>),
        )
        .route("/export-articole-full", get(export_articole_full::<S>))
        .route("/add-articol", post(add_articol::<S>))
        .route("/add-reference/:id_articol", post(add_reference::<S>))
        .route("/update-articol/:id_articol", put(update_articol::<S>))
        .route(
            "/update-reference/:id_articol/:id_reference",
            put(update_reference::<S>),
        )
        .route("/delete-articol/:id_articol", delete(delete_articol::<S>))
        .route(
            "/delete-reference/:id_articol/:id_reference",
            delete(delete_reference::<S>),
        )
        .with_state(state);

    with_middleware(routes, cors_origin)
}

pub async fn serve<S: Storage + Clone + Send + Sync + 'static>(
    addr: SocketAddr,
    state: AppState<S>,
    cors_origin: HeaderValue,
    shutdown: tokio_util::sync::CancellationToken,
) -> anyhow::Result<()> {
    let app = router(state, cors_origin);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    log::info!("🌐 REST listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown.cancelled().await;
            log::info!("🛑 REST shutdown requested");
        })
        .await?;
    log::info!("👋 REST server exited");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{header::ACCESS_CONTROL_ALLOW_ORIGIN, Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    async fn boom() -> &'static str {
        panic!("handler exploded")
    }

    fn guarded() -> Router {
        with_middleware(
            Router::new().route("/boom", get(boom)),
            HeaderValue::from_static("http://localhost:3000"),
        )
    }

    #[tokio::test]
    async fn panics_become_json_500() {
        let response = guarded()
            .oneshot(Request::builder().uri("/boom").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let payload: models::ErrorResponse = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(payload.message, "500 - Server Error");
    }

    #[tokio::test]
    async fn cors_allows_configured_origin() {
        let response = guarded()
            .oneshot(
                Request::builder()
                    .method("OPTIONS")
                    .uri("/boom")
                    .header("origin", "http://localhost:3000")
                    .header("access-control-request-method", "GET")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(
            response.headers().get(ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "http://localhost:3000"
        );
    }
}
