use axum::{
    extract::{Path, Query, State},
    http::{
        header::{CONTENT_DISPOSITION, CONTENT_TYPE},
        StatusCode,
    },
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::{
    export::DOWNLOAD_FILE_NAME,
    repository::RepoResult,
    storage::Storage,
    types::{ArticolFilter, ArticolInput, ArticolPatch, ReferenceInput, ReferencePatch},
};

use super::{
    error::ApiError,
    models::{ErrorResponse, HealthResponse, MessageResponse},
    payload::Payload,
    AppState,
};

fn reply<T: Serialize>(status: StatusCode, result: RepoResult<T>) -> Response {
    match result {
        Ok(value) => (status, Json(value)).into_response(),
        Err(err) => ApiError::from(err).into_response(),
    }
}

pub async fn health<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
) -> impl IntoResponse {
    let uptime_secs = state.started_at.elapsed().map(|d| d.as_secs()).unwrap_or(0);
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok".to_string(),
            uptime_secs,
        }),
    )
}

pub async fn create_schema<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
) -> Response {
    match state.repo.recreate_schema() {
        Ok(()) => (
            StatusCode::CREATED,
            Json(MessageResponse {
                message: "Database created with the models.".to_string(),
            }),
        )
            .into_response(),
        Err(err) => ApiError::from(err).into_response(),
    }
}

pub async fn get_articole_full<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
) -> Response {
    reply(StatusCode::OK, state.repo.list_articole_full())
}

pub async fn get_articole<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
) -> Response {
    reply(StatusCode::OK, state.repo.list_articole())
}

pub async fn get_articol_by_id<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    Path(id): Path<i64>,
) -> Response {
    reply(StatusCode::OK, state.repo.get_articol(id))
}

pub async fn get_references<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
) -> Response {
    reply(StatusCode::OK, state.repo.list_references())
}

pub async fn get_references_by_articol<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    Path(id_articol): Path<i64>,
) -> Response {
    reply(StatusCode::OK, state.repo.list_references_by_articol(id_articol))
}

pub async fn get_reference_by_articol<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    Path((id_articol, id_reference)): Path<(i64, i64)>,
) -> Response {
    reply(
        StatusCode::OK,
        state.repo.get_reference(id_articol, id_reference),
    )
}

pub async fn get_articole_filter<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    Query(filter): Query<ArticolFilter>,
) -> Response {
    reply(StatusCode::OK, state.repo.filter_articole(&filter))
}

pub async fn get_articole_sortate_dupa_data<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
) -> Response {
    reply(StatusCode::OK, state.repo.list_articole_by_date())
}

pub async fn export_articole_full<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
) -> Response {
    let repo = state.repo.clone();
    let dir = state.export_dir.clone();

    let path = match tokio::task::spawn_blocking(move || repo.export_full(&dir)).await {
        Ok(Ok(path)) => path,
        Ok(Err(err)) => return ApiError::from(err).into_response(),
        Err(err) => {
            log::error!("Export task failed: {}", err);
            return ApiError::internal("500 - Server Error").into_response();
        }
    };

    match tokio::fs::read(&path).await {
        Ok(bytes) => (
            [
                (CONTENT_TYPE, "application/json".to_string()),
                (
                    CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", DOWNLOAD_FILE_NAME),
                ),
            ],
            bytes,
        )
            .into_response(),
        Err(err) => {
            log::error!("Failed to read export {}: {}", path.display(), err);
            ApiError::internal("500 - Server Error").into_response()
        }
    }
}

pub async fn add_articol<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    Payload(input): Payload<ArticolInput>,
) -> Response {
    match state.repo.create_articol(&input) {
        Ok(articol) => (StatusCode::CREATED, Json(articol)).into_response(),
        Err(err) => ApiError::from(err)
            .or_internal("Internal server error! Could not insert articol!")
            .into_response(),
    }
}

pub async fn add_reference<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    Path(id_articol): Path<i64>,
    Payload(input): Payload<ReferenceInput>,
) -> Response {
    match state.repo.create_reference(id_articol, &input) {
        Ok(reference) => (StatusCode::CREATED, Json(reference)).into_response(),
        Err(err) => ApiError::from(err)
            .or_internal("Internal server error! Could not insert reference!")
            .into_response(),
    }
}

pub async fn update_articol<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    Path(id_articol): Path<i64>,
    Payload(patch): Payload<ArticolPatch>,
) -> Response {
    reply(StatusCode::OK, state.repo.update_articol(id_articol, &patch))
}

pub async fn update_reference<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    Path((id_articol, id_reference)): Path<(i64, i64)>,
    Payload(patch): Payload<ReferencePatch>,
) -> Response {
    reply(
        StatusCode::OK,
        state
            .repo
            .update_reference(id_articol, id_reference, &patch),
    )
}

pub async fn delete_articol<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    Path(id_articol): Path<i64>,
) -> Response {
    reply(StatusCode::OK, state.repo.delete_articol(id_articol))
}

pub async fn delete_reference<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    Path((id_articol, id_reference)): Path<(i64, i64)>,
) -> Response {
    reply(
        StatusCode::OK,
        state.repo.delete_reference(id_articol, id_reference),
    )
}

pub async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            message: "endpoint not found".to_string(),
            fields: Vec::new(),
        }),
    )
}
