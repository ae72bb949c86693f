//! `/apples` resource handlers.
//!
//! Each handler takes the store lock for exactly one store call and clones
//! the result out before responding, so no lock is held across an await.

use apples_core::filter::{self, FilterOutcome};
use apples_core::{Apple, DeleteReceipt};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use super::AppState;
use crate::error::{ApiError, ErrorBody};
use crate::openapi::{AppleSchema, DeleteReceiptSchema};

/// Lists apples, narrowed and ordered by the query string.
///
/// A filter that cannot be evaluated (a bad pattern, or a key given twice)
/// still answers 200, with a single `{error, filter}` element in place of the
/// apples.
#[utoipa::path(
    get,
    path = "/apples",
    tag = "apples",
    params(
        ("sort" = Option<String>, Query, description = "Top-level field to sort by; prefix with `-` for descending"),
    ),
    responses(
        (status = 200, description = "Matching apples, or a one-element error payload if filtering failed", body = Vec<AppleSchema>),
    ),
)]
pub async fn list_apples(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Response {
    let outcome = {
        let store = state.store.lock();
        filter::apply_query(store.list(), &pairs)
    };
    match outcome {
        FilterOutcome::Matched(apples) => Json(apples).into_response(),
        FilterOutcome::Failed(failure) => Json(vec![failure]).into_response(),
    }
}

/// Returns one apple by name.
#[utoipa::path(
    get,
    path = "/apples/{name}",
    tag = "apples",
    params(("name" = String, Path, description = "The name of the apple")),
    responses(
        (status = 200, description = "The apple", body = AppleSchema),
        (status = 404, description = "No apple with that name", body = ErrorBody),
    ),
)]
pub async fn get_apple(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Apple>, ApiError> {
    let apple = state.store.lock().get(&name)?.clone();
    Ok(Json(apple))
}

/// Reports whether an apple exists without sending it.
#[utoipa::path(
    head,
    path = "/apples/{name}",
    tag = "apples",
    params(("name" = String, Path, description = "The name of the apple")),
    responses(
        (status = 200, description = "The apple exists"),
        (status = 404, description = "No apple with that name"),
    ),
)]
pub async fn head_apple(State(state): State<AppState>, Path(name): Path<String>) -> StatusCode {
    if state.store.lock().get(&name).is_ok() {
        StatusCode::OK
    } else {
        StatusCode::NOT_FOUND
    }
}

/// Adds a new apple at the end of the collection.
#[utoipa::path(
    post,
    path = "/apples",
    tag = "apples",
    request_body = AppleSchema,
    responses(
        (status = 200, description = "The created apple", body = AppleSchema),
        (status = 400, description = "An apple with that name already exists", body = ErrorBody),
    ),
)]
pub async fn create_apple(
    State(state): State<AppState>,
    payload: Result<Json<Apple>, JsonRejection>,
) -> Result<Json<Apple>, ApiError> {
    let Json(apple) = payload?;
    let created = state.store.lock().create(apple)?.clone();
    Ok(Json(created))
}

/// Replaces an apple wholesale. The body must keep the apple's name.
#[utoipa::path(
    put,
    path = "/apples/{name}",
    tag = "apples",
    params(("name" = String, Path, description = "The name of the apple")),
    request_body = AppleSchema,
    responses(
        (status = 200, description = "The replacement apple", body = AppleSchema),
        (status = 400, description = "Body name differs from the path name", body = ErrorBody),
        (status = 404, description = "No apple with that name", body = ErrorBody),
    ),
)]
pub async fn replace_apple(
    State(state): State<AppState>,
    Path(name): Path<String>,
    payload: Result<Json<Apple>, JsonRejection>,
) -> Result<Json<Apple>, ApiError> {
    let Json(apple) = payload?;
    if !apple.has_name(&name) {
        return Err(ApiError::NameMismatch);
    }
    let replaced = state.store.lock().replace(&name, apple)?.clone();
    Ok(Json(replaced))
}

/// Merges the body's fields into an apple, possibly renaming it.
#[utoipa::path(
    patch,
    path = "/apples/{name}",
    tag = "apples",
    params(("name" = String, Path, description = "The name of the apple")),
    request_body = AppleSchema,
    responses(
        (status = 200, description = "The merged apple", body = AppleSchema),
        (status = 400, description = "The new name belongs to another apple", body = ErrorBody),
        (status = 404, description = "No apple with that name", body = ErrorBody),
    ),
)]
pub async fn patch_apple(
    State(state): State<AppState>,
    Path(name): Path<String>,
    payload: Result<Json<Apple>, JsonRejection>,
) -> Result<Json<Apple>, ApiError> {
    let Json(partial) = payload?;
    let merged = state.store.lock().merge(&name, partial)?.clone();
    Ok(Json(merged))
}

/// Deletes an apple. Deleting a missing apple still succeeds.
#[utoipa::path(
    delete,
    path = "/apples/{name}",
    tag = "apples",
    params(("name" = String, Path, description = "The name of the apple")),
    responses(
        (status = 200, description = "Deletion confirmation", body = DeleteReceiptSchema),
    ),
)]
pub async fn delete_apple(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Json<DeleteReceipt> {
    Json(state.store.lock().delete(&name))
}
