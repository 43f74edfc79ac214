use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    db::Session,
    error::ApiError,
    notes::dto::{NoteCreate, NoteResponse, Pagination},
    notes::repo,
    state::AppState,
};

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/notes", get(list_notes))
        .route("/notes/:id", get(get_note))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/notes", post(create_note))
        .route("/notes/:id", put(update_note).delete(delete_note))
}

// The notes table caps titles at 255 characters.
fn check_title(title: &str) -> Result<(), ApiError> {
    if title.chars().count() > 255 {
        warn!("title too long");
        return Err(ApiError::BadRequest("Title too long"));
    }
    Ok(())
}

#[instrument(skip(state, payload))]
pub async fn create_note(
    State(state): State<AppState>,
    Json(payload): Json<NoteCreate>,
) -> Result<(StatusCode, Json<NoteResponse>), ApiError> {
    check_title(&payload.title)?;

    let mut session = Session::begin(&state.db).await?;
    let note = repo::insert(&mut session, &payload.title, &payload.content).await?;
    session.commit().await?;

    info!(note_id = note.id, "note created");
    Ok((StatusCode::CREATED, Json(note.into())))
}

#[instrument(skip(state))]
pub async fn list_notes(
    State(state): State<AppState>,
    Query(p): Query<Pagination>,
) -> Result<Json<Vec<NoteResponse>>, ApiError> {
    let mut session = Session::begin(&state.db).await?;
    let notes = repo::list(&mut session, p.limit, p.skip).await?;
    Ok(Json(notes.into_iter().map(NoteResponse::from).collect()))
}

#[instrument(skip(state))]
pub async fn get_note(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<NoteResponse>, ApiError> {
    let mut session = Session::begin(&state.db).await?;
    match repo::find(&mut session, id).await? {
        Some(note) => Ok(Json(note.into())),
        None => Err(ApiError::NotFound("Note")),
    }
}

#[instrument(skip(state, payload))]
pub async fn update_note(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<NoteCreate>,
) -> Result<Json<NoteResponse>, ApiError> {
    check_title(&payload.title)?;

    let mut session = Session::begin(&state.db).await?;
    let updated = repo::update(&mut session, id, &payload.title, &payload.content).await?;
    let note = updated.ok_or(ApiError::NotFound("Note"))?;
    session.commit().await?;

    info!(note_id = note.id, "note updated");
    Ok(Json(note.into()))
}

#[instrument(skip(state))]
pub async fn delete_note(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let mut session = Session::begin(&state.db).await?;
    if !repo::delete(&mut session, id).await? {
        return Err(ApiError::NotFound("Note"));
    }
    session.commit().await?;

    info!(note_id = id, "note deleted");
    Ok(StatusCode::NO_CONTENT)
}
