use axum::{extract::State, http::StatusCode, routing::get, Router};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    dto::{CreatePerkRequest, MessageResponse, PerkListResponse, PerkResponse, UpdatePerkRequest},
    filter::{DirectoryFilter, DirectoryView},
    repo_types::Perk,
};
use crate::{
    auth::jwt::AuthUser,
    error::{AppError, AppResult},
    extract::{Json, Path, Query},
    state::AppState,
};

pub fn directory_routes() -> Router<AppState> {
    Router::new().route("/perks/all", get(list_directory))
}

pub fn perk_routes() -> Router<AppState> {
    Router::new()
        .route("/perks", get(list_mine).post(create_perk))
        .route(
            "/perks/:id",
            get(get_perk).put(update_perk).delete(delete_perk),
        )
}

fn parse_id(raw: &str) -> AppResult<Uuid> {
    raw.parse()
        .map_err(|_| AppError::Validation("Invalid perk id".into()))
}

/// Loads a perk and checks the caller owns it.
async fn owned_perk(state: &AppState, id: Uuid, user_id: Uuid) -> AppResult<Perk> {
    let perk = state
        .perks
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Perk not found".into()))?;
    if perk.created_by != user_id {
        warn!(%user_id, perk_id = %id, "perk owned by someone else");
        return Err(AppError::Forbidden("You do not own this perk".into()));
    }
    Ok(perk)
}

/// GET /perks/all?search=&merchant=
#[instrument(skip(state))]
pub async fn list_directory(
    State(state): State<AppState>,
    Query(filter): Query<DirectoryFilter>,
) -> AppResult<Json<DirectoryView>> {
    let all = state.perks.list().await?;
    Ok(Json(DirectoryView::build(all, &filter)))
}

#[instrument(skip(state))]
pub async fn list_mine(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<PerkListResponse>> {
    let perks = state.perks.list_by_owner(user_id).await?;
    Ok(Json(PerkListResponse { perks }))
}

#[instrument(skip(state))]
pub async fn get_perk(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<PerkResponse>> {
    let id = parse_id(&id)?;
    let perk = state
        .perks
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Perk not found".into()))?;
    Ok(Json(PerkResponse { perk }))
}

#[instrument(skip(state, body))]
pub async fn create_perk(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<CreatePerkRequest>,
) -> AppResult<(StatusCode, Json<PerkResponse>)> {
    let new = body.validate(user_id)?;
    let perk = state.perks.create(new).await?;
    info!(%user_id, perk_id = %perk.id, "perk created");
    Ok((StatusCode::CREATED, Json(PerkResponse { perk })))
}

#[instrument(skip(state, body))]
pub async fn update_perk(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
    Json(body): Json<UpdatePerkRequest>,
) -> AppResult<Json<PerkResponse>> {
    let id = parse_id(&id)?;
    let changes = body.validate()?;
    owned_perk(&state, id, user_id).await?;
    // a concurrent delete between the ownership check and the write surfaces as 404
    let perk = state
        .perks
        .update(id, changes)
        .await?
        .ok_or_else(|| AppError::NotFound("Perk not found".into()))?;
    info!(%user_id, perk_id = %id, "perk updated");
    Ok(Json(PerkResponse { perk }))
}

#[instrument(skip(state))]
pub async fn delete_perk(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    let id = parse_id(&id)?;
    owned_perk(&state, id, user_id).await?;
    if !state.perks.delete(id).await? {
        return Err(AppError::NotFound("Perk not found".into()));
    }
    info!(%user_id, perk_id = %id, "perk deleted");
    Ok(Json(MessageResponse {
        message: "Perk deleted".into(),
    }))
}
