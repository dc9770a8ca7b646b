use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    auth::{PublicUser, User},
    error::ApiError,
    ideas::{dto::IdeaView, repo_types::Idea},
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list))
        .route("/users/:id", get(find_one))
        .route("/users/:id/ideas", get(user_ideas))
}

#[instrument(skip(state))]
async fn list(State(state): State<AppState>) -> Result<Json<Vec<PublicUser>>, ApiError> {
    let users = User::list_all(&state.db).await?;
    Ok(Json(users.iter().map(PublicUser::from).collect()))
}

#[instrument(skip(state))]
async fn find_one(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PublicUser>, ApiError> {
    let user = User::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    Ok(Json(PublicUser::from(&user)))
}

#[instrument(skip(state))]
async fn user_ideas(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<IdeaView>>, ApiError> {
    if User::find_by_id(&state.db, id).await?.is_none() {
        return Err(ApiError::not_found("User not found"));
    }
    let ideas = Idea::list_by_creator(&state.db, id).await?;
    Ok(Json(
        ideas
            .iter()
            .map(|idea| IdeaView::from_idea(idea, None))
            .collect(),
    ))
}
