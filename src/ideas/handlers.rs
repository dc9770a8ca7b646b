use std::collections::HashMap;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::{AuthUser, User},
    error::ApiError,
    ideas::{
        dto::{CreateIdeaRequest, IdeaView, UserSummary},
        repo_types::{Idea, IdeaFollower},
    },
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/ideas", post(create).get(list))
        .route("/ideas/:id/follow", post(follow))
        .route("/ideas/:id/unfollow", post(unfollow))
}

fn validate_idea(payload: &CreateIdeaRequest) -> Result<(), ApiError> {
    let name_len = payload.name.chars().count();
    if name_len < 2 {
        return Err(ApiError::validation(
            "Name must be at least 2 characters long",
        ));
    }
    if name_len > 40 {
        return Err(ApiError::validation(
            "Name must be shorter than 40 characters",
        ));
    }
    if payload.description.chars().count() < 3 {
        return Err(ApiError::validation(
            "Description must be at least 3 characters long",
        ));
    }
    Ok(())
}

#[instrument(skip(state, payload))]
async fn create(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<CreateIdeaRequest>,
) -> Result<(StatusCode, Json<IdeaView>), ApiError> {
    validate_idea(&payload)?;

    if User::find_by_id(&state.db, user_id).await?.is_none() {
        return Err(ApiError::not_found("User not found"));
    }
    if Idea::find_by_creator_and_name(&state.db, user_id, &payload.name)
        .await?
        .is_some()
    {
        return Err(ApiError::conflict("Idea already exists"));
    }

    let idea = Idea::create(&state.db, user_id, &payload.name, &payload.description).await?;
    info!(idea_id = %idea.id, user_id = %user_id, "idea created");
    Ok((
        StatusCode::CREATED,
        Json(IdeaView::from_idea(&idea, None)),
    ))
}

/// Public listing with creator and follower summaries.
#[instrument(skip(state))]
async fn list(State(state): State<AppState>) -> Result<Json<Vec<IdeaView>>, ApiError> {
    let ideas = Idea::list_all(&state.db).await?;
    let mut followers: HashMap<Uuid, Vec<UserSummary>> = HashMap::new();
    for row in IdeaFollower::list_all(&state.db).await? {
        followers.entry(row.idea_id).or_default().push(UserSummary {
            id: row.user_id,
            username: row.username,
        });
    }

    let views = ideas
        .iter()
        .map(|idea| {
            let list = followers.remove(&idea.id).unwrap_or_default();
            IdeaView::from_idea(idea, Some(list))
        })
        .collect();
    Ok(Json(views))
}

#[instrument(skip(state))]
async fn follow(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<IdeaView>, ApiError> {
    let idea = Idea::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Idea not found"))?;
    if User::find_by_id(&state.db, user_id).await?.is_none() {
        return Err(ApiError::not_found("User not found"));
    }

    IdeaFollower::follow(&state.db, idea.id, user_id).await?;
    info!(idea_id = %idea.id, user_id = %user_id, "idea followed");
    Ok(Json(IdeaView::from_idea(&idea, None)))
}

#[instrument(skip(state))]
async fn unfollow(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<IdeaView>, ApiError> {
    let idea = Idea::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Idea not found"))?;

    IdeaFollower::unfollow(&state.db, idea.id, user_id).await?;
    info!(idea_id = %idea.id, user_id = %user_id, "idea unfollowed");
    Ok(Json(IdeaView::from_idea(&idea, None)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> CreateIdeaRequest {
        CreateIdeaRequest {
            name: "solar kettle".into(),
            description: "boil water with mirrors".into(),
        }
    }

    #[test]
    fn idea_validation_enforces_field_rules() {
        assert!(validate_idea(&base()).is_ok());

        let mut bad = base();
        bad.name = "x".into();
        assert!(validate_idea(&bad).is_err());

        let mut bad = base();
        bad.name = "x".repeat(41);
        assert!(validate_idea(&bad).is_err());

        let mut bad = base();
        bad.description = "ab".into();
        assert!(validate_idea(&bad).is_err());
    }
}
