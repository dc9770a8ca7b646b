use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Idea row joined with its creator's username.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Idea {
    pub id: Uuid,
    pub creator_id: Uuid,
    pub name: String,
    pub description: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub creator_username: String,
}

/// One follower of one idea, used to assemble follower lists.
#[derive(Debug, Clone, FromRow)]
pub struct IdeaFollower {
    pub idea_id: Uuid,
    pub user_id: Uuid,
    pub username: String,
}
