use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::ideas::repo_types::Idea;

/// Request body for creating an idea.
#[derive(Debug, Deserialize)]
pub struct CreateIdeaRequest {
    pub name: String,
    pub description: String,
}

/// `{id, username}` summary used for both creators and followers.
#[derive(Debug, Clone, Serialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub username: String,
}

/// Idea as returned to clients. `followers` only appears on the public
/// listing; single-idea responses omit it.
#[derive(Debug, Serialize)]
pub struct IdeaView {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub creator: UserSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub followers: Option<Vec<UserSummary>>,
}

impl IdeaView {
    pub fn from_idea(idea: &Idea, followers: Option<Vec<UserSummary>>) -> Self {
        Self {
            id: idea.id,
            name: idea.name.clone(),
            description: idea.description.clone(),
            created_at: idea.created_at,
            updated_at: idea.updated_at,
            creator: UserSummary {
                id: idea.creator_id,
                username: idea.creator_username.clone(),
            },
            followers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_idea() -> Idea {
        Idea {
            id: Uuid::new_v4(),
            creator_id: Uuid::new_v4(),
            name: "solar kettle".into(),
            description: "boil water with mirrors".into(),
            created_at: OffsetDateTime::now_utc(),
            updated_at: OffsetDateTime::now_utc(),
            creator_username: "sunny".into(),
        }
    }

    #[test]
    fn followers_field_omitted_when_absent() {
        let view = IdeaView::from_idea(&sample_idea(), None);
        let json = serde_json::to_string(&view).unwrap();
        assert!(!json.contains("followers"));
        assert!(json.contains("sunny"));
    }

    #[test]
    fn followers_field_present_when_listed() {
        let view = IdeaView::from_idea(
            &sample_idea(),
            Some(vec![UserSummary {
                id: Uuid::new_v4(),
                username: "fan".into(),
            }]),
        );
        let json = serde_json::to_string(&view).unwrap();
        assert!(json.contains("followers"));
        assert!(json.contains("fan"));
    }
}
