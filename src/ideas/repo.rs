use sqlx::PgPool;
use uuid::Uuid;

use crate::ideas::repo_types::{Idea, IdeaFollower};

const IDEA_SELECT: &str = r#"
    SELECT i.id, i.creator_id, i.name, i.description, i.created_at, i.updated_at,
           u.username AS creator_username
    FROM ideas i
    JOIN users u ON u.id = i.creator_id
"#;

impl Idea {
    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Idea>> {
        let idea = sqlx::query_as::<_, Idea>(&format!("{IDEA_SELECT} WHERE i.id = $1"))
            .bind(id)
            .fetch_optional(db)
            .await?;
        Ok(idea)
    }

    pub async fn find_by_creator_and_name(
        db: &PgPool,
        creator_id: Uuid,
        name: &str,
    ) -> anyhow::Result<Option<Idea>> {
        let idea = sqlx::query_as::<_, Idea>(&format!(
            "{IDEA_SELECT} WHERE i.creator_id = $1 AND i.name = $2"
        ))
        .bind(creator_id)
        .bind(name)
        .fetch_optional(db)
        .await?;
        Ok(idea)
    }

    pub async fn create(
        db: &PgPool,
        creator_id: Uuid,
        name: &str,
        description: &str,
    ) -> anyhow::Result<Idea> {
        let idea = sqlx::query_as::<_, Idea>(
            r#"
            WITH inserted AS (
                INSERT INTO ideas (creator_id, name, description)
                VALUES ($1, $2, $3)
                RETURNING id, creator_id, name, description, created_at, updated_at
            )
            SELECT i.id, i.creator_id, i.name, i.description, i.created_at, i.updated_at,
                   u.username AS creator_username
            FROM inserted i
            JOIN users u ON u.id = i.creator_id
            "#,
        )
        .bind(creator_id)
        .bind(name)
        .bind(description)
        .fetch_one(db)
        .await?;
        Ok(idea)
    }

    pub async fn list_all(db: &PgPool) -> anyhow::Result<Vec<Idea>> {
        let ideas = sqlx::query_as::<_, Idea>(&format!("{IDEA_SELECT} ORDER BY i.created_at"))
            .fetch_all(db)
            .await?;
        Ok(ideas)
    }

    pub async fn list_by_creator(db: &PgPool, creator_id: Uuid) -> anyhow::Result<Vec<Idea>> {
        let ideas = sqlx::query_as::<_, Idea>(&format!(
            "{IDEA_SELECT} WHERE i.creator_id = $1 ORDER BY i.created_at"
        ))
        .bind(creator_id)
        .fetch_all(db)
        .await?;
        Ok(ideas)
    }
}

impl IdeaFollower {
    /// Followers across all ideas, for assembling the public listing.
    pub async fn list_all(db: &PgPool) -> anyhow::Result<Vec<IdeaFollower>> {
        let rows = sqlx::query_as::<_, IdeaFollower>(
            r#"
            SELECT f.idea_id, f.user_id, u.username
            FROM idea_followers f
            JOIN users u ON u.id = f.user_id
            "#,
        )
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    /// Idempotent: following an already-followed idea changes nothing.
    pub async fn follow(db: &PgPool, idea_id: Uuid, user_id: Uuid) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO idea_followers (idea_id, user_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(idea_id)
        .bind(user_id)
        .execute(db)
        .await?;
        Ok(())
    }

    /// Idempotent: unfollowing an idea the user never followed is a no-op.
    pub async fn unfollow(db: &PgPool, idea_id: Uuid, user_id: Uuid) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            DELETE FROM idea_followers WHERE idea_id = $1 AND user_id = $2
            "#,
        )
        .bind(idea_id)
        .bind(user_id)
        .execute(db)
        .await?;
        Ok(())
    }
}
