use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, Statement,
};
use tracing::debug;

use crate::{
    db::now_sec,
    entities::follow,
    error::{AppError, AppResult},
};

/// Counts the edge a -> b joined against its reverse b -> a, so the result is
/// 1 only when both directions are stored.
const MUTUAL_FOLLOW_SQL: &str = "SELECT COUNT(*) AS edges \
     FROM follows f \
     JOIN follows r ON r.follower_id = f.following_id AND r.following_id = f.follower_id \
     WHERE f.follower_id = ? AND f.following_id = ?";

#[derive(Clone)]
pub struct FollowStore {
    db: DatabaseConnection,
}

impl FollowStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn exists(&self, follower_id: i32, following_id: i32) -> AppResult<bool> {
        let count = follow::Entity::find()
            .filter(follow::Column::FollowerId.eq(follower_id))
            .filter(follow::Column::FollowingId.eq(following_id))
            .count(&self.db)
            .await?;
        Ok(count > 0)
    }

    pub async fn find(
        &self,
        follower_id: i32,
        following_id: i32,
    ) -> AppResult<Option<follow::Model>> {
        Ok(follow::Entity::find()
            .filter(follow::Column::FollowerId.eq(follower_id))
            .filter(follow::Column::FollowingId.eq(following_id))
            .one(&self.db)
            .await?)
    }

    /// Stores the edge. Self-follows are rejected here; a repeated edge hits
    /// the unique index and comes back as `AppError::Conflict`.
    pub async fn follow(&self, follower_id: i32, following_id: i32) -> AppResult<follow::Model> {
        if follower_id == following_id {
            return Err(AppError::bad_request("users cannot follow themselves"));
        }

        let model = follow::ActiveModel {
            id: Default::default(),
            follower_id: Set(follower_id),
            following_id: Set(following_id),
            created_at: Set(now_sec()),
        }
        .insert(&self.db)
        .await?;

        debug!(follower_id, following_id, "follow created");
        Ok(model)
    }

    pub async fn unfollow(&self, follower_id: i32, following_id: i32) -> AppResult<bool> {
        let res = follow::Entity::delete_many()
            .filter(follow::Column::FollowerId.eq(follower_id))
            .filter(follow::Column::FollowingId.eq(following_id))
            .exec(&self.db)
            .await?;

        debug!(follower_id, following_id, deleted = res.rows_affected, "unfollow");
        Ok(res.rows_affected > 0)
    }

    /// Edges from `user_id` to the users they follow, newest first.
    pub async fn following_of(&self, user_id: i32) -> AppResult<Vec<follow::Model>> {
        Ok(follow::Entity::find()
            .filter(follow::Column::FollowerId.eq(user_id))
            .order_by_desc(follow::Column::CreatedAt)
            .order_by_desc(follow::Column::Id)
            .all(&self.db)
            .await?)
    }

    /// Edges pointing at `user_id`, newest first.
    pub async fn followers_of(&self, user_id: i32) -> AppResult<Vec<follow::Model>> {
        Ok(follow::Entity::find()
            .filter(follow::Column::FollowingId.eq(user_id))
            .order_by_desc(follow::Column::CreatedAt)
            .order_by_desc(follow::Column::Id)
            .all(&self.db)
            .await?)
    }

    pub async fn count_following(&self, user_id: i32) -> AppResult<u64> {
        Ok(follow::Entity::find()
            .filter(follow::Column::FollowerId.eq(user_id))
            .count(&self.db)
            .await?)
    }

    pub async fn count_followers(&self, user_id: i32) -> AppResult<u64> {
        Ok(follow::Entity::find()
            .filter(follow::Column::FollowingId.eq(user_id))
            .count(&self.db)
            .await?)
    }

    pub async fn is_mutual(&self, user_a: i32, user_b: i32) -> AppResult<bool> {
        let row = self
            .db
            .query_one(Statement::from_sql_and_values(
                self.db.get_database_backend(),
                MUTUAL_FOLLOW_SQL,
                [user_a.into(), user_b.into()],
            ))
            .await?;

        let edges = match row {
            Some(row) => row.try_get::<i64>("", "edges")?,
            None => 0,
        };
        Ok(edges > 0)
    }

    /// Most recent edges created by any of `follower_ids`, for activity feeds.
    pub async fn recent_by_followers(
        &self,
        follower_ids: &[i32],
        limit: u64,
    ) -> AppResult<Vec<follow::Model>> {
        if follower_ids.is_empty() {
            return Ok(Vec::new());
        }

        Ok(follow::Entity::find()
            .filter(follow::Column::FollowerId.is_in(follower_ids.iter().copied()))
            .order_by_desc(follow::Column::CreatedAt)
            .order_by_desc(follow::Column::Id)
            .limit(limit)
            .all(&self.db)
            .await?)
    }
}
