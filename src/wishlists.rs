use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Select, Set,
};
use tracing::debug;

use crate::{db::now_sec, entities::wishlist, error::AppResult};

const RECENT_LIMIT: u64 = 10;

#[derive(Clone)]
pub struct WishlistStore {
    db: DatabaseConnection,
}

impl WishlistStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// A movie already on the list comes back as `AppError::Conflict`.
    pub async fn add(&self, user_id: i32, tmdb_movie_id: i32) -> AppResult<wishlist::Model> {
        let model = wishlist::ActiveModel {
            id: Default::default(),
            user_id: Set(user_id),
            tmdb_movie_id: Set(tmdb_movie_id),
            created_at: Set(now_sec()),
        }
        .insert(&self.db)
        .await?;

        debug!(user_id, tmdb_movie_id, "added to wishlist");
        Ok(model)
    }

    pub async fn list_for_user(&self, user_id: i32) -> AppResult<Vec<wishlist::Model>> {
        Ok(newest_first(user_id).all(&self.db).await?)
    }

    pub async fn recent_for_user(&self, user_id: i32) -> AppResult<Vec<wishlist::Model>> {
        Ok(newest_first(user_id).limit(RECENT_LIMIT).all(&self.db).await?)
    }

    pub async fn exists(&self, user_id: i32, tmdb_movie_id: i32) -> AppResult<bool> {
        let count = entry(user_id, tmdb_movie_id).count(&self.db).await?;
        Ok(count > 0)
    }

    pub async fn find(
        &self,
        user_id: i32,
        tmdb_movie_id: i32,
    ) -> AppResult<Option<wishlist::Model>> {
        Ok(entry(user_id, tmdb_movie_id).one(&self.db).await?)
    }

    pub async fn count_for_user(&self, user_id: i32) -> AppResult<u64> {
        Ok(wishlist::Entity::find()
            .filter(wishlist::Column::UserId.eq(user_id))
            .count(&self.db)
            .await?)
    }

    pub async fn remove(&self, user_id: i32, tmdb_movie_id: i32) -> AppResult<bool> {
        let res = wishlist::Entity::delete_many()
            .filter(wishlist::Column::UserId.eq(user_id))
            .filter(wishlist::Column::TmdbMovieId.eq(tmdb_movie_id))
            .exec(&self.db)
            .await?;

        debug!(user_id, tmdb_movie_id, deleted = res.rows_affected, "removed from wishlist");
        Ok(res.rows_affected > 0)
    }
}

fn newest_first(user_id: i32) -> Select<wishlist::Entity> {
    wishlist::Entity::find()
        .filter(wishlist::Column::UserId.eq(user_id))
        .order_by_desc(wishlist::Column::CreatedAt)
        .order_by_desc(wishlist::Column::Id)
}

fn entry(user_id: i32, tmdb_movie_id: i32) -> Select<wishlist::Entity> {
    wishlist::Entity::find()
        .filter(wishlist::Column::UserId.eq(user_id))
        .filter(wishlist::Column::TmdbMovieId.eq(tmdb_movie_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{db::test_db, error::AppError, users::UserStore};

    async fn setup() -> (WishlistStore, i32) {
        let db = test_db().await;
        let user = UserStore::new(db.clone()).create("alice").await.unwrap();
        (WishlistStore::new(db), user.id)
    }

    #[tokio::test]
    async fn add_find_remove() {
        let (wishlist, user) = setup().await;

        let added = wishlist.add(user, 550).await.unwrap();
        assert!(wishlist.exists(user, 550).await.unwrap());
        assert_eq!(wishlist.find(user, 550).await.unwrap(), Some(added));
        assert_eq!(wishlist.find(user, 551).await.unwrap(), None);

        assert!(wishlist.remove(user, 550).await.unwrap());
        assert!(!wishlist.remove(user, 550).await.unwrap());
        assert!(!wishlist.exists(user, 550).await.unwrap());
    }

    #[tokio::test]
    async fn same_movie_twice_conflicts() {
        let (wishlist, user) = setup().await;
        wishlist.add(user, 550).await.unwrap();
        assert!(matches!(wishlist.add(user, 550).await, Err(AppError::Conflict(_))));
        assert_eq!(wishlist.count_for_user(user).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn recent_is_capped_at_ten_newest() {
        let (wishlist, user) = setup().await;
        for movie in 1..=12 {
            wishlist.add(user, movie).await.unwrap();
        }

        let all: Vec<i32> =
            wishlist.list_for_user(user).await.unwrap().iter().map(|w| w.tmdb_movie_id).collect();
        assert_eq!(all, (1..=12).rev().collect::<Vec<_>>());

        let recent: Vec<i32> =
            wishlist.recent_for_user(user).await.unwrap().iter().map(|w| w.tmdb_movie_id).collect();
        assert_eq!(recent, (3..=12).rev().collect::<Vec<_>>());

        assert_eq!(wishlist.count_for_user(user).await.unwrap(), 12);
    }
}
