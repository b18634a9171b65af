use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use tracing::debug;

use crate::{
    db::now_sec,
    entities::user,
    error::{AppError, AppResult},
};

#[derive(Clone)]
pub struct UserStore {
    db: DatabaseConnection,
}

impl UserStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn create(&self, username: &str) -> AppResult<user::Model> {
        let username = username.trim();
        if username.is_empty() {
            return Err(AppError::bad_request("username is required"));
        }

        let model = user::ActiveModel {
            id: Default::default(),
            username: Set(username.to_string()),
            created_at: Set(now_sec()),
        }
        .insert(&self.db)
        .await?;

        debug!(user_id = model.id, username = %model.username, "created user");
        Ok(model)
    }

    pub async fn find(&self, id: i32) -> AppResult<Option<user::Model>> {
        Ok(user::Entity::find_by_id(id).one(&self.db).await?)
    }
}
