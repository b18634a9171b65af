use sea_orm::entity::prelude::*;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "viewing_records")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: i32,
    pub tmdb_movie_id: i32,
    pub movie_title: String,
    #[serde(skip)]
    pub movie_title_folded: String,
    #[sea_orm(column_type = "Double")]
    pub rating: f64,
    /// ISO `YYYY-MM-DD`; lexical order is date order.
    pub viewing_date: String,
    pub theater: Option<String>,
    pub created_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
}

impl ActiveModelBehavior for ActiveModel {}
