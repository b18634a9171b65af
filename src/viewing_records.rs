use jiff::civil::Date;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Select, Set,
    sea_query::{Expr, Func, SimpleExpr},
};
use tracing::debug;

use crate::{
    db::now_sec,
    entities::viewing_record,
    error::{AppError, AppResult},
    models::{NewViewingRecord, Page},
    search::{fold, folded_contains},
};

pub const MAX_PER_PAGE: u64 = 100;

#[derive(Clone)]
pub struct ViewingRecordStore {
    db: DatabaseConnection,
}

impl ViewingRecordStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn create(&self, record: NewViewingRecord) -> AppResult<viewing_record::Model> {
        record.validate()?;

        let theater = record.theater.map(|t| t.trim().to_string()).filter(|t| !t.is_empty());
        let movie_title = record.movie_title.trim().to_string();
        let model = viewing_record::ActiveModel {
            id: Default::default(),
            user_id: Set(record.user_id),
            tmdb_movie_id: Set(record.tmdb_movie_id),
            movie_title_folded: Set(fold(&movie_title)),
            movie_title: Set(movie_title),
            rating: Set(record.rating),
            viewing_date: Set(record.viewing_date.to_string()),
            theater: Set(theater),
            created_at: Set(now_sec()),
        }
        .insert(&self.db)
        .await?;

        debug!(user_id = model.user_id, tmdb_movie_id = model.tmdb_movie_id, "logged viewing");
        Ok(model)
    }

    pub async fn list_for_user(&self, user_id: i32) -> AppResult<Vec<viewing_record::Model>> {
        Ok(for_user(user_id).all(&self.db).await?)
    }

    /// Zero-based page of a user's records, most recent viewing first.
    /// `per_page` is capped at [`MAX_PER_PAGE`]; a page whose row offset does
    /// not fit in an SQL integer is rejected.
    pub async fn page_for_user(
        &self,
        user_id: i32,
        page: u64,
        per_page: u64,
    ) -> AppResult<Page<viewing_record::Model>> {
        if per_page == 0 {
            return Err(AppError::bad_request("per_page must be positive"));
        }
        let per_page = per_page.min(MAX_PER_PAGE);
        if page.checked_mul(per_page).is_none_or(|offset| offset > i64::MAX as u64) {
            return Err(AppError::bad_request("page is out of range"));
        }

        let paginator = for_user(user_id).paginate(&self.db, per_page);
        let totals = paginator.num_items_and_pages().await?;
        let items = paginator.fetch_page(page).await?;

        Ok(Page {
            items,
            page,
            per_page,
            total_items: totals.number_of_items,
            total_pages: totals.number_of_pages,
        })
    }

    pub async fn exists(&self, user_id: i32, tmdb_movie_id: i32) -> AppResult<bool> {
        let count = viewing_record::Entity::find()
            .filter(viewing_record::Column::UserId.eq(user_id))
            .filter(viewing_record::Column::TmdbMovieId.eq(tmdb_movie_id))
            .count(&self.db)
            .await?;
        Ok(count > 0)
    }

    pub async fn with_min_rating(
        &self,
        user_id: i32,
        min_rating: f64,
    ) -> AppResult<Vec<viewing_record::Model>> {
        Ok(for_user(user_id)
            .filter(viewing_record::Column::Rating.gte(min_rating))
            .all(&self.db)
            .await?)
    }

    /// Records viewed between `from` and `to`, both inclusive.
    pub async fn between(
        &self,
        user_id: i32,
        from: Date,
        to: Date,
    ) -> AppResult<Vec<viewing_record::Model>> {
        Ok(for_user(user_id)
            .filter(viewing_record::Column::ViewingDate.between(from.to_string(), to.to_string()))
            .all(&self.db)
            .await?)
    }

    pub async fn search_title(
        &self,
        user_id: i32,
        query: &str,
    ) -> AppResult<Vec<viewing_record::Model>> {
        Ok(for_user(user_id)
            .filter(folded_contains(viewing_record::Column::MovieTitleFolded, query))
            .all(&self.db)
            .await?)
    }

    pub async fn count_for_user(&self, user_id: i32) -> AppResult<u64> {
        Ok(viewing_record::Entity::find()
            .filter(viewing_record::Column::UserId.eq(user_id))
            .count(&self.db)
            .await?)
    }

    /// `None` when the user has no records.
    pub async fn average_rating(&self, user_id: i32) -> AppResult<Option<f64>> {
        let average: Option<Option<f64>> = viewing_record::Entity::find()
            .select_only()
            .column_as(
                SimpleExpr::from(Func::avg(Expr::col(viewing_record::Column::Rating))),
                "average",
            )
            .filter(viewing_record::Column::UserId.eq(user_id))
            .into_tuple()
            .one(&self.db)
            .await?;
        Ok(average.flatten())
    }

    pub async fn with_theater(&self, user_id: i32) -> AppResult<Vec<viewing_record::Model>> {
        Ok(for_user(user_id)
            .filter(viewing_record::Column::Theater.is_not_null())
            .filter(viewing_record::Column::Theater.ne(""))
            .all(&self.db)
            .await?)
    }
}

fn for_user(user_id: i32) -> Select<viewing_record::Entity> {
    viewing_record::Entity::find()
        .filter(viewing_record::Column::UserId.eq(user_id))
        .order_by_desc(viewing_record::Column::ViewingDate)
        .order_by_desc(viewing_record::Column::Id)
}
