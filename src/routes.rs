use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use jiff::civil::Date;
use serde::{Deserialize, Serialize};

use crate::{
    AppState,
    entities::{follow, theater, user, viewing_record, wishlist},
    error::{AppError, AppResult},
    models::{BoundingBox, NewViewingRecord, TheaterSearch, UserProfile},
    tmdb::{PagedResponse, ProductionCompany, TmdbMovie},
};

const DEFAULT_PER_PAGE: u64 = 20;
const DEFAULT_FEED_LIMIT: u64 = 20;
const MAX_FEED_LIMIT: u64 = 100;
const DEFAULT_RADIUS_KM: f64 = 5.0;

type AppStateRef = State<Arc<AppState>>;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/users", axum::routing::post(create_user))
        .route("/users/{id}", get(get_user))
        .route("/users/{id}/profile", get(profile))
        .route("/users/{id}/following", get(following))
        .route("/users/{id}/followers", get(followers))
        .route(
            "/users/{id}/following/{target}",
            get(follow_status).post(follow_user).delete(unfollow_user),
        )
        .route("/users/{id}/feed", get(feed))
        .route("/users/{id}/records", get(list_records).post(create_record))
        .route("/users/{id}/wishlist", get(list_wishlist))
        .route("/users/{id}/wishlist/recent", get(recent_wishlist))
        .route(
            "/users/{id}/wishlist/{movie}",
            get(get_wishlist_entry).post(add_to_wishlist).delete(remove_from_wishlist),
        )
        .route("/theaters", get(search_theaters))
        .route("/theaters/nearby", get(nearby_theaters))
        .route("/theaters/prefectures", get(prefectures))
        .route("/theaters/cities", get(cities))
        .route("/theaters/chains", get(chains))
        .route("/movies/search", get(search_movies))
        .route("/movies/popular", get(popular_movies))
        .route("/movies/now-playing", get(now_playing))
        .route("/movies/{id}", get(movie))
        .route("/companies/{id}", get(company))
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

#[derive(Debug, Deserialize)]
pub struct CreateUser {
    username: String,
}

async fn create_user(
    State(state): AppStateRef,
    Json(body): Json<CreateUser>,
) -> AppResult<(StatusCode, Json<user::Model>)> {
    let user = state.users.create(&body.username).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

async fn get_user(State(state): AppStateRef, Path(id): Path<i32>) -> AppResult<Json<user::Model>> {
    state.users.find(id).await?.map(Json).ok_or(AppError::NotFound)
}

async fn profile(State(state): AppStateRef, Path(id): Path<i32>) -> AppResult<Json<UserProfile>> {
    let user = state.users.find(id).await?.ok_or(AppError::NotFound)?;

    let (following, followers, viewing_records, average_rating, wishlist) = futures::try_join!(
        state.follows.count_following(id),
        state.follows.count_followers(id),
        state.records.count_for_user(id),
        state.records.average_rating(id),
        state.wishlists.count_for_user(id),
    )?;

    Ok(Json(UserProfile {
        id: user.id,
        username: user.username,
        following,
        followers,
        viewing_records,
        average_rating,
        wishlist,
    }))
}

async fn following(
    State(state): AppStateRef,
    Path(id): Path<i32>,
) -> AppResult<Json<Vec<follow::Model>>> {
    Ok(Json(state.follows.following_of(id).await?))
}

async fn followers(
    State(state): AppStateRef,
    Path(id): Path<i32>,
) -> AppResult<Json<Vec<follow::Model>>> {
    Ok(Json(state.follows.followers_of(id).await?))
}

#[derive(Debug, Serialize)]
pub struct FollowStatus {
    following: bool,
    mutual: bool,
}

async fn follow_status(
    State(state): AppStateRef,
    Path((id, target)): Path<(i32, i32)>,
) -> AppResult<Json<FollowStatus>> {
    let following = state.follows.exists(id, target).await?;
    let mutual = following && state.follows.is_mutual(id, target).await?;
    Ok(Json(FollowStatus { following, mutual }))
}

async fn follow_user(
    State(state): AppStateRef,
    Path((id, target)): Path<(i32, i32)>,
) -> AppResult<(StatusCode, Json<follow::Model>)> {
    let edge = state.follows.follow(id, target).await?;
    Ok((StatusCode::CREATED, Json(edge)))
}

async fn unfollow_user(
    State(state): AppStateRef,
    Path((id, target)): Path<(i32, i32)>,
) -> AppResult<StatusCode> {
    removed(state.follows.unfollow(id, target).await?)
}

#[derive(Debug, Deserialize)]
pub struct FeedQuery {
    limit: Option<u64>,
}

/// Newest follow edges made by the users `id` follows.
async fn feed(
    State(state): AppStateRef,
    Path(id): Path<i32>,
    Query(q): Query<FeedQuery>,
) -> AppResult<Json<Vec<follow::Model>>> {
    let followed: Vec<i32> =
        state.follows.following_of(id).await?.into_iter().map(|f| f.following_id).collect();
    let limit = q.limit.unwrap_or(DEFAULT_FEED_LIMIT).clamp(1, MAX_FEED_LIMIT);
    Ok(Json(state.follows.recent_by_followers(&followed, limit).await?))
}

#[derive(Debug, Deserialize)]
pub struct RecordBody {
    tmdb_movie_id: i32,
    movie_title: String,
    rating: f64,
    viewing_date: Date,
    theater: Option<String>,
}

async fn create_record(
    State(state): AppStateRef,
    Path(id): Path<i32>,
    Json(body): Json<RecordBody>,
) -> AppResult<(StatusCode, Json<viewing_record::Model>)> {
    let record = state
        .records
        .create(NewViewingRecord {
            user_id: id,
            tmdb_movie_id: body.tmdb_movie_id,
            movie_title: body.movie_title,
            rating: body.rating,
            viewing_date: body.viewing_date,
            theater: body.theater,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(record)))
}

#[derive(Debug, Deserialize)]
pub struct RecordsQuery {
    page: Option<u64>,
    per_page: Option<u64>,
    min_rating: Option<f64>,
    from: Option<Date>,
    to: Option<Date>,
    title: Option<String>,
    #[serde(default)]
    with_theater: bool,
}

/// Lists a user's records. Pagination and the filters are mutually
/// exclusive, at most one may be given per request.
async fn list_records(
    State(state): AppStateRef,
    Path(id): Path<i32>,
    Query(q): Query<RecordsQuery>,
) -> AppResult<Response> {
    let paged = q.page.is_some() || q.per_page.is_some();
    let dated = q.from.is_some() || q.to.is_some();
    let title = q.title.as_deref().map(str::trim).filter(|t| !t.is_empty());
    let selected = [paged, dated, title.is_some(), q.min_rating.is_some(), q.with_theater]
        .into_iter()
        .filter(|&on| on)
        .count();
    if selected > 1 {
        return Err(AppError::bad_request(
            "paging, date range, title, min_rating and with_theater cannot be combined",
        ));
    }

    if paged {
        let page = state
            .records
            .page_for_user(id, q.page.unwrap_or(0), q.per_page.unwrap_or(DEFAULT_PER_PAGE))
            .await?;
        return Ok(Json(page).into_response());
    }

    let records = if dated {
        let (Some(from), Some(to)) = (q.from, q.to) else {
            return Err(AppError::bad_request("from and to must be given together"));
        };
        state.records.between(id, from, to).await?
    } else if let Some(title) = title {
        state.records.search_title(id, title).await?
    } else if let Some(min_rating) = q.min_rating {
        state.records.with_min_rating(id, min_rating).await?
    } else if q.with_theater {
        state.records.with_theater(id).await?
    } else {
        state.records.list_for_user(id).await?
    };
    Ok(Json(records).into_response())
}

async fn list_wishlist(
    State(state): AppStateRef,
    Path(id): Path<i32>,
) -> AppResult<Json<Vec<wishlist::Model>>> {
    Ok(Json(state.wishlists.list_for_user(id).await?))
}

async fn recent_wishlist(
    State(state): AppStateRef,
    Path(id): Path<i32>,
) -> AppResult<Json<Vec<wishlist::Model>>> {
    Ok(Json(state.wishlists.recent_for_user(id).await?))
}

async fn get_wishlist_entry(
    State(state): AppStateRef,
    Path((id, movie)): Path<(i32, i32)>,
) -> AppResult<Json<wishlist::Model>> {
    state.wishlists.find(id, movie).await?.map(Json).ok_or(AppError::NotFound)
}

async fn add_to_wishlist(
    State(state): AppStateRef,
    Path((id, movie)): Path<(i32, i32)>,
) -> AppResult<(StatusCode, Json<wishlist::Model>)> {
    let entry = state.wishlists.add(id, movie).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

async fn remove_from_wishlist(
    State(state): AppStateRef,
    Path((id, movie)): Path<(i32, i32)>,
) -> AppResult<StatusCode> {
    removed(state.wishlists.remove(id, movie).await?)
}

fn removed(deleted: bool) -> AppResult<StatusCode> {
    if deleted { Ok(StatusCode::NO_CONTENT) } else { Err(AppError::NotFound) }
}

async fn search_theaters(
    State(state): AppStateRef,
    Query(criteria): Query<TheaterSearch>,
) -> AppResult<Json<Vec<theater::Model>>> {
    Ok(Json(state.theaters.search(&criteria).await?))
}

#[derive(Debug, Deserialize)]
pub struct NearbyQuery {
    lat: f64,
    lng: f64,
    radius_km: Option<f64>,
}

async fn nearby_theaters(
    State(state): AppStateRef,
    Query(q): Query<NearbyQuery>,
) -> AppResult<Json<Vec<theater::Model>>> {
    let bbox = BoundingBox::around(q.lat, q.lng, q.radius_km.unwrap_or(DEFAULT_RADIUS_KM));
    Ok(Json(state.theaters.nearby(bbox).await?))
}

async fn prefectures(State(state): AppStateRef) -> AppResult<Json<Vec<String>>> {
    Ok(Json(state.theaters.prefectures().await?))
}

#[derive(Debug, Deserialize)]
pub struct CitiesQuery {
    prefecture: String,
}

async fn cities(
    State(state): AppStateRef,
    Query(q): Query<CitiesQuery>,
) -> AppResult<Json<Vec<String>>> {
    Ok(Json(state.theaters.cities(q.prefecture.trim()).await?))
}

async fn chains(State(state): AppStateRef) -> AppResult<Json<Vec<String>>> {
    Ok(Json(state.theaters.chains().await?))
}

#[derive(Debug, Deserialize)]
pub struct MovieSearchQuery {
    query: String,
    page: Option<u32>,
}

async fn search_movies(
    State(state): AppStateRef,
    Query(q): Query<MovieSearchQuery>,
) -> AppResult<Json<PagedResponse<TmdbMovie>>> {
    let query = q.query.trim();
    if query.is_empty() {
        return Err(AppError::bad_request("query is required"));
    }
    Ok(Json(state.tmdb.search_movies(query, q.page.unwrap_or(1)).await?))
}

#[derive(Debug, Deserialize)]
pub struct ListingQuery {
    page: Option<u32>,
    region: Option<String>,
}

async fn popular_movies(
    State(state): AppStateRef,
    Query(q): Query<ListingQuery>,
) -> AppResult<Json<PagedResponse<TmdbMovie>>> {
    Ok(Json(state.tmdb.popular_movies(q.page.unwrap_or(1)).await?))
}

async fn now_playing(
    State(state): AppStateRef,
    Query(q): Query<ListingQuery>,
) -> AppResult<Json<PagedResponse<TmdbMovie>>> {
    Ok(Json(state.tmdb.now_playing(q.page.unwrap_or(1), q.region.as_deref()).await?))
}

async fn movie(State(state): AppStateRef, Path(id): Path<i32>) -> AppResult<Json<TmdbMovie>> {
    Ok(Json(state.tmdb.get_movie(id).await?))
}

async fn company(
    State(state): AppStateRef,
    Path(id): Path<i32>,
) -> AppResult<Json<ProductionCompany>> {
    Ok(Json(state.tmdb.get_company(id).await?))
}
