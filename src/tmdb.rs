use std::{num::NonZeroU32, sync::Arc};

use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
};
use reqwest::header::ACCEPT;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::debug;

use crate::error::AppResult;

/// Read-only client for the TMDb v3 API.
///
/// Failures are not retried: transport errors, non-2xx statuses and bodies
/// that do not decode all come back as `AppError::Upstream`.
pub struct TmdbClient {
    client: reqwest::Client,
    access_token: String,
    base_url: String,
    limiter: Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
}

impl TmdbClient {
    pub fn new(client: reqwest::Client, access_token: String, base_url: String, rps: u32) -> Self {
        if access_token.trim().is_empty() {
            tracing::warn!("no TMDB_ACCESS_TOKEN provided, requests will be sent unauthenticated");
        }

        let rps = NonZeroU32::new(rps.max(1)).unwrap_or(NonZeroU32::MIN);
        let limiter = Arc::new(RateLimiter::direct(Quota::per_second(rps)));
        Self { client, access_token, base_url, limiter }
    }

    pub async fn get_movie(&self, tmdb_id: i32) -> AppResult<TmdbMovie> {
        self.get_json(&format!("movie/{tmdb_id}"), &[]).await
    }

    pub async fn search_movies(
        &self,
        query: &str,
        page: u32,
    ) -> AppResult<PagedResponse<TmdbMovie>> {
        self.get_json(
            "search/movie",
            &[("query", query.to_string()), ("page", page.max(1).to_string())],
        )
        .await
    }

    pub async fn popular_movies(&self, page: u32) -> AppResult<PagedResponse<TmdbMovie>> {
        self.get_json("movie/popular", &[("page", page.max(1).to_string())]).await
    }

    pub async fn now_playing(
        &self,
        page: u32,
        region: Option<&str>,
    ) -> AppResult<PagedResponse<TmdbMovie>> {
        let mut query = vec![("page", page.max(1).to_string())];
        if let Some(region) = region.map(str::trim).filter(|r| !r.is_empty()) {
            query.push(("region", region.to_uppercase()));
        }
        self.get_json("movie/now_playing", &query).await
    }

    pub async fn get_company(&self, company_id: i32) -> AppResult<ProductionCompany> {
        self.get_json(&format!("company/{company_id}"), &[]).await
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> AppResult<T> {
        self.limiter.until_ready().await;

        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), path);
        debug!(url = %url, "tmdb request");

        let mut req = self.client.get(url).header(ACCEPT, "application/json").query(query);
        if !self.access_token.trim().is_empty() {
            req = req.bearer_auth(&self.access_token);
        }

        Ok(req.send().await?.error_for_status()?.json().await?)
    }
}

/// A movie as returned by TMDb search, listing and detail endpoints.
///
/// The listing endpoints fill `genre_ids`, the detail endpoint fills
/// `genres` and `production_companies`. Anything TMDb leaves out stays `None`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TmdbMovie {
    pub id: Option<i32>,
    pub title: Option<String>,
    pub original_title: Option<String>,
    pub original_language: Option<String>,
    pub overview: Option<String>,
    pub tagline: Option<String>,
    pub status: Option<String>,
    pub release_date: Option<String>,
    pub runtime: Option<i32>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub homepage: Option<String>,
    pub imdb_id: Option<String>,
    pub vote_average: Option<f64>,
    pub vote_count: Option<i32>,
    pub popularity: Option<f64>,
    pub budget: Option<i64>,
    pub revenue: Option<i64>,
    pub adult: Option<bool>,
    pub video: Option<bool>,
    pub genre_ids: Option<Vec<i32>>,
    pub genres: Option<Vec<Genre>>,
    pub production_companies: Option<Vec<ProductionCompany>>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
    pub id: Option<i32>,
    pub name: Option<String>,
}

impl Genre {
    pub fn new(id: i32, name: impl Into<String>) -> Self {
        Self { id: Some(id), name: Some(name.into()) }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductionCompany {
    pub id: Option<i32>,
    pub name: Option<String>,
    pub logo_path: Option<String>,
    pub origin_country: Option<String>,
    pub description: Option<String>,
    pub headquarters: Option<String>,
    pub homepage: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PagedResponse<T> {
    pub page: Option<u32>,
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
    pub total_pages: Option<u32>,
    pub total_results: Option<u32>,
}
