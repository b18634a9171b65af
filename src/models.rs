use jiff::civil::Date;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

pub const MIN_RATING: f64 = 0.0;
pub const MAX_RATING: f64 = 5.0;

const KM_PER_DEGREE_LAT: f64 = 111.32;

#[derive(Clone, Debug, Deserialize)]
pub struct NewTheater {
    pub name: String,
    pub chain: Option<String>,
    pub location: String,
    pub prefecture: String,
    pub city: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

/// Criteria for the combined theater search. `None` and blank strings both
/// act as wildcards.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct TheaterSearch {
    pub keyword: Option<String>,
    pub prefecture: Option<String>,
    pub city: Option<String>,
    pub chain: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl BoundingBox {
    /// Square box of `radius_km` around a point. Longitude degrees shrink
    /// with latitude, so the box widens towards the poles.
    pub fn around(lat: f64, lng: f64, radius_km: f64) -> Self {
        let radius_km = radius_km.abs();
        let d_lat = radius_km / KM_PER_DEGREE_LAT;
        let d_lng = radius_km / (KM_PER_DEGREE_LAT * lat.to_radians().cos().abs().max(0.01));
        Self {
            min_lat: lat - d_lat,
            max_lat: lat + d_lat,
            min_lng: lng - d_lng,
            max_lng: lng + d_lng,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct NewViewingRecord {
    pub user_id: i32,
    pub tmdb_movie_id: i32,
    pub movie_title: String,
    pub rating: f64,
    pub viewing_date: Date,
    pub theater: Option<String>,
}

impl NewViewingRecord {
    pub fn validate(&self) -> AppResult<()> {
        if self.movie_title.trim().is_empty() {
            return Err(AppError::bad_request("movie_title is required"));
        }
        if !(MIN_RATING..=MAX_RATING).contains(&self.rating) {
            return Err(AppError::bad_request(format!(
                "rating must be between {MIN_RATING} and {MAX_RATING}"
            )));
        }
        Ok(())
    }
}

/// One zero-based page of a larger ordered result.
#[derive(Clone, Debug, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u64,
    pub per_page: u64,
    pub total_items: u64,
    pub total_pages: u64,
}

#[derive(Clone, Debug, Serialize)]
pub struct UserProfile {
    pub id: i32,
    pub username: String,
    pub following: u64,
    pub followers: u64,
    pub viewing_records: u64,
    pub average_rating: Option<f64>,
    pub wishlist: u64,
}
