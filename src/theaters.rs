use std::path::Path;

use anyhow::Context;
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Select, Set,
};
use tracing::{debug, info};

use crate::{
    entities::theater,
    error::AppResult,
    models::{BoundingBox, NewTheater, TheaterSearch},
    search::{fold, folded_contains},
};

#[derive(Clone)]
pub struct TheaterStore {
    db: DatabaseConnection,
}

impl TheaterStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn insert(&self, theaters: Vec<NewTheater>) -> AppResult<u64> {
        if theaters.is_empty() {
            return Ok(0);
        }

        let count = theaters.len() as u64;
        let models = theaters.into_iter().map(|t| theater::ActiveModel {
            id: Default::default(),
            name_folded: Set(fold(&t.name)),
            name: Set(t.name),
            chain_folded: Set(t.chain.as_deref().map(fold)),
            chain: Set(t.chain),
            location_folded: Set(fold(&t.location)),
            location: Set(t.location),
            prefecture: Set(t.prefecture),
            city: Set(t.city),
            latitude: Set(t.latitude),
            longitude: Set(t.longitude),
            active: Set(t.active),
        });
        theater::Entity::insert_many(models).exec(&self.db).await?;

        debug!(count, "inserted theaters");
        Ok(count)
    }

    /// Loads a JSON array of theaters, but only into an empty table.
    pub async fn seed_from_file(&self, path: &Path) -> AppResult<u64> {
        let existing = theater::Entity::find().count(&self.db).await?;
        if existing > 0 {
            debug!(existing, "theaters already seeded");
            return Ok(0);
        }

        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading {}", path.display()))?;
        let theaters: Vec<NewTheater> =
            serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?;

        let count = self.insert(theaters).await?;
        info!(count, path = %path.display(), "seeded theaters");
        Ok(count)
    }

    pub async fn list_active(&self) -> AppResult<Vec<theater::Model>> {
        Ok(active().order_by_asc(theater::Column::Name).all(&self.db).await?)
    }

    /// Case-insensitive substring match on name, chain or location.
    pub async fn search_keyword(&self, keyword: &str) -> AppResult<Vec<theater::Model>> {
        Ok(active()
            .filter(keyword_condition(keyword))
            .order_by_asc(theater::Column::Name)
            .all(&self.db)
            .await?)
    }

    pub async fn by_prefecture(&self, prefecture: &str) -> AppResult<Vec<theater::Model>> {
        Ok(active()
            .filter(theater::Column::Prefecture.eq(prefecture))
            .order_by_asc(theater::Column::Name)
            .all(&self.db)
            .await?)
    }

    pub async fn by_city(&self, prefecture: &str, city: &str) -> AppResult<Vec<theater::Model>> {
        Ok(active()
            .filter(theater::Column::Prefecture.eq(prefecture))
            .filter(theater::Column::City.eq(city))
            .order_by_asc(theater::Column::Name)
            .all(&self.db)
            .await?)
    }

    pub async fn by_chain(&self, chain: &str) -> AppResult<Vec<theater::Model>> {
        Ok(active()
            .filter(theater::Column::Chain.eq(chain))
            .order_by_asc(theater::Column::Location)
            .all(&self.db)
            .await?)
    }

    pub async fn by_prefecture_and_chain(
        &self,
        prefecture: &str,
        chain: &str,
    ) -> AppResult<Vec<theater::Model>> {
        Ok(active()
            .filter(theater::Column::Prefecture.eq(prefecture))
            .filter(theater::Column::Chain.eq(chain))
            .order_by_asc(theater::Column::Name)
            .all(&self.db)
            .await?)
    }

    pub async fn nearby(&self, bbox: BoundingBox) -> AppResult<Vec<theater::Model>> {
        Ok(active()
            .filter(theater::Column::Latitude.between(bbox.min_lat, bbox.max_lat))
            .filter(theater::Column::Longitude.between(bbox.min_lng, bbox.max_lng))
            .order_by_asc(theater::Column::Name)
            .all(&self.db)
            .await?)
    }

    pub async fn prefectures(&self) -> AppResult<Vec<String>> {
        Ok(active()
            .select_only()
            .column(theater::Column::Prefecture)
            .distinct()
            .order_by_asc(theater::Column::Prefecture)
            .into_tuple()
            .all(&self.db)
            .await?)
    }

    pub async fn cities(&self, prefecture: &str) -> AppResult<Vec<String>> {
        Ok(active()
            .select_only()
            .column(theater::Column::City)
            .distinct()
            .filter(theater::Column::Prefecture.eq(prefecture))
            .order_by_asc(theater::Column::City)
            .into_tuple()
            .all(&self.db)
            .await?)
    }

    pub async fn chains(&self) -> AppResult<Vec<String>> {
        Ok(active()
            .select_only()
            .column(theater::Column::Chain)
            .distinct()
            .filter(theater::Column::Chain.is_not_null())
            .filter(theater::Column::Chain.ne(""))
            .order_by_asc(theater::Column::Chain)
            .into_tuple()
            .all(&self.db)
            .await?)
    }

    /// Every criterion that is present and non-blank narrows the result;
    /// the rest match anything.
    pub async fn search(&self, criteria: &TheaterSearch) -> AppResult<Vec<theater::Model>> {
        let condition = Condition::all()
            .add_option(present(&criteria.keyword).map(keyword_condition))
            .add_option(present(&criteria.prefecture).map(|p| theater::Column::Prefecture.eq(p)))
            .add_option(present(&criteria.city).map(|c| theater::Column::City.eq(c)))
            .add_option(present(&criteria.chain).map(|c| theater::Column::Chain.eq(c)));

        Ok(active()
            .filter(condition)
            .order_by_asc(theater::Column::Name)
            .all(&self.db)
            .await?)
    }
}

fn active() -> Select<theater::Entity> {
    theater::Entity::find().filter(theater::Column::Active.eq(true))
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn keyword_condition(keyword: &str) -> Condition {
    Condition::any()
        .add(folded_contains(theater::Column::NameFolded, keyword))
        .add(folded_contains(theater::Column::ChainFolded, keyword))
        .add(folded_contains(theater::Column::LocationFolded, keyword))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_db;

    fn theater(
        name: &str,
        chain: Option<&str>,
        location: &str,
        prefecture: &str,
        city: &str,
        (latitude, longitude): (f64, f64),
    ) -> NewTheater {
        NewTheater {
            name: name.to_string(),
            chain: chain.map(str::to_string),
            location: location.to_string(),
            prefecture: prefecture.to_string(),
            city: city.to_string(),
            latitude,
            longitude,
            active: true,
        }
    }

    async fn seeded() -> TheaterStore {
        let store = TheaterStore::new(test_db().await);
        let toho = Some("TOHO Cinemas");

        let mut closed =
            theater("Old Picture House", toho, "Ginza 1-1", "Tokyo", "Chuo", (35.0, 139.0));
        closed.active = false;

        let umeda = (34.70, 135.50);
        let osaka = theater("TOHO Cinemas Umeda", toho, "Kakuda-cho 7-10", "Osaka", "Kita", umeda);
        let shinjuku = theater(
            "TOHO Cinemas Shinjuku",
            toho,
            "Kabukicho 1-19-1",
            "Tokyo",
            "Shinjuku",
            (35.695, 139.702),
        );
        let t_joy = Some("T-Joy");
        let wald_at = (35.691, 139.705);
        let wald = theater("Wald 9", t_joy, "Shinjuku 3-1-26", "Tokyo", "Shinjuku", wald_at);
        let eurospace =
            theater("Eurospace", None, "Maruyama-cho 1-5", "Tokyo", "Shibuya", (35.657, 139.696));

        store.insert(vec![closed, osaka, shinjuku, wald, eurospace]).await.unwrap();
        store
    }

    fn names(theaters: &[theater::Model]) -> Vec<&str> {
        theaters.iter().map(|t| t.name.as_str()).collect()
    }

    #[tokio::test]
    async fn inactive_theaters_are_never_listed() {
        let store = seeded().await;
        let all = store.list_active().await.unwrap();
        let expected = ["Eurospace", "TOHO Cinemas Shinjuku", "TOHO Cinemas Umeda", "Wald 9"];
        assert_eq!(names(&all), expected);
        assert!(store.search_keyword("picture").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn keyword_search_ignores_case_and_spans_columns() {
        let store = seeded().await;
        let toho = store.search_keyword("toho").await.unwrap();
        assert_eq!(names(&toho), ["TOHO Cinemas Shinjuku", "TOHO Cinemas Umeda"]);
        // matches chain
        assert_eq!(names(&store.search_keyword("t-JOY").await.unwrap()), ["Wald 9"]);
        // matches location
        let shinjuku = store.search_keyword("shinjuku").await.unwrap();
        assert_eq!(names(&shinjuku), ["TOHO Cinemas Shinjuku", "Wald 9"]);
    }

    #[tokio::test]
    async fn keyword_search_folds_full_width_and_accents() {
        let store = TheaterStore::new(test_db().await);
        let at = (35.0, 139.0);
        store
            .insert(vec![
                theater(
                    "Ｔｏｋｙｏ Story Hall",
                    Some("ＴＯＨＯシネマズ"),
                    "日比谷",
                    "Tokyo",
                    "Chiyoda",
                    at,
                ),
                theater("Cinéma Élysée", None, "Aoyama 2-1", "Tokyo", "Minato", at),
            ])
            .await
            .unwrap();

        let hall = ["Ｔｏｋｙｏ Story Hall"];
        assert_eq!(names(&store.search_keyword("ＴＯＫＹＯ").await.unwrap()), hall);
        assert_eq!(names(&store.search_keyword("tokyo").await.unwrap()), hall);
        assert_eq!(names(&store.search_keyword("tohoシネマズ").await.unwrap()), hall);
        assert_eq!(names(&store.search_keyword("日比谷").await.unwrap()), hall);

        let elysee = ["Cinéma Élysée"];
        assert_eq!(names(&store.search_keyword("ÉLYSÉE").await.unwrap()), elysee);
        assert_eq!(names(&store.search_keyword("cinéma").await.unwrap()), elysee);
    }

    #[tokio::test]
    async fn keyword_wildcards_are_literal() {
        let store = TheaterStore::new(test_db().await);
        let at = (35.0, 139.0);
        store
            .insert(vec![
                theater("Cinema_One", None, "Ebisu 4-20", "Tokyo", "Shibuya", at),
                theater("CinemaXOne", None, "Meguro 1-1", "Tokyo", "Meguro", at),
                theater("100% Screen", None, "Ueno 2-2", "Tokyo", "Taito", at),
            ])
            .await
            .unwrap();

        assert_eq!(names(&store.search_keyword("a_o").await.unwrap()), ["Cinema_One"]);
        assert_eq!(names(&store.search_keyword("%").await.unwrap()), ["100% Screen"]);
        assert_eq!(names(&store.search_keyword("0% s").await.unwrap()), ["100% Screen"]);
        assert!(store.search_keyword("\\").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn filters_by_place_and_chain() {
        let store = seeded().await;
        assert_eq!(store.by_prefecture("Tokyo").await.unwrap().len(), 3);

        let shinjuku = store.by_city("Tokyo", "Shinjuku").await.unwrap();
        assert_eq!(names(&shinjuku), ["TOHO Cinemas Shinjuku", "Wald 9"]);

        // ordered by location
        let toho = store.by_chain("TOHO Cinemas").await.unwrap();
        assert_eq!(names(&toho), ["TOHO Cinemas Shinjuku", "TOHO Cinemas Umeda"]);

        let osaka_toho = store.by_prefecture_and_chain("Osaka", "TOHO Cinemas").await.unwrap();
        assert_eq!(names(&osaka_toho), ["TOHO Cinemas Umeda"]);
    }

    #[tokio::test]
    async fn nearby_uses_bounding_box() {
        let store = seeded().await;
        let near_shinjuku = store.nearby(BoundingBox::around(35.693, 139.703, 1.0)).await.unwrap();
        assert_eq!(names(&near_shinjuku), ["TOHO Cinemas Shinjuku", "Wald 9"]);

        let wide = store.nearby(BoundingBox::around(35.68, 139.70, 10.0)).await.unwrap();
        assert_eq!(wide.len(), 3);
    }

    #[tokio::test]
    async fn distinct_filter_values() {
        let store = seeded().await;
        assert_eq!(store.prefectures().await.unwrap(), ["Osaka", "Tokyo"]);
        assert_eq!(store.cities("Tokyo").await.unwrap(), ["Shibuya", "Shinjuku"]);
        assert_eq!(store.chains().await.unwrap(), ["T-Joy", "TOHO Cinemas"]);
    }

    #[tokio::test]
    async fn empty_search_returns_every_active_theater() {
        let store = seeded().await;
        let criteria = TheaterSearch {
            keyword: Some(String::new()),
            prefecture: None,
            city: Some("  ".to_string()),
            chain: None,
        };
        assert_eq!(store.search(&criteria).await.unwrap(), store.list_active().await.unwrap());
        assert_eq!(store.search(&TheaterSearch::default()).await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn search_with_only_prefecture() {
        let store = seeded().await;
        let criteria =
            TheaterSearch { prefecture: Some("Tokyo".to_string()), ..Default::default() };
        let found = store.search(&criteria).await.unwrap();
        assert_eq!(names(&found), ["Eurospace", "TOHO Cinemas Shinjuku", "Wald 9"]);
        assert!(found.iter().all(|t| t.prefecture == "Tokyo" && t.active));
    }

    #[tokio::test]
    async fn search_combines_criteria() {
        let store = seeded().await;
        let criteria = TheaterSearch {
            keyword: Some("toho".to_string()),
            prefecture: Some("Tokyo".to_string()),
            city: None,
            chain: Some("TOHO Cinemas".to_string()),
        };
        assert_eq!(names(&store.search(&criteria).await.unwrap()), ["TOHO Cinemas Shinjuku"]);
    }

    #[tokio::test]
    async fn seed_only_fills_an_empty_table() {
        let store = TheaterStore::new(test_db().await);
        let path =
            std::env::temp_dir().join(format!("cinelog-theaters-{}.json", std::process::id()));
        let json = r#"[{
            "name": "Cine Quinto", "chain": null, "location": "Udagawa-cho 14-5",
            "prefecture": "Tokyo", "city": "Shibuya", "latitude": 35.66, "longitude": 139.70
        }]"#;
        tokio::fs::write(&path, json).await.unwrap();

        assert_eq!(store.seed_from_file(&path).await.unwrap(), 1);
        assert_eq!(store.seed_from_file(&path).await.unwrap(), 0);

        let seeded = store.list_active().await.unwrap();
        assert_eq!(names(&seeded), ["Cine Quinto"]);
        assert_eq!(seeded[0].location_folded, "udagawa-cho 14-5");

        tokio::fs::remove_file(&path).await.ok();
    }
}
