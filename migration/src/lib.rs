pub use sea_orm_migration::prelude::*;

mod m20250301_000001_create_social_tables;
mod m20250301_000002_create_theaters;
mod m20250302_000001_create_viewing_records;
mod m20250302_000002_create_wishlists;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_create_social_tables::Migration),
            Box::new(m20250301_000002_create_theaters::Migration),
            Box::new(m20250302_000001_create_viewing_records::Migration),
            Box::new(m20250302_000002_create_wishlists::Migration),
        ]
    }
}
