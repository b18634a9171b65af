use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Theaters::Table)
                    .if_not_exists()
                    .col(pk_auto(Theaters::Id))
                    .col(string(Theaters::Name))
                    .col(string(Theaters::NameFolded))
                    .col(string_null(Theaters::Chain))
                    .col(string_null(Theaters::ChainFolded))
                    .col(string(Theaters::Location))
                    .col(string(Theaters::LocationFolded))
                    .col(string(Theaters::Prefecture))
                    .col(string(Theaters::City))
                    .col(double(Theaters::Latitude))
                    .col(double(Theaters::Longitude))
                    .col(boolean(Theaters::Active).default(true))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_theaters_prefecture_city")
                    .table(Theaters::Table)
                    .col(Theaters::Prefecture)
                    .col(Theaters::City)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_theaters_lat_lng")
                    .table(Theaters::Table)
                    .col(Theaters::Latitude)
                    .col(Theaters::Longitude)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Theaters::Table).to_owned()).await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Theaters {
    Table,
    Id,
    Name,
    NameFolded,
    Chain,
    ChainFolded,
    Location,
    LocationFolded,
    Prefecture,
    City,
    Latitude,
    Longitude,
    Active,
}
