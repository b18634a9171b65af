use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ViewingRecords::Table)
                    .if_not_exists()
                    .col(pk_auto(ViewingRecords::Id))
                    .col(integer(ViewingRecords::UserId))
                    .col(integer(ViewingRecords::TmdbMovieId))
                    .col(string(ViewingRecords::MovieTitle))
                    .col(string(ViewingRecords::MovieTitleFolded))
                    .col(double(ViewingRecords::Rating))
                    .col(string(ViewingRecords::ViewingDate))
                    .col(string_null(ViewingRecords::Theater))
                    .col(big_integer(ViewingRecords::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_viewing_records_user")
                            .from(ViewingRecords::Table, ViewingRecords::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_viewing_records_user_date")
                    .table(ViewingRecords::Table)
                    .col(ViewingRecords::UserId)
                    .col(ViewingRecords::ViewingDate)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(ViewingRecords::Table).to_owned()).await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum ViewingRecords {
    Table,
    Id,
    UserId,
    TmdbMovieId,
    MovieTitle,
    MovieTitleFolded,
    Rating,
    ViewingDate,
    Theater,
    CreatedAt,
}
