use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Wishlists::Table)
                    .if_not_exists()
                    .col(pk_auto(Wishlists::Id))
                    .col(integer(Wishlists::UserId))
                    .col(integer(Wishlists::TmdbMovieId))
                    .col(big_integer(Wishlists::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_wishlists_user")
                            .from(Wishlists::Table, Wishlists::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_wishlists_user_movie_unique")
                    .table(Wishlists::Table)
                    .col(Wishlists::UserId)
                    .col(Wishlists::TmdbMovieId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Wishlists::Table).to_owned()).await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Wishlists {
    Table,
    Id,
    UserId,
    TmdbMovieId,
    CreatedAt,
}
