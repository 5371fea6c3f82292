use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // movie_ml_id is the catalog's own id, not a movies.id reference, so no foreign key.
        manager
            .create_table(
                Table::create()
                    .table(Ratings::Table)
                    .if_not_exists()
                    .col(big_integer(Ratings::UserId))
                    .col(big_integer(Ratings::MovieMlId))
                    .col(double(Ratings::Rating))
                    .col(big_integer(Ratings::Timestamp))
                    .primary_key(Index::create().col(Ratings::UserId).col(Ratings::MovieMlId))
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Ratings::Table).to_owned()).await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Ratings {
    Table,
    UserId,
    MovieMlId,
    Rating,
    Timestamp,
}
