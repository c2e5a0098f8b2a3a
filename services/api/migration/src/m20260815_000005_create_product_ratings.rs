use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ProductRatings::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ProductRatings::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ProductRatings::ProductId).uuid().not_null())
                    .col(ColumnDef::new(ProductRatings::UserId).uuid().not_null())
                    .col(
                        ColumnDef::new(ProductRatings::Rating)
                            .small_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ProductRatings::Review).string())
                    .col(
                        ColumnDef::new(ProductRatings::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(ProductRatings::Table, ProductRatings::ProductId)
                            .to(Products::Table, Products::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(ProductRatings::Table, ProductRatings::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .check(
                        Expr::col(ProductRatings::Rating)
                            .gte(1)
                            .and(Expr::col(ProductRatings::Rating).lte(5)),
                    )
                    .to_owned(),
            )
            .await?;

        // One rating per user per product; rating upserts key on this pair.
        manager
            .create_index(
                Index::create()
                    .table(ProductRatings::Table)
                    .col(ProductRatings::ProductId)
                    .col(ProductRatings::UserId)
                    .unique()
                    .name("uniq_product_ratings_product_user")
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ProductRatings::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum ProductRatings {
    Table,
    Id,
    ProductId,
    UserId,
    Rating,
    Review,
    CreatedAt,
}

#[derive(Iden)]
enum Products {
    Table,
    Id,
}

#[derive(Iden)]
enum Users {
    Table,
    Id,
}
