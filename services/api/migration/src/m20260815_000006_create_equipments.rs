use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Equipments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Equipments::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Equipments::Name).string().not_null())
                    .col(ColumnDef::new(Equipments::Description).string().not_null())
                    .col(
                        ColumnDef::new(Equipments::PriceCents)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Equipments::Category).string().not_null())
                    .col(ColumnDef::new(Equipments::Manufacturer).string().not_null())
                    .col(ColumnDef::new(Equipments::WarehouseId).uuid().not_null())
                    .col(
                        ColumnDef::new(Equipments::InStock)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Equipments::Images).json_binary().not_null())
                    .col(
                        ColumnDef::new(Equipments::Specifications)
                            .json_binary()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Equipments::IsAvailable)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Equipments::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Equipments::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Equipments::Table, Equipments::WarehouseId)
                            .to(Warehouses::Table, Warehouses::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .check(Expr::col(Equipments::PriceCents).gt(0))
                    .check(Expr::col(Equipments::InStock).gte(0))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .table(Equipments::Table)
                    .col(Equipments::WarehouseId)
                    .name("idx_equipments_warehouse_id")
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Equipments::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Equipments {
    Table,
    Id,
    Name,
    Description,
    PriceCents,
    Category,
    Manufacturer,
    WarehouseId,
    InStock,
    Images,
    Specifications,
    IsAvailable,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Warehouses {
    Table,
    Id,
}
