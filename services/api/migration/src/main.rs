use sea_orm_migration::prelude::*;

mod m20260815_000001_create_users;
mod m20260815_000002_create_warehouses;
mod m20260815_000003_create_categories;
mod m20260815_000004_create_products;
mod m20260815_000005_create_product_ratings;
mod m20260815_000006_create_equipments;
mod m20260815_000007_create_carts;
mod m20260815_000008_create_cart_items;
mod m20260815_000009_create_orders;
mod m20260815_000010_create_order_items;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260815_000001_create_users::Migration),
            Box::new(m20260815_000002_create_warehouses::Migration),
            Box::new(m20260815_000003_create_categories::Migration),
            Box::new(m20260815_000004_create_products::Migration),
            Box::new(m20260815_000005_create_product_ratings::Migration),
            Box::new(m20260815_000006_create_equipments::Migration),
            Box::new(m20260815_000007_create_carts::Migration),
            Box::new(m20260815_000008_create_cart_items::Migration),
            Box::new(m20260815_000009_create_orders::Migration),
            Box::new(m20260815_000010_create_order_items::Migration),
        ]
    }
}

#[tokio::main]
async fn main() {
    cli::run_cli(Migrator).await;
}
