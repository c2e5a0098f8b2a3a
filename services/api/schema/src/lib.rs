//! sea-orm entities for the Harvest marketplace database.

pub mod cart_items;
pub mod carts;
pub mod categories;
pub mod equipments;
pub mod order_items;
pub mod orders;
pub mod product_ratings;
pub mod products;
pub mod users;
pub mod warehouses;
