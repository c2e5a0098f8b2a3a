pub mod admin;
pub mod auth;
pub mod cart;
pub mod category;
pub mod equipment;
pub mod order;
pub mod product;
pub mod warehouse;
