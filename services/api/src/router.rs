use axum::{
    Router,
    routing::{delete, get, patch, post},
};
use tower_http::trace::TraceLayer;

use harvest_core::health::{healthz, readyz};
use harvest_core::middleware::request_id_layer;

use crate::handlers::{
    admin::{get_dashboard, get_user, list_users, update_user_role},
    auth::{
        change_password, forget_password, get_me, reset_password, signin, signup, update_me,
        verify_otp, verify_reset_otp,
    },
    cart::{add_cart_item, clear_cart, get_cart, remove_cart_item, update_cart_item},
    category::{create_category, delete_category, get_category, list_categories, update_category},
    equipment::{
        create_equipment, delete_equipment, get_equipment, list_equipments, search_equipments,
        update_equipment,
    },
    order::{cancel_order, get_order, list_orders, place_order},
    product::{
        create_product, delete_product, get_product, list_products, rate_product, update_product,
    },
    warehouse::{create_warehouse, get_warehouse, list_warehouses, update_warehouse},
};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // Auth
        .route("/auth/signup", post(signup))
        .route("/auth/verify", post(verify_otp))
        .route("/auth/signin", post(signin))
        .route("/auth/forget-password", post(forget_password))
        .route("/auth/verify-reset-otp", post(verify_reset_otp))
        .route("/auth/reset-password", post(reset_password))
        .route("/auth/me", get(get_me))
        .route("/auth/me", patch(update_me))
        .route("/auth/change-password", patch(change_password))
        // Admin
        .route("/dashboard", get(get_dashboard))
        .route("/users", get(list_users))
        .route("/users/{id}", get(get_user))
        .route("/users/{id}/role", patch(update_user_role))
        // Categories
        .route("/categories", get(list_categories))
        .route("/categories", post(create_category))
        .route("/categories/{id}", get(get_category))
        .route("/categories/{id}", patch(update_category))
        .route("/categories/{id}", delete(delete_category))
        // Warehouses
        .route("/warehouses", get(list_warehouses))
        .route("/warehouses", post(create_warehouse))
        .route("/warehouses/{id}", get(get_warehouse))
        .route("/warehouses/{id}", patch(update_warehouse))
        // Products
        .route("/products", get(list_products))
        .route("/products", post(create_product))
        .route("/products/{id}", get(get_product))
        .route("/products/{id}", patch(update_product))
        .route("/products/{id}", delete(delete_product))
        .route("/products/{id}/ratings", post(rate_product))
        // Equipments
        .route("/equipments", get(list_equipments))
        .route("/equipments", post(create_equipment))
        .route("/equipments/search", get(search_equipments))
        .route("/equipments/{id}", get(get_equipment))
        .route("/equipments/{id}", patch(update_equipment))
        .route("/equipments/{id}", delete(delete_equipment))
        // Cart
        .route("/cart", get(get_cart))
        .route("/cart", delete(clear_cart))
        .route("/cart", post(add_cart_item))
        .route("/cart/items/{itemId}", patch(update_cart_item))
        .route("/cart/items/{itemId}", delete(remove_cart_item))
        // Orders
        .route("/orders", get(list_orders))
        .route("/orders", post(place_order))
        .route("/orders/{id}", get(get_order))
        .route("/orders/{id}/cancel", patch(cancel_order))
        .layer(TraceLayer::new_for_http())
        .layer(request_id_layer())
        .with_state(state)
}
