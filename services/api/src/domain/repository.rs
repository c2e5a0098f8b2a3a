#![allow(async_fn_in_trait)]

use chrono::{DateTime, Utc};

use harvest_domain::id::{
    CartId, CartItemId, CategoryId, EquipmentId, OrderId, ProductId, UserId, WarehouseId,
};
use harvest_domain::pagination::PageRequest;
use harvest_domain::user::UserRole;

use crate::domain::types::{
    Cart, CartItem, Category, CategoryPatch, Equipment, EquipmentFilter, EquipmentPatch,
    EquipmentSortBy, Order, OrderLine, Product, ProductFilter, ProductPatch, ProductRating, User,
    UserProfilePatch, Warehouse, WarehousePatch,
};
use crate::error::ApiError;

/// Repository for user accounts.
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, ApiError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, ApiError>;
    /// All accounts, newest first. Admin surface only.
    async fn list(&self) -> Result<Vec<User>, ApiError>;
    async fn count(&self) -> Result<u64, ApiError>;
    async fn create(&self, user: &User) -> Result<(), ApiError>;
    async fn update_role(&self, id: UserId, role: UserRole) -> Result<(), ApiError>;
    async fn update_profile(&self, id: UserId, patch: &UserProfilePatch) -> Result<(), ApiError>;

    /// Set or clear the OTP fields. Both are written together so the account
    /// never holds a code without an expiry.
    async fn set_otp(
        &self,
        id: UserId,
        otp: Option<i32>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<(), ApiError>;

    /// Mark the account verified and clear the OTP fields in one update.
    async fn mark_verified(&self, id: UserId) -> Result<(), ApiError>;

    /// Replace the password hash and clear any outstanding OTP.
    async fn update_password(&self, id: UserId, password_hash: &str) -> Result<(), ApiError>;
}

/// Repository for warehouses.
pub trait WarehouseRepository: Send + Sync {
    async fn list_active(&self) -> Result<Vec<Warehouse>, ApiError>;
    async fn find_by_id(&self, id: WarehouseId) -> Result<Option<Warehouse>, ApiError>;
    async fn find_by_name(&self, name: &str) -> Result<Option<Warehouse>, ApiError>;
    /// The warehouse managed by `admin_id`, if any. At most one per admin.
    async fn find_by_admin(&self, admin_id: UserId) -> Result<Option<Warehouse>, ApiError>;
    async fn create(&self, warehouse: &Warehouse) -> Result<(), ApiError>;
    async fn update(&self, id: WarehouseId, patch: &WarehousePatch) -> Result<(), ApiError>;
    async fn count(&self) -> Result<u64, ApiError>;
}

/// Repository for product categories.
pub trait CategoryRepository: Send + Sync {
    async fn list_active(&self) -> Result<Vec<Category>, ApiError>;
    async fn find_by_id(&self, id: CategoryId) -> Result<Option<Category>, ApiError>;
    async fn create(&self, category: &Category) -> Result<(), ApiError>;
    async fn update(&self, id: CategoryId, patch: &CategoryPatch) -> Result<(), ApiError>;
}

/// Repository for products and their ratings.
pub trait ProductRepository: Send + Sync {
    /// Available products matching `filter`, newest first.
    async fn list(
        &self,
        filter: &ProductFilter,
        page: PageRequest,
    ) -> Result<Vec<Product>, ApiError>;
    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, ApiError>;
    async fn create(&self, product: &Product) -> Result<(), ApiError>;
    async fn update(&self, id: ProductId, patch: &ProductPatch) -> Result<(), ApiError>;

    /// Upsert a rating keyed by (product, user) and recompute the product's
    /// average in the same transaction. Returns the new average.
    async fn upsert_rating(&self, rating: &ProductRating) -> Result<f64, ApiError>;
}

/// Repository for equipment.
pub trait EquipmentRepository: Send + Sync {
    async fn list(
        &self,
        filter: &EquipmentFilter,
        sort_by: EquipmentSortBy,
        page: PageRequest,
    ) -> Result<Vec<Equipment>, ApiError>;

    /// Case-insensitive substring search over name, description, manufacturer,
    /// and category. No ranking.
    async fn search(&self, query: &str, page: PageRequest) -> Result<Vec<Equipment>, ApiError>;

    async fn find_by_id(&self, id: EquipmentId) -> Result<Option<Equipment>, ApiError>;
    async fn create(&self, equipment: &Equipment) -> Result<(), ApiError>;
    async fn update(&self, id: EquipmentId, patch: &EquipmentPatch) -> Result<(), ApiError>;
    async fn count(&self) -> Result<u64, ApiError>;
    async fn count_by_warehouse(&self, warehouse_id: WarehouseId) -> Result<u64, ApiError>;
}

/// Repository for shopping carts.
pub trait CartRepository: Send + Sync {
    async fn find_by_user(&self, user_id: UserId)
    -> Result<Option<(Cart, Vec<CartItem>)>, ApiError>;
    async fn create(&self, cart: &Cart) -> Result<(), ApiError>;
    async fn insert_item(&self, item: &CartItem) -> Result<(), ApiError>;
    async fn set_item_quantity(&self, item_id: CartItemId, quantity: i32) -> Result<(), ApiError>;
    /// Delete a cart line. Returns `true` if a row was deleted.
    async fn delete_item(&self, cart_id: CartId, item_id: CartItemId) -> Result<bool, ApiError>;
    async fn clear(&self, cart_id: CartId) -> Result<(), ApiError>;
    /// Persist the derived total after a mutation.
    async fn set_total(&self, cart_id: CartId, total_cents: i64) -> Result<(), ApiError>;
}

/// Repository for orders.
pub trait OrderRepository: Send + Sync {
    /// The user's orders, newest first.
    async fn list_by_user(&self, user_id: UserId) -> Result<Vec<Order>, ApiError>;
    async fn find_by_id(&self, id: OrderId) -> Result<Option<(Order, Vec<OrderLine>)>, ApiError>;

    /// Atomically insert the order and its lines, decrement stock per line
    /// (guarded: fails with `InsufficientStock` if any product has too little
    /// left), and clear the buyer's cart when one exists. All or nothing.
    async fn place(
        &self,
        order: &Order,
        lines: &[OrderLine],
        cart_id: Option<CartId>,
    ) -> Result<(), ApiError>;

    /// Atomically flip the order from pending to cancelled and restock every
    /// line. The flip is conditional on the stored status, so of two racing
    /// cancels exactly one restocks; the loser gets `CannotCancel`.
    async fn cancel_with_restock(&self, id: OrderId) -> Result<(), ApiError>;
}

/// Port for outbound email. Implemented over SMTP in infra; mocked in tests.
pub trait Mailer: Send + Sync {
    async fn send_otp(&self, to: &str, first_name: &str, otp: i32) -> Result<(), ApiError>;
    async fn send_reset_link(&self, to: &str, first_name: &str, link: &str)
    -> Result<(), ApiError>;
}
