use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use harvest_domain::id::{
    CartId, CartItemId, CategoryId, EquipmentId, OrderId, ProductId, UserId, WarehouseId,
};
use harvest_domain::pagination::Sort;
use harvest_domain::user::UserRole;

/// OTP lifetime: 10 minutes.
pub const OTP_TTL_SECS: i64 = 600;

/// User account with credentials and OTP verification state.
///
/// `otp` and `otp_expires_at` are both set or both `None`.
#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub country: String,
    pub password_hash: String,
    pub profile_image: Option<String>,
    pub role: UserRole,
    pub is_verified: bool,
    pub otp: Option<i32>,
    pub otp_expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partial profile update; `None` fields are left untouched. Email, role, and
/// verification state are never patched through here.
#[derive(Debug, Clone, Default)]
pub struct UserProfilePatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub country: Option<String>,
    pub profile_image: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Warehouse {
    pub id: WarehouseId,
    pub name: String,
    pub location: String,
    pub capacity: i32,
    pub admin_id: UserId,
    pub image: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partial warehouse update; `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct WarehousePatch {
    pub name: Option<String>,
    pub location: Option<String>,
    pub capacity: Option<i32>,
    pub image: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub description: String,
    pub image: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct CategoryPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub is_active: Option<bool>,
}

/// Product stocked in a warehouse. Prices are integer minor units (cents).
#[derive(Debug, Clone)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price_cents: i64,
    pub category_id: CategoryId,
    pub warehouse_id: WarehouseId,
    pub in_stock: i32,
    pub images: Vec<String>,
    pub is_available: bool,
    pub average_rating: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price_cents: Option<i64>,
    pub category_id: Option<CategoryId>,
    pub in_stock: Option<i32>,
    pub images: Option<Vec<String>>,
    pub is_available: Option<bool>,
}

/// Filters for the public product listing.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub category: Option<CategoryId>,
    pub min_price_cents: Option<i64>,
    pub max_price_cents: Option<i64>,
}

/// One user's rating of a product. Upserted by (product, user).
#[derive(Debug, Clone)]
pub struct ProductRating {
    pub product_id: ProductId,
    pub user_id: UserId,
    pub rating: i16,
    pub review: Option<String>,
}

/// Farm equipment. Parallel to products but a separate aggregate: free-text
/// category, free-form specifications, not cart/orderable.
#[derive(Debug, Clone)]
pub struct Equipment {
    pub id: EquipmentId,
    pub name: String,
    pub description: String,
    pub price_cents: i64,
    pub category: String,
    pub manufacturer: String,
    pub warehouse_id: WarehouseId,
    pub in_stock: i32,
    pub images: Vec<String>,
    pub specifications: serde_json::Value,
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct EquipmentPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price_cents: Option<i64>,
    pub category: Option<String>,
    pub manufacturer: Option<String>,
    pub in_stock: Option<i32>,
    pub images: Option<Vec<String>>,
    pub specifications: Option<serde_json::Value>,
    pub is_available: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct EquipmentFilter {
    pub category: Option<String>,
    pub min_price_cents: Option<i64>,
    pub max_price_cents: Option<i64>,
}

/// Sort order for equipment listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EquipmentSortBy {
    CreatedAt(Sort),
    Price(Sort),
}

impl Default for EquipmentSortBy {
    fn default() -> Self {
        Self::CreatedAt(Sort::Desc)
    }
}

/// Shopping cart, one per user, created lazily on first access.
#[derive(Debug, Clone)]
pub struct Cart {
    pub id: CartId,
    pub user_id: UserId,
    pub total_cents: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One cart line with the unit price frozen at add time.
#[derive(Debug, Clone)]
pub struct CartItem {
    pub id: CartItemId,
    pub cart_id: CartId,
    pub product_id: ProductId,
    pub quantity: i32,
    pub unit_price_cents: i64,
    pub created_at: DateTime<Utc>,
}

/// Cart total: Σ quantity × captured unit price.
pub fn cart_total(items: &[CartItem]) -> i64 {
    items
        .iter()
        .map(|item| i64::from(item.quantity) * item.unit_price_cents)
        .sum()
}

/// Order lifecycle status, stored as a lowercase string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }

    /// Cancellation is allowed from `pending` only. Once fulfilment starts the
    /// order is out of the buyer's hands.
    pub fn can_cancel(self) -> bool {
        matches!(self, Self::Pending)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "shipped" => Ok(Self::Shipped),
            "delivered" => Ok(Self::Delivered),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(UnknownVariant),
        }
    }
}

/// Payment method chosen at checkout. No gateway integration here; the value
/// is recorded for the fulfilment pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentMethod {
    Stripe,
    CashOnDelivery,
}

impl PaymentMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Stripe => "stripe",
            Self::CashOnDelivery => "cashOnDelivery",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stripe" => Ok(Self::Stripe),
            "cashOnDelivery" => Ok(Self::CashOnDelivery),
            _ => Err(UnknownVariant),
        }
    }
}

/// A stored string did not match any known enum variant.
#[derive(Debug, thiserror::Error)]
#[error("unknown variant")]
pub struct UnknownVariant;

#[derive(Debug, Clone)]
pub struct ShippingAddress {
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
}

/// Order snapshot. Lines and prices are immutable once placed; only `status`
/// transitions afterwards.
#[derive(Debug, Clone)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub total_cents: i64,
    pub shipping: ShippingAddress,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One order line with the unit price captured at order time.
#[derive(Debug, Clone)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub quantity: i32,
    pub unit_price_cents: i64,
}
