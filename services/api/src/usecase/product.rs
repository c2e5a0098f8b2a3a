use chrono::Utc;
use uuid::Uuid;

use harvest_domain::id::{CategoryId, ProductId, UserId, WarehouseId};
use harvest_domain::pagination::PageRequest;
use harvest_domain::user::UserRole;

use crate::domain::policy::{Action, Ownership, authorize};
use crate::domain::repository::{CategoryRepository, ProductRepository, WarehouseRepository};
use crate::domain::types::{Product, ProductFilter, ProductPatch, ProductRating, Warehouse};
use crate::error::ApiError;

/// Resolve the warehouse a catalog mutation targets: the explicit one if
/// given, otherwise the one the actor manages.
pub(crate) async fn resolve_target_warehouse<W: WarehouseRepository>(
    warehouses: &W,
    actor_id: UserId,
    explicit: Option<WarehouseId>,
) -> Result<Warehouse, ApiError> {
    match explicit {
        Some(id) => warehouses
            .find_by_id(id)
            .await?
            .ok_or(ApiError::WarehouseNotFound),
        None => warehouses
            .find_by_admin(actor_id)
            .await?
            .ok_or(ApiError::WarehouseNotFound),
    }
}

// ── ListProducts / GetProduct ────────────────────────────────────────────────

pub struct ListProductsUseCase<P: ProductRepository> {
    pub products: P,
}

impl<P: ProductRepository> ListProductsUseCase<P> {
    pub async fn execute(
        &self,
        filter: ProductFilter,
        page: PageRequest,
    ) -> Result<Vec<Product>, ApiError> {
        self.products.list(&filter, page.clamped()).await
    }
}

pub struct GetProductUseCase<P: ProductRepository> {
    pub products: P,
}

impl<P: ProductRepository> GetProductUseCase<P> {
    pub async fn execute(&self, id: ProductId) -> Result<Product, ApiError> {
        self.products
            .find_by_id(id)
            .await?
            .ok_or(ApiError::ProductNotFound)
    }
}

// ── CreateProduct ────────────────────────────────────────────────────────────

pub struct CreateProductInput {
    pub name: String,
    pub description: String,
    pub price_cents: i64,
    pub category_id: CategoryId,
    /// Required for superAdmin; warehouseAdmins default to their own warehouse.
    pub warehouse_id: Option<WarehouseId>,
    pub in_stock: i32,
    pub images: Vec<String>,
}

pub struct CreateProductUseCase<P, W, C>
where
    P: ProductRepository,
    W: WarehouseRepository,
    C: CategoryRepository,
{
    pub products: P,
    pub warehouses: W,
    pub categories: C,
}

impl<P, W, C> CreateProductUseCase<P, W, C>
where
    P: ProductRepository,
    W: WarehouseRepository,
    C: CategoryRepository,
{
    pub async fn execute(
        &self,
        actor_id: UserId,
        role: UserRole,
        input: CreateProductInput,
    ) -> Result<Product, ApiError> {
        let warehouse =
            resolve_target_warehouse(&self.warehouses, actor_id, input.warehouse_id).await?;
        authorize(
            role,
            Action::MutateProduct,
            Ownership::Warehouse {
                admin_id: warehouse.admin_id.0,
                actor_id: actor_id.0,
            },
        )
        .map_err(|_| ApiError::Forbidden)?;

        if input.price_cents <= 0 {
            return Err(ApiError::InvalidPrice);
        }
        if input.in_stock < 0 {
            return Err(ApiError::InvalidStock);
        }
        self.categories
            .find_by_id(input.category_id)
            .await?
            .ok_or(ApiError::CategoryNotFound)?;

        let now = Utc::now();
        let product = Product {
            id: ProductId(Uuid::now_v7()),
            name: input.name,
            description: input.description,
            price_cents: input.price_cents,
            category_id: input.category_id,
            warehouse_id: warehouse.id,
            in_stock: input.in_stock,
            images: input.images,
            is_available: true,
            average_rating: 0.0,
            created_at: now,
            updated_at: now,
        };
        self.products.create(&product).await?;
        Ok(product)
    }
}

// ── UpdateProduct ────────────────────────────────────────────────────────────

pub struct UpdateProductUseCase<P, W, C>
where
    P: ProductRepository,
    W: WarehouseRepository,
    C: CategoryRepository,
{
    pub products: P,
    pub warehouses: W,
    pub categories: C,
}

impl<P, W, C> UpdateProductUseCase<P, W, C>
where
    P: ProductRepository,
    W: WarehouseRepository,
    C: CategoryRepository,
{
    pub async fn execute(
        &self,
        actor_id: UserId,
        role: UserRole,
        product_id: ProductId,
        patch: ProductPatch,
    ) -> Result<Product, ApiError> {
        let product = self
            .products
            .find_by_id(product_id)
            .await?
            .ok_or(ApiError::ProductNotFound)?;
        authorize_product_mutation(&self.warehouses, actor_id, role, &product).await?;

        if let Some(price) = patch.price_cents {
            if price <= 0 {
                return Err(ApiError::InvalidPrice);
            }
        }
        if let Some(stock) = patch.in_stock {
            if stock < 0 {
                return Err(ApiError::InvalidStock);
            }
        }
        if let Some(category_id) = patch.category_id {
            self.categories
                .find_by_id(category_id)
                .await?
                .ok_or(ApiError::CategoryNotFound)?;
        }

        self.products.update(product.id, &patch).await?;
        self.products
            .find_by_id(product.id)
            .await?
            .ok_or(ApiError::ProductNotFound)
    }
}

async fn authorize_product_mutation<W: WarehouseRepository>(
    warehouses: &W,
    actor_id: UserId,
    role: UserRole,
    product: &Product,
) -> Result<(), ApiError> {
    let warehouse = warehouses
        .find_by_id(product.warehouse_id)
        .await?
        .ok_or(ApiError::WarehouseNotFound)?;
    authorize(
        role,
        Action::MutateProduct,
        Ownership::Warehouse {
            admin_id: warehouse.admin_id.0,
            actor_id: actor_id.0,
        },
    )
    .map_err(|_| ApiError::Forbidden)
}

// ── DeleteProduct ────────────────────────────────────────────────────────────

pub struct DeleteProductUseCase<P, W>
where
    P: ProductRepository,
    W: WarehouseRepository,
{
    pub products: P,
    pub warehouses: W,
}

impl<P, W> DeleteProductUseCase<P, W>
where
    P: ProductRepository,
    W: WarehouseRepository,
{
    /// Soft delete: the product disappears from listings and carts reject it,
    /// but existing order lines keep their reference.
    pub async fn execute(
        &self,
        actor_id: UserId,
        role: UserRole,
        product_id: ProductId,
    ) -> Result<(), ApiError> {
        let product = self
            .products
            .find_by_id(product_id)
            .await?
            .ok_or(ApiError::ProductNotFound)?;
        authorize_product_mutation(&self.warehouses, actor_id, role, &product).await?;

        let patch = ProductPatch {
            is_available: Some(false),
            ..Default::default()
        };
        self.products.update(product.id, &patch).await
    }
}

// ── RateProduct ──────────────────────────────────────────────────────────────

pub struct RateProductUseCase<P: ProductRepository> {
    pub products: P,
}

impl<P: ProductRepository> RateProductUseCase<P> {
    /// Upsert the caller's rating; returns the product's new average.
    pub async fn execute(
        &self,
        user_id: UserId,
        product_id: ProductId,
        rating: i16,
        review: Option<String>,
    ) -> Result<f64, ApiError> {
        if !(1..=5).contains(&rating) {
            return Err(ApiError::InvalidRating);
        }
        let product = self
            .products
            .find_by_id(product_id)
            .await?
            .ok_or(ApiError::ProductNotFound)?;
        self.products
            .upsert_rating(&ProductRating {
                product_id: product.id,
                user_id,
                rating,
                review,
            })
            .await
    }
}
