use axum::{
    Json,
    extract::{Path, RawQuery, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use harvest_auth_types::identity::Identity;
use harvest_domain::id::{CategoryId, ProductId, UserId, WarehouseId};
use harvest_domain::pagination::PageRequest;

use crate::domain::types::{Product, ProductFilter, ProductPatch};
use crate::error::ApiError;
use crate::response::ApiResponse;
use crate::state::AppState;
use crate::usecase::product::{
    CreateProductInput, CreateProductUseCase, DeleteProductUseCase, GetProductUseCase,
    ListProductsUseCase, RateProductUseCase, UpdateProductUseCase,
};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductResponse {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price_cents: i64,
    pub category_id: String,
    pub warehouse_id: String,
    pub in_stock: i32,
    pub images: Vec<String>,
    pub is_available: bool,
    pub average_rating: f64,
    #[serde(serialize_with = "harvest_core::serde::to_rfc3339_ms")]
    pub created_at: DateTime<Utc>,
    #[serde(serialize_with = "harvest_core::serde::to_rfc3339_ms")]
    pub updated_at: DateTime<Utc>,
}

impl From<Product> for ProductResponse {
    fn from(product: Product) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name,
            description: product.description,
            price_cents: product.price_cents,
            category_id: product.category_id.to_string(),
            warehouse_id: product.warehouse_id.to_string(),
            in_stock: product.in_stock,
            images: product.images,
            is_available: product.is_available,
            average_rating: product.average_rating,
            created_at: product.created_at,
            updated_at: product.updated_at,
        }
    }
}

// ── GET /products ────────────────────────────────────────────────────────────

/// Filter keys are kebab-case (`min-price`, `max-price`); prices are cents.
#[derive(Deserialize)]
#[serde(rename_all = "kebab-case")]
struct ProductListQuery {
    category: Option<CategoryId>,
    min_price: Option<i64>,
    max_price: Option<i64>,
}

pub async fn list_products(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<ApiResponse<Vec<ProductResponse>>, ApiError> {
    let query = query.as_deref().unwrap_or("");
    let filters: ProductListQuery =
        serde_qs::from_str(query).map_err(|_| ApiError::InvalidQuery)?;
    let page: PageRequest = serde_qs::from_str(query).map_err(|_| ApiError::InvalidQuery)?;

    let usecase = ListProductsUseCase {
        products: state.product_repo(),
    };
    let products = usecase
        .execute(
            ProductFilter {
                category: filters.category,
                min_price_cents: filters.min_price,
                max_price_cents: filters.max_price,
            },
            page,
        )
        .await?;
    let data: Vec<ProductResponse> = products.into_iter().map(Into::into).collect();
    let results = data.len();
    Ok(ApiResponse::list(data, results))
}

// ── GET /products/{id} ───────────────────────────────────────────────────────

pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<ApiResponse<ProductResponse>, ApiError> {
    let usecase = GetProductUseCase {
        products: state.product_repo(),
    };
    let product = usecase.execute(id).await?;
    Ok(ApiResponse::new(product.into()))
}

// ── POST /products ───────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    pub name: String,
    pub description: String,
    pub price_cents: i64,
    pub category_id: CategoryId,
    pub warehouse_id: Option<WarehouseId>,
    pub in_stock: i32,
    #[serde(default)]
    pub images: Vec<String>,
}

pub async fn create_product(
    identity: Identity,
    State(state): State<AppState>,
    Json(body): Json<CreateProductRequest>,
) -> Result<(StatusCode, ApiResponse<ProductResponse>), ApiError> {
    let usecase = CreateProductUseCase {
        products: state.product_repo(),
        warehouses: state.warehouse_repo(),
        categories: state.category_repo(),
    };
    let product = usecase
        .execute(
            UserId(identity.user_id),
            identity.role,
            CreateProductInput {
                name: body.name,
                description: body.description,
                price_cents: body.price_cents,
                category_id: body.category_id,
                warehouse_id: body.warehouse_id,
                in_stock: body.in_stock,
                images: body.images,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, ApiResponse::new(product.into())))
}

// ── PATCH /products/{id} ─────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price_cents: Option<i64>,
    pub category_id: Option<CategoryId>,
    pub in_stock: Option<i32>,
    pub images: Option<Vec<String>>,
    pub is_available: Option<bool>,
}

pub async fn update_product(
    identity: Identity,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    Json(body): Json<UpdateProductRequest>,
) -> Result<ApiResponse<ProductResponse>, ApiError> {
    let usecase = UpdateProductUseCase {
        products: state.product_repo(),
        warehouses: state.warehouse_repo(),
        categories: state.category_repo(),
    };
    let product = usecase
        .execute(
            UserId(identity.user_id),
            identity.role,
            id,
            ProductPatch {
                name: body.name,
                description: body.description,
                price_cents: body.price_cents,
                category_id: body.category_id,
                in_stock: body.in_stock,
                images: body.images,
                is_available: body.is_available,
            },
        )
        .await?;
    Ok(ApiResponse::new(product.into()))
}

// ── DELETE /products/{id} ────────────────────────────────────────────────────

pub async fn delete_product(
    identity: Identity,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<StatusCode, ApiError> {
    let usecase = DeleteProductUseCase {
        products: state.product_repo(),
        warehouses: state.warehouse_repo(),
    };
    usecase
        .execute(UserId(identity.user_id), identity.role, id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// ── POST /products/{id}/ratings ──────────────────────────────────────────────

#[derive(Deserialize)]
pub struct RateProductRequest {
    pub rating: i16,
    pub review: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingResponse {
    pub average_rating: f64,
}

pub async fn rate_product(
    identity: Identity,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    Json(body): Json<RateProductRequest>,
) -> Result<ApiResponse<RatingResponse>, ApiError> {
    let usecase = RateProductUseCase {
        products: state.product_repo(),
    };
    let average_rating = usecase
        .execute(UserId(identity.user_id), id, body.rating, body.review)
        .await?;
    Ok(ApiResponse::new(RatingResponse { average_rating }))
}
