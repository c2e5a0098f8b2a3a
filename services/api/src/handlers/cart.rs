use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};

use harvest_auth_types::identity::Identity;
use harvest_domain::id::{CartItemId, ProductId, UserId};

use crate::domain::types::{Cart, CartItem};
use crate::error::ApiError;
use crate::response::ApiResponse;
use crate::state::AppState;
use crate::usecase::cart::{
    AddCartItemUseCase, ClearCartUseCase, GetCartUseCase, RemoveCartItemUseCase,
    UpdateCartItemUseCase,
};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemResponse {
    pub id: String,
    pub product_id: String,
    pub quantity: i32,
    pub unit_price_cents: i64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartResponse {
    pub id: String,
    pub total_cents: i64,
    pub items: Vec<CartItemResponse>,
}

impl CartResponse {
    fn build(cart: Cart, items: Vec<CartItem>) -> Self {
        Self {
            id: cart.id.to_string(),
            total_cents: cart.total_cents,
            items: items
                .into_iter()
                .map(|item| CartItemResponse {
                    id: item.id.to_string(),
                    product_id: item.product_id.to_string(),
                    quantity: item.quantity,
                    unit_price_cents: item.unit_price_cents,
                })
                .collect(),
        }
    }
}

// ── GET /cart ────────────────────────────────────────────────────────────────

pub async fn get_cart(
    identity: Identity,
    State(state): State<AppState>,
) -> Result<ApiResponse<CartResponse>, ApiError> {
    let usecase = GetCartUseCase {
        carts: state.cart_repo(),
    };
    let (cart, items) = usecase.execute(UserId(identity.user_id)).await?;
    Ok(ApiResponse::new(CartResponse::build(cart, items)))
}

// ── POST /cart ───────────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddCartItemRequest {
    pub product_id: ProductId,
    pub quantity: i32,
}

pub async fn add_cart_item(
    identity: Identity,
    State(state): State<AppState>,
    Json(body): Json<AddCartItemRequest>,
) -> Result<ApiResponse<CartResponse>, ApiError> {
    let usecase = AddCartItemUseCase {
        carts: state.cart_repo(),
        products: state.product_repo(),
    };
    let (cart, items) = usecase
        .execute(UserId(identity.user_id), body.product_id, body.quantity)
        .await?;
    Ok(ApiResponse::new(CartResponse::build(cart, items)))
}

// ── PATCH /cart/items/{itemId} ───────────────────────────────────────────────

#[derive(Deserialize)]
pub struct UpdateCartItemRequest {
    pub quantity: i32,
}

pub async fn update_cart_item(
    identity: Identity,
    State(state): State<AppState>,
    Path(item_id): Path<CartItemId>,
    Json(body): Json<UpdateCartItemRequest>,
) -> Result<ApiResponse<CartResponse>, ApiError> {
    let usecase = UpdateCartItemUseCase {
        carts: state.cart_repo(),
        products: state.product_repo(),
    };
    let (cart, items) = usecase
        .execute(UserId(identity.user_id), item_id, body.quantity)
        .await?;
    Ok(ApiResponse::new(CartResponse::build(cart, items)))
}

// ── DELETE /cart/items/{itemId} ──────────────────────────────────────────────

pub async fn remove_cart_item(
    identity: Identity,
    State(state): State<AppState>,
    Path(item_id): Path<CartItemId>,
) -> Result<ApiResponse<CartResponse>, ApiError> {
    let usecase = RemoveCartItemUseCase {
        carts: state.cart_repo(),
    };
    let (cart, items) = usecase.execute(UserId(identity.user_id), item_id).await?;
    Ok(ApiResponse::new(CartResponse::build(cart, items)))
}

// ── DELETE /cart ─────────────────────────────────────────────────────────────

pub async fn clear_cart(
    identity: Identity,
    State(state): State<AppState>,
) -> Result<ApiResponse<CartResponse>, ApiError> {
    let usecase = ClearCartUseCase {
        carts: state.cart_repo(),
    };
    let cart = usecase.execute(UserId(identity.user_id)).await?;
    Ok(ApiResponse::new(CartResponse::build(cart, Vec::new())))
}
