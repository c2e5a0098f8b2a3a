use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use harvest_auth_types::identity::Identity;
use harvest_domain::id::{OrderId, ProductId, UserId};

use crate::domain::types::{Order, OrderLine, PaymentMethod, ShippingAddress};
use crate::error::ApiError;
use crate::response::ApiResponse;
use crate::state::AppState;
use crate::usecase::order::{
    CancelOrderUseCase, GetOrderUseCase, ListOrdersUseCase, OrderItemInput, PlaceOrderInput,
    PlaceOrderUseCase,
};

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddressBody {
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineResponse {
    pub product_id: String,
    pub quantity: i32,
    pub unit_price_cents: i64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub id: String,
    pub status: String,
    pub payment_method: String,
    pub total_cents: i64,
    pub shipping: ShippingAddressBody,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<OrderLineResponse>>,
    #[serde(serialize_with = "harvest_core::serde::to_rfc3339_ms")]
    pub created_at: DateTime<Utc>,
}

impl OrderResponse {
    fn build(order: Order, lines: Option<Vec<OrderLine>>) -> Self {
        Self {
            id: order.id.to_string(),
            status: order.status.to_string(),
            payment_method: order.payment_method.to_string(),
            total_cents: order.total_cents,
            shipping: ShippingAddressBody {
                address: order.shipping.address,
                city: order.shipping.city,
                postal_code: order.shipping.postal_code,
                country: order.shipping.country,
            },
            items: lines.map(|lines| {
                lines
                    .into_iter()
                    .map(|line| OrderLineResponse {
                        product_id: line.product_id.to_string(),
                        quantity: line.quantity,
                        unit_price_cents: line.unit_price_cents,
                    })
                    .collect()
            }),
            created_at: order.created_at,
        }
    }
}

// ── POST /orders ─────────────────────────────────────────────────────────────

/// Wire names of [`PaymentMethod`] values.
#[derive(Deserialize)]
pub enum PaymentMethodBody {
    #[serde(rename = "stripe")]
    Stripe,
    #[serde(rename = "cashOnDelivery")]
    CashOnDelivery,
}

impl From<PaymentMethodBody> for PaymentMethod {
    fn from(body: PaymentMethodBody) -> Self {
        match body {
            PaymentMethodBody::Stripe => Self::Stripe,
            PaymentMethodBody::CashOnDelivery => Self::CashOnDelivery,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemBody {
    pub product_id: ProductId,
    pub quantity: i32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderRequest {
    pub items: Vec<OrderItemBody>,
    pub payment_method: PaymentMethodBody,
    pub shipping: ShippingAddressBody,
}

pub async fn place_order(
    identity: Identity,
    State(state): State<AppState>,
    Json(body): Json<PlaceOrderRequest>,
) -> Result<(StatusCode, ApiResponse<OrderResponse>), ApiError> {
    let usecase = PlaceOrderUseCase {
        carts: state.cart_repo(),
        products: state.product_repo(),
        orders: state.order_repo(),
    };
    let (order, lines) = usecase
        .execute(
            UserId(identity.user_id),
            PlaceOrderInput {
                items: body
                    .items
                    .into_iter()
                    .map(|item| OrderItemInput {
                        product_id: item.product_id,
                        quantity: item.quantity,
                    })
                    .collect(),
                payment_method: body.payment_method.into(),
                shipping: ShippingAddress {
                    address: body.shipping.address,
                    city: body.shipping.city,
                    postal_code: body.shipping.postal_code,
                    country: body.shipping.country,
                },
            },
        )
        .await?;
    Ok((
        StatusCode::CREATED,
        ApiResponse::new(OrderResponse::build(order, Some(lines))),
    ))
}

// ── GET /orders ──────────────────────────────────────────────────────────────

pub async fn list_orders(
    identity: Identity,
    State(state): State<AppState>,
) -> Result<ApiResponse<Vec<OrderResponse>>, ApiError> {
    let usecase = ListOrdersUseCase {
        orders: state.order_repo(),
    };
    let orders = usecase.execute(UserId(identity.user_id)).await?;
    let data: Vec<OrderResponse> = orders
        .into_iter()
        .map(|order| OrderResponse::build(order, None))
        .collect();
    let results = data.len();
    Ok(ApiResponse::list(data, results))
}

// ── GET /orders/{id} ─────────────────────────────────────────────────────────

pub async fn get_order(
    identity: Identity,
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
) -> Result<ApiResponse<OrderResponse>, ApiError> {
    let usecase = GetOrderUseCase {
        orders: state.order_repo(),
    };
    let (order, lines) = usecase.execute(UserId(identity.user_id), id).await?;
    Ok(ApiResponse::new(OrderResponse::build(order, Some(lines))))
}

// ── PATCH /orders/{id}/cancel ────────────────────────────────────────────────

pub async fn cancel_order(
    identity: Identity,
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
) -> Result<ApiResponse<OrderResponse>, ApiError> {
    let usecase = CancelOrderUseCase {
        orders: state.order_repo(),
    };
    let order = usecase.execute(UserId(identity.user_id), id).await?;
    Ok(ApiResponse::new(OrderResponse::build(order, None)))
}
