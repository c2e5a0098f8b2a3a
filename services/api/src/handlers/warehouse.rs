use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use harvest_auth_types::identity::Identity;
use harvest_domain::id::{UserId, WarehouseId};

use crate::domain::types::{Warehouse, WarehousePatch};
use crate::error::ApiError;
use crate::response::ApiResponse;
use crate::state::AppState;
use crate::usecase::warehouse::{
    CreateWarehouseInput, CreateWarehouseUseCase, GetWarehouseUseCase, ListWarehousesUseCase,
    UpdateWarehouseUseCase,
};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WarehouseResponse {
    pub id: String,
    pub name: String,
    pub location: String,
    pub capacity: i32,
    pub admin_id: String,
    pub image: Option<String>,
    pub is_active: bool,
    #[serde(serialize_with = "harvest_core::serde::to_rfc3339_ms")]
    pub created_at: DateTime<Utc>,
}

impl From<Warehouse> for WarehouseResponse {
    fn from(warehouse: Warehouse) -> Self {
        Self {
            id: warehouse.id.to_string(),
            name: warehouse.name,
            location: warehouse.location,
            capacity: warehouse.capacity,
            admin_id: warehouse.admin_id.to_string(),
            image: warehouse.image,
            is_active: warehouse.is_active,
            created_at: warehouse.created_at,
        }
    }
}

// ── GET /warehouses ──────────────────────────────────────────────────────────

pub async fn list_warehouses(
    State(state): State<AppState>,
) -> Result<ApiResponse<Vec<WarehouseResponse>>, ApiError> {
    let usecase = ListWarehousesUseCase {
        warehouses: state.warehouse_repo(),
    };
    let warehouses = usecase.execute().await?;
    let data: Vec<WarehouseResponse> = warehouses.into_iter().map(Into::into).collect();
    let results = data.len();
    Ok(ApiResponse::list(data, results))
}

// ── GET /warehouses/{id} ─────────────────────────────────────────────────────

pub async fn get_warehouse(
    State(state): State<AppState>,
    Path(id): Path<WarehouseId>,
) -> Result<ApiResponse<WarehouseResponse>, ApiError> {
    let usecase = GetWarehouseUseCase {
        warehouses: state.warehouse_repo(),
    };
    let warehouse = usecase.execute(id).await?;
    Ok(ApiResponse::new(warehouse.into()))
}

// ── POST /warehouses ─────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateWarehouseRequest {
    pub name: String,
    pub location: String,
    pub capacity: i32,
    pub admin_id: UserId,
    pub image: Option<String>,
}

pub async fn create_warehouse(
    identity: Identity,
    State(state): State<AppState>,
    Json(body): Json<CreateWarehouseRequest>,
) -> Result<(StatusCode, ApiResponse<WarehouseResponse>), ApiError> {
    let usecase = CreateWarehouseUseCase {
        warehouses: state.warehouse_repo(),
        users: state.user_repo(),
    };
    let warehouse = usecase
        .execute(
            identity.role,
            CreateWarehouseInput {
                name: body.name,
                location: body.location,
                capacity: body.capacity,
                admin_id: body.admin_id,
                image: body.image,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, ApiResponse::new(warehouse.into())))
}

// ── PATCH /warehouses/{id} ───────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateWarehouseRequest {
    pub name: Option<String>,
    pub location: Option<String>,
    pub capacity: Option<i32>,
    pub image: Option<String>,
    pub is_active: Option<bool>,
}

pub async fn update_warehouse(
    identity: Identity,
    State(state): State<AppState>,
    Path(id): Path<WarehouseId>,
    Json(body): Json<UpdateWarehouseRequest>,
) -> Result<ApiResponse<WarehouseResponse>, ApiError> {
    let usecase = UpdateWarehouseUseCase {
        warehouses: state.warehouse_repo(),
    };
    let warehouse = usecase
        .execute(
            UserId(identity.user_id),
            identity.role,
            id,
            WarehousePatch {
                name: body.name,
                location: body.location,
                capacity: body.capacity,
                image: body.image,
                is_active: body.is_active,
            },
        )
        .await?;
    Ok(ApiResponse::new(warehouse.into()))
}
