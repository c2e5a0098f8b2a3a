use axum::{
    Json,
    extract::{Path, RawQuery, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use harvest_auth_types::identity::Identity;
use harvest_domain::id::{EquipmentId, UserId, WarehouseId};
use harvest_domain::pagination::{PageRequest, Sort};

use crate::domain::types::{Equipment, EquipmentFilter, EquipmentPatch, EquipmentSortBy};
use crate::error::ApiError;
use crate::response::ApiResponse;
use crate::state::AppState;
use crate::usecase::equipment::{
    CreateEquipmentInput, CreateEquipmentUseCase, DeleteEquipmentUseCase, GetEquipmentUseCase,
    ListEquipmentUseCase, SearchEquipmentUseCase, UpdateEquipmentUseCase,
};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EquipmentResponse {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price_cents: i64,
    pub category: String,
    pub manufacturer: String,
    pub warehouse_id: String,
    pub in_stock: i32,
    pub images: Vec<String>,
    pub specifications: serde_json::Value,
    pub is_available: bool,
    #[serde(serialize_with = "harvest_core::serde::to_rfc3339_ms")]
    pub created_at: DateTime<Utc>,
    #[serde(serialize_with = "harvest_core::serde::to_rfc3339_ms")]
    pub updated_at: DateTime<Utc>,
}

impl From<Equipment> for EquipmentResponse {
    fn from(equipment: Equipment) -> Self {
        Self {
            id: equipment.id.to_string(),
            name: equipment.name,
            description: equipment.description,
            price_cents: equipment.price_cents,
            category: equipment.category,
            manufacturer: equipment.manufacturer,
            warehouse_id: equipment.warehouse_id.to_string(),
            in_stock: equipment.in_stock,
            images: equipment.images,
            specifications: equipment.specifications,
            is_available: equipment.is_available,
            created_at: equipment.created_at,
            updated_at: equipment.updated_at,
        }
    }
}

// ── GET /equipments ──────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "kebab-case")]
enum EquipmentSortField {
    CreatedAt,
    Price,
}

/// Filter keys are kebab-case. `sort-by` picks the column (`created-at`,
/// `price`), `sort` the direction (`desc` default).
#[derive(Deserialize)]
#[serde(rename_all = "kebab-case")]
struct EquipmentListQuery {
    category: Option<String>,
    min_price: Option<i64>,
    max_price: Option<i64>,
    sort_by: Option<EquipmentSortField>,
    sort: Option<Sort>,
}

pub async fn list_equipments(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<ApiResponse<Vec<EquipmentResponse>>, ApiError> {
    let query = query.as_deref().unwrap_or("");
    let filters: EquipmentListQuery =
        serde_qs::from_str(query).map_err(|_| ApiError::InvalidQuery)?;
    let page: PageRequest = serde_qs::from_str(query).map_err(|_| ApiError::InvalidQuery)?;

    let sort = filters.sort.unwrap_or(Sort::Desc);
    let sort_by = match filters.sort_by {
        Some(EquipmentSortField::Price) => EquipmentSortBy::Price(sort),
        Some(EquipmentSortField::CreatedAt) | None => EquipmentSortBy::CreatedAt(sort),
    };

    let usecase = ListEquipmentUseCase {
        equipments: state.equipment_repo(),
    };
    let equipments = usecase
        .execute(
            EquipmentFilter {
                category: filters.category,
                min_price_cents: filters.min_price,
                max_price_cents: filters.max_price,
            },
            sort_by,
            page,
        )
        .await?;
    let data: Vec<EquipmentResponse> = equipments.into_iter().map(Into::into).collect();
    let results = data.len();
    Ok(ApiResponse::list(data, results))
}

// ── GET /equipments/search ───────────────────────────────────────────────────

#[derive(Deserialize)]
struct EquipmentSearchQuery {
    q: Option<String>,
}

pub async fn search_equipments(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<ApiResponse<Vec<EquipmentResponse>>, ApiError> {
    let query = query.as_deref().unwrap_or("");
    let search: EquipmentSearchQuery =
        serde_qs::from_str(query).map_err(|_| ApiError::InvalidQuery)?;
    let page: PageRequest = serde_qs::from_str(query).map_err(|_| ApiError::InvalidQuery)?;

    let usecase = SearchEquipmentUseCase {
        equipments: state.equipment_repo(),
    };
    let equipments = usecase
        .execute(search.q.as_deref().unwrap_or(""), page)
        .await?;
    let data: Vec<EquipmentResponse> = equipments.into_iter().map(Into::into).collect();
    let results = data.len();
    Ok(ApiResponse::list(data, results))
}

// ── GET /equipments/{id} ─────────────────────────────────────────────────────

pub async fn get_equipment(
    State(state): State<AppState>,
    Path(id): Path<EquipmentId>,
) -> Result<ApiResponse<EquipmentResponse>, ApiError> {
    let usecase = GetEquipmentUseCase {
        equipments: state.equipment_repo(),
    };
    let equipment = usecase.execute(id).await?;
    Ok(ApiResponse::new(equipment.into()))
}

// ── POST /equipments ─────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEquipmentRequest {
    pub name: String,
    pub description: String,
    pub price_cents: i64,
    pub category: String,
    pub manufacturer: String,
    pub warehouse_id: Option<WarehouseId>,
    pub in_stock: i32,
    #[serde(default)]
    pub images: Vec<String>,
    pub specifications: Option<serde_json::Value>,
}

pub async fn create_equipment(
    identity: Identity,
    State(state): State<AppState>,
    Json(body): Json<CreateEquipmentRequest>,
) -> Result<(StatusCode, ApiResponse<EquipmentResponse>), ApiError> {
    let usecase = CreateEquipmentUseCase {
        equipments: state.equipment_repo(),
        warehouses: state.warehouse_repo(),
    };
    let equipment = usecase
        .execute(
            UserId(identity.user_id),
            identity.role,
            CreateEquipmentInput {
                name: body.name,
                description: body.description,
                price_cents: body.price_cents,
                category: body.category,
                manufacturer: body.manufacturer,
                warehouse_id: body.warehouse_id,
                in_stock: body.in_stock,
                images: body.images,
                specifications: body.specifications,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, ApiResponse::new(equipment.into())))
}

// ── PATCH /equipments/{id} ───────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEquipmentRequest {
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

pub async fn update_equipment(
    identity: Identity,
    State(state): State<AppState>,
    Path(id): Path<EquipmentId>,
    Json(body): Json<UpdateEquipmentRequest>,
) -> Result<ApiResponse<EquipmentResponse>, ApiError> {
    let usecase = UpdateEquipmentUseCase {
        equipments: state.equipment_repo(),
        warehouses: state.warehouse_repo(),
    };
    let equipment = usecase
        .execute(
            UserId(identity.user_id),
            identity.role,
            id,
            EquipmentPatch {
                name: body.name,
                description: body.description,
                price_cents: body.price_cents,
                category: body.category,
                manufacturer: body.manufacturer,
                in_stock: body.in_stock,
                images: body.images,
                specifications: body.specifications,
                is_available: body.is_available,
            },
        )
        .await?;
    Ok(ApiResponse::new(equipment.into()))
}

// ── DELETE /equipments/{id} ──────────────────────────────────────────────────

pub async fn delete_equipment(
    identity: Identity,
    State(state): State<AppState>,
    Path(id): Path<EquipmentId>,
) -> Result<StatusCode, ApiError> {
    let usecase = DeleteEquipmentUseCase {
        equipments: state.equipment_repo(),
        warehouses: state.warehouse_repo(),
    };
    usecase
        .execute(UserId(identity.user_id), identity.role, id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
