use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};

use harvest_auth_types::identity::Identity;
use harvest_domain::id::UserId;
use harvest_domain::user::UserRole;

use crate::error::ApiError;
use crate::handlers::auth::UserResponse;
use crate::response::ApiResponse;
use crate::state::AppState;
use crate::usecase::admin::{
    DashboardStats, DashboardStatsUseCase, GetUserUseCase, ListUsersUseCase, UpdateUserRoleUseCase,
};

// ── GET /dashboard ───────────────────────────────────────────────────────────

/// Shape depends on the caller: superAdmin sees platform totals,
/// warehouseAdmin sees their warehouse only.
#[derive(Serialize)]
#[serde(untagged)]
pub enum DashboardResponse {
    #[serde(rename_all = "camelCase")]
    Global {
        users_count: u64,
        warehouses_count: u64,
        equipments_count: u64,
    },
    #[serde(rename_all = "camelCase")]
    Warehouse {
        warehouse_id: String,
        warehouse_name: String,
        equipments_count: u64,
    },
}

impl From<DashboardStats> for DashboardResponse {
    fn from(stats: DashboardStats) -> Self {
        match stats {
            DashboardStats::Global {
                users,
                warehouses,
                equipments,
            } => Self::Global {
                users_count: users,
                warehouses_count: warehouses,
                equipments_count: equipments,
            },
            DashboardStats::Warehouse {
                warehouse_id,
                warehouse_name,
                equipments,
            } => Self::Warehouse {
                warehouse_id: warehouse_id.to_string(),
                warehouse_name,
                equipments_count: equipments,
            },
        }
    }
}

pub async fn get_dashboard(
    identity: Identity,
    State(state): State<AppState>,
) -> Result<ApiResponse<DashboardResponse>, ApiError> {
    let usecase = DashboardStatsUseCase {
        users: state.user_repo(),
        warehouses: state.warehouse_repo(),
        equipments: state.equipment_repo(),
    };
    let stats = usecase
        .execute(UserId(identity.user_id), identity.role)
        .await?;
    Ok(ApiResponse::new(stats.into()))
}

// ── GET /users ───────────────────────────────────────────────────────────────

pub async fn list_users(
    identity: Identity,
    State(state): State<AppState>,
) -> Result<ApiResponse<Vec<UserResponse>>, ApiError> {
    let usecase = ListUsersUseCase {
        users: state.user_repo(),
    };
    let users = usecase.execute(identity.role).await?;
    let data: Vec<UserResponse> = users.into_iter().map(Into::into).collect();
    let results = data.len();
    Ok(ApiResponse::list(data, results))
}

// ── GET /users/{id} ──────────────────────────────────────────────────────────

pub async fn get_user(
    identity: Identity,
    State(state): State<AppState>,
    Path(id): Path<UserId>,
) -> Result<ApiResponse<UserResponse>, ApiError> {
    let usecase = GetUserUseCase {
        users: state.user_repo(),
    };
    let user = usecase.execute(identity.role, id).await?;
    Ok(ApiResponse::new(user.into()))
}

// ── PATCH /users/{id}/role ───────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct UpdateUserRoleRequest {
    pub role: UserRole,
}

pub async fn update_user_role(
    identity: Identity,
    State(state): State<AppState>,
    Path(id): Path<UserId>,
    Json(body): Json<UpdateUserRoleRequest>,
) -> Result<ApiResponse<UserResponse>, ApiError> {
    let usecase = UpdateUserRoleUseCase {
        users: state.user_repo(),
    };
    let user = usecase.execute(identity.role, id, body.role).await?;
    Ok(ApiResponse::new(user.into()))
}
