use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use harvest_auth_types::identity::Identity;
use harvest_domain::id::{CategoryId, UserId};

use crate::domain::types::{Category, CategoryPatch};
use crate::error::ApiError;
use crate::response::ApiResponse;
use crate::state::AppState;
use crate::usecase::category::{
    CreateCategoryInput, CreateCategoryUseCase, DeleteCategoryUseCase, GetCategoryUseCase,
    ListCategoriesUseCase, UpdateCategoryUseCase,
};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryResponse {
    pub id: String,
    pub name: String,
    pub description: String,
    pub image: Option<String>,
    pub is_active: bool,
    #[serde(serialize_with = "harvest_core::serde::to_rfc3339_ms")]
    pub created_at: DateTime<Utc>,
}

impl From<Category> for CategoryResponse {
    fn from(category: Category) -> Self {
        Self {
            id: category.id.to_string(),
            name: category.name,
            description: category.description,
            image: category.image,
            is_active: category.is_active,
            created_at: category.created_at,
        }
    }
}

// ── GET /categories ──────────────────────────────────────────────────────────

pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<ApiResponse<Vec<CategoryResponse>>, ApiError> {
    let usecase = ListCategoriesUseCase {
        categories: state.category_repo(),
    };
    let categories = usecase.execute().await?;
    let data: Vec<CategoryResponse> = categories.into_iter().map(Into::into).collect();
    let results = data.len();
    Ok(ApiResponse::list(data, results))
}

// ── GET /categories/{id} ─────────────────────────────────────────────────────

pub async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<CategoryId>,
) -> Result<ApiResponse<CategoryResponse>, ApiError> {
    let usecase = GetCategoryUseCase {
        categories: state.category_repo(),
    };
    let category = usecase.execute(id).await?;
    Ok(ApiResponse::new(category.into()))
}

// ── POST /categories ─────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
    pub description: String,
    pub image: Option<String>,
}

pub async fn create_category(
    identity: Identity,
    State(state): State<AppState>,
    Json(body): Json<CreateCategoryRequest>,
) -> Result<(StatusCode, ApiResponse<CategoryResponse>), ApiError> {
    let usecase = CreateCategoryUseCase {
        categories: state.category_repo(),
    };
    let category = usecase
        .execute(
            UserId(identity.user_id),
            identity.role,
            CreateCategoryInput {
                name: body.name,
                description: body.description,
                image: body.image,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, ApiResponse::new(category.into())))
}

// ── PATCH /categories/{id} ───────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCategoryRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub is_active: Option<bool>,
}

pub async fn update_category(
    identity: Identity,
    State(state): State<AppState>,
    Path(id): Path<CategoryId>,
    Json(body): Json<UpdateCategoryRequest>,
) -> Result<ApiResponse<CategoryResponse>, ApiError> {
    let usecase = UpdateCategoryUseCase {
        categories: state.category_repo(),
    };
    let category = usecase
        .execute(
            identity.role,
            id,
            CategoryPatch {
                name: body.name,
                description: body.description,
                image: body.image,
                is_active: body.is_active,
            },
        )
        .await?;
    Ok(ApiResponse::new(category.into()))
}

// ── DELETE /categories/{id} ──────────────────────────────────────────────────

pub async fn delete_category(
    identity: Identity,
    State(state): State<AppState>,
    Path(id): Path<CategoryId>,
) -> Result<StatusCode, ApiError> {
    let usecase = DeleteCategoryUseCase {
        categories: state.category_repo(),
    };
    usecase.execute(identity.role, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
