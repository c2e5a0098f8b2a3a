use axum::{Json, extract::State, http::StatusCode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use harvest_auth_types::identity::Identity;
use harvest_domain::id::UserId;
use harvest_domain::user::UserRole;

use crate::domain::types::UserProfilePatch;
use crate::error::ApiError;
use crate::response::ApiResponse;
use crate::state::AppState;
use crate::usecase::auth::{
    ChangePasswordUseCase, ForgetPasswordUseCase, GetMeUseCase, ResetPasswordUseCase,
    SignInUseCase, SignUpInput, SignUpUseCase, UpdateProfileUseCase, VerifyOtpUseCase,
    VerifyResetOtpUseCase,
};

/// Public view of a user account. Never exposes the password hash or OTP state.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub country: String,
    pub profile_image: Option<String>,
    pub role: UserRole,
    pub is_verified: bool,
    #[serde(serialize_with = "harvest_core::serde::to_rfc3339_ms")]
    pub created_at: DateTime<Utc>,
}

impl From<crate::domain::types::User> for UserResponse {
    fn from(user: crate::domain::types::User) -> Self {
        Self {
            id: user.id.to_string(),
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            phone: user.phone,
            country: user.country,
            profile_image: user.profile_image,
            role: user.role,
            is_verified: user.is_verified,
            created_at: user.created_at,
        }
    }
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

// ── POST /auth/signup ────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub country: String,
    pub password: String,
    pub password_confirm: String,
    pub profile_image: Option<String>,
}

pub async fn signup(
    State(state): State<AppState>,
    Json(body): Json<SignUpRequest>,
) -> Result<(StatusCode, ApiResponse<UserResponse>), ApiError> {
    let usecase = SignUpUseCase {
        users: state.user_repo(),
        mailer: state.mailer.clone(),
    };
    let user = usecase
        .execute(SignUpInput {
            first_name: body.first_name,
            last_name: body.last_name,
            email: body.email,
            phone: body.phone,
            country: body.country,
            password: body.password,
            password_confirm: body.password_confirm,
            profile_image: body.profile_image,
        })
        .await?;
    Ok((StatusCode::CREATED, ApiResponse::new(user.into())))
}

// ── POST /auth/verify ────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct VerifyOtpRequest {
    pub email: String,
    pub otp: i32,
}

pub async fn verify_otp(
    State(state): State<AppState>,
    Json(body): Json<VerifyOtpRequest>,
) -> Result<ApiResponse<MessageResponse>, ApiError> {
    let usecase = VerifyOtpUseCase {
        users: state.user_repo(),
    };
    usecase.execute(&body.email, body.otp).await?;
    Ok(ApiResponse::new(MessageResponse {
        message: "account verified",
    }))
}

// ── POST /auth/signin ────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInResponse {
    pub token: String,
    pub expires_at: u64,
    pub user: UserResponse,
}

pub async fn signin(
    State(state): State<AppState>,
    Json(body): Json<SignInRequest>,
) -> Result<ApiResponse<SignInResponse>, ApiError> {
    let usecase = SignInUseCase {
        users: state.user_repo(),
        jwt_secret: state.config.jwt_secret.clone(),
        session_ttl_secs: state.config.session_ttl_secs,
    };
    let output = usecase.execute(&body.email, &body.password).await?;
    Ok(ApiResponse::new(SignInResponse {
        token: output.token,
        expires_at: output.expires_at,
        user: output.user.into(),
    }))
}

// ── POST /auth/forget-password ───────────────────────────────────────────────

#[derive(Deserialize)]
pub struct ForgetPasswordRequest {
    pub email: String,
}

pub async fn forget_password(
    State(state): State<AppState>,
    Json(body): Json<ForgetPasswordRequest>,
) -> Result<ApiResponse<MessageResponse>, ApiError> {
    let usecase = ForgetPasswordUseCase {
        users: state.user_repo(),
        mailer: state.mailer.clone(),
        flow: state.config.reset_flow,
        jwt_secret: state.config.jwt_secret.clone(),
        reset_link_base: state.config.reset_link_base.clone(),
    };
    usecase.execute(&body.email).await?;
    Ok(ApiResponse::new(MessageResponse {
        message: "reset instructions sent",
    }))
}

// ── POST /auth/verify-reset-otp ──────────────────────────────────────────────

#[derive(Deserialize)]
pub struct VerifyResetOtpRequest {
    pub email: String,
    pub otp: i32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetTokenResponse {
    pub reset_token: String,
}

pub async fn verify_reset_otp(
    State(state): State<AppState>,
    Json(body): Json<VerifyResetOtpRequest>,
) -> Result<ApiResponse<ResetTokenResponse>, ApiError> {
    let usecase = VerifyResetOtpUseCase {
        users: state.user_repo(),
        jwt_secret: state.config.jwt_secret.clone(),
    };
    let reset_token = usecase.execute(&body.email, body.otp).await?;
    Ok(ApiResponse::new(ResetTokenResponse { reset_token }))
}

// ── POST /auth/reset-password ────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub token: String,
    pub password: String,
    pub password_confirm: String,
}

pub async fn reset_password(
    State(state): State<AppState>,
    Json(body): Json<ResetPasswordRequest>,
) -> Result<ApiResponse<MessageResponse>, ApiError> {
    let usecase = ResetPasswordUseCase {
        users: state.user_repo(),
        jwt_secret: state.config.jwt_secret.clone(),
    };
    usecase
        .execute(&body.token, &body.password, &body.password_confirm)
        .await?;
    Ok(ApiResponse::new(MessageResponse {
        message: "password updated",
    }))
}

// ── GET /auth/me ─────────────────────────────────────────────────────────────

pub async fn get_me(
    identity: Identity,
    State(state): State<AppState>,
) -> Result<ApiResponse<UserResponse>, ApiError> {
    let usecase = GetMeUseCase {
        users: state.user_repo(),
    };
    let user = usecase.execute(UserId(identity.user_id)).await?;
    Ok(ApiResponse::new(user.into()))
}

// ── PATCH /auth/me ───────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub country: Option<String>,
    pub profile_image: Option<String>,
}

pub async fn update_me(
    identity: Identity,
    State(state): State<AppState>,
    Json(body): Json<UpdateProfileRequest>,
) -> Result<ApiResponse<UserResponse>, ApiError> {
    let usecase = UpdateProfileUseCase {
        users: state.user_repo(),
    };
    let user = usecase
        .execute(
            UserId(identity.user_id),
            UserProfilePatch {
                first_name: body.first_name,
                last_name: body.last_name,
                phone: body.phone,
                country: body.country,
                profile_image: body.profile_image,
            },
        )
        .await?;
    Ok(ApiResponse::new(user.into()))
}

// ── PATCH /auth/change-password ──────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub password: String,
    pub password_confirm: String,
}

pub async fn change_password(
    identity: Identity,
    State(state): State<AppState>,
    Json(body): Json<ChangePasswordRequest>,
) -> Result<ApiResponse<MessageResponse>, ApiError> {
    let usecase = ChangePasswordUseCase {
        users: state.user_repo(),
    };
    usecase
        .execute(
            UserId(identity.user_id),
            &body.current_password,
            &body.password,
            &body.password_confirm,
        )
        .await?;
    Ok(ApiResponse::new(MessageResponse {
        message: "password updated",
    }))
}
