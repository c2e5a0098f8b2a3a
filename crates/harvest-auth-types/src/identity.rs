//! Bearer-token identity extractor.

use axum::extract::FromRequestParts;
use axum::response::{IntoResponse, Response};
use http::StatusCode;
use http::request::Parts;
use uuid::Uuid;

use harvest_domain::user::UserRole;

use crate::token::{TokenError, validate_session_token};

/// Provides the HMAC secret used to validate session tokens.
///
/// Implemented by each service's `AppState` so the [`Identity`] extractor can
/// run against it.
pub trait JwtSecret {
    fn jwt_secret(&self) -> &str;
}

/// Authenticated caller, resolved from the `Authorization: Bearer <jwt>` header.
///
/// Missing or invalid tokens are rejected with 401 before the handler runs.
/// Unverified accounts are rejected with 403; verification state rides in the
/// token so this check needs no store lookup. Role-based denial (also 403) is
/// the authorization policy's job, after extraction.
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: Uuid,
    pub role: UserRole,
}

/// Rejection for [`Identity`], rendered in the API failure envelope.
#[derive(Debug, thiserror::Error)]
pub enum IdentityRejection {
    #[error("not authorized, no token provided")]
    MissingToken,
    #[error("not authorized, invalid token")]
    InvalidToken,
    #[error("user account not verified, please verify it")]
    Unverified,
}

impl IntoResponse for IdentityRejection {
    fn into_response(self) -> Response {
        let status = match self {
            Self::MissingToken | Self::InvalidToken => StatusCode::UNAUTHORIZED,
            Self::Unverified => StatusCode::FORBIDDEN,
        };
        let body = serde_json::json!({
            "status": "fail",
            "message": self.to_string(),
        });
        (status, axum::Json(body)).into_response()
    }
}

impl<S> FromRequestParts<S> for Identity
where
    S: JwtSecret + Send + Sync,
{
    type Rejection = IdentityRejection;

    // axum-core 0.5 defines this as `fn -> impl Future + Send` (not `async fn`).
    // Extract synchronously, return a 'static async move block.
    fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let bearer = parts
            .headers
            .get(http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::to_owned);

        let result = match bearer {
            None => Err(IdentityRejection::MissingToken),
            Some(token) => match validate_session_token(&token, state.jwt_secret()) {
                Ok(info) if !info.verified => Err(IdentityRejection::Unverified),
                Ok(info) => match UserRole::from_u8(info.user_role) {
                    Some(role) => Ok(Identity {
                        user_id: info.user_id,
                        role,
                    }),
                    None => Err(IdentityRejection::InvalidToken),
                },
                Err(TokenError::Expired | TokenError::InvalidSignature | TokenError::Malformed) => {
                    Err(IdentityRejection::InvalidToken)
                }
            },
        };

        async move { result }
    }
}
