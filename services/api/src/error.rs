use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// API service domain error variants.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    // auth
    #[error("passwords do not match")]
    PasswordMismatch,
    #[error("email already registered")]
    EmailTaken,
    #[error("incorrect email or password")]
    InvalidCredentials,
    #[error("invalid or expired verification code")]
    InvalidOtp,
    #[error("invalid or expired reset token")]
    InvalidResetToken,
    #[error("user not found")]
    UserNotFound,
    #[error("failed to send email")]
    EmailDispatch(#[source] anyhow::Error),

    // catalog
    #[error("category not found")]
    CategoryNotFound,
    #[error("warehouse not found")]
    WarehouseNotFound,
    #[error("product not found")]
    ProductNotFound,
    #[error("equipment not found")]
    EquipmentNotFound,
    #[error("product is not available")]
    ProductUnavailable,
    #[error("price must be a positive amount")]
    InvalidPrice,
    #[error("rating must be between 1 and 5")]
    InvalidRating,
    #[error("stock cannot be negative")]
    InvalidStock,
    #[error("warehouse name already in use")]
    WarehouseNameTaken,
    #[error("admin must hold the warehouseAdmin role")]
    NotWarehouseAdmin,
    #[error("admin already manages a warehouse")]
    AdminAlreadyAssigned,

    // cart / orders
    #[error("cart item not found")]
    CartItemNotFound,
    #[error("order not found")]
    OrderNotFound,
    #[error("order must contain at least one item")]
    EmptyOrder,
    #[error("quantity must be at least 1")]
    InvalidQuantity,
    #[error("insufficient stock, only {available} left")]
    InsufficientStock { available: i32 },
    #[error("order cannot be cancelled in status {status}")]
    CannotCancel { status: String },

    // generic
    #[error("you do not have permission to perform this action")]
    Forbidden,
    #[error("invalid query string")]
    InvalidQuery,
    #[error("missing data")]
    MissingData,
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::PasswordMismatch => "PASSWORD_MISMATCH",
            Self::EmailTaken => "EMAIL_TAKEN",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::InvalidOtp => "INVALID_OTP",
            Self::InvalidResetToken => "INVALID_RESET_TOKEN",
            Self::UserNotFound => "USER_NOT_FOUND",
            Self::EmailDispatch(_) => "EMAIL_DISPATCH",
            Self::CategoryNotFound => "CATEGORY_NOT_FOUND",
            Self::WarehouseNotFound => "WAREHOUSE_NOT_FOUND",
            Self::ProductNotFound => "PRODUCT_NOT_FOUND",
            Self::EquipmentNotFound => "EQUIPMENT_NOT_FOUND",
            Self::ProductUnavailable => "PRODUCT_UNAVAILABLE",
            Self::InvalidPrice => "INVALID_PRICE",
            Self::InvalidRating => "INVALID_RATING",
            Self::InvalidStock => "INVALID_STOCK",
            Self::WarehouseNameTaken => "WAREHOUSE_NAME_TAKEN",
            Self::NotWarehouseAdmin => "NOT_WAREHOUSE_ADMIN",
            Self::AdminAlreadyAssigned => "ADMIN_ALREADY_ASSIGNED",
            Self::CartItemNotFound => "CART_ITEM_NOT_FOUND",
            Self::OrderNotFound => "ORDER_NOT_FOUND",
            Self::EmptyOrder => "EMPTY_ORDER",
            Self::InvalidQuantity => "INVALID_QUANTITY",
            Self::InsufficientStock { .. } => "INSUFFICIENT_STOCK",
            Self::CannotCancel { .. } => "CANNOT_CANCEL",
            Self::Forbidden => "FORBIDDEN",
            Self::InvalidQuery => "INVALID_QUERY",
            Self::MissingData => "MISSING_DATA",
            Self::Internal(_) => "INTERNAL",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::UserNotFound
            | Self::CategoryNotFound
            | Self::WarehouseNotFound
            | Self::ProductNotFound
            | Self::EquipmentNotFound
            | Self::CartItemNotFound
            | Self::OrderNotFound => StatusCode::NOT_FOUND,
            Self::EmailTaken | Self::WarehouseNameTaken | Self::AdminAlreadyAssigned => {
                StatusCode::CONFLICT
            }
            Self::InvalidCredentials | Self::InvalidResetToken => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::PasswordMismatch
            | Self::InvalidOtp
            | Self::ProductUnavailable
            | Self::InvalidPrice
            | Self::InvalidRating
            | Self::InvalidStock
            | Self::NotWarehouseAdmin
            | Self::EmptyOrder
            | Self::InvalidQuantity
            | Self::InsufficientStock { .. }
            | Self::CannotCancel { .. }
            | Self::InvalidQuery
            | Self::MissingData => StatusCode::BAD_REQUEST,
            Self::EmailDispatch(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        // Log 500s only; tower-http TraceLayer already records method/uri/status for all
        // requests. 4xx are expected client errors; logging them here would be noise.
        // Internal errors need the anyhow chain logged so the root cause is traceable.
        match &self {
            Self::Internal(e) | Self::EmailDispatch(e) => {
                tracing::error!(error = %e, kind = self.kind(), "internal error");
            }
            _ => {}
        }
        // Envelope: 4xx are client faults ("fail"), 5xx are server faults ("error").
        let envelope = if status.is_client_error() {
            "fail"
        } else {
            "error"
        };
        let body = serde_json::json!({
            "status": envelope,
            "message": self.to_string(),
        });
        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use axum::response::IntoResponse;

    async fn assert_error(
        error: ApiError,
        expected_status: StatusCode,
        expected_envelope: &str,
        expected_message: &str,
    ) {
        let resp = error.into_response();
        assert_eq!(resp.status(), expected_status);
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["status"], expected_envelope);
        assert_eq!(json["message"], expected_message);
    }

    #[tokio::test]
    async fn should_return_password_mismatch() {
        assert_error(
            ApiError::PasswordMismatch,
            StatusCode::BAD_REQUEST,
            "fail",
            "passwords do not match",
        )
        .await;
    }

    #[tokio::test]
    async fn should_return_email_taken() {
        assert_error(
            ApiError::EmailTaken,
            StatusCode::CONFLICT,
            "fail",
            "email already registered",
        )
        .await;
    }

    #[tokio::test]
    async fn should_return_invalid_credentials() {
        assert_error(
            ApiError::InvalidCredentials,
            StatusCode::UNAUTHORIZED,
            "fail",
            "incorrect email or password",
        )
        .await;
    }

    #[tokio::test]
    async fn should_return_user_not_found() {
        assert_error(
            ApiError::UserNotFound,
            StatusCode::NOT_FOUND,
            "fail",
            "user not found",
        )
        .await;
    }

    #[tokio::test]
    async fn should_return_insufficient_stock_with_remaining_count() {
        assert_error(
            ApiError::InsufficientStock { available: 3 },
            StatusCode::BAD_REQUEST,
            "fail",
            "insufficient stock, only 3 left",
        )
        .await;
    }

    #[tokio::test]
    async fn should_return_cannot_cancel_with_current_status() {
        assert_error(
            ApiError::CannotCancel {
                status: "shipped".to_owned(),
            },
            StatusCode::BAD_REQUEST,
            "fail",
            "order cannot be cancelled in status shipped",
        )
        .await;
    }

    #[tokio::test]
    async fn should_return_forbidden() {
        assert_error(
            ApiError::Forbidden,
            StatusCode::FORBIDDEN,
            "fail",
            "you do not have permission to perform this action",
        )
        .await;
    }

    #[tokio::test]
    async fn should_return_internal_with_error_envelope() {
        assert_error(
            ApiError::Internal(anyhow::anyhow!("db error")),
            StatusCode::INTERNAL_SERVER_ERROR,
            "error",
            "internal error",
        )
        .await;
    }

    #[tokio::test]
    async fn should_return_email_dispatch_with_error_envelope() {
        assert_error(
            ApiError::EmailDispatch(anyhow::anyhow!("smtp down")),
            StatusCode::INTERNAL_SERVER_ERROR,
            "error",
            "failed to send email",
        )
        .await;
    }
}
