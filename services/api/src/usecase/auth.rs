use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::RngExt;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use harvest_auth_types::token::issue_session_token;
use harvest_domain::id::UserId;
use harvest_domain::user::UserRole;

use crate::config::ResetFlow;
use crate::domain::repository::{Mailer, UserRepository};
use crate::domain::types::{OTP_TTL_SECS, User, UserProfilePatch};
use crate::error::ApiError;

/// Reset tokens are short-lived: long enough to read an email, no longer.
const RESET_TOKEN_TTL_SECS: u64 = 15 * 60;
/// Purpose claim distinguishing reset tokens from session tokens. A session
/// token must never be accepted for a password reset.
const RESET_PURPOSE: &str = "password_reset";

fn generate_otp() -> i32 {
    let mut rng = rand::rng();
    rng.random_range(100_000..=999_999)
}

pub(crate) fn hash_password(plain: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("hash password: {e}"))?;
    Ok(hash.to_string())
}

pub(crate) fn verify_password(plain: &str, hash: &str) -> Result<bool, ApiError> {
    let parsed =
        PasswordHash::new(hash).map_err(|e| anyhow::anyhow!("parse password hash: {e}"))?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

#[derive(Serialize, Deserialize)]
struct ResetClaims {
    sub: String,
    purpose: String,
    exp: u64,
}

fn issue_reset_token(user_id: UserId, secret: &str) -> Result<String, ApiError> {
    let claims = ResetClaims {
        sub: user_id.to_string(),
        purpose: RESET_PURPOSE.to_owned(),
        exp: Utc::now().timestamp() as u64 + RESET_TOKEN_TTL_SECS,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| anyhow::anyhow!("sign reset token: {e}").into())
}

fn validate_reset_token(token: &str, secret: &str) -> Result<UserId, ApiError> {
    let mut validation = Validation::new(jsonwebtoken::Algorithm::HS256);
    validation.set_required_spec_claims(&["exp", "sub"]);
    let data = decode::<ResetClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|_| ApiError::InvalidResetToken)?;
    if data.claims.purpose != RESET_PURPOSE {
        return Err(ApiError::InvalidResetToken);
    }
    let id = data
        .claims
        .sub
        .parse::<Uuid>()
        .map_err(|_| ApiError::InvalidResetToken)?;
    Ok(UserId(id))
}

// ── SignUp ───────────────────────────────────────────────────────────────────

pub struct SignUpInput {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub country: String,
    pub password: String,
    pub password_confirm: String,
    pub profile_image: Option<String>,
}

pub struct SignUpUseCase<R: UserRepository, M: Mailer> {
    pub users: R,
    pub mailer: M,
}

impl<R: UserRepository, M: Mailer> SignUpUseCase<R, M> {
    pub async fn execute(&self, input: SignUpInput) -> Result<User, ApiError> {
        if input.password != input.password_confirm {
            return Err(ApiError::PasswordMismatch);
        }
        if self.users.find_by_email(&input.email).await?.is_some() {
            return Err(ApiError::EmailTaken);
        }

        let now = Utc::now();
        let otp = generate_otp();
        let user = User {
            id: UserId(Uuid::now_v7()),
            first_name: input.first_name,
            last_name: input.last_name,
            email: input.email,
            phone: input.phone,
            country: input.country,
            password_hash: hash_password(&input.password)?,
            profile_image: input.profile_image,
            role: UserRole::User,
            is_verified: false,
            otp: Some(otp),
            otp_expires_at: Some(now + Duration::seconds(OTP_TTL_SECS)),
            created_at: now,
            updated_at: now,
        };
        self.users.create(&user).await?;

        // Dispatch failure keeps the account but clears the phantom code; the
        // user requests a fresh one through the reset path.
        if let Err(send_err) = self.mailer.send_otp(&user.email, &user.first_name, otp).await {
            self.users.set_otp(user.id, None, None).await?;
            return Err(send_err);
        }
        Ok(user)
    }
}

// ── VerifyOtp ────────────────────────────────────────────────────────────────

pub struct VerifyOtpUseCase<R: UserRepository> {
    pub users: R,
}

impl<R: UserRepository> VerifyOtpUseCase<R> {
    pub async fn execute(&self, email: &str, otp: i32) -> Result<(), ApiError> {
        let user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or(ApiError::UserNotFound)?;
        check_otp(&user, otp)?;
        self.users.mark_verified(user.id).await
    }
}

fn check_otp(user: &User, otp: i32) -> Result<(), ApiError> {
    let (Some(stored), Some(expires_at)) = (user.otp, user.otp_expires_at) else {
        return Err(ApiError::InvalidOtp);
    };
    if stored != otp || expires_at < Utc::now() {
        return Err(ApiError::InvalidOtp);
    }
    Ok(())
}

// ── SignIn ───────────────────────────────────────────────────────────────────

pub struct SignInOutput {
    pub token: String,
    pub expires_at: u64,
    pub user: User,
}

pub struct SignInUseCase<R: UserRepository> {
    pub users: R,
    pub jwt_secret: String,
    pub session_ttl_secs: u64,
}

impl<R: UserRepository> SignInUseCase<R> {
    pub async fn execute(&self, email: &str, password: &str) -> Result<SignInOutput, ApiError> {
        let user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or(ApiError::UserNotFound)?;
        if !verify_password(password, &user.password_hash)? {
            return Err(ApiError::InvalidCredentials);
        }
        let (token, expires_at) = issue_session_token(
            user.id.0,
            user.role.as_u8(),
            user.is_verified,
            self.session_ttl_secs,
            &self.jwt_secret,
        )
        .map_err(|e| anyhow::anyhow!("sign session token: {e}"))?;
        Ok(SignInOutput {
            token,
            expires_at,
            user,
        })
    }
}

// ── ForgetPassword ───────────────────────────────────────────────────────────

pub struct ForgetPasswordUseCase<R: UserRepository, M: Mailer> {
    pub users: R,
    pub mailer: M,
    pub flow: ResetFlow,
    pub jwt_secret: String,
    pub reset_link_base: String,
}

impl<R: UserRepository, M: Mailer> ForgetPasswordUseCase<R, M> {
    pub async fn execute(&self, email: &str) -> Result<(), ApiError> {
        let user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or(ApiError::UserNotFound)?;

        match self.flow {
            ResetFlow::Otp => {
                let otp = generate_otp();
                self.users
                    .set_otp(
                        user.id,
                        Some(otp),
                        Some(Utc::now() + Duration::seconds(OTP_TTL_SECS)),
                    )
                    .await?;
                if let Err(send_err) =
                    self.mailer.send_otp(&user.email, &user.first_name, otp).await
                {
                    self.users.set_otp(user.id, None, None).await?;
                    return Err(send_err);
                }
            }
            ResetFlow::Link => {
                let token = issue_reset_token(user.id, &self.jwt_secret)?;
                let link = format!("{}?token={token}", self.reset_link_base);
                self.mailer
                    .send_reset_link(&user.email, &user.first_name, &link)
                    .await?;
            }
        }
        Ok(())
    }
}

// ── VerifyResetOtp ───────────────────────────────────────────────────────────

pub struct VerifyResetOtpUseCase<R: UserRepository> {
    pub users: R,
    pub jwt_secret: String,
}

impl<R: UserRepository> VerifyResetOtpUseCase<R> {
    /// Exchange a valid reset code for a reset token. The code is single-use.
    pub async fn execute(&self, email: &str, otp: i32) -> Result<String, ApiError> {
        let user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or(ApiError::UserNotFound)?;
        check_otp(&user, otp)?;
        self.users.set_otp(user.id, None, None).await?;
        issue_reset_token(user.id, &self.jwt_secret)
    }
}

// ── ResetPassword ────────────────────────────────────────────────────────────

pub struct ResetPasswordUseCase<R: UserRepository> {
    pub users: R,
    pub jwt_secret: String,
}

impl<R: UserRepository> ResetPasswordUseCase<R> {
    pub async fn execute(
        &self,
        token: &str,
        password: &str,
        password_confirm: &str,
    ) -> Result<(), ApiError> {
        if password != password_confirm {
            return Err(ApiError::PasswordMismatch);
        }
        let user_id = validate_reset_token(token, &self.jwt_secret)?;
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(ApiError::UserNotFound)?;
        let hash = hash_password(password)?;
        self.users.update_password(user.id, &hash).await
    }
}

// ── GetMe ────────────────────────────────────────────────────────────────────

pub struct GetMeUseCase<R: UserRepository> {
    pub users: R,
}

impl<R: UserRepository> GetMeUseCase<R> {
    pub async fn execute(&self, user_id: UserId) -> Result<User, ApiError> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or(ApiError::UserNotFound)
    }
}

// ── UpdateProfile ────────────────────────────────────────────────────────────

pub struct UpdateProfileUseCase<R: UserRepository> {
    pub users: R,
}

impl<R: UserRepository> UpdateProfileUseCase<R> {
    pub async fn execute(
        &self,
        user_id: UserId,
        patch: UserProfilePatch,
    ) -> Result<User, ApiError> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(ApiError::UserNotFound)?;
        self.users.update_profile(user.id, &patch).await?;
        self.users
            .find_by_id(user.id)
            .await?
            .ok_or(ApiError::UserNotFound)
    }
}

// ── ChangePassword ───────────────────────────────────────────────────────────

pub struct ChangePasswordUseCase<R: UserRepository> {
    pub users: R,
}

impl<R: UserRepository> ChangePasswordUseCase<R> {
    /// Authenticated password change; the current password is re-checked so a
    /// hijacked session cannot silently lock the owner out.
    pub async fn execute(
        &self,
        user_id: UserId,
        current_password: &str,
        new_password: &str,
        new_password_confirm: &str,
    ) -> Result<(), ApiError> {
        if new_password != new_password_confirm {
            return Err(ApiError::PasswordMismatch);
        }
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(ApiError::UserNotFound)?;
        if !verify_password(current_password, &user.password_hash)? {
            return Err(ApiError::InvalidCredentials);
        }
        let hash = hash_password(new_password)?;
        self.users.update_password(user.id, &hash).await
    }
}
