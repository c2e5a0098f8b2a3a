use serde::Deserialize;

use harvest_core::config::Config;

/// Which password-reset flow the deployment runs.
///
/// `otp`: a fresh code is mailed and exchanged for a reset token via
/// `POST /auth/verify-reset-otp`. `link`: the reset token is mailed directly
/// inside a reset URL.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResetFlow {
    #[default]
    Otp,
    Link,
}

/// API service configuration loaded from environment variables.
///
/// Required: `DATABASE_URL`, `JWT_SECRET`, `SMTP_HOST`, `SMTP_FROM`.
#[derive(Debug, Deserialize)]
pub struct ApiConfig {
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// HMAC secret for signing session and reset tokens.
    pub jwt_secret: String,
    /// TCP port to listen on (default 3000). Env var: `API_PORT`.
    #[serde(default = "default_api_port")]
    pub api_port: u16,
    /// Session token lifetime in seconds (default 24h). Env var: `SESSION_TTL_SECS`.
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u64,
    /// SMTP relay host.
    pub smtp_host: String,
    /// SMTP relay port (default 587).
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    /// SMTP credentials. Both unset for unauthenticated relays (Mailpit etc).
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    /// Sender mailbox, e.g. `Harvest <noreply@harvest.example>`.
    pub smtp_from: String,
    /// Password-reset flow variant (default `otp`). Env var: `RESET_FLOW`.
    #[serde(default)]
    pub reset_flow: ResetFlow,
    /// Base URL the reset token is appended to in `link` flow.
    #[serde(default = "default_reset_link_base")]
    pub reset_link_base: String,
}

fn default_api_port() -> u16 {
    3000
}

fn default_session_ttl_secs() -> u64 {
    harvest_auth_types::token::SESSION_TOKEN_EXP
}

fn default_smtp_port() -> u16 {
    587
}

fn default_reset_link_base() -> String {
    "http://localhost:3000/reset-password".to_owned()
}

impl Config for ApiConfig {}
