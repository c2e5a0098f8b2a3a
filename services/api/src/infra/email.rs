use anyhow::Context as _;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::ApiConfig;
use crate::domain::repository::Mailer;
use crate::error::ApiError;

/// SMTP-backed [`Mailer`]. STARTTLS relay; credentials are optional so local
/// relays (Mailpit) work without auth.
#[derive(Clone)]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &ApiConfig) -> Result<Self, anyhow::Error> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
            .context("build SMTP transport")?
            .port(config.smtp_port);
        if let (Some(username), Some(password)) = (&config.smtp_username, &config.smtp_password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }
        let from = config
            .smtp_from
            .parse::<Mailbox>()
            .context("parse SMTP sender mailbox")?;
        Ok(Self {
            transport: builder.build(),
            from,
        })
    }

    async fn send(&self, to: &str, subject: &str, body: String) -> Result<(), ApiError> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(to
                .parse()
                .map_err(|e| ApiError::EmailDispatch(anyhow::anyhow!("parse recipient: {e}")))?)
            .subject(subject)
            .body(body)
            .map_err(|e| ApiError::EmailDispatch(anyhow::anyhow!("build message: {e}")))?;
        self.transport
            .send(message)
            .await
            .map_err(|e| ApiError::EmailDispatch(anyhow::anyhow!("send message: {e}")))?;
        Ok(())
    }
}

impl Mailer for SmtpMailer {
    async fn send_otp(&self, to: &str, first_name: &str, otp: i32) -> Result<(), ApiError> {
        let body = format!(
            "Hi {first_name},\n\n\
             Your Harvest verification code is {otp}.\n\
             It expires in 10 minutes.\n\n\
             If you did not request this code, you can ignore this email.\n"
        );
        self.send(to, "Your Harvest verification code", body).await
    }

    async fn send_reset_link(
        &self,
        to: &str,
        first_name: &str,
        link: &str,
    ) -> Result<(), ApiError> {
        let body = format!(
            "Hi {first_name},\n\n\
             Follow this link to reset your Harvest password:\n\n\
             {link}\n\n\
             The link expires in 15 minutes. If you did not request a reset,\n\
             you can ignore this email.\n"
        );
        self.send(to, "Reset your Harvest password", body).await
    }
}
