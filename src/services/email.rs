//! Email service for account activation codes

use lettre::{
    message::{header::ContentType, Mailbox, Message, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    SmtpTransport, Transport,
};
use std::str::FromStr;

use crate::{
    config::EmailConfig,
    error::{AppError, AppResult},
};

#[derive(Clone)]
pub struct EmailService {
    config: EmailConfig,
}

impl EmailService {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    /// Send the activation code for a freshly registered account
    pub async fn send_activation_code(&self, to: &str, full_name: &str, code: &str) -> AppResult<()> {
        if !self.config.enabled {
            tracing::info!("Email delivery disabled; activation code for {} is {}", to, code);
            return Ok(());
        }

        let subject = "Account activation";
        let body = activation_body(full_name, code, &self.config.activation_url);

        self.send_email(to, subject, &body).await
    }

    /// Best-effort variant: a delivery failure is logged and reported as `false`.
    /// The stored code stays valid, and an expired one is re-sent on activation.
    pub async fn notify_activation_code(&self, to: &str, full_name: &str, code: &str) -> bool {
        match self.send_activation_code(to, full_name, code).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("Could not deliver activation code to {}: {}", to, e);
                false
            }
        }
    }

    async fn send_email(&self, to: &str, subject: &str, body: &str) -> AppResult<()> {
        let from_name = self
            .config
            .smtp_from_name
            .as_deref()
            .unwrap_or("Book Social Network");
        let from_mailbox = Mailbox::from_str(&format!("{} <{}>", from_name, self.config.smtp_from))
            .map_err(|e| AppError::Internal(format!("Invalid from address: {}", e)))?;

        let to_mailbox = Mailbox::from_str(to)
            .map_err(|e| AppError::Internal(format!("Invalid to address: {}", e)))?;

        let email = Message::builder()
            .from(from_mailbox)
            .to(to_mailbox)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(body.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(format!(
                                r#"<html><body><p>{}</p></body></html>"#,
                                body.replace('\n', "<br>")
                            )),
                    ),
            )
            .map_err(|e| AppError::Internal(format!("Failed to build email: {}", e)))?;

        let mailer_builder = if self.config.smtp_use_tls {
            SmtpTransport::starttls_relay(&self.config.smtp_host)
                .map_err(|e| AppError::Internal(format!("Failed to create SMTP transport: {}", e)))?
        } else {
            SmtpTransport::builder_dangerous(&self.config.smtp_host)
        }
        .port(self.config.smtp_port);

        let mailer_builder = if let (Some(username), Some(password)) = (
            &self.config.smtp_username,
            &self.config.smtp_password,
        ) {
            mailer_builder.credentials(Credentials::new(username.clone(), password.clone()))
        } else {
            mailer_builder
        };

        let mailer = mailer_builder.build();

        // SMTP transport is blocking
        tokio::task::spawn_blocking(move || mailer.send(&email))
            .await
            .map_err(|e| AppError::Internal(format!("Email task failed: {}", e)))?
            .map_err(|e| AppError::Internal(format!("Failed to send email: {}", e)))?;

        tracing::info!("Activation email sent to {}", to);
        Ok(())
    }
}

fn activation_body(full_name: &str, code: &str, activation_url: &str) -> String {
    format!(
        r#"Hello {full_name},

Your account has been created. Please activate it with the following code:

{code}

Activation page: {activation_url}

This code expires shortly. If you did not create an account, please ignore this email.
"#
    )
}
