use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::warn;

use crate::config::MailConfig;

/// Outcome of an OTP delivery attempt. Delivery problems are reported in-band
/// so callers can fall back to logging the code instead of failing the flow.
#[derive(Debug, Clone)]
pub struct SendOutcome {
    pub sent: bool,
    pub error: Option<String>,
}

impl SendOutcome {
    pub fn sent() -> Self {
        Self {
            sent: true,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            sent: false,
            error: Some(error.into()),
        }
    }
}

#[async_trait]
pub trait OtpNotifier: Send + Sync {
    async fn send_otp(&self, to_email: &str, code: &str, label: &str) -> SendOutcome;
}

/// Pick a notifier from config: the API-backed mailer when a token is set,
/// otherwise the no-op mailer (codes end up in the operational log only).
pub fn from_config(cfg: &MailConfig) -> Arc<dyn OtpNotifier> {
    match &cfg.api_token {
        Some(token) => Arc::new(ApiMailer::new(
            cfg.api_url.clone(),
            token.clone(),
            cfg.from.clone(),
            cfg.app_name.clone(),
        )),
        None => {
            warn!("MAIL_API_TOKEN not set; OTP codes will be logged only");
            Arc::new(NoopMailer)
        }
    }
}

const AUTH_HEADER: &str = "X-Postmark-Server-Token";
const MESSAGE_STREAM: &str = "outbound";

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    html_body: &'a str,
    text_body: &'a str,
    message_stream: &'a str,
}

/// Transactional-email API client (Postmark wire format).
pub struct ApiMailer {
    http: reqwest::Client,
    api_url: String,
    api_token: String,
    from: String,
    app_name: String,
}

impl ApiMailer {
    pub fn new(api_url: String, api_token: String, from: String, app_name: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url,
            api_token,
            from,
            app_name,
        }
    }
}

#[async_trait]
impl OtpNotifier for ApiMailer {
    async fn send_otp(&self, to_email: &str, code: &str, label: &str) -> SendOutcome {
        let subject = format!("{} - Your verification code is {}", self.app_name, code);
        let html = format!(
            r#"<div style="font-family: sans-serif; max-width: 400px; margin: 0 auto;">
  <h2 style="color: #111;">{label} - Verification code</h2>
  <p>Use this code to verify your email:</p>
  <p style="font-size: 24px; font-weight: bold; letter-spacing: 4px; color: #111;">{code}</p>
  <p style="color: #666; font-size: 14px;">This code expires in 10 minutes. If you didn't request it, you can ignore this email.</p>
  <p style="color: #666; font-size: 14px;">- {app_name}</p>
</div>"#,
            label = label,
            code = code,
            app_name = self.app_name,
        );
        let text = format!(
            "{} - Your verification code is: {}. It expires in 10 minutes.",
            self.app_name, code
        );

        let body = SendEmailRequest {
            from: &self.from,
            to: to_email,
            subject: &subject,
            html_body: &html,
            text_body: &text,
            message_stream: MESSAGE_STREAM,
        };

        let url = format!("{}/email", self.api_url.trim_end_matches('/'));
        let result = self
            .http
            .post(url)
            .header(AUTH_HEADER, &self.api_token)
            .json(&body)
            .send()
            .await
            .and_then(|resp| resp.error_for_status());

        match result {
            Ok(_) => SendOutcome::sent(),
            Err(e) => SendOutcome::failed(e.to_string()),
        }
    }
}

/// Stand-in notifier for deployments without a mail provider.
pub struct NoopMailer;

#[async_trait]
impl OtpNotifier for NoopMailer {
    async fn send_otp(&self, _to_email: &str, _code: &str, _label: &str) -> SendOutcome {
        SendOutcome::failed("mailer not configured")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MailConfig;

    #[tokio::test]
    async fn noop_mailer_reports_failure_in_band() {
        let outcome = NoopMailer.send_otp("a@ex.com", "123456", "Signup").await;
        assert!(!outcome.sent);
        assert_eq!(outcome.error.as_deref(), Some("mailer not configured"));
    }

    #[test]
    fn from_config_without_token_is_noop() {
        let notifier = from_config(&MailConfig {
            api_url: "https://api.postmarkapp.com".into(),
            api_token: None,
            from: "noreply@svift.com".into(),
            app_name: "Svift".into(),
        });
        // No token, so sends must degrade to the log fallback.
        let outcome = tokio::runtime::Runtime::new()
            .expect("runtime")
            .block_on(notifier.send_otp("a@ex.com", "123456", "Signup"));
        assert!(!outcome.sent);
    }
}
