//! 通知网关
//!
//! 把验证码发送到用户邮箱。发送要么成功要么失败，不存在部分发送。

use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::config::{MailBackend, MailConfig};
use crate::error::{AppError, Result};
use crate::models::account::EmailMessage;

/// 通知网关 trait
#[async_trait]
pub trait NotificationGateway: Send + Sync {
    /// 发送一封邮件
    async fn send(&self, message: &EmailMessage) -> Result<()>;
}

/// 只写日志的网关，开发环境使用
#[derive(Debug, Default)]
pub struct LogNotificationGateway;

#[async_trait]
impl NotificationGateway for LogNotificationGateway {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        info!(to = %message.to, subject = %message.subject, "Email delivery skipped (log backend)");
        debug!("Email body: {}", message.body);
        Ok(())
    }
}

#[derive(Serialize)]
struct OutboundMail<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text: &'a str,
}

/// 通过 HTTP 邮件服务发送
pub struct HttpMailGateway {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    sender: String,
}

impl HttpMailGateway {
    pub fn new(
        endpoint: &str,
        api_key: Option<String>,
        sender: &str,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            api_key,
            sender: sender.to_string(),
        })
    }
}

#[async_trait]
impl NotificationGateway for HttpMailGateway {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        let mut request = self.client.post(&self.endpoint).json(&OutboundMail {
            from: &self.sender,
            to: &message.to,
            subject: &message.subject,
            text: &message.body,
        });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!(%status, to = %message.to, "Mail delivery failed: {}", error_text);
            return Err(AppError::Upstream(format!(
                "mail service responded with {}",
                status
            )));
        }

        info!(to = %message.to, "Verification email sent");
        Ok(())
    }
}

/// 根据配置创建通知网关
pub fn create_notification_gateway(config: &MailConfig) -> Result<Box<dyn NotificationGateway>> {
    match config.backend {
        MailBackend::Http => {
            let gateway = HttpMailGateway::new(
                &config.endpoint,
                config.api_key.clone(),
                &config.sender,
                Duration::from_secs(config.timeout_secs),
            )?;
            Ok(Box::new(gateway))
        }
        MailBackend::Log => Ok(Box::new(LogNotificationGateway)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_log_gateway_always_succeeds() {
        let gateway: Box<dyn NotificationGateway> =
            create_notification_gateway(&MailConfig::default()).unwrap();
        let message = EmailMessage {
            to: "a@x.com".into(),
            subject: "hi".into(),
            body: "123456".into(),
        };
        assert!(gateway.send(&message).await.is_ok());
    }
}
