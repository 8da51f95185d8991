use async_trait::async_trait;
use tracing::info;

/// Delivery boundary for verification codes. How the mail actually goes out
/// (SMTP, provider API) is outside this service.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_verification_code(&self, to: &str, code: &str) -> anyhow::Result<()>;
}

/// Default sender: logs the delivery and reports success. Local and staging
/// environments read the code from the logs.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_verification_code(&self, to: &str, code: &str) -> anyhow::Result<()> {
        info!(to = %to, code = %code, "verification code issued");
        Ok(())
    }
}
