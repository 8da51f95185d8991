use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use tracing::debug;

use crate::{config::AuthConfig, error::AuthError, state::AppState};

/// Scheme prefix clients send in the `Authorization` header. `verify` accepts
/// the header value with or without it.
pub const BEARER_PREFIX: &str = "Bearer ";

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    exp: usize,
}

#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    token_ttl: Duration,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        let AuthConfig {
            secret,
            token_ttl_days,
            ..
        } = state.config.auth.clone();
        Self::new(&secret, Duration::days(token_ttl_days))
    }
}

impl JwtKeys {
    pub fn new(secret: &str, token_ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            token_ttl,
        }
    }

    /// Signs a stateless token carrying `subject` (the account email) that
    /// expires `token_ttl` from now.
    pub fn issue(&self, subject: &str) -> anyhow::Result<String> {
        let exp = OffsetDateTime::now_utc() + self.token_ttl;
        let claims = Claims {
            sub: subject.to_owned(),
            exp: exp.unix_timestamp() as usize,
        };
        let token = encode(&Header::new(Algorithm::HS512), &claims, &self.encoding)?;
        debug!(subject = %subject, "token signed");
        Ok(token)
    }

    /// Validates signature and expiry and returns the subject. Accepts a bare
    /// token or a full `Bearer <token>` header value. Every failure collapses
    /// into [`AuthError::InvalidToken`]; callers decide whether that is fatal.
    pub fn verify(&self, value: &str) -> Result<String, AuthError> {
        let raw = value.strip_prefix(BEARER_PREFIX).unwrap_or(value);
        let mut validation = Validation::new(Algorithm::HS512);
        validation.leeway = 0;
        match decode::<Claims>(raw, &self.decoding, &validation) {
            Ok(data) => Ok(data.claims.sub),
            Err(e) => {
                debug!(error = %e, "token rejected");
                Err(AuthError::InvalidToken)
            }
        }
    }
}
