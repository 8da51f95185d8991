use lazy_static::lazy_static;
use rand::Rng;
use regex::Regex;
use time::{Duration, OffsetDateTime};
use tracing::{info, warn};

use crate::auth::password::hash_password;
use crate::email::Mailer;
use crate::error::AuthError;
use crate::users::repo::{CodeStore, User, UserChanges, UserStore, VerificationCode};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Six decimal digits, uniformly random, leading zeros kept.
fn generate_code() -> String {
    format!("{:06}", rand::thread_rng().gen_range(0..1_000_000))
}

/// Creates a disabled account. Email and username must both be free; the
/// caller validates their shape beforehand.
pub async fn register(
    users: &dyn UserStore,
    email: &str,
    username: Option<&str>,
    password: &str,
) -> Result<User, AuthError> {
    if users.find_by_email(email).await?.is_some() {
        warn!(email = %email, "registration for taken email");
        return Err(AuthError::AlreadyExists);
    }
    if let Some(name) = username {
        if users.find_by_username(name).await?.is_some() {
            warn!(username = %name, "registration for taken username");
            return Err(AuthError::AlreadyExists);
        }
    }
    let hash = hash_password(password)?;
    let user = users.insert(email, username, &hash).await?;
    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok(user)
}

/// Issues a fresh verification code for a disabled account and hands it to
/// the mailer. Re-requesting is not an error: the previous code is replaced
/// and stops working.
pub async fn request_code(
    users: &dyn UserStore,
    codes: &dyn CodeStore,
    mailer: &dyn Mailer,
    email: &str,
    window: Duration,
) -> Result<VerificationCode, AuthError> {
    let Some(user) = users.find_by_email(email).await? else {
        warn!(email = %email, "verification requested for unknown email");
        return Err(AuthError::UserNotFound);
    };
    if user.enabled {
        warn!(user_id = %user.id, "verification requested for enabled account");
        return Err(AuthError::NotDisabled);
    }
    let token = generate_code();
    let expires_at = OffsetDateTime::now_utc() + window;
    let code = codes.replace_for_user(user.id, &token, expires_at).await?;
    mailer
        .send_verification_code(&user.email, &code.token)
        .await?;
    info!(user_id = %user.id, "verification code issued");
    Ok(code)
}

/// Redeems a verification code: the sole disabled→enabled transition. The
/// code is deleted on success (single use); an expired code is left in place
/// and the account stays disabled.
pub async fn consume_code(codes: &dyn CodeStore, token: &str) -> Result<User, AuthError> {
    let Some(code) = codes.find_by_token(token).await? else {
        warn!("confirmation with unknown code");
        return Err(AuthError::CodeNotFound);
    };
    if OffsetDateTime::now_utc() > code.expires_at {
        warn!(user_id = %code.user_id, "confirmation with expired code");
        return Err(AuthError::CodeExpired);
    }
    // The claim on the row and the enable commit together, so there is no
    // window where the code is burned but the account stays disabled.
    let Some(user) = codes.consume(&code).await? else {
        return Err(AuthError::CodeNotFound);
    };
    info!(user_id = %user.id, "account enabled");
    Ok(user)
}

/// Applies a partial profile update, re-checking uniqueness for changed
/// fields and re-hashing a changed password.
pub async fn update_profile(
    users: &dyn UserStore,
    user: &User,
    email: Option<String>,
    username: Option<String>,
    password: Option<String>,
) -> Result<User, AuthError> {
    if let Some(new_email) = &email {
        if new_email != &user.email && users.find_by_email(new_email).await?.is_some() {
            warn!(user_id = %user.id, "profile update to taken email");
            return Err(AuthError::AlreadyExists);
        }
    }
    if let Some(new_name) = &username {
        if user.username.as_deref() != Some(new_name.as_str())
            && users.find_by_username(new_name).await?.is_some()
        {
            warn!(user_id = %user.id, "profile update to taken username");
            return Err(AuthError::AlreadyExists);
        }
    }
    let password_hash = match password {
        Some(p) => Some(hash_password(&p)?),
        None => None,
    };
    let updated = users
        .update(
            user.id,
            UserChanges {
                email,
                username,
                password_hash,
            },
        )
        .await?;
    info!(user_id = %updated.id, "profile updated");
    Ok(updated)
}

pub async fn delete_account(users: &dyn UserStore, user: &User) -> Result<(), AuthError> {
    users.delete(user.id).await?;
    info!(user_id = %user.id, "account deleted");
    Ok(())
}
