use tracing::warn;

use crate::auth::password::verify_password;
use crate::error::AuthError;
use crate::users::repo::{User, UserStore};

/// Resolves `principal` against email first, then username, and checks the
/// password. An email match settles the lookup even when the password turns
/// out wrong; there is no second try against usernames. Unknown principals
/// and wrong passwords both come back as [`AuthError::BadCredentials`] so a
/// caller cannot probe which half failed.
pub async fn authenticate(
    users: &dyn UserStore,
    principal: &str,
    password: &str,
) -> Result<User, AuthError> {
    let found = match users.find_by_email(principal).await? {
        Some(user) => Some(user),
        None => users.find_by_username(principal).await?,
    };
    let Some(user) = found else {
        warn!(principal = %principal, "login attempt for unknown principal");
        return Err(AuthError::BadCredentials);
    };
    if !user.enabled {
        warn!(user_id = %user.id, "login attempt for disabled account");
        return Err(AuthError::Disabled);
    }
    if !verify_password(password, &user.password_hash)? {
        warn!(user_id = %user.id, "login attempt with wrong password");
        return Err(AuthError::BadCredentials);
    }
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::hash_password;
    use crate::users::repo::memory::MemoryStore;

    async fn seeded_store() -> MemoryStore {
        let store = MemoryStore::new();
        let hash = hash_password("longenough1").expect("hash password");
        let user = store
            .insert("ada@example.com", Some("ada"), &hash)
            .await
            .expect("insert user");
        store.set_enabled(user.id, true).await.expect("enable user");
        store
    }

    #[tokio::test]
    async fn login_by_email() {
        let store = seeded_store().await;
        let user = authenticate(&store, "ada@example.com", "longenough1")
            .await
            .expect("login should succeed");
        assert_eq!(user.email, "ada@example.com");
    }

    #[tokio::test]
    async fn login_by_username() {
        let store = seeded_store().await;
        let user = authenticate(&store, "ada", "longenough1")
            .await
            .expect("login should succeed");
        assert_eq!(user.email, "ada@example.com");
    }

    #[tokio::test]
    async fn unknown_principal_is_bad_credentials() {
        let store = seeded_store().await;
        let err = authenticate(&store, "nobody@example.com", "longenough1")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::BadCredentials));
    }

    #[tokio::test]
    async fn wrong_password_is_bad_credentials() {
        let store = seeded_store().await;
        let err = authenticate(&store, "ada@example.com", "not-the-password")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::BadCredentials));
    }

    #[tokio::test]
    async fn empty_credentials_are_bad_credentials() {
        let store = seeded_store().await;
        let err = authenticate(&store, "", "").await.unwrap_err();
        assert!(matches!(err, AuthError::BadCredentials));
        let err = authenticate(&store, "ada@example.com", "").await.unwrap_err();
        assert!(matches!(err, AuthError::BadCredentials));
    }

    #[tokio::test]
    async fn disabled_account_is_reported_before_password_check() {
        let store = MemoryStore::new();
        let hash = hash_password("longenough1").expect("hash password");
        store
            .insert("ada@example.com", Some("ada"), &hash)
            .await
            .expect("insert user");
        // Wrong password on a disabled account still reports the disabled
        // state; the password is never consulted.
        let err = authenticate(&store, "ada@example.com", "not-the-password")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Disabled));
    }

    #[tokio::test]
    async fn email_match_wins_over_username_match() {
        let store = MemoryStore::new();
        let hash_a = hash_password("password-for-a").expect("hash password");
        let hash_b = hash_password("password-for-b").expect("hash password");
        let a = store
            .insert("team@example.com", Some("alpha"), &hash_a)
            .await
            .expect("insert a");
        let b = store
            .insert("beta@example.com", Some("team@example.com"), &hash_b)
            .await
            .expect("insert b");
        store.set_enabled(a.id, true).await.expect("enable a");
        store.set_enabled(b.id, true).await.expect("enable b");

        let user = authenticate(&store, "team@example.com", "password-for-a")
            .await
            .expect("email owner logs in");
        assert_eq!(user.id, a.id);

        // The email match is final: b's password never reaches the check.
        let err = authenticate(&store, "team@example.com", "password-for-b")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::BadCredentials));
    }
}
