use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;
use time::OffsetDateTime;
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        jwt::TokenIssuer,
        password::{hash_password, verify_password},
        repo::{Account, NewAccount, UserStore},
    },
    error::{AuthError, AuthResult},
};

pub const MIN_PASSWORD_CHARS: usize = 6;
pub const MIN_NAME_CHARS: usize = 2;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Signup, login and token-to-account resolution over an injected store.
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn UserStore>,
    tokens: TokenIssuer,
}

impl AuthService {
    pub fn new(store: Arc<dyn UserStore>, tokens: TokenIssuer) -> Self {
        Self { store, tokens }
    }

    pub fn tokens(&self) -> &TokenIssuer {
        &self.tokens
    }

    /// Validates input before touching the store, then hashes and inserts.
    #[instrument(skip(self, display_name, password))]
    pub async fn signup(
        &self,
        email: &str,
        display_name: &str,
        password: &str,
    ) -> AuthResult<Account> {
        let email = normalize_email(email);
        if !is_valid_email(&email) {
            warn!(%email, "invalid email");
            return Err(AuthError::InvalidEmail);
        }

        if self.store.find_by_email(&email).await?.is_some() {
            warn!(%email, "email already registered");
            return Err(AuthError::DuplicateAccount);
        }

        if password.chars().count() < MIN_PASSWORD_CHARS {
            warn!("password too short");
            return Err(AuthError::WeakPassword);
        }

        let display_name = display_name.trim();
        if display_name.chars().count() < MIN_NAME_CHARS {
            warn!("display name too short");
            return Err(AuthError::InvalidName);
        }

        let password_hash = hash_password(password)?;
        let account = self
            .store
            .insert(NewAccount {
                email: &email,
                display_name,
                password_hash: &password_hash,
                created_at: OffsetDateTime::now_utc(),
            })
            .await
            .map_err(|e| {
                warn!(%email, error = %e, "insert rejected");
                AuthError::from(e)
            })?;

        info!(account_id = account.id, email = %account.email, "account created");
        Ok(account)
    }

    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> AuthResult<(String, Account)> {
        let email = normalize_email(email);
        let account = match self.store.find_by_email(&email).await? {
            Some(a) => a,
            None => {
                warn!(%email, "login unknown email");
                return Err(AuthError::AccountNotFound);
            }
        };

        if !verify_password(password, &account.password_hash) {
            warn!(%email, account_id = account.id, "login wrong password");
            return Err(AuthError::WrongPassword);
        }

        let token = self.tokens.issue(account.id)?;
        info!(account_id = account.id, "account logged in");
        Ok((token, account))
    }

    /// Every failure here is `Unauthorized`; callers never learn why.
    #[instrument(skip_all)]
    pub async fn resolve_identity(&self, token: &str) -> AuthResult<Account> {
        let account_id = self.tokens.validate(token).map_err(|_| {
            warn!("invalid or expired token");
            AuthError::Unauthorized
        })?;

        match self.store.find_by_id(account_id).await? {
            Some(account) => Ok(account),
            None => {
                warn!(account_id, "token subject no longer exists");
                Err(AuthError::Unauthorized)
            }
        }
    }

    pub async fn federated_auth(&self) -> AuthResult<Account> {
        Err(AuthError::NotImplemented)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        auth::repo::{SqliteUserStore, StoreError},
        config::{JwtConfig, DEFAULT_TTL_MINUTES},
        db,
    };
    use time::Duration;

    async fn make_service() -> (AuthService, SqliteUserStore) {
        let store = SqliteUserStore::new(db::in_memory().await.expect("in-memory db"));
        let tokens = TokenIssuer::new(&JwtConfig {
            secret: "test-secret".into(),
            issuer: "test-issuer".into(),
            audience: "test-aud".into(),
            ttl_minutes: DEFAULT_TTL_MINUTES,
        });
        (AuthService::new(Arc::new(store.clone()), tokens), store)
    }

    #[test]
    fn email_check() {
        assert!(is_valid_email("u@x.com"));
        assert!(!is_valid_email("u@x"));
        assert!(!is_valid_email("not an email"));
        assert_eq!(normalize_email("  A@B.com "), "a@b.com");
    }

    #[tokio::test]
    async fn signup_then_login() {
        let (auth, _) = make_service().await;
        let created = auth.signup("u@x.com", "Uma", "secret1").await.expect("signup");
        assert_eq!(created.email, "u@x.com");
        assert_eq!(created.display_name, "Uma");
        assert_ne!(created.password_hash, "secret1");

        let (token, account) = auth.login("u@x.com", "secret1").await.expect("login");
        assert!(!token.is_empty());
        assert_eq!(account.id, created.id);
    }

    #[tokio::test]
    async fn email_is_case_insensitive() {
        let (auth, _) = make_service().await;
        let created = auth.signup("A@B.com", "Ann", "secret1").await.expect("signup");
        assert_eq!(created.email, "a@b.com");
        let (_, account) = auth.login("a@b.com", "secret1").await.expect("login");
        assert_eq!(account.id, created.id);
    }

    #[tokio::test]
    async fn duplicate_signup_is_rejected() {
        let (auth, _) = make_service().await;
        auth.signup("u@x.com", "Uma", "secret1").await.expect("first");
        let err = auth.signup("U@X.COM", "Other", "secret2").await.unwrap_err();
        assert!(matches!(err, AuthError::DuplicateAccount));
    }

    #[tokio::test]
    async fn concurrent_signups_with_same_email() {
        let (auth, _) = make_service().await;
        let (a, b) = tokio::join!(
            auth.signup("race@x.com", "First", "secret1"),
            auth.signup("RACE@x.com", "Second", "secret2"),
        );
        let results = [a, b];
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results
            .iter()
            .any(|r| matches!(r, Err(AuthError::DuplicateAccount))));
    }

    /// Store whose email lookup always misses, as when a concurrent signup
    /// lands between the pre-check and the insert.
    struct StalePrecheck(SqliteUserStore);

    #[async_trait::async_trait]
    impl UserStore for StalePrecheck {
        async fn insert(&self, new: NewAccount<'_>) -> Result<Account, StoreError> {
            self.0.insert(new).await
        }
        async fn find_by_id(&self, id: i64) -> Result<Option<Account>, StoreError> {
            self.0.find_by_id(id).await
        }
        async fn find_by_email(&self, _email: &str) -> Result<Option<Account>, StoreError> {
            Ok(None)
        }
    }

    #[tokio::test]
    async fn unique_index_catches_signup_race() {
        let (_, store) = make_service().await;
        let tokens = TokenIssuer::new(&JwtConfig {
            secret: "test-secret".into(),
            issuer: "test-issuer".into(),
            audience: "test-aud".into(),
            ttl_minutes: DEFAULT_TTL_MINUTES,
        });
        let auth = AuthService::new(Arc::new(StalePrecheck(store.clone())), tokens);

        auth.signup("race@x.com", "First", "secret1").await.expect("first");
        let err = auth.signup("RACE@x.com", "Second", "secret2").await.unwrap_err();
        assert!(matches!(err, AuthError::DuplicateAccount));

        let kept = store.find_by_email("race@x.com").await.unwrap().expect("row");
        assert_eq!(kept.display_name, "First");
    }

    #[tokio::test]
    async fn password_length_boundary() {
        let (auth, _) = make_service().await;
        let err = auth.signup("five@x.com", "Uma", "12345").await.unwrap_err();
        assert!(matches!(err, AuthError::WeakPassword));
        auth.signup("six@x.com", "Uma", "123456").await.expect("six chars ok");
    }

    #[tokio::test]
    async fn display_name_is_trimmed_and_checked() {
        let (auth, _) = make_service().await;
        let err = auth.signup("n@x.com", " a ", "secret1").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidName));

        let created = auth.signup("n@x.com", "  Al  ", "secret1").await.expect("signup");
        assert_eq!(created.display_name, "Al");
    }

    #[tokio::test]
    async fn failed_validation_writes_nothing() {
        let (auth, store) = make_service().await;
        let _ = auth.signup("w@x.com", "Uma", "short").await;
        let _ = auth.signup("w@x.com", "U", "secret1").await;
        assert!(store.find_by_email("w@x.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn invalid_email_is_rejected() {
        let (auth, _) = make_service().await;
        let err = auth.signup("nope", "Uma", "secret1").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidEmail));
    }

    #[tokio::test]
    async fn login_errors_are_distinct() {
        let (auth, _) = make_service().await;
        auth.signup("u@x.com", "Uma", "secret1").await.expect("signup");

        let err = auth.login("nobody@x.com", "secret1").await.unwrap_err();
        assert!(matches!(err, AuthError::AccountNotFound));

        let err = auth.login("u@x.com", "secret2").await.unwrap_err();
        assert!(matches!(err, AuthError::WrongPassword));
    }

    #[tokio::test]
    async fn resolve_identity_roundtrip() {
        let (auth, _) = make_service().await;
        let created = auth.signup("u@x.com", "Uma", "secret1").await.expect("signup");
        let (token, _) = auth.login("u@x.com", "secret1").await.expect("login");
        let account = auth.resolve_identity(&token).await.expect("resolve");
        assert_eq!(account.id, created.id);
        assert_eq!(account.email, "u@x.com");
    }

    #[tokio::test]
    async fn resolve_identity_rejects_bad_tokens() {
        let (auth, _) = make_service().await;
        let created = auth.signup("u@x.com", "Uma", "secret1").await.expect("signup");

        let expired = auth
            .tokens()
            .issue_with_ttl(created.id, Duration::seconds(-1))
            .unwrap();
        assert!(matches!(
            auth.resolve_identity(&expired).await,
            Err(AuthError::Unauthorized)
        ));
        assert!(matches!(
            auth.resolve_identity("garbage").await,
            Err(AuthError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn resolve_identity_for_deleted_account() {
        let (auth, store) = make_service().await;
        let created = auth.signup("gone@x.com", "Gus", "secret1").await.expect("signup");
        let (token, _) = auth.login("gone@x.com", "secret1").await.expect("login");

        sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(created.id)
            .execute(store.pool())
            .await
            .expect("delete");

        assert!(matches!(
            auth.resolve_identity(&token).await,
            Err(AuthError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn federated_auth_is_not_implemented() {
        let (auth, _) = make_service().await;
        assert!(matches!(
            auth.federated_auth().await,
            Err(AuthError::NotImplemented)
        ));
    }
}
