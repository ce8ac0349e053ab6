//! Identity provider: users, bcrypt-hashed passwords and opaque bearer tokens.
//!
//! Users and tokens live in memory only.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use crate::core::{Principal, Role, TenantId, UserId};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Invalid or unknown token")]
    InvalidToken,

    #[error("Token expired")]
    TokenExpired,

    #[error("User '{0}' already exists")]
    UserExists(String),

    #[error("{0}")]
    InvalidUsername(String),

    #[error("{0}")]
    InvalidPassword(String),

    #[error("Password hashing failed: {0}")]
    Hash(String),
}

pub type AuthResult<T> = std::result::Result<T, AuthError>;

/// User account
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    #[serde(skip_serializing)]
    password_hash: String,
    pub tenant_id: TenantId,
    pub role: Role,
}

impl User {
    pub fn principal(&self) -> Principal {
        Principal::new(self.tenant_id, self.id, self.role.clone())
    }

    #[inline]
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

/// Bearer token handed out on login.
#[derive(Debug, Clone, Serialize)]
pub struct AccessToken {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct Session {
    principal: Principal,
    expires_at: DateTime<Utc>,
}

/// Authentication manager
///
/// Usernames are unique across all tenants.
pub struct AuthManager {
    users: RwLock<HashMap<String, User>>,
    sessions: RwLock<HashMap<String, Session>>,
    bcrypt_cost: u32,
    token_ttl: Duration,
}

impl AuthManager {
    pub const DEFAULT_TOKEN_TTL_MINUTES: i64 = 30;

    pub fn new(bcrypt_cost: u32, token_ttl: Duration) -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
            sessions: RwLock::new(HashMap::new()),
            bcrypt_cost,
            token_ttl,
        }
    }

    /// Creates a manager with one administrator in `tenant`.
    pub async fn with_admin(
        username: &str,
        password: &str,
        tenant: TenantId,
        bcrypt_cost: u32,
        token_ttl: Duration,
    ) -> AuthResult<Self> {
        let manager = Self::new(bcrypt_cost, token_ttl);
        manager.create_user(username, password, tenant, Role::admin()).await?;
        Ok(manager)
    }

    fn hash_password(&self, password: &str) -> AuthResult<String> {
        bcrypt::hash(password, self.bcrypt_cost).map_err(|err| AuthError::Hash(err.to_string()))
    }

    fn verify_password(password: &str, hash: &str) -> bool {
        bcrypt::verify(password, hash).unwrap_or(false)
    }

    pub async fn create_user(
        &self,
        username: &str,
        password: &str,
        tenant: TenantId,
        role: Role,
    ) -> AuthResult<User> {
        validate_username(username)?;
        validate_password(password)?; // before hashing

        if self.users.read().await.contains_key(username) {
            return Err(AuthError::UserExists(username.to_string()));
        }
        let password_hash = self.hash_password(password)?;

        let mut users = self.users.write().await;
        if users.contains_key(username) {
            return Err(AuthError::UserExists(username.to_string()));
        }

        let user = User {
            id: UserId::new(),
            username: username.to_string(),
            password_hash,
            tenant_id: tenant,
            role,
        };
        users.insert(username.to_string(), user.clone());

        info!(user = username, tenant = %tenant, role = %user.role, "user created");
        Ok(user)
    }

    pub async fn authenticate(&self, username: &str, password: &str) -> AuthResult<User> {
        let users = self.users.read().await;
        let user = users.get(username).ok_or(AuthError::InvalidCredentials)?;

        if !Self::verify_password(password, &user.password_hash) {
            return Err(AuthError::InvalidCredentials);
        }

        Ok(user.clone())
    }

    pub async fn issue_token(&self, user: &User) -> AccessToken {
        let token = Uuid::new_v4().simple().to_string();
        let now = Utc::now();
        // An expiry past the representable range never lapses.
        let expires_at = now
            .checked_add_signed(self.token_ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        let mut sessions = self.sessions.write().await;
        sessions.retain(|_, session| session.expires_at > now);
        sessions.insert(
            token.clone(),
            Session {
                principal: user.principal(),
                expires_at,
            },
        );

        AccessToken {
            access_token: token,
            token_type: "bearer",
            expires_at,
        }
    }

    /// Principal behind a live token. Expired tokens are dropped.
    pub async fn resolve(&self, token: &str) -> AuthResult<Principal> {
        let session = self
            .sessions
            .read()
            .await
            .get(token)
            .cloned()
            .ok_or(AuthError::InvalidToken)?;

        if session.expires_at <= Utc::now() {
            self.sessions.write().await.remove(token);
            return Err(AuthError::TokenExpired);
        }

        Ok(session.principal)
    }

    pub async fn user_count(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

fn validate_username(username: &str) -> AuthResult<()> {
    if username.is_empty() {
        return Err(AuthError::InvalidUsername("Username cannot be empty".into()));
    }

    if username.chars().count() > 50 {
        return Err(AuthError::InvalidUsername(
            "Username too long (max 50 characters)".into(),
        ));
    }

    Ok(())
}

fn validate_password(password: &str) -> AuthResult<()> {
    if password.chars().count() < 8 {
        return Err(AuthError::InvalidPassword(
            "Password must be at least 8 characters long".into(),
        ));
    }

    Ok(())
}
