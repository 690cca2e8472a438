use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand_core::OsRng;
use tracing::info;
use uuid::Uuid;

use alive_db::models::{NewUser, UserRow};
use alive_db::{DbError, SharedStore, blocking, format_timestamp};
use alive_types::api::{Claims, LoginRequest, RegisterRequest, RegisteredUser, SessionUser};

use crate::convert;
use crate::error::{CoreError, CoreResult};

pub const TOKEN_TTL_DAYS: i64 = 7;
pub const MIN_PASSWORD_LEN: usize = 6;

/// Credential handling: Argon2id password hashes and HS256 session tokens.
#[derive(Clone)]
pub struct Accounts {
    store: SharedStore,
    jwt_secret: String,
}

/// A successful login.
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub user: SessionUser,
}

impl Accounts {
    pub fn new(store: SharedStore, jwt_secret: impl Into<String>) -> Self {
        Self {
            store,
            jwt_secret: jwt_secret.into(),
        }
    }

    pub async fn register(&self, req: RegisterRequest, now: DateTime<Utc>) -> CoreResult<RegisteredUser> {
        let (Some(email), Some(password), Some(username)) = (
            non_blank(req.email),
            req.password.filter(|p| !p.is_empty()),
            non_blank(req.username),
        ) else {
            return Err(CoreError::validation("email, password and username are required"));
        };
        if !email.contains('@') {
            return Err(CoreError::validation("email address is not valid"));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(CoreError::validation(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }

        let lookup = email.clone();
        if blocking(&self.store, move |s| s.get_user_by_email(&lookup))
            .await?
            .is_some()
        {
            return Err(CoreError::conflict("email already registered"));
        }

        // Hash password with Argon2id
        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| anyhow::anyhow!("hash password: {}", e))?
            .to_string();

        let user_id = Uuid::new_v4();
        let row = NewUser {
            id: user_id.to_string(),
            email: email.clone(),
            phone: non_blank(req.phone),
            password_hash,
            username: username.clone(),
            created_at: format_timestamp(now),
        };
        // Two registrations racing past the lookup still hit the UNIQUE index
        blocking(&self.store, move |s| s.create_user(&row))
            .await
            .map_err(|e| match e {
                DbError::UniqueViolation { .. } => CoreError::conflict("email already registered"),
                other => other.into(),
            })?;

        info!(%user_id, "Registered user");
        Ok(RegisteredUser {
            id: user_id,
            email,
            username,
        })
    }

    pub async fn login(&self, req: LoginRequest, now: DateTime<Utc>) -> CoreResult<Session> {
        let (Some(email), Some(password)) = (non_blank(req.email), req.password) else {
            return Err(CoreError::validation("email and password are required"));
        };

        let user = blocking(&self.store, move |s| s.get_user_by_email(&email))
            .await?
            .ok_or_else(|| CoreError::auth("user does not exist"))?;

        // Verify password
        let parsed_hash = PasswordHash::new(&user.password)
            .map_err(|e| anyhow::anyhow!("stored hash for {} is unreadable: {}", user.id, e))?;
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .map_err(|_| CoreError::auth("wrong password"))?;

        let token = self.issue_token(&user, now)?;
        Ok(Session {
            token,
            user: SessionUser {
                id: convert::uuid(&user.id, "user id"),
                email: user.email,
                username: user.username,
                phone: user.phone,
            },
        })
    }

    pub fn issue_token(&self, user: &UserRow, now: DateTime<Utc>) -> CoreResult<String> {
        let claims = Claims {
            sub: convert::uuid(&user.id, "user id"),
            email: user.email.clone(),
            username: user.username.clone(),
            exp: (now + Duration::days(TOKEN_TTL_DAYS)).timestamp() as usize,
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|e| anyhow::anyhow!("encode token: {}", e))?;

        Ok(token)
    }

    pub fn verify_token(&self, token: &str) -> CoreResult<Claims> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|_| CoreError::auth("invalid or expired token"))
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
