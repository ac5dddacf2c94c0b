use std::fmt;
use std::str::FromStr;

use argon2::password_hash::SaltString;
use argon2::password_hash::rand_core::OsRng;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use serde::Deserialize;
use tracing::{info, warn};

use crate::data_api::DataApiClient;
use crate::data_api::filter::Filter;
use crate::error::AppError;
use crate::models::{User, UserRecord};

const INVALID_CREDENTIALS: &str = "Invalid credentials";

/// How credentials are checked against the `Users` resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoginMode {
    /// Look the row up by numeric `user_id` and verify its bcrypt or argon2 hash locally.
    #[default]
    Hashed,
    /// Let the data API match `username` and `password` columns.
    Plaintext,
}

impl FromStr for LoginMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hashed" => Ok(LoginMode::Hashed),
            "plaintext" => Ok(LoginMode::Plaintext),
            other => Err(AppError::Config(format!(
                "LOGIN_MODE must be 'hashed' or 'plaintext', got '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for LoginMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoginMode::Hashed => f.write_str("hashed"),
            LoginMode::Plaintext => f.write_str("plaintext"),
        }
    }
}

#[derive(Clone, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

pub async fn login(
    api: &dyn DataApiClient,
    credentials: &Credentials,
    mode: LoginMode,
) -> Result<User, AppError> {
    if credentials.username.trim().is_empty() || credentials.password.is_empty() {
        return Err(AppError::Validation("Please fill all the fields".to_string()));
    }

    let user = match mode {
        LoginMode::Hashed => {
            let user_id: i64 = credentials
                .username
                .trim()
                .parse()
                .map_err(|_| invalid_credentials())?;

            let record = single_match(api.fetch_users(&Filter::eq("user_id", user_id)).await?)?;
            let stored = record.password.as_deref().ok_or_else(invalid_credentials)?;
            if !verify_password(&credentials.password, stored) {
                return Err(invalid_credentials());
            }
            User::from(record)
        }
        LoginMode::Plaintext => {
            let filter = Filter::eq("username", credentials.username.trim())
                .and(Filter::eq("password", credentials.password.as_str()));
            User::from(single_match(api.fetch_users(&filter).await?)?)
        }
    };

    info!(user_id = user.user_id, role = ?user.role, "login succeeded");
    Ok(user)
}

fn single_match(mut rows: Vec<UserRecord>) -> Result<UserRecord, AppError> {
    if rows.len() != 1 {
        warn!("login matched {} user rows", rows.len());
        return Err(invalid_credentials());
    }
    rows.pop().ok_or_else(invalid_credentials)
}

fn invalid_credentials() -> AppError {
    AppError::Auth(INVALID_CREDENTIALS.to_string())
}

/// Hash formats stored in the `Users` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordScheme {
    /// `$2a$` / `$2b$` / `$2y$` modular crypt strings.
    Bcrypt,
    /// `$argon2id$...` PHC strings.
    Argon2,
}

impl PasswordScheme {
    pub fn detect(stored: &str) -> Option<Self> {
        if ["$2a$", "$2b$", "$2y$"].iter().any(|p| stored.starts_with(p)) {
            Some(PasswordScheme::Bcrypt)
        } else if stored.starts_with("$argon2") {
            Some(PasswordScheme::Argon2)
        } else {
            None
        }
    }
}

pub fn hash_password(plain: &str) -> Result<String, AppError> {
    hash_password_with(plain, PasswordScheme::Argon2)
}

pub fn hash_password_with(plain: &str, scheme: PasswordScheme) -> Result<String, AppError> {
    match scheme {
        PasswordScheme::Bcrypt => bcrypt::hash(plain, bcrypt::DEFAULT_COST)
            .map_err(|e| AppError::Hashing(e.to_string())),
        PasswordScheme::Argon2 => {
            let salt = SaltString::generate(&mut OsRng);
            Argon2::default()
                .hash_password(plain.as_bytes(), &salt)
                .map(|hash| hash.to_string())
                .map_err(|e| AppError::Hashing(e.to_string()))
        }
    }
}

/// Checks `plain` against a bcrypt or argon2 hash, picked by the hash prefix.
pub fn verify_password(plain: &str, stored: &str) -> bool {
    match PasswordScheme::detect(stored) {
        Some(PasswordScheme::Bcrypt) => match bcrypt::verify(plain, stored) {
            Ok(matches) => matches,
            Err(e) => {
                warn!("stored bcrypt hash is malformed: {}", e);
                false
            }
        },
        Some(PasswordScheme::Argon2) => match PasswordHash::new(stored) {
            Ok(parsed) => Argon2::default()
                .verify_password(plain.as_bytes(), &parsed)
                .is_ok(),
            Err(e) => {
                warn!("stored argon2 hash is malformed: {}", e);
                false
            }
        },
        None => {
            warn!("stored password is not a recognised hash");
            false
        }
    }
}
