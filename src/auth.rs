use argon2::{self, Config as ArgonConfig};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::Rng;

use crate::errors::{AppError, Result};
use crate::models::{Claims, User};

pub fn hash_password(password: &str) -> Result<String> {
    let salt: [u8; 16] = rand::thread_rng().gen();
    let config = ArgonConfig::default();

    argon2::hash_encoded(password.as_bytes(), &salt, &config).map_err(|e| {
        log::error!("Password hashing failed: {}", e);
        AppError::Internal("Password hashing failed".to_string())
    })
}

/// A malformed stored hash counts as a mismatch.
pub fn verify_password(hash: &str, password: &str) -> bool {
    argon2::verify_encoded(hash, password.as_bytes()).unwrap_or(false)
}

/// Signs and verifies session tokens.
#[derive(Clone)]
pub struct TokenIssuer {
    secret: String,
    ttl_hours: i64,
}

impl TokenIssuer {
    pub fn new(secret: impl Into<String>, ttl_hours: i64) -> Self {
        TokenIssuer {
            secret: secret.into(),
            ttl_hours,
        }
    }

    pub fn issue(&self, user: &User) -> Result<String> {
        let id = user
            .id
            .ok_or_else(|| AppError::Internal("Cannot issue a token for an unsaved user".into()))?;

        let expiration = chrono::Utc::now()
            .checked_add_signed(chrono::Duration::hours(self.ttl_hours))
            .ok_or_else(|| AppError::Internal("Session expiry out of range".into()))?
            .timestamp() as usize;

        let claims = Claims {
            sub: id.to_hex(),
            email: user.email.clone(),
            name: user.name.clone(),
            role: user.role,
            exp: expiration,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_ref()),
        )
        .map_err(|e| {
            log::error!("Failed to encode token: {}", e);
            AppError::Internal("Failed to issue session token".to_string())
        })
    }

    pub fn verify(&self, token: &str) -> Result<Claims> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_ref()),
            &Validation::new(Algorithm::HS256),
        )
        .map(|data| data.claims)
        .map_err(|e| {
            log::debug!("Rejected session token: {}", e);
            AppError::unauthorized()
        })
    }
}
