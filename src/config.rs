use std::env;

use crate::errors::{AppError, Result};

pub const DEFAULT_DATABASE_NAME: &str = "ecommerce-admin";
pub const DEFAULT_UPLOAD_FOLDER: &str = "ecommerce-products";

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub mongodb_uri: String,
    pub database_name: String,
    pub jwt_secret: String,
    pub session_ttl_hours: i64,
    pub cloudinary: CloudinaryConfig,
}

/// Credentials are kept as read from the environment; they are only checked
/// when an upload or delete is attempted.
#[derive(Debug, Clone, Default)]
pub struct CloudinaryConfig {
    pub cloud_name: Option<String>,
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
    pub folder: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        let mongodb_uri = env::var("MONGODB_URI")
            .or_else(|_| env::var("DATABASE_URL"))
            .map_err(|_| AppError::Config("MONGODB_URI must be set".to_string()))?;
        let jwt_secret = required("JWT_SECRET")?;

        let config = Config {
            host: optional("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: parse_or("PORT", 8080)?,
            mongodb_uri,
            database_name: optional("DATABASE_NAME")
                .unwrap_or_else(|| DEFAULT_DATABASE_NAME.to_string()),
            jwt_secret,
            session_ttl_hours: parse_or("SESSION_TTL_HOURS", 24)?,
            cloudinary: CloudinaryConfig::from_env(),
        };

        log::info!(
            "Configuration loaded (database: {}, listen: {}:{})",
            config.database_name,
            config.host,
            config.port
        );
        Ok(config)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl CloudinaryConfig {
    pub fn from_env() -> Self {
        CloudinaryConfig {
            cloud_name: env::var("CLOUDINARY_CLOUD_NAME").ok(),
            api_key: env::var("CLOUDINARY_API_KEY").ok(),
            api_secret: env::var("CLOUDINARY_API_SECRET").ok(),
            folder: optional("CLOUDINARY_FOLDER")
                .unwrap_or_else(|| DEFAULT_UPLOAD_FOLDER.to_string()),
        }
    }
}

fn required(name: &str) -> Result<String> {
    optional(name).ok_or_else(|| AppError::Config(format!("{} must be set", name)))
}

fn optional(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match optional(name) {
        Some(raw) => raw
            .parse::<T>()
            .map_err(|e| AppError::Config(format!("Invalid {}: {}", name, e))),
        None => Ok(default),
    }
}
