use mongodb::Database;

use crate::auth::TokenIssuer;
use crate::cloudinary::Cloudinary;
use crate::config::Config;
use crate::db;
use crate::errors::Result;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub tokens: TokenIssuer,
    pub media: Cloudinary,
}

impl AppState {
    /// Connects to MongoDB, ensures indexes and prepares the media host client.
    pub async fn init(config: &Config) -> Result<Self> {
        let db = db::connect(&config.mongodb_uri, &config.database_name).await?;
        db::ensure_indexes(&db).await?;

        Ok(AppState {
            db,
            tokens: TokenIssuer::new(config.jwt_secret.clone(), config.session_ttl_hours),
            media: Cloudinary::new(config.cloudinary.clone())?,
        })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::config::CloudinaryConfig;

    pub const SECRET: &str = "test-secret";

    /// State backed by a client that is never used: the driver connects
    /// lazily, so tests that stop before touching the database need no server.
    pub async fn offline_state() -> AppState {
        let client = mongodb::Client::with_uri_str("mongodb://127.0.0.1:1")
            .await
            .unwrap();
        AppState {
            db: client.database("catalog-admin-test"),
            tokens: TokenIssuer::new(SECRET, 1),
            media: Cloudinary::new(CloudinaryConfig {
                folder: "ecommerce-products".into(),
                ..Default::default()
            })
            .unwrap(),
        }
    }
}
