pub mod admin;
pub mod auth;
pub mod products;
pub mod stats;
pub mod upload;

use actix_web::HttpResponse;
use serde_json::json;

use crate::errors::{AppError, Result};

pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}

pub async fn not_found() -> Result<HttpResponse> {
    Err(AppError::NotFound("Not found".to_string()))
}
