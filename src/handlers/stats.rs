use actix_web::{web, HttpResponse};

use crate::db;
use crate::errors::Result;
use crate::middleware::RequireAdmin;
use crate::state::AppState;
use crate::stats;

pub async fn product_stats(_admin: RequireAdmin, state: web::Data<AppState>) -> Result<HttpResponse> {
    let stats = stats::collect(&db::products(&state.db)).await?;
    Ok(HttpResponse::Ok().json(stats))
}
