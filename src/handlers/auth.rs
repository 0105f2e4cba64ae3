use actix_web::{web, HttpResponse};

use crate::auth::verify_password;
use crate::db;
use crate::errors::{AppError, Result};
use crate::middleware::Session;
use crate::models::{AuthResponse, SignInInput, UserResponse};
use crate::state::AppState;
use crate::users;

pub async fn sign_in(
    state: web::Data<AppState>,
    data: web::Json<SignInInput>,
) -> Result<HttpResponse> {
    let invalid = || AppError::Unauthorized("Invalid credentials".to_string());

    let user = users::find_by_email(&db::users(&state.db), &data.email)
        .await?
        .ok_or_else(invalid)?;

    if !verify_password(&user.password, &data.password) {
        log::warn!("Failed sign-in for {}", user.email);
        return Err(invalid());
    }

    let token = state.tokens.issue(&user)?;
    log::info!("{} signed in", user.email);

    Ok(HttpResponse::Ok().json(AuthResponse {
        token,
        user: UserResponse::from(user),
    }))
}

pub async fn session(Session(claims): Session) -> HttpResponse {
    HttpResponse::Ok().json(claims)
}
