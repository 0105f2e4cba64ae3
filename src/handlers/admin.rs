use actix_web::{web, HttpResponse};
use validator::Validate;

use crate::db;
use crate::errors::Result;
use crate::middleware::RequireAdmin;
use crate::models::{OnboardInput, UserResponse};
use crate::state::AppState;
use crate::users;

/// Lets an existing admin create another admin account.
pub async fn onboard_admin(
    RequireAdmin(admin): RequireAdmin,
    state: web::Data<AppState>,
    data: web::Json<OnboardInput>,
) -> Result<HttpResponse> {
    let input = data.into_inner().normalize();
    input.validate()?;

    let user = users::create_admin(&db::users(&state.db), &input.name, &input.email, &input.password).await?;

    log::info!("{} onboarded admin {}", admin.email, user.email);
    Ok(HttpResponse::Created().json(UserResponse::from(user)))
}
