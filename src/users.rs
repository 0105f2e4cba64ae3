use mongodb::bson::doc;
use mongodb::Collection;

use crate::auth::hash_password;
use crate::errors::{is_duplicate_key, AppError, Result};
use crate::models::User;
use crate::validation::normalize_email;

pub const DUPLICATE_EMAIL: &str = "User with this email already exists";

pub async fn find_by_email(users: &Collection<User>, email: &str) -> Result<Option<User>> {
    let filter = doc! { "email": normalize_email(email) };
    Ok(users.find_one(filter, None).await?)
}

/// Creates an account with the admin role. The email check runs first for a
/// friendly error; the unique index settles any race.
pub async fn create_admin(
    users: &Collection<User>,
    name: &str,
    email: &str,
    password: &str,
) -> Result<User> {
    if find_by_email(users, email).await?.is_some() {
        return Err(AppError::Duplicate(DUPLICATE_EMAIL.to_string()));
    }

    let mut user = User::new_admin(name, email, hash_password(password)?);
    let result = users.insert_one(&user, None).await.map_err(|e| {
        if is_duplicate_key(&e) {
            AppError::Duplicate(DUPLICATE_EMAIL.to_string())
        } else {
            AppError::Database(e)
        }
    })?;
    user.id = result.inserted_id.as_object_id();

    log::info!("Created admin account {}", user.email);
    Ok(user)
}
