use crate::{
    auth::{hash_password, verify_password, AuthenticatedUserId, ChangePasswordRequest},
    error::AppError,
    models::User,
};
use actix_web::{get, post, web, HttpResponse, Responder};
use serde_json::json;
use sqlx::PgPool;
use validator::Validate;

/// Returns the authenticated user's profile. The password hash is never
/// selected, so it cannot appear in the response.
#[get("/profile")]
pub async fn profile(
    pool: web::Data<PgPool>,
    user: AuthenticatedUserId,
) -> Result<impl Responder, AppError> {
    let user = sqlx::query_as::<_, User>(
        "SELECT id, username, email, created_at FROM users WHERE id = $1",
    )
    .bind(user.0)
    .fetch_optional(&**pool)
    .await?
    .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    Ok(HttpResponse::Ok().json(user))
}

/// Change the authenticated user's password.
///
/// The current password is re-verified even though the guard already
/// admitted the request; a valid token alone is not enough for this
/// mutation.
#[post("/change-password")]
pub async fn change_password(
    pool: web::Data<PgPool>,
    user: AuthenticatedUserId,
    payload: web::Json<ChangePasswordRequest>,
) -> Result<impl Responder, AppError> {
    payload.validate()?;

    let (password_hash,) =
        sqlx::query_as::<_, (String,)>("SELECT password_hash FROM users WHERE id = $1")
            .bind(user.0)
            .fetch_optional(&**pool)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    if !verify_password(&payload.current_password, &password_hash)? {
        return Err(AppError::BadRequest("Current password is incorrect".into()));
    }

    let new_hash = hash_password(&payload.new_password)?;

    sqlx::query("UPDATE users SET password_hash = $1 WHERE id = $2")
        .bind(&new_hash)
        .bind(user.0)
        .execute(&**pool)
        .await?;

    Ok(HttpResponse::Ok().json(json!({ "message": "Password changed successfully!" })))
}
