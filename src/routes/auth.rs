use crate::{
    auth::{
        bearer_token, hash_password, verify_password, AuthResponse, LoginRequest, RevocationStore,
        SignupRequest, TokenService, TOKEN_TTL_SECS,
    },
    error::AppError,
};
use actix_web::{post, web, HttpRequest, HttpResponse, Responder};
use chrono::{Duration, TimeZone, Utc};
use serde_json::json;
use sqlx::PgPool;
use validator::Validate;

/// Register a new user.
///
/// Creates the account and immediately issues a session token, so signup
/// doubles as a login.
#[post("/signup")]
pub async fn signup(
    pool: web::Data<PgPool>,
    tokens: web::Data<TokenService>,
    signup_data: web::Json<SignupRequest>,
) -> Result<impl Responder, AppError> {
    signup_data.validate()?;

    // Check if the email is already taken
    let existing_user = sqlx::query_as::<_, (i32,)>("SELECT id FROM users WHERE email = $1")
        .bind(&signup_data.email)
        .fetch_optional(&**pool)
        .await?;

    if existing_user.is_some() {
        return Err(AppError::BadRequest("User already exists".into()));
    }

    let password_hash = hash_password(&signup_data.password)?;

    let (user_id,) = sqlx::query_as::<_, (i32,)>(
        "INSERT INTO users (username, email, password_hash) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(&signup_data.username)
    .bind(&signup_data.email)
    .bind(&password_hash)
    .fetch_one(&**pool)
    .await?;

    let token = tokens.issue(user_id)?;

    Ok(HttpResponse::Created().json(AuthResponse { token }))
}

/// Authenticate a user and issue a session token.
///
/// An unknown email and a wrong password produce the same response, so the
/// caller learns nothing about which factor failed.
#[post("/login")]
pub async fn login(
    pool: web::Data<PgPool>,
    tokens: web::Data<TokenService>,
    login_data: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    login_data.validate()?;

    let user = sqlx::query_as::<_, (i32, String)>(
        "SELECT id, password_hash FROM users WHERE email = $1",
    )
    .bind(&login_data.email)
    .fetch_optional(&**pool)
    .await?;

    match user {
        Some((user_id, password_hash)) => {
            if verify_password(&login_data.password, &password_hash)? {
                let token = tokens.issue(user_id)?;
                Ok(HttpResponse::Ok().json(AuthResponse { token }))
            } else {
                Err(AppError::BadRequest("Invalid email or password".into()))
            }
        }
        None => Err(AppError::BadRequest("Invalid email or password".into())),
    }
}

/// Invalidate the presented token.
///
/// Requires only that a token be presented; the exact string is recorded in
/// the revocation registry so the guard refuses it from now on, even though
/// its signature and expiry remain valid. Logging out twice with the same
/// token succeeds both times.
#[post("/logout")]
pub async fn logout(
    req: HttpRequest,
    tokens: web::Data<TokenService>,
    store: web::Data<dyn RevocationStore>,
) -> Result<impl Responder, AppError> {
    let token = bearer_token(req.headers())
        .ok_or_else(|| AppError::Unauthorized("No token provided".into()))?;

    // The registry keeps entries until the token's own expiry. A token we
    // cannot decode is retained for the longest a real token could live.
    let expires_at = tokens
        .verify(token)
        .ok()
        .and_then(|claims| Utc.timestamp_opt(claims.exp as i64, 0).single())
        .unwrap_or_else(|| Utc::now() + Duration::seconds(TOKEN_TTL_SECS));

    store.revoke(token, expires_at).await?;

    Ok(HttpResponse::Ok().json(json!({ "message": "Logged out successfully" })))
}
