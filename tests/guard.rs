//! Guard behavior tests, run against a live server backed by the in-memory
//! revocation registry so no database is needed. A probe route behind the
//! guard echoes the authenticated user id; every rejection path is asserted
//! down to the exact message a client would see.

use std::net::TcpListener;
use std::sync::Arc;

use actix_web::{rt, web, App, HttpResponse, HttpServer, Responder};
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::json;
use uuid::Uuid;

use taskvault::auth::{
    AuthGuard, AuthenticatedUserId, Claims, MemoryRevocationStore, RevocationStore, TokenService,
    TOKEN_TTL_SECS,
};

const SECRET: &[u8] = b"guard-test-secret";

async fn whoami(user: AuthenticatedUserId) -> impl Responder {
    HttpResponse::Ok().json(json!({ "userId": user.0 }))
}

/// Signs arbitrary claims with the given secret, bypassing `TokenService`
/// so tests can mint expired or foreign tokens.
fn sign_claims(sub: i32, exp: i64, secret: &[u8]) -> String {
    let claims = Claims {
        sub,
        exp: exp as usize,
        iat: (exp - TOKEN_TTL_SECS) as usize,
        jti: Uuid::new_v4(),
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret)).unwrap()
}

/// Spawns the guarded probe app on a random port and returns its base url.
async fn spawn_app(tokens: TokenService, store: Arc<dyn RevocationStore>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    rt::spawn(async move {
        HttpServer::new(move || {
            App::new()
                .app_data(web::Data::new(tokens.clone()))
                .app_data(web::Data::from(Arc::clone(&store)))
                .service(
                    web::scope("/api")
                        .wrap(AuthGuard)
                        .service(taskvault::routes::auth::logout)
                        .route("/whoami", web::get().to(whoami)),
                )
        })
        .workers(1)
        .bind(("127.0.0.1", port))
        .unwrap_or_else(|_| panic!("Failed to bind to port {}", port))
        .run()
        .await
    });

    // Give the server a moment to start
    tokio::time::sleep(tokio::time::Duration::from_millis(200)).await;

    format!("http://127.0.0.1:{}", port)
}

#[test_log::test(actix_rt::test)]
async fn test_missing_or_malformed_header_is_rejected() {
    let tokens = TokenService::new(SECRET);
    let store: Arc<dyn RevocationStore> = Arc::new(MemoryRevocationStore::new());
    let base = spawn_app(tokens, store).await;
    let client = reqwest::Client::new();

    // No header at all.
    let resp = client
        .get(format!("{}/api/whoami", base))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "Authentication required");

    // Wrong scheme.
    let resp = client
        .get(format!("{}/api/whoami", base))
        .header("Authorization", "Token abc")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "Authentication required");
}

#[test_log::test(actix_rt::test)]
async fn test_valid_token_is_admitted() {
    let tokens = TokenService::new(SECRET);
    let store: Arc<dyn RevocationStore> = Arc::new(MemoryRevocationStore::new());
    let base = spawn_app(tokens.clone(), store).await;
    let client = reqwest::Client::new();

    let token = tokens.issue(42).unwrap();
    let resp = client
        .get(format!("{}/api/whoami", base))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::OK);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["userId"], 42);
}

#[actix_rt::test]
async fn test_revoked_token_is_rejected_while_still_verifiable() {
    let tokens = TokenService::new(SECRET);
    let store: Arc<dyn RevocationStore> = Arc::new(MemoryRevocationStore::new());
    let base = spawn_app(tokens.clone(), Arc::clone(&store)).await;
    let client = reqwest::Client::new();

    let token = tokens.issue(7).unwrap();
    // The token itself still verifies; only the registry entry blocks it.
    assert!(tokens.verify(&token).is_ok());
    store
        .revoke(&token, Utc::now() + Duration::seconds(TOKEN_TTL_SECS))
        .await
        .unwrap();

    let resp = client
        .get(format!("{}/api/whoami", base))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "Token is invalidated");
}

#[actix_rt::test]
async fn test_expired_token_is_rejected() {
    let tokens = TokenService::new(SECRET);
    let store: Arc<dyn RevocationStore> = Arc::new(MemoryRevocationStore::new());
    let base = spawn_app(tokens, store).await;
    let client = reqwest::Client::new();

    let expired = sign_claims(7, (Utc::now() - Duration::hours(2)).timestamp(), SECRET);
    let resp = client
        .get(format!("{}/api/whoami", base))
        .header("Authorization", format!("Bearer {}", expired))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "Invalid token");
}

#[actix_rt::test]
async fn test_foreign_signature_is_rejected() {
    let tokens = TokenService::new(SECRET);
    let store: Arc<dyn RevocationStore> = Arc::new(MemoryRevocationStore::new());
    let base = spawn_app(tokens, store).await;
    let client = reqwest::Client::new();

    let forged = sign_claims(
        7,
        (Utc::now() + Duration::hours(1)).timestamp(),
        b"some-other-secret",
    );
    let resp = client
        .get(format!("{}/api/whoami", base))
        .header("Authorization", format!("Bearer {}", forged))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "Invalid token");
}

#[actix_rt::test]
async fn test_garbage_token_is_rejected() {
    let tokens = TokenService::new(SECRET);
    let store: Arc<dyn RevocationStore> = Arc::new(MemoryRevocationStore::new());
    let base = spawn_app(tokens, store).await;
    let client = reqwest::Client::new();

    let resp = client
        .get(format!("{}/api/whoami", base))
        .header("Authorization", "Bearer not-a-jwt")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "Invalid token");
}

#[test_log::test(actix_rt::test)]
async fn test_logout_invalidates_the_token() {
    let tokens = TokenService::new(SECRET);
    let store: Arc<dyn RevocationStore> = Arc::new(MemoryRevocationStore::new());
    let base = spawn_app(tokens.clone(), store).await;
    let client = reqwest::Client::new();

    let token = tokens.issue(9).unwrap();
    let auth_value = format!("Bearer {}", token);

    // The token works before logout.
    let resp = client
        .get(format!("{}/api/whoami", base))
        .header("Authorization", &auth_value)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::OK);

    // Logout succeeds.
    let resp = client
        .post(format!("{}/api/logout", base))
        .header("Authorization", &auth_value)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::OK);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "Logged out successfully");

    // The token still verifies cryptographically, but the guard refuses it.
    assert!(tokens.verify(&token).is_ok());
    let resp = client
        .get(format!("{}/api/whoami", base))
        .header("Authorization", &auth_value)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "Token is invalidated");

    // A second logout with the same token is still a success.
    let resp = client
        .post(format!("{}/api/logout", base))
        .header("Authorization", &auth_value)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::OK);
}

#[actix_rt::test]
async fn test_logout_without_token_is_rejected() {
    let tokens = TokenService::new(SECRET);
    let store: Arc<dyn RevocationStore> = Arc::new(MemoryRevocationStore::new());
    let base = spawn_app(tokens, store).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/api/logout", base))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "No token provided");
}

#[actix_rt::test]
async fn test_logout_does_not_affect_other_sessions() {
    let tokens = TokenService::new(SECRET);
    let store: Arc<dyn RevocationStore> = Arc::new(MemoryRevocationStore::new());
    let base = spawn_app(tokens.clone(), store).await;
    let client = reqwest::Client::new();

    let first = tokens.issue(5).unwrap();
    let second = tokens.issue(5).unwrap();
    assert_ne!(first, second);

    let resp = client
        .post(format!("{}/api/logout", base))
        .header("Authorization", format!("Bearer {}", first))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::OK);

    // Revocation is per token string, not per user.
    let resp = client
        .get(format!("{}/api/whoami", base))
        .header("Authorization", format!("Bearer {}", second))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::OK);
}
