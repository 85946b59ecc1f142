//! Revocation registry for session tokens.
//!
//! A token that still verifies can be refused by recording its exact string
//! here; the guard consults the registry before trusting any signature.
//! Entries only matter until the token's own expiry passes, so the store
//! keeps that timestamp and `prune_expired` drops entries that can no longer
//! verify anyway.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::AppError;

/// Storage interface for revoked tokens.
///
/// `is_revoked` runs on every guarded request, so implementations keep the
/// lookup cheap. `revoke` is idempotent: revoking an already-revoked token
/// succeeds with the same observable result.
#[async_trait]
pub trait RevocationStore: Send + Sync {
    /// Durably records `token` as revoked. `expires_at` is when the token
    /// would have expired naturally, bounding how long the entry is kept.
    async fn revoke(&self, token: &str, expires_at: DateTime<Utc>) -> Result<(), AppError>;

    /// Whether `token` has been revoked.
    async fn is_revoked(&self, token: &str) -> Result<bool, AppError>;

    /// Deletes entries for tokens that have expired on their own. Returns
    /// the number of entries removed.
    async fn prune_expired(&self) -> Result<u64, AppError>;
}

/// Postgres-backed registry over the `revoked_tokens` table.
pub struct PgRevocationStore {
    pool: PgPool,
}

impl PgRevocationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RevocationStore for PgRevocationStore {
    async fn revoke(&self, token: &str, expires_at: DateTime<Utc>) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO revoked_tokens (token, expires_at) VALUES ($1, $2)
             ON CONFLICT (token) DO NOTHING",
        )
        .bind(token)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn is_revoked(&self, token: &str) -> Result<bool, AppError> {
        let revoked = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM revoked_tokens WHERE token = $1)",
        )
        .bind(token)
        .fetch_one(&self.pool)
        .await?;

        Ok(revoked)
    }

    async fn prune_expired(&self) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM revoked_tokens WHERE expires_at < now()")
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

/// In-memory registry for tests and single-process deployments.
#[derive(Default)]
pub struct MemoryRevocationStore {
    entries: RwLock<HashMap<String, DateTime<Utc>>>,
}

impl MemoryRevocationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RevocationStore for MemoryRevocationStore {
    async fn revoke(&self, token: &str, expires_at: DateTime<Utc>) -> Result<(), AppError> {
        self.entries
            .write()
            .map_err(|_| AppError::InternalServerError("Revocation store lock poisoned".into()))?
            .insert(token.to_owned(), expires_at);
        Ok(())
    }

    async fn is_revoked(&self, token: &str) -> Result<bool, AppError> {
        Ok(self
            .entries
            .read()
            .map_err(|_| AppError::InternalServerError("Revocation store lock poisoned".into()))?
            .contains_key(token))
    }

    async fn prune_expired(&self) -> Result<u64, AppError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| AppError::InternalServerError("Revocation store lock poisoned".into()))?;
        let before = entries.len();
        let now = Utc::now();
        entries.retain(|_, expires_at| *expires_at > now);
        Ok((before - entries.len()) as u64)
    }
}
