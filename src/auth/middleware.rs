use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::{self, HeaderMap},
    web, Error, HttpMessage,
};
use futures::future::{ready, LocalBoxFuture, Ready};
use std::rc::Rc;

use crate::auth::blacklist::RevocationStore;
use crate::auth::token::TokenService;
use crate::error::AppError;

/// Paths under the guarded scope that are reachable without authentication.
/// Logout does its own token-presence check so a revocation can always be
/// recorded, even for a token the guard would refuse.
const PUBLIC_PATHS: [&str; 3] = ["/api/signup", "/api/login", "/api/logout"];

/// Extracts the bearer token from the `Authorization` header, if present.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
}

/// Middleware gating a scope on token validity and revocation status.
///
/// Each request is judged once, in order: a missing or malformed bearer
/// header is rejected outright; a revoked token is rejected before its
/// signature is even checked; a token that fails verification is rejected
/// last. Otherwise the verified user id is attached to the request's
/// extensions for downstream handlers.
pub struct AuthGuard;

impl<S, B> Transform<S, ServiceRequest> for AuthGuard
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = AuthGuardService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthGuardService {
            service: Rc::new(service),
        }))
    }
}

pub struct AuthGuardService<S> {
    // The revocation lookup is asynchronous and must resolve before the
    // downstream call, so the inner service is shared into the future.
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for AuthGuardService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);

        Box::pin(async move {
            if PUBLIC_PATHS.contains(&req.path()) {
                return service.call(req).await;
            }

            let token = match bearer_token(req.headers()) {
                Some(token) => token.to_owned(),
                None => {
                    return Err(AppError::Unauthorized("Authentication required".into()).into())
                }
            };

            let store = req
                .app_data::<web::Data<dyn RevocationStore>>()
                .cloned()
                .ok_or_else(|| {
                    AppError::InternalServerError("Revocation store not configured".into())
                })?;
            let tokens = req
                .app_data::<web::Data<TokenService>>()
                .cloned()
                .ok_or_else(|| {
                    AppError::InternalServerError("Token service not configured".into())
                })?;

            // Revocation comes before the signature check: a blacklisted
            // token must be refused even while it still verifies.
            if store.is_revoked(&token).await? {
                return Err(AppError::Unauthorized("Token is invalidated".into()).into());
            }

            let claims = tokens
                .verify(&token)
                .map_err(|_| AppError::Unauthorized("Invalid token".into()))?;

            req.extensions_mut().insert(claims.sub);
            service.call(req).await
        })
    }
}
