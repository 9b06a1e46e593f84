// Authentication middleware for the saved-list endpoints.
//
// Identity is the signed JWT in the `token` cookie and nothing else. The
// middleware verifies it and parks the claims in request extensions; handlers
// pull them back out with the `AuthedUser` extractor.

use actix_web::{
    body::{BoxBody, EitherBody},
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    Error, FromRequest, HttpMessage, HttpRequest, ResponseError,
};
use futures::future::LocalBoxFuture;
use std::future::{ready, Ready};

use crate::auth::{Claims, TokenKeys, TOKEN_COOKIE};
use crate::error::ApiError;

/// Middleware factory that validates the token cookie.
pub struct Auth {
    keys: TokenKeys,
}

impl Auth {
    pub fn new(keys: TokenKeys) -> Self {
        Self { keys }
    }
}

impl<S, B> Transform<S, ServiceRequest> for Auth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B, BoxBody>>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddleware {
            service,
            keys: self.keys.clone(),
        }))
    }
}

pub struct AuthMiddleware<S> {
    service: S,
    keys: TokenKeys,
}

impl<S, B> Service<ServiceRequest> for AuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B, BoxBody>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let verified = req
            .cookie(TOKEN_COOKIE)
            .ok_or(ApiError::Unauthenticated)
            .and_then(|cookie| self.keys.verify(cookie.value()));

        match verified {
            Ok(claims) => {
                req.extensions_mut().insert(claims);
                let fut = self.service.call(req);
                Box::pin(async move {
                    let res = fut.await?;
                    Ok(res.map_into_left_body())
                })
            }
            Err(err) => Box::pin(async move {
                let response = err.error_response().map_into_right_body();
                Ok(req.into_response(response))
            }),
        }
    }
}

/// Verified identity for the current request, placed there by [`Auth`].
pub struct AuthedUser(pub Claims);

impl FromRequest for AuthedUser {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<Claims>()
                .cloned()
                .map(AuthedUser)
                .ok_or(ApiError::Unauthenticated),
        )
    }
}
