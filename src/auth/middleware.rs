use std::rc::Rc;

use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    web, Error, HttpMessage,
};
use futures::future::{ready, LocalBoxFuture, Ready};

use crate::auth::cookies::ACCESS_COOKIE;
use crate::auth::extractors::AuthenticatedUser;
use crate::auth::INVALID_SESSION;
use crate::error::AppError;
use crate::state::AppState;

/// Resolves an access token to the caller's identity.
///
/// Every way this can fail (no token, bad signature, expiry, user gone) is reported
/// as the same `Unauthorized` error; the reason is only logged. The role is read from
/// the user repository on every call so that promotions and demotions take effect on
/// the next request, without a new token.
pub async fn authenticate(
    state: &AppState,
    access_token: Option<&str>,
) -> Result<AuthenticatedUser, AppError> {
    let rejected = || AppError::Unauthorized(INVALID_SESSION.to_string());

    let token = access_token.ok_or_else(|| {
        log::debug!("Rejected request: access token cookie missing");
        rejected()
    })?;

    let claims = state.tokens.verify_access(token).map_err(|e| {
        log::warn!("Rejected access token: {}", e);
        rejected()
    })?;

    let user = state.users.find_by_id(claims.sub).await?.ok_or_else(|| {
        log::warn!("Rejected access token: user {} no longer exists", claims.sub);
        rejected()
    })?;

    Ok(AuthenticatedUser {
        id: user.id,
        role: user.role,
    })
}

/// Authenticates requests from the `accessToken` cookie and stores an
/// [`AuthenticatedUser`] in the request extensions.
///
/// Rejections are answered directly with the error envelope instead of being
/// returned as service errors, so the wrapped service never runs.
pub struct SessionMiddleware;

impl<S, B> Transform<S, ServiceRequest> for SessionMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = SessionMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(SessionMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct SessionMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for SessionMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);

        Box::pin(async move {
            let state = match req.app_data::<web::Data<AppState>>().cloned() {
                Some(state) => state,
                None => {
                    let err =
                        AppError::InternalServerError("Application state is not registered".into());
                    return Ok(req.error_response(err).map_into_right_body());
                }
            };

            let token = req.cookie(ACCESS_COOKIE).map(|c| c.value().to_string());
            match authenticate(&state, token.as_deref()).await {
                Ok(identity) => {
                    req.extensions_mut().insert(identity);
                    service.call(req).await.map(ServiceResponse::map_into_left_body)
                }
                Err(err) => Ok(req.error_response(err).map_into_right_body()),
            }
        })
    }
}
