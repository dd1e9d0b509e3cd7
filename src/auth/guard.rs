use std::rc::Rc;

use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpMessage,
};
use futures::future::{ready, LocalBoxFuture, Ready};

use crate::auth::extractors::AuthenticatedUser;
use crate::auth::INVALID_SESSION;
use crate::error::AppError;
use crate::models::Role;

/// Permits `user` if their role is one of `allowed`.
pub fn authorize(allowed: &[Role], user: &AuthenticatedUser) -> Result<(), AppError> {
    if allowed.contains(&user.role) {
        return Ok(());
    }

    let required: Vec<&str> = allowed.iter().map(|r| r.as_str()).collect();
    Err(AppError::Forbidden(format!(
        "Access denied. Required role(s): {}",
        required.join(", ")
    )))
}

/// Restricts a scope to a set of roles. Must be registered inside `SessionMiddleware`
/// (i.e. `.wrap(RequireRole::admin()).wrap(SessionMiddleware)`), which supplies the identity.
#[derive(Clone)]
pub struct RequireRole {
    allowed: Rc<[Role]>,
}

impl RequireRole {
    pub fn new(allowed: &[Role]) -> Self {
        Self {
            allowed: Rc::from(allowed),
        }
    }

    pub fn admin() -> Self {
        Self::new(&[Role::Admin])
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequireRole
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = RequireRoleService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireRoleService {
            service,
            allowed: Rc::clone(&self.allowed),
        }))
    }
}

pub struct RequireRoleService<S> {
    service: S,
    allowed: Rc<[Role]>,
}

impl<S, B> Service<ServiceRequest> for RequireRoleService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let identity = req.extensions().get::<AuthenticatedUser>().copied();

        let verdict = match identity {
            Some(user) => authorize(&self.allowed, &user),
            None => Err(AppError::Unauthorized(INVALID_SESSION.to_string())),
        };

        match verdict {
            Ok(()) => {
                let fut = self.service.call(req);
                Box::pin(async move { fut.await.map(ServiceResponse::map_into_left_body) })
            }
            Err(err) => {
                let resp = req.error_response(err).map_into_right_body();
                Box::pin(async move { Ok(resp) })
            }
        }
    }
}
