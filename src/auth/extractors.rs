use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpMessage, HttpRequest};
use std::fmt;
use std::future::{ready, Ready};

use crate::error::AppError;

/// The logged-in user acting on this request.
///
/// Only available under `AuthMiddleware`, which puts it into the request
/// extensions once the session checks out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUserId(pub i64);

impl AuthenticatedUserId {
    /// Whether the actor is the user with `user_id`.
    pub fn is(self, user_id: i64) -> bool {
        self.0 == user_id
    }
}

impl fmt::Display for AuthenticatedUserId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "user {}", self.0)
    }
}

impl FromRequest for AuthenticatedUserId {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let actor = req
            .extensions()
            .get::<AuthenticatedUserId>()
            .copied()
            .ok_or_else(|| AppError::Unauthorized("No session for this route".into()));
        ready(actor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test, ResponseError};

    #[actix_rt::test]
    async fn test_actor_from_extensions() {
        let req = test::TestRequest::default().to_http_request();
        req.extensions_mut().insert(AuthenticatedUserId(7));

        let actor = AuthenticatedUserId::from_request(&req, &mut Payload::None)
            .await
            .unwrap();
        assert!(actor.is(7));
        assert!(!actor.is(8));
        assert_eq!(actor.to_string(), "user 7");
    }

    #[actix_rt::test]
    async fn test_missing_actor_is_unauthorized() {
        let req = test::TestRequest::default().to_http_request();

        let err = AuthenticatedUserId::from_request(&req, &mut Payload::None)
            .await
            .unwrap_err();
        assert_eq!(err.error_response().status(), 401);
    }
}
