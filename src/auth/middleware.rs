use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header,
    web, Error, HttpMessage, HttpResponse,
};
use futures::future::{ready, LocalBoxFuture, Ready};
use std::rc::Rc;

use super::{verify_token, AuthenticatedUserId, LOGIN_PATH, SESSION_COOKIE};
use crate::config::Config;
use crate::db::DbPool;
use crate::error::AppError;
use crate::models::User;
use crate::notice::{redirect, removal_cookie, Message, Notice};

/// Requires a valid session on every route of the wrapped scope.
///
/// Requests without one are redirected to the login page with an error
/// notice; the handler never runs.
pub struct AuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = AuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
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
            match authenticate(&req).await? {
                Some(user_id) => {
                    req.extensions_mut().insert(user_id);
                    let res = service.call(req).await?;
                    Ok(res.map_into_left_body())
                }
                None => {
                    log::warn!("login required for {} {}", req.method(), req.path());
                    let response = login_redirect(req.cookie(SESSION_COOKIE).is_some());
                    Ok(req.into_response(response).map_into_right_body())
                }
            }
        })
    }
}

/// The session token from the cookie, or from an `Authorization: Bearer` header.
fn session_token(req: &ServiceRequest) -> Option<String> {
    if let Some(cookie) = req.cookie(SESSION_COOKIE) {
        return Some(cookie.value().to_string());
    }
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::to_string)
}

/// Resolves the session to a user id. `Ok(None)` means "not logged in";
/// `Err` is reserved for failures on our side.
async fn authenticate(req: &ServiceRequest) -> Result<Option<AuthenticatedUserId>, AppError> {
    let token = match session_token(req) {
        Some(token) => token,
        None => return Ok(None),
    };

    let config = req
        .app_data::<web::Data<Config>>()
        .ok_or_else(|| AppError::InternalServerError("Config is not registered".into()))?;
    let claims = match verify_token(&token, &config.secret_key) {
        Ok(claims) => claims,
        Err(err) => {
            log::debug!("rejected session token: {}", err);
            return Ok(None);
        }
    };

    let pool = req
        .app_data::<web::Data<DbPool>>()
        .ok_or_else(|| AppError::InternalServerError("Database pool is not registered".into()))?;
    let mut conn = pool.acquire().await?;
    if User::exists(&mut conn, claims.sub).await? {
        Ok(Some(AuthenticatedUserId(claims.sub)))
    } else {
        Ok(None)
    }
}

fn login_redirect(clear_session: bool) -> HttpResponse {
    let mut response = redirect(LOGIN_PATH, Notice::error(Message::LoginRequired));
    if clear_session {
        if let Err(err) = response.add_cookie(&removal_cookie(SESSION_COOKIE)) {
            log::error!("failed to clear session cookie: {}", err);
        }
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::generate_token;
    use crate::db;
    use crate::i18n::Locale;
    use crate::models::UserInput;
    use actix_web::cookie::Cookie;
    use actix_web::{test, App, HttpResponse};

    const SECRET: &str = "middleware-test-secret";

    fn config() -> Config {
        Config {
            database_url: "sqlite::memory:".into(),
            server_port: 8080,
            server_host: "127.0.0.1".into(),
            secret_key: SECRET.into(),
            session_ttl_hours: 1,
            bcrypt_cost: 4,
            default_locale: Locale::En,
        }
    }

    async fn whoami(user_id: AuthenticatedUserId) -> HttpResponse {
        HttpResponse::Ok().body(user_id.0.to_string())
    }

    #[actix_rt::test]
    async fn test_session_gate() {
        let pool = db::connect_in_memory().await.unwrap();
        let user_id = {
            let mut conn = pool.acquire().await.unwrap();
            let input = UserInput {
                username: "gatekeeper".into(),
                first_name: String::new(),
                last_name: String::new(),
                password1: String::new(),
                password2: String::new(),
            };
            User::insert(&mut conn, &input, "hash").await.unwrap().id
        };

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(pool.clone()))
                .app_data(web::Data::new(config()))
                .service(
                    web::scope("/private")
                        .wrap(AuthMiddleware)
                        .route("", web::get().to(whoami)),
                ),
        )
        .await;

        // No session at all.
        let req = test::TestRequest::get().uri("/private").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 302);
        assert_eq!(resp.headers().get(header::LOCATION).unwrap(), LOGIN_PATH);

        // Forged token.
        let forged = generate_token(user_id, "another-secret", 1).unwrap();
        let req = test::TestRequest::get()
            .uri("/private")
            .cookie(Cookie::new(SESSION_COOKIE, forged))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 302);

        // Valid cookie.
        let token = generate_token(user_id, SECRET, 1).unwrap();
        let req = test::TestRequest::get()
            .uri("/private")
            .cookie(Cookie::new(SESSION_COOKIE, token.clone()))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);
        let body = test::read_body(resp).await;
        assert_eq!(body, user_id.to_string());

        // Valid bearer header.
        let req = test::TestRequest::get()
            .uri("/private")
            .insert_header((header::AUTHORIZATION, format!("Bearer {}", token)))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);

        // The user behind the token is gone.
        {
            let mut conn = pool.acquire().await.unwrap();
            User::delete(&mut conn, user_id).await.unwrap();
        }
        let req = test::TestRequest::get()
            .uri("/private")
            .cookie(Cookie::new(SESSION_COOKIE, token))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 302);
    }
}
