use actix_web::{get, post, web, HttpResponse};
use serde_json::json;

use super::{form_data, form_schema, with_cookie, FormBody, INDEX_PATH};
use crate::{
    auth::{generate_token, session_cookie, verify_password, LoginInput, SESSION_COOKIE},
    config::Config,
    db::DbPool,
    error::AppError,
    i18n::Locale,
    models::User,
    notice::{redirect, removal_cookie, render_page, Message, Notice, PendingNotice},
};

const BAD_CREDENTIALS: &str =
    "Please enter a correct username and password. Note that both fields may be case-sensitive.";

/// Landing page. Public; shows whatever notice the last redirect left.
#[get("/", name = "index")]
pub async fn index(locale: Locale, pending: PendingNotice) -> HttpResponse {
    render_page(locale, pending, json!({ "title": "Task Manager" }))
}

#[get("/login", name = "login")]
pub async fn login_page(locale: Locale, pending: PendingNotice) -> HttpResponse {
    render_page(
        locale,
        pending,
        json!({ "form": form_schema(LoginInput::FIELDS, json!({}), json!({})) }),
    )
}

/// Login user
///
/// Checks the credentials and stores a signed session token in the
/// `session` cookie.
#[post("/login")]
pub async fn login(
    pool: web::Data<DbPool>,
    config: web::Data<Config>,
    body: FormBody,
) -> Result<HttpResponse, AppError> {
    let input = LoginInput::bind(&form_data(body));
    input.clean()?;

    let user = {
        let mut conn = pool.acquire().await?;
        User::find_by_username(&mut conn, &input.username).await?
    };

    let user = match user {
        Some(user) => user,
        None => {
            log::warn!("failed login for unknown user {:?}", input.username);
            return Err(AppError::Unauthorized(BAD_CREDENTIALS.into()));
        }
    };
    if !verify_password(&input.password, &user.password_hash)? {
        log::warn!("failed login for user {}", user.id);
        return Err(AppError::Unauthorized(BAD_CREDENTIALS.into()));
    }

    let token = generate_token(user.id, &config.secret_key, config.session_ttl_hours)?;
    log::info!("user {} logged in", user.id);
    with_cookie(
        redirect(INDEX_PATH, Notice::success(Message::LoggedIn)),
        session_cookie(token),
    )
}

#[post("/logout", name = "logout")]
pub async fn logout() -> Result<HttpResponse, AppError> {
    with_cookie(
        redirect(INDEX_PATH, Notice::success(Message::LoggedOut)),
        removal_cookie(SESSION_COOKIE),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::hash_password;
    use crate::db;
    use crate::models::UserInput;
    use actix_web::{http::header, test, App};

    fn config() -> Config {
        Config {
            database_url: "sqlite::memory:".into(),
            server_port: 8080,
            server_host: "127.0.0.1".into(),
            secret_key: "login-test-secret".into(),
            session_ttl_hours: 1,
            bcrypt_cost: 4,
            default_locale: Locale::En,
        }
    }

    #[actix_rt::test]
    async fn test_login_and_logout() {
        let pool = db::connect_in_memory().await.unwrap();
        {
            let mut conn = pool.acquire().await.unwrap();
            let input = UserInput {
                username: "albert".into(),
                first_name: String::new(),
                last_name: String::new(),
                password1: String::new(),
                password2: String::new(),
            };
            let hash = hash_password("qwer1234", 4).unwrap();
            User::insert(&mut conn, &input, &hash).await.unwrap();
        }

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(pool))
                .app_data(web::Data::new(config()))
                .service(login)
                .service(logout),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/login")
            .set_form(&[("username", "albert"), ("password", "wrong")])
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 401);

        let req = test::TestRequest::post()
            .uri("/login")
            .set_form(&[("username", "albert"), ("password", "qwer1234")])
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 302);
        assert_eq!(resp.headers().get(header::LOCATION).unwrap(), "/");
        let session = resp
            .response()
            .cookies()
            .find(|c| c.name() == SESSION_COOKIE)
            .unwrap();
        assert!(!session.value().is_empty());

        let req = test::TestRequest::post().uri("/logout").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 302);
        let cleared = resp
            .response()
            .cookies()
            .find(|c| c.name() == SESSION_COOKIE)
            .unwrap();
        assert_eq!(cleared.value(), "");
    }

    #[actix_rt::test]
    async fn test_login_requires_both_fields() {
        let pool = db::connect_in_memory().await.unwrap();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(pool))
                .app_data(web::Data::new(config()))
                .service(login),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/login")
            .set_form(&[("username", "albert")])
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 422);
    }
}
