#![allow(dead_code)]

use actix_http::Request;
use actix_web::body::MessageBody;
use actix_web::cookie::Cookie;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::{http::header, test, web, App, Error};
use serde_json::Value;

use task_manager::auth::{generate_token, hash_password, SESSION_COOKIE};
use task_manager::db::{self, DbPool};
use task_manager::i18n::Locale;
use task_manager::models::{Label, Status, Task, TaskChanges, User, UserInput};
use task_manager::notice::NOTICE_COOKIE;
use task_manager::{routes, Config};

pub const SECRET: &str = "integration-test-secret";
pub const PASSWORD: &str = "qwer1234";

pub fn test_config() -> Config {
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

pub async fn test_pool() -> DbPool {
    db::connect_in_memory()
        .await
        .expect("Failed to open in-memory database")
}

pub async fn init_app(
    pool: &DbPool,
) -> impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = Error> {
    init_app_with(pool, test_config()).await
}

pub async fn init_app_with(
    pool: &DbPool,
    config: Config,
) -> impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = Error> {
    test::init_service(
        App::new()
            .app_data(web::Data::new(pool.clone()))
            .app_data(web::Data::new(config))
            .configure(routes::config)
            .default_service(web::to(routes::not_found)),
    )
    .await
}

/// Inserts a user whose password is `PASSWORD`.
pub async fn create_user(pool: &DbPool, username: &str) -> i64 {
    let input = UserInput {
        username: username.to_string(),
        first_name: username.to_string(),
        last_name: "Tester".to_string(),
        password1: PASSWORD.to_string(),
        password2: PASSWORD.to_string(),
    };
    let hash = hash_password(PASSWORD, 4).unwrap();
    let mut conn = pool.acquire().await.unwrap();
    User::insert(&mut conn, &input, &hash).await.unwrap().id
}

pub async fn create_status(pool: &DbPool, name: &str) -> i64 {
    let mut conn = pool.acquire().await.unwrap();
    Status::insert(&mut conn, name).await.unwrap().id
}

pub async fn create_label(pool: &DbPool, name: &str) -> i64 {
    let mut conn = pool.acquire().await.unwrap();
    Label::insert(&mut conn, name).await.unwrap().id
}

pub async fn create_task(
    pool: &DbPool,
    name: &str,
    status_id: i64,
    creator_id: i64,
    executor_id: Option<i64>,
    label_ids: Vec<i64>,
) -> i64 {
    let changes = TaskChanges {
        name: name.to_string(),
        description: String::new(),
        status_id,
        executor_id,
        label_ids,
    };
    let mut conn = pool.acquire().await.unwrap();
    Task::insert(&mut conn, &changes, creator_id).await.unwrap().id
}

pub async fn find_user(pool: &DbPool, id: i64) -> Option<User> {
    let mut conn = pool.acquire().await.unwrap();
    User::find(&mut conn, id).await.unwrap()
}

pub async fn find_task(pool: &DbPool, id: i64) -> Option<Task> {
    let mut conn = pool.acquire().await.unwrap();
    Task::find(&mut conn, id).await.unwrap()
}

pub fn session(user_id: i64) -> Cookie<'static> {
    Cookie::new(SESSION_COOKIE, generate_token(user_id, SECRET, 1).unwrap())
}

pub async fn get<S, B>(app: &S, uri: &str, user_id: Option<i64>) -> ServiceResponse<B>
where
    S: Service<Request, Response = ServiceResponse<B>, Error = Error>,
    B: MessageBody,
{
    let mut req = test::TestRequest::get().uri(uri);
    if let Some(user_id) = user_id {
        req = req.cookie(session(user_id));
    }
    test::call_service(app, req.to_request()).await
}

pub async fn post<S, B>(
    app: &S,
    uri: &str,
    user_id: Option<i64>,
    form: &[(&str, &str)],
) -> ServiceResponse<B>
where
    S: Service<Request, Response = ServiceResponse<B>, Error = Error>,
    B: MessageBody,
{
    let mut req = test::TestRequest::post().uri(uri).set_form(form);
    if let Some(user_id) = user_id {
        req = req.cookie(session(user_id));
    }
    test::call_service(app, req.to_request()).await
}

pub async fn body_json<B: MessageBody>(resp: ServiceResponse<B>) -> Value {
    test::read_body_json(resp).await
}

pub fn location<B>(resp: &ServiceResponse<B>) -> String {
    resp.headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

/// The raw `kind:key` notice a response leaves behind.
pub fn notice<B>(resp: &ServiceResponse<B>) -> Option<String> {
    resp.response()
        .cookies()
        .find(|cookie| cookie.name() == NOTICE_COOKIE)
        .map(|cookie| cookie.value().to_string())
}
