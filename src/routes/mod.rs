pub mod auth;
pub mod health;
pub mod labels;
pub mod statuses;
pub mod tasks;
pub mod users;

use actix_web::cookie::Cookie;
use actix_web::{web, HttpResponse};
use serde_json::{json, Value};

use crate::auth::AuthMiddleware;
use crate::error::AppError;
use crate::forms::{FieldSpec, FormData};

pub const INDEX_PATH: &str = "/";
pub const USERS_PATH: &str = "/users";
pub const STATUSES_PATH: &str = "/statuses";
pub const LABELS_PATH: &str = "/labels";
pub const TASKS_PATH: &str = "/tasks";

/// A urlencoded body as raw pairs, so repeated keys survive.
pub type FormBody = web::Form<Vec<(String, String)>>;

/// Registers every route. User list and registration are public; every other
/// entity route sits behind `AuthMiddleware`.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(health::health)
        .service(auth::index)
        .service(auth::login_page)
        .service(auth::login)
        .service(auth::logout)
        .service(
            web::scope(USERS_PATH)
                .service(users::list)
                .service(users::create_page)
                .service(users::create)
                .service(
                    web::scope("/{id}")
                        .wrap(AuthMiddleware)
                        .service(users::update_page)
                        .service(users::update)
                        .service(users::delete_page)
                        .service(users::delete),
                ),
        )
        .service(
            web::scope(STATUSES_PATH)
                .wrap(AuthMiddleware)
                .service(statuses::list)
                .service(statuses::create_page)
                .service(statuses::create)
                .service(statuses::update_page)
                .service(statuses::update)
                .service(statuses::delete_page)
                .service(statuses::delete),
        )
        .service(
            web::scope(LABELS_PATH)
                .wrap(AuthMiddleware)
                .service(labels::list)
                .service(labels::create_page)
                .service(labels::create)
                .service(labels::update_page)
                .service(labels::update)
                .service(labels::delete_page)
                .service(labels::delete),
        )
        .service(
            web::scope(TASKS_PATH)
                .wrap(AuthMiddleware)
                .service(tasks::list)
                .service(tasks::create_page)
                .service(tasks::create)
                .service(tasks::detail)
                .service(tasks::update_page)
                .service(tasks::update)
                .service(tasks::delete_page)
                .service(tasks::delete),
        );
}

/// Fallback for unknown routes.
pub async fn not_found() -> Result<HttpResponse, AppError> {
    Err(AppError::NotFound("Page not found".into()))
}

pub(crate) fn form_data(body: FormBody) -> FormData {
    body.into_inner().into()
}

/// The `form` object of a form page.
pub(crate) fn form_schema(fields: &[FieldSpec], values: Value, choices: Value) -> Value {
    json!({
        "fields": fields,
        "values": values,
        "choices": choices,
    })
}

pub(crate) fn choice(value: i64, label: impl Into<String>) -> Value {
    json!({ "value": value, "label": label.into() })
}

pub(crate) fn with_cookie(
    mut response: HttpResponse,
    cookie: Cookie<'_>,
) -> Result<HttpResponse, AppError> {
    response
        .add_cookie(&cookie)
        .map_err(|e| AppError::InternalServerError(format!("Failed to set cookie: {}", e)))?;
    Ok(response)
}
