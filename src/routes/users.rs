use actix_web::{get, post, web, HttpResponse};
use serde_json::{json, Value};

use super::{form_data, form_schema, with_cookie, FormBody, USERS_PATH};
use crate::{
    auth::{
        hash_password, permissions::must_be_self, AuthenticatedUserId, LOGIN_PATH, SESSION_COOKIE,
    },
    config::Config,
    db::DbPool,
    error::AppError,
    forms::FormErrors,
    i18n::Locale,
    models::{User, UserInput},
    notice::{redirect, removal_cookie, render_page, Message, Notice, PendingNotice},
};

const USERNAME_TAKEN: &str = "A user with that username already exists.";

fn not_found(id: i64) -> AppError {
    AppError::NotFound(format!("User {} not found", id))
}

fn summary(user: &User) -> Value {
    json!({
        "id": user.id,
        "username": user.username,
        "full_name": user.full_name(),
        "created_at": user.created_at,
    })
}

async fn load(pool: &DbPool, id: i64) -> Result<User, AppError> {
    let mut conn = pool.acquire().await?;
    User::find(&mut conn, id).await?.ok_or_else(|| not_found(id))
}

/// Lists every user. Public.
#[get("", name = "user_list")]
pub async fn list(
    pool: web::Data<DbPool>,
    locale: Locale,
    pending: PendingNotice,
) -> Result<HttpResponse, AppError> {
    let mut conn = pool.acquire().await?;
    let users: Vec<Value> = User::all(&mut conn).await?.iter().map(summary).collect();
    Ok(render_page(locale, pending, json!({ "users": users })))
}

#[get("/create", name = "user_create")]
pub async fn create_page(locale: Locale, pending: PendingNotice) -> HttpResponse {
    render_page(
        locale,
        pending,
        json!({ "form": form_schema(UserInput::FIELDS, json!({}), json!({})) }),
    )
}

/// Registers a new user. Public.
#[post("/create")]
pub async fn create(
    pool: web::Data<DbPool>,
    config: web::Data<Config>,
    body: FormBody,
) -> Result<HttpResponse, AppError> {
    let input = UserInput::bind(&form_data(body));
    input.clean(true)?;

    let mut tx = pool.begin().await?;
    if User::username_taken(&mut tx, &input.username, None).await? {
        return Err(FormErrors::single("username", USERNAME_TAKEN).into());
    }
    let password_hash = hash_password(&input.password1, config.bcrypt_cost)?;
    let user = User::insert(&mut tx, &input, &password_hash).await?;
    tx.commit().await?;

    log::info!("registered user {} ({})", user.id, user.username);
    Ok(redirect(LOGIN_PATH, Notice::success(Message::UserRegistered)))
}

#[get("/update", name = "user_update")]
pub async fn update_page(
    pool: web::Data<DbPool>,
    path: web::Path<i64>,
    actor: AuthenticatedUserId,
    locale: Locale,
    pending: PendingNotice,
) -> Result<HttpResponse, AppError> {
    let user = load(&pool, path.into_inner()).await?;
    if let Err(denied) = must_be_self(actor, &user) {
        log::warn!("user {} may not edit user {}", actor.0, user.id);
        return Ok(denied.into_response());
    }

    let values = json!({
        "username": user.username,
        "first_name": user.first_name,
        "last_name": user.last_name,
    });
    Ok(render_page(
        locale,
        pending,
        json!({
            "user": summary(&user),
            "form": form_schema(UserInput::FIELDS, values, json!({})),
        }),
    ))
}

/// Saves the actor's own profile. Blank password fields keep the current password.
#[post("/update")]
pub async fn update(
    pool: web::Data<DbPool>,
    config: web::Data<Config>,
    path: web::Path<i64>,
    actor: AuthenticatedUserId,
    body: FormBody,
) -> Result<HttpResponse, AppError> {
    let user = load(&pool, path.into_inner()).await?;
    if let Err(denied) = must_be_self(actor, &user) {
        log::warn!("user {} may not edit user {}", actor.0, user.id);
        return Ok(denied.into_response());
    }

    let input = UserInput::bind(&form_data(body));
    input.clean(false)?;

    let mut tx = pool.begin().await?;
    if User::username_taken(&mut tx, &input.username, Some(user.id)).await? {
        return Err(FormErrors::single("username", USERNAME_TAKEN).into());
    }
    let password_hash = match input.password() {
        Some(password) => Some(hash_password(password, config.bcrypt_cost)?),
        None => None,
    };
    User::update(&mut tx, user.id, &input, password_hash.as_deref()).await?;
    tx.commit().await?;

    log::info!("user {} updated their profile", user.id);
    Ok(redirect(USERS_PATH, Notice::success(Message::UserUpdated)))
}

#[get("/delete", name = "user_delete")]
pub async fn delete_page(
    pool: web::Data<DbPool>,
    path: web::Path<i64>,
    actor: AuthenticatedUserId,
    locale: Locale,
    pending: PendingNotice,
) -> Result<HttpResponse, AppError> {
    let user = load(&pool, path.into_inner()).await?;
    if let Err(denied) = must_be_self(actor, &user) {
        log::warn!("user {} may not delete user {}", actor.0, user.id);
        return Ok(denied.into_response());
    }
    Ok(render_page(locale, pending, json!({ "user": summary(&user) })))
}

/// Deletes the actor's own account unless a task still refers to it,
/// then ends the session.
#[post("/delete")]
pub async fn delete(
    pool: web::Data<DbPool>,
    path: web::Path<i64>,
    actor: AuthenticatedUserId,
) -> Result<HttpResponse, AppError> {
    let user = load(&pool, path.into_inner()).await?;
    if let Err(denied) = must_be_self(actor, &user) {
        log::warn!("user {} may not delete user {}", actor.0, user.id);
        return Ok(denied.into_response());
    }

    let mut tx = pool.begin().await?;
    if User::is_in_use(&mut tx, user.id).await? {
        log::warn!("user {} is still referenced by tasks", user.id);
        return Ok(redirect(USERS_PATH, Notice::error(Message::UserInUse)));
    }
    User::delete(&mut tx, user.id).await?;
    tx.commit().await?;

    log::info!("user {} deleted their account", user.id);
    with_cookie(
        redirect(USERS_PATH, Notice::success(Message::UserDeleted)),
        removal_cookie(SESSION_COOKIE),
    )
}
