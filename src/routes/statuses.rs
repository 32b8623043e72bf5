use actix_web::{get, post, web, HttpResponse};
use serde_json::json;

use super::{form_data, form_schema, FormBody, STATUSES_PATH};
use crate::{
    auth::AuthenticatedUserId,
    db::DbPool,
    error::AppError,
    forms::FormErrors,
    i18n::Locale,
    models::{NameInput, Status},
    notice::{redirect, render_page, Message, Notice, PendingNotice},
};

const NAME_TAKEN: &str = "Status with this name already exists.";

fn not_found(id: i64) -> AppError {
    AppError::NotFound(format!("Status {} not found", id))
}

#[get("", name = "statuses_list")]
pub async fn list(
    pool: web::Data<DbPool>,
    locale: Locale,
    pending: PendingNotice,
) -> Result<HttpResponse, AppError> {
    let mut conn = pool.acquire().await?;
    let statuses = Status::all(&mut conn).await?;
    Ok(render_page(locale, pending, json!({ "statuses": statuses })))
}

#[get("/create", name = "status_create")]
pub async fn create_page(locale: Locale, pending: PendingNotice) -> HttpResponse {
    render_page(
        locale,
        pending,
        json!({ "form": form_schema(NameInput::FIELDS, json!({}), json!({})) }),
    )
}

#[post("/create")]
pub async fn create(
    pool: web::Data<DbPool>,
    actor: AuthenticatedUserId,
    body: FormBody,
) -> Result<HttpResponse, AppError> {
    let input = NameInput::bind(&form_data(body));
    input.clean()?;

    let mut tx = pool.begin().await?;
    if Status::name_taken(&mut tx, &input.name, None).await? {
        return Err(FormErrors::single("name", NAME_TAKEN).into());
    }
    let status = Status::insert(&mut tx, &input.name).await?;
    tx.commit().await?;

    log::info!("user {} created status {}", actor.0, status.id);
    Ok(redirect(STATUSES_PATH, Notice::success(Message::StatusCreated)))
}

#[get("/{id}/update", name = "status_update")]
pub async fn update_page(
    pool: web::Data<DbPool>,
    path: web::Path<i64>,
    locale: Locale,
    pending: PendingNotice,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let mut conn = pool.acquire().await?;
    let status = Status::find(&mut conn, id).await?.ok_or_else(|| not_found(id))?;

    Ok(render_page(
        locale,
        pending,
        json!({
            "status": &status,
            "form": form_schema(NameInput::FIELDS, json!({ "name": status.name }), json!({})),
        }),
    ))
}

#[post("/{id}/update")]
pub async fn update(
    pool: web::Data<DbPool>,
    path: web::Path<i64>,
    actor: AuthenticatedUserId,
    body: FormBody,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let mut tx = pool.begin().await?;
    Status::find(&mut tx, id).await?.ok_or_else(|| not_found(id))?;

    let input = NameInput::bind(&form_data(body));
    input.clean()?;
    if Status::name_taken(&mut tx, &input.name, Some(id)).await? {
        return Err(FormErrors::single("name", NAME_TAKEN).into());
    }
    Status::rename(&mut tx, id, &input.name).await?;
    tx.commit().await?;

    log::info!("user {} renamed status {}", actor.0, id);
    Ok(redirect(STATUSES_PATH, Notice::success(Message::StatusUpdated)))
}

#[get("/{id}/delete", name = "status_delete")]
pub async fn delete_page(
    pool: web::Data<DbPool>,
    path: web::Path<i64>,
    locale: Locale,
    pending: PendingNotice,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let mut conn = pool.acquire().await?;
    let status = Status::find(&mut conn, id).await?.ok_or_else(|| not_found(id))?;
    Ok(render_page(locale, pending, json!({ "status": status })))
}

/// Deletes a status no task refers to.
#[post("/{id}/delete")]
pub async fn delete(
    pool: web::Data<DbPool>,
    path: web::Path<i64>,
    actor: AuthenticatedUserId,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let mut tx = pool.begin().await?;
    Status::find(&mut tx, id).await?.ok_or_else(|| not_found(id))?;

    if Status::is_in_use(&mut tx, id).await? {
        log::warn!("user {} tried to delete status {} which is in use", actor.0, id);
        return Ok(redirect(STATUSES_PATH, Notice::error(Message::StatusInUse)));
    }
    Status::delete(&mut tx, id).await?;
    tx.commit().await?;

    log::info!("user {} deleted status {}", actor.0, id);
    Ok(redirect(STATUSES_PATH, Notice::success(Message::StatusDeleted)))
}
