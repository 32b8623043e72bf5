use actix_web::{get, post, web, HttpResponse};
use serde_json::json;

use super::{form_data, form_schema, FormBody, LABELS_PATH};
use crate::{
    auth::AuthenticatedUserId,
    db::DbPool,
    error::AppError,
    forms::FormErrors,
    i18n::Locale,
    models::{Label, NameInput},
    notice::{redirect, render_page, Message, Notice, PendingNotice},
};

const NAME_TAKEN: &str = "Label with this name already exists.";

fn not_found(id: i64) -> AppError {
    AppError::NotFound(format!("Label {} not found", id))
}

#[get("", name = "labels_list")]
pub async fn list(
    pool: web::Data<DbPool>,
    locale: Locale,
    pending: PendingNotice,
) -> Result<HttpResponse, AppError> {
    let mut conn = pool.acquire().await?;
    let labels = Label::all(&mut conn).await?;
    Ok(render_page(locale, pending, json!({ "labels": labels })))
}

#[get("/create", name = "label_create")]
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
    if Label::name_taken(&mut tx, &input.name, None).await? {
        return Err(FormErrors::single("name", NAME_TAKEN).into());
    }
    let label = Label::insert(&mut tx, &input.name).await?;
    tx.commit().await?;

    log::info!("user {} created label {}", actor.0, label.id);
    Ok(redirect(LABELS_PATH, Notice::success(Message::LabelCreated)))
}

#[get("/{id}/update", name = "label_update")]
pub async fn update_page(
    pool: web::Data<DbPool>,
    path: web::Path<i64>,
    locale: Locale,
    pending: PendingNotice,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let mut conn = pool.acquire().await?;
    let label = Label::find(&mut conn, id).await?.ok_or_else(|| not_found(id))?;

    Ok(render_page(
        locale,
        pending,
        json!({
            "label": &label,
            "form": form_schema(NameInput::FIELDS, json!({ "name": label.name }), json!({})),
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
    Label::find(&mut tx, id).await?.ok_or_else(|| not_found(id))?;

    let input = NameInput::bind(&form_data(body));
    input.clean()?;
    if Label::name_taken(&mut tx, &input.name, Some(id)).await? {
        return Err(FormErrors::single("name", NAME_TAKEN).into());
    }
    Label::rename(&mut tx, id, &input.name).await?;
    tx.commit().await?;

    log::info!("user {} renamed label {}", actor.0, id);
    Ok(redirect(LABELS_PATH, Notice::success(Message::LabelUpdated)))
}

#[get("/{id}/delete", name = "label_delete")]
pub async fn delete_page(
    pool: web::Data<DbPool>,
    path: web::Path<i64>,
    locale: Locale,
    pending: PendingNotice,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let mut conn = pool.acquire().await?;
    let label = Label::find(&mut conn, id).await?.ok_or_else(|| not_found(id))?;
    Ok(render_page(locale, pending, json!({ "label": label })))
}

/// Deletes a label that is attached to no task.
#[post("/{id}/delete")]
pub async fn delete(
    pool: web::Data<DbPool>,
    path: web::Path<i64>,
    actor: AuthenticatedUserId,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let mut tx = pool.begin().await?;
    Label::find(&mut tx, id).await?.ok_or_else(|| not_found(id))?;

    if Label::is_in_use(&mut tx, id).await? {
        log::warn!("user {} tried to delete label {} which is in use", actor.0, id);
        return Ok(redirect(LABELS_PATH, Notice::error(Message::LabelInUse)));
    }
    Label::delete(&mut tx, id).await?;
    tx.commit().await?;

    log::info!("user {} deleted label {}", actor.0, id);
    Ok(redirect(LABELS_PATH, Notice::success(Message::LabelDeleted)))
}
