use actix_web::{get, post, web, HttpResponse};
use serde_json::{json, Value};
use sqlx::SqliteConnection;

use super::{choice, form_data, form_schema, FormBody, TASKS_PATH};
use crate::{
    auth::{permissions::must_be_creator, AuthenticatedUserId},
    db::DbPool,
    error::AppError,
    forms::FormErrors,
    i18n::Locale,
    models::{Label, Status, Task, TaskFilter, TaskInput, User},
    notice::{redirect, render_page, Message, Notice, PendingNotice},
};

const NAME_TAKEN: &str = "Task with this name already exists.";

fn not_found(id: i64) -> AppError {
    AppError::NotFound(format!("Task {} not found", id))
}

async fn load(pool: &DbPool, id: i64) -> Result<Task, AppError> {
    let mut conn = pool.acquire().await?;
    Task::find(&mut conn, id).await?.ok_or_else(|| not_found(id))
}

/// Choices offered by the task form and the filter.
async fn choices(conn: &mut SqliteConnection) -> Result<Value, sqlx::Error> {
    let statuses: Vec<Value> = Status::all(conn)
        .await?
        .into_iter()
        .map(|status| choice(status.id, status.name))
        .collect();
    let executors: Vec<Value> = User::all(conn)
        .await?
        .iter()
        .map(|user| {
            let full_name = user.full_name();
            let label = if full_name.is_empty() {
                user.username.clone()
            } else {
                full_name
            };
            choice(user.id, label)
        })
        .collect();
    let labels: Vec<Value> = Label::all(conn)
        .await?
        .into_iter()
        .map(|label| choice(label.id, label.name))
        .collect();

    Ok(json!({
        "status": statuses,
        "executor": executors,
        "labels": labels,
    }))
}

/// Lists tasks narrowed by the filter in the query string.
///
/// ## Query Parameters:
/// - `status` (optional): id of the status the task is in.
/// - `executor` (optional): id of the user the task is assigned to.
/// - `label` (optional): id of a label the task carries.
/// - `own_tasks` (optional): `on`/`true`/`1` keeps only tasks the actor created.
///
/// Every given parameter must hold; a repeated parameter counts once, with
/// its last value. A value that names no existing record
/// makes the whole filter invalid: the page then lists no tasks and reports
/// the offending fields under `errors`.
#[get("", name = "tasks_list")]
pub async fn list(
    pool: web::Data<DbPool>,
    query: web::Query<Vec<(String, String)>>,
    actor: AuthenticatedUserId,
    locale: Locale,
    pending: PendingNotice,
) -> Result<HttpResponse, AppError> {
    let filter = TaskFilter::bind(&query.into_inner().into());
    let mut conn = pool.acquire().await?;

    let (tasks, errors) = match filter.parse(actor.0) {
        Ok(criteria) => {
            let errors = criteria.unknown_choices(&mut conn).await?;
            if errors.is_empty() {
                (Task::filter(&mut conn, &criteria).await?, errors)
            } else {
                (Vec::new(), errors)
            }
        }
        Err(errors) => (Vec::new(), errors),
    };
    if !errors.is_empty() {
        log::debug!("invalid task filter: {}", errors);
    }

    let choices = choices(&mut conn).await?;
    Ok(render_page(
        locale,
        pending,
        json!({
            "tasks": tasks,
            "filter": {
                "status": filter.status,
                "executor": filter.executor,
                "label": filter.label,
                "own_tasks": filter.own_tasks_only(),
            },
            "errors": errors,
            "choices": choices,
        }),
    ))
}

#[get("/create", name = "task_create")]
pub async fn create_page(
    pool: web::Data<DbPool>,
    locale: Locale,
    pending: PendingNotice,
) -> Result<HttpResponse, AppError> {
    let mut conn = pool.acquire().await?;
    let choices = choices(&mut conn).await?;
    Ok(render_page(
        locale,
        pending,
        json!({ "form": form_schema(TaskInput::FIELDS, json!({}), choices) }),
    ))
}

/// Creates a task. The creator is always the actor; a submitted `creator`
/// field is ignored.
#[post("/create")]
pub async fn create(
    pool: web::Data<DbPool>,
    actor: AuthenticatedUserId,
    body: FormBody,
) -> Result<HttpResponse, AppError> {
    let input = TaskInput::bind(&form_data(body));

    let mut tx = pool.begin().await?;
    let changes = input.clean(&mut tx).await?;
    if Task::name_taken(&mut tx, &changes.name, None).await? {
        return Err(FormErrors::single("name", NAME_TAKEN).into());
    }
    let task = Task::insert(&mut tx, &changes, actor.0).await?;
    tx.commit().await?;

    log::info!("user {} created task {}", actor.0, task.id);
    Ok(redirect(TASKS_PATH, Notice::success(Message::TaskCreated)))
}

#[get("/{id}", name = "task_detail")]
pub async fn detail(
    pool: web::Data<DbPool>,
    path: web::Path<i64>,
    locale: Locale,
    pending: PendingNotice,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let mut conn = pool.acquire().await?;
    let task = Task::detail(&mut conn, id).await?.ok_or_else(|| not_found(id))?;
    Ok(render_page(locale, pending, json!({ "task": task })))
}

#[get("/{id}/update", name = "task_update")]
pub async fn update_page(
    pool: web::Data<DbPool>,
    path: web::Path<i64>,
    locale: Locale,
    pending: PendingNotice,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let mut conn = pool.acquire().await?;
    let task = Task::find(&mut conn, id).await?.ok_or_else(|| not_found(id))?;
    let label_ids = Task::label_ids(&mut conn, id).await?;
    let choices = choices(&mut conn).await?;

    let values = json!({
        "name": task.name,
        "description": task.description,
        "status": task.status_id,
        "executor": task.executor_id,
        "labels": label_ids,
    });
    Ok(render_page(
        locale,
        pending,
        json!({
            "task": task,
            "form": form_schema(TaskInput::FIELDS, values, choices),
        }),
    ))
}

/// Updates a task. Any logged-in user may do this; the creator is kept.
#[post("/{id}/update")]
pub async fn update(
    pool: web::Data<DbPool>,
    path: web::Path<i64>,
    actor: AuthenticatedUserId,
    body: FormBody,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let input = TaskInput::bind(&form_data(body));

    let mut tx = pool.begin().await?;
    Task::find(&mut tx, id).await?.ok_or_else(|| not_found(id))?;
    let changes = input.clean(&mut tx).await?;
    if Task::name_taken(&mut tx, &changes.name, Some(id)).await? {
        return Err(FormErrors::single("name", NAME_TAKEN).into());
    }
    Task::update(&mut tx, id, &changes).await?;
    tx.commit().await?;

    log::info!("user {} updated task {}", actor.0, id);
    Ok(redirect(TASKS_PATH, Notice::success(Message::TaskUpdated)))
}

#[get("/{id}/delete", name = "task_delete")]
pub async fn delete_page(
    pool: web::Data<DbPool>,
    path: web::Path<i64>,
    actor: AuthenticatedUserId,
    locale: Locale,
    pending: PendingNotice,
) -> Result<HttpResponse, AppError> {
    let task = load(&pool, path.into_inner()).await?;
    if let Err(denied) = must_be_creator(actor, &task) {
        log::warn!("user {} may not delete task {}", actor.0, task.id);
        return Ok(denied.into_response());
    }
    Ok(render_page(locale, pending, json!({ "task": task })))
}

/// Deletes a task. Only its creator may do this.
#[post("/{id}/delete")]
pub async fn delete(
    pool: web::Data<DbPool>,
    path: web::Path<i64>,
    actor: AuthenticatedUserId,
) -> Result<HttpResponse, AppError> {
    let task = load(&pool, path.into_inner()).await?;
    if let Err(denied) = must_be_creator(actor, &task) {
        log::warn!("user {} may not delete task {}", actor.0, task.id);
        return Ok(denied.into_response());
    }

    let mut conn = pool.acquire().await?;
    Task::delete(&mut conn, task.id).await?;

    log::info!("user {} deleted task {}", actor.0, task.id);
    Ok(redirect(TASKS_PATH, Notice::success(Message::TaskDeleted)))
}
