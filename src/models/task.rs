use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, SqliteConnection};
use validator::Validate;

use super::{Label, Status, User};
use crate::forms::{parse_id, FieldKind, FieldSpec, FormData, FormErrors, INVALID_CHOICE, REQUIRED};

/// A task as stored.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Task {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub status_id: i64,
    /// The user who created the task. Set once, at creation.
    pub creator_id: i64,
    pub executor_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// A task joined with the names of its status, creator and executor.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct TaskRow {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub status_id: i64,
    pub status_name: String,
    pub creator_id: i64,
    pub creator_username: String,
    pub executor_id: Option<i64>,
    pub executor_username: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Everything shown on the task detail page.
#[derive(Debug, Serialize)]
pub struct TaskDetail {
    #[serde(flatten)]
    pub task: TaskRow,
    pub labels: Vec<Label>,
}

/// Submitted task form. The creator is never part of it.
#[derive(Debug, Clone, Validate)]
pub struct TaskInput {
    #[validate(length(min = 1, max = 150))]
    pub name: String,
    #[validate(length(max = 10000))]
    pub description: String,
    pub status: String,
    pub executor: String,
    pub labels: Vec<String>,
}

/// A task form whose choices all resolved to existing records.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskChanges {
    pub name: String,
    pub description: String,
    pub status_id: i64,
    pub executor_id: Option<i64>,
    pub label_ids: Vec<i64>,
}

impl TaskInput {
    pub const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::new("name", FieldKind::Text, true),
        FieldSpec::new("description", FieldKind::TextArea, false),
        FieldSpec::new("status", FieldKind::Select, true),
        FieldSpec::new("executor", FieldKind::Select, false),
        FieldSpec::new("labels", FieldKind::MultiSelect, false),
    ];

    pub fn bind(form: &FormData) -> Self {
        Self {
            name: form.text("name"),
            description: form.text("description"),
            status: form.text("status"),
            executor: form.text("executor"),
            labels: form.all("labels"),
        }
    }

    /// Validates the fields and resolves every choice against the store.
    pub async fn clean(&self, conn: &mut SqliteConnection) -> Result<TaskChanges, CleanError> {
        let mut errors = FormErrors::from_result(self.validate());

        let mut status_id = None;
        if self.status.is_empty() {
            errors.add("status", REQUIRED);
        } else {
            if let Some(id) = parse_id(&self.status) {
                if Status::find(conn, id).await?.is_some() {
                    status_id = Some(id);
                }
            }
            if status_id.is_none() {
                errors.add("status", INVALID_CHOICE);
            }
        }

        let mut executor_id = None;
        if !self.executor.is_empty() {
            if let Some(id) = parse_id(&self.executor) {
                if User::exists(conn, id).await? {
                    executor_id = Some(id);
                }
            }
            if executor_id.is_none() {
                errors.add("executor", INVALID_CHOICE);
            }
        }

        let mut label_ids = Vec::new();
        for raw in &self.labels {
            let known = match parse_id(raw) {
                Some(id) => Label::find(conn, id).await?.map(|label| label.id),
                None => None,
            };
            match known {
                Some(id) if label_ids.contains(&id) => {}
                Some(id) => label_ids.push(id),
                None => {
                    errors.add("labels", INVALID_CHOICE);
                    break;
                }
            }
        }

        match (errors.into_result(), status_id) {
            (Ok(()), Some(status_id)) => Ok(TaskChanges {
                name: self.name.clone(),
                description: self.description.clone(),
                status_id,
                executor_id,
                label_ids,
            }),
            (Err(errors), _) => Err(CleanError::Invalid(errors)),
            (Ok(()), None) => Err(CleanError::Invalid(FormErrors::single("status", REQUIRED))),
        }
    }
}

/// Why a task form could not be cleaned.
#[derive(Debug)]
pub enum CleanError {
    Invalid(FormErrors),
    Database(sqlx::Error),
}

impl From<sqlx::Error> for CleanError {
    fn from(error: sqlx::Error) -> Self {
        CleanError::Database(error)
    }
}

impl From<CleanError> for crate::error::AppError {
    fn from(error: CleanError) -> Self {
        match error {
            CleanError::Invalid(errors) => errors.into(),
            CleanError::Database(error) => error.into(),
        }
    }
}

/// Raw task-list query parameters.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TaskFilter {
    pub status: Option<String>,
    pub executor: Option<String>,
    pub label: Option<String>,
    pub own_tasks: Option<String>,
}

/// A parsed task filter. Every `Some` narrows the result; all must hold.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskCriteria {
    pub status_id: Option<i64>,
    pub executor_id: Option<i64>,
    pub label_id: Option<i64>,
    pub creator_id: Option<i64>,
}

impl TaskFilter {
    /// Reads the filter from query pairs. A repeated key keeps its last value.
    pub fn bind(query: &FormData) -> Self {
        Self {
            status: query.last("status"),
            executor: query.last("executor"),
            label: query.last("label"),
            own_tasks: query.last("own_tasks"),
        }
    }

    /// Parses the parameters for `actor`. Empty values are ignored.
    pub fn parse(&self, actor: i64) -> Result<TaskCriteria, FormErrors> {
        let mut errors = FormErrors::default();
        let mut id_of = |field: &str, raw: &Option<String>| -> Option<i64> {
            let raw = raw.as_deref().map(str::trim).filter(|raw| !raw.is_empty())?;
            let id = parse_id(raw);
            if id.is_none() {
                errors.add(field, INVALID_CHOICE);
            }
            id
        };

        let criteria = TaskCriteria {
            status_id: id_of("status", &self.status),
            executor_id: id_of("executor", &self.executor),
            label_id: id_of("label", &self.label),
            creator_id: if self.own_tasks_only() { Some(actor) } else { None },
        };

        errors.into_result().map(|()| criteria)
    }

    pub fn own_tasks_only(&self) -> bool {
        matches!(
            self.own_tasks
                .as_deref()
                .map(|value| value.trim().to_ascii_lowercase())
                .as_deref(),
            Some("on" | "true" | "1")
        )
    }
}

impl TaskCriteria {
    /// Reports every id that does not name an existing record.
    pub async fn unknown_choices(
        &self,
        conn: &mut SqliteConnection,
    ) -> Result<FormErrors, sqlx::Error> {
        let mut errors = FormErrors::default();
        if let Some(id) = self.status_id {
            if Status::find(conn, id).await?.is_none() {
                errors.add("status", INVALID_CHOICE);
            }
        }
        if let Some(id) = self.executor_id {
            if !User::exists(conn, id).await? {
                errors.add("executor", INVALID_CHOICE);
            }
        }
        if let Some(id) = self.label_id {
            if Label::find(conn, id).await?.is_none() {
                errors.add("label", INVALID_CHOICE);
            }
        }
        Ok(errors)
    }
}

const TASK_COLUMNS: &str =
    "id, name, description, status_id, creator_id, executor_id, created_at";

const TASK_ROW_SELECT: &str = "SELECT t.id, t.name, t.description, \
     t.status_id, s.name AS status_name, \
     t.creator_id, c.username AS creator_username, \
     t.executor_id, e.username AS executor_username, \
     t.created_at \
     FROM tasks t \
     JOIN statuses s ON s.id = t.status_id \
     JOIN users c ON c.id = t.creator_id \
     LEFT JOIN users e ON e.id = t.executor_id";

impl Task {
    pub async fn find(conn: &mut SqliteConnection, id: i64) -> Result<Option<Task>, sqlx::Error> {
        sqlx::query_as::<_, Task>(&format!("SELECT {} FROM tasks WHERE id = ?", TASK_COLUMNS))
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
    }

    /// Tasks matching every constraint in `criteria`, by ascending id.
    pub async fn filter(
        conn: &mut SqliteConnection,
        criteria: &TaskCriteria,
    ) -> Result<Vec<TaskRow>, sqlx::Error> {
        let mut sql = String::from(TASK_ROW_SELECT);
        let mut conditions: Vec<&str> = Vec::new();
        let mut params: Vec<i64> = Vec::new();

        if let Some(status_id) = criteria.status_id {
            conditions.push("t.status_id = ?");
            params.push(status_id);
        }
        if let Some(executor_id) = criteria.executor_id {
            conditions.push("t.executor_id = ?");
            params.push(executor_id);
        }
        if let Some(label_id) = criteria.label_id {
            conditions.push(
                "EXISTS (SELECT 1 FROM task_labels tl WHERE tl.task_id = t.id AND tl.label_id = ?)",
            );
            params.push(label_id);
        }
        if let Some(creator_id) = criteria.creator_id {
            conditions.push("t.creator_id = ?");
            params.push(creator_id);
        }

        if !conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }
        sql.push_str(" ORDER BY t.id");

        let mut query = sqlx::query_as::<_, TaskRow>(&sql);
        for param in params {
            query = query.bind(param);
        }
        query.fetch_all(&mut *conn).await
    }

    pub async fn detail(
        conn: &mut SqliteConnection,
        id: i64,
    ) -> Result<Option<TaskDetail>, sqlx::Error> {
        let row = sqlx::query_as::<_, TaskRow>(&format!("{} WHERE t.id = ?", TASK_ROW_SELECT))
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;
        match row {
            Some(task) => {
                let labels = Label::for_task(conn, id).await?;
                Ok(Some(TaskDetail { task, labels }))
            }
            None => Ok(None),
        }
    }

    pub async fn name_taken(
        conn: &mut SqliteConnection,
        name: &str,
        except_id: Option<i64>,
    ) -> Result<bool, sqlx::Error> {
        let (taken,): (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM tasks WHERE name = ? AND id IS NOT ?)")
                .bind(name)
                .bind(except_id)
                .fetch_one(&mut *conn)
                .await?;
        Ok(taken)
    }

    /// Inserts a task created by `creator_id`, with its labels.
    pub async fn insert(
        conn: &mut SqliteConnection,
        changes: &TaskChanges,
        creator_id: i64,
    ) -> Result<Task, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(&format!(
            "INSERT INTO tasks (name, description, status_id, creator_id, executor_id, created_at) \
             VALUES (?, ?, ?, ?, ?, ?) RETURNING {}",
            TASK_COLUMNS
        ))
        .bind(&changes.name)
        .bind(&changes.description)
        .bind(changes.status_id)
        .bind(creator_id)
        .bind(changes.executor_id)
        .bind(Utc::now())
        .fetch_one(&mut *conn)
        .await?;

        Task::set_labels(conn, task.id, &changes.label_ids).await?;
        Ok(task)
    }

    /// Applies `changes`. The creator column is left alone.
    pub async fn update(
        conn: &mut SqliteConnection,
        id: i64,
        changes: &TaskChanges,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE tasks SET name = ?, description = ?, status_id = ?, executor_id = ? WHERE id = ?",
        )
        .bind(&changes.name)
        .bind(&changes.description)
        .bind(changes.status_id)
        .bind(changes.executor_id)
        .bind(id)
        .execute(&mut *conn)
        .await?;

        Task::set_labels(conn, id, &changes.label_ids).await
    }

    /// Replaces the task's label set.
    pub async fn set_labels(
        conn: &mut SqliteConnection,
        task_id: i64,
        label_ids: &[i64],
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM task_labels WHERE task_id = ?")
            .bind(task_id)
            .execute(&mut *conn)
            .await?;
        for label_id in label_ids {
            sqlx::query("INSERT INTO task_labels (task_id, label_id) VALUES (?, ?)")
                .bind(task_id)
                .bind(*label_id)
                .execute(&mut *conn)
                .await?;
        }
        Ok(())
    }

    pub async fn label_ids(
        conn: &mut SqliteConnection,
        task_id: i64,
    ) -> Result<Vec<i64>, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT label_id FROM task_labels WHERE task_id = ? ORDER BY label_id",
        )
        .bind(task_id)
        .fetch_all(&mut *conn)
        .await
    }

    pub async fn delete(conn: &mut SqliteConnection, id: i64) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = ?")
            .bind(id)
            .execute(&mut *conn)
            .await?;
        Ok(result.rows_affected())
    }
}
