use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, SqliteConnection};

/// A named workflow state every task is in.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Status {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl Status {
    pub async fn all(conn: &mut SqliteConnection) -> Result<Vec<Status>, sqlx::Error> {
        sqlx::query_as::<_, Status>("SELECT id, name, created_at FROM statuses ORDER BY id")
            .fetch_all(&mut *conn)
            .await
    }

    pub async fn find(conn: &mut SqliteConnection, id: i64) -> Result<Option<Status>, sqlx::Error> {
        sqlx::query_as::<_, Status>("SELECT id, name, created_at FROM statuses WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
    }

    /// Whether another status already uses `name`.
    pub async fn name_taken(
        conn: &mut SqliteConnection,
        name: &str,
        except_id: Option<i64>,
    ) -> Result<bool, sqlx::Error> {
        let (taken,): (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM statuses WHERE name = ? AND id IS NOT ?)",
        )
        .bind(name)
        .bind(except_id)
        .fetch_one(&mut *conn)
        .await?;
        Ok(taken)
    }

    pub async fn insert(conn: &mut SqliteConnection, name: &str) -> Result<Status, sqlx::Error> {
        sqlx::query_as::<_, Status>(
            "INSERT INTO statuses (name, created_at) VALUES (?, ?) RETURNING id, name, created_at",
        )
        .bind(name)
        .bind(Utc::now())
        .fetch_one(&mut *conn)
        .await
    }

    pub async fn rename(conn: &mut SqliteConnection, id: i64, name: &str) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE statuses SET name = ? WHERE id = ?")
            .bind(name)
            .bind(id)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    /// Whether any task is in this status.
    pub async fn is_in_use(conn: &mut SqliteConnection, id: i64) -> Result<bool, sqlx::Error> {
        let (used,): (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM tasks WHERE status_id = ?)")
                .bind(id)
                .fetch_one(&mut *conn)
                .await?;
        Ok(used)
    }

    pub async fn delete(conn: &mut SqliteConnection, id: i64) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM statuses WHERE id = ?")
            .bind(id)
            .execute(&mut *conn)
            .await?;
        Ok(result.rows_affected())
    }
}
