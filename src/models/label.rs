use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, SqliteConnection};

/// A tag that can be attached to any number of tasks.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Label {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl Label {
    pub async fn all(conn: &mut SqliteConnection) -> Result<Vec<Label>, sqlx::Error> {
        sqlx::query_as::<_, Label>("SELECT id, name, created_at FROM labels ORDER BY id")
            .fetch_all(&mut *conn)
            .await
    }

    pub async fn find(conn: &mut SqliteConnection, id: i64) -> Result<Option<Label>, sqlx::Error> {
        sqlx::query_as::<_, Label>("SELECT id, name, created_at FROM labels WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
    }

    /// Labels attached to `task_id`, by label id.
    pub async fn for_task(
        conn: &mut SqliteConnection,
        task_id: i64,
    ) -> Result<Vec<Label>, sqlx::Error> {
        sqlx::query_as::<_, Label>(
            "SELECT l.id, l.name, l.created_at FROM labels l \
             JOIN task_labels tl ON tl.label_id = l.id \
             WHERE tl.task_id = ? ORDER BY l.id",
        )
        .bind(task_id)
        .fetch_all(&mut *conn)
        .await
    }

    pub async fn name_taken(
        conn: &mut SqliteConnection,
        name: &str,
        except_id: Option<i64>,
    ) -> Result<bool, sqlx::Error> {
        let (taken,): (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM labels WHERE name = ? AND id IS NOT ?)")
                .bind(name)
                .bind(except_id)
                .fetch_one(&mut *conn)
                .await?;
        Ok(taken)
    }

    pub async fn insert(conn: &mut SqliteConnection, name: &str) -> Result<Label, sqlx::Error> {
        sqlx::query_as::<_, Label>(
            "INSERT INTO labels (name, created_at) VALUES (?, ?) RETURNING id, name, created_at",
        )
        .bind(name)
        .bind(Utc::now())
        .fetch_one(&mut *conn)
        .await
    }

    pub async fn rename(conn: &mut SqliteConnection, id: i64, name: &str) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE labels SET name = ? WHERE id = ?")
            .bind(name)
            .bind(id)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    /// Whether any task carries this label.
    pub async fn is_in_use(conn: &mut SqliteConnection, id: i64) -> Result<bool, sqlx::Error> {
        let (used,): (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM task_labels WHERE label_id = ?)")
                .bind(id)
                .fetch_one(&mut *conn)
                .await?;
        Ok(used)
    }

    pub async fn delete(conn: &mut SqliteConnection, id: i64) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM labels WHERE id = ?")
            .bind(id)
            .execute(&mut *conn)
            .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    #[actix_rt::test]
    async fn test_label_lifecycle() {
        let pool = db::connect_in_memory().await.unwrap();
        let mut conn = pool.acquire().await.unwrap();

        let bug = Label::insert(&mut conn, "bug").await.unwrap();
        let feature = Label::insert(&mut conn, "feature").await.unwrap();
        assert_eq!(Label::all(&mut conn).await.unwrap(), vec![bug.clone(), feature.clone()]);
        assert!(Label::name_taken(&mut conn, "bug", Some(feature.id)).await.unwrap());

        Label::rename(&mut conn, bug.id, "defect").await.unwrap();
        assert_eq!(
            Label::find(&mut conn, bug.id).await.unwrap().unwrap().name,
            "defect"
        );

        assert!(!Label::is_in_use(&mut conn, feature.id).await.unwrap());
        assert_eq!(Label::delete(&mut conn, feature.id).await.unwrap(), 1);
        assert_eq!(Label::delete(&mut conn, feature.id).await.unwrap(), 0);
    }
}
