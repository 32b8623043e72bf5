use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use sqlx::{FromRow, SqliteConnection};
use validator::Validate;

use crate::forms::{FieldKind, FieldSpec, FormData, FormErrors, REQUIRED};

pub const MIN_PASSWORD_LENGTH: usize = 3;

lazy_static! {
    // Letters, digits and @/./+/-/_ only. Emptiness is reported by the length rule.
    static ref USERNAME_REGEX: Regex = Regex::new(r"^[\w.@+-]*$").unwrap();
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Registration and profile form. Update reuses it; see `UserInput::clean`.
#[derive(Debug, Clone, Validate)]
pub struct UserInput {
    #[validate(
        length(min = 1, max = 150),
        regex(
            path = "USERNAME_REGEX",
            message = "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters."
        )
    )]
    pub username: String,
    #[validate(length(max = 150))]
    pub first_name: String,
    #[validate(length(max = 150))]
    pub last_name: String,
    pub password1: String,
    pub password2: String,
}

impl UserInput {
    pub const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::new("first_name", FieldKind::Text, false),
        FieldSpec::new("last_name", FieldKind::Text, false),
        FieldSpec::new("username", FieldKind::Text, true),
        FieldSpec::new("password1", FieldKind::Password, true),
        FieldSpec::new("password2", FieldKind::Password, true),
    ];

    /// Binds the submitted fields. Passwords are taken verbatim.
    pub fn bind(form: &FormData) -> Self {
        Self {
            username: form.text("username"),
            first_name: form.text("first_name"),
            last_name: form.text("last_name"),
            password1: form.raw("password1"),
            password2: form.raw("password2"),
        }
    }

    /// Checks field rules and the password pair.
    ///
    /// With `require_password` unset (profile update) both password fields may
    /// be left blank to keep the current password; once either is filled in
    /// the pair is checked as on registration.
    pub fn clean(&self, require_password: bool) -> Result<(), FormErrors> {
        let mut errors = FormErrors::from_result(self.validate());

        let supplied = !self.password1.is_empty() || !self.password2.is_empty();
        if require_password || supplied {
            if self.password1.is_empty() {
                errors.add("password1", REQUIRED);
            } else if self.password1.chars().count() < MIN_PASSWORD_LENGTH {
                errors.add(
                    "password1",
                    format!(
                        "This password is too short. It must contain at least {} characters.",
                        MIN_PASSWORD_LENGTH
                    ),
                );
            }
            if self.password2.is_empty() {
                errors.add("password2", REQUIRED);
            } else if !self.password1.is_empty() && self.password1 != self.password2 {
                errors.add("password2", "The two password fields didn't match.");
            }
        }

        errors.into_result()
    }

    /// The new password, if one was submitted.
    pub fn password(&self) -> Option<&str> {
        if self.password1.is_empty() {
            None
        } else {
            Some(&self.password1)
        }
    }
}

const USER_COLUMNS: &str = "id, username, first_name, last_name, password_hash, created_at";

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    pub async fn all(conn: &mut SqliteConnection) -> Result<Vec<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!("SELECT {} FROM users ORDER BY id", USER_COLUMNS))
            .fetch_all(&mut *conn)
            .await
    }

    pub async fn find(conn: &mut SqliteConnection, id: i64) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS))
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
    }

    pub async fn find_by_username(
        conn: &mut SqliteConnection,
        username: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE username = ?",
            USER_COLUMNS
        ))
        .bind(username)
        .fetch_optional(&mut *conn)
        .await
    }

    pub async fn exists(conn: &mut SqliteConnection, id: i64) -> Result<bool, sqlx::Error> {
        let (exists,): (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM users WHERE id = ?)")
            .bind(id)
            .fetch_one(&mut *conn)
            .await?;
        Ok(exists)
    }

    pub async fn username_taken(
        conn: &mut SqliteConnection,
        username: &str,
        except_id: Option<i64>,
    ) -> Result<bool, sqlx::Error> {
        let (taken,): (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM users WHERE username = ? AND id IS NOT ?)")
                .bind(username)
                .bind(except_id)
                .fetch_one(&mut *conn)
                .await?;
        Ok(taken)
    }

    pub async fn insert(
        conn: &mut SqliteConnection,
        input: &UserInput,
        password_hash: &str,
    ) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (username, first_name, last_name, password_hash, created_at) \
             VALUES (?, ?, ?, ?, ?) RETURNING {}",
            USER_COLUMNS
        ))
        .bind(&input.username)
        .bind(&input.first_name)
        .bind(&input.last_name)
        .bind(password_hash)
        .bind(Utc::now())
        .fetch_one(&mut *conn)
        .await
    }

    /// Saves the profile fields; the password hash changes only when one is given.
    pub async fn update(
        conn: &mut SqliteConnection,
        id: i64,
        input: &UserInput,
        password_hash: Option<&str>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE users SET username = ?, first_name = ?, last_name = ?, \
             password_hash = COALESCE(?, password_hash) WHERE id = ?",
        )
        .bind(&input.username)
        .bind(&input.first_name)
        .bind(&input.last_name)
        .bind(password_hash)
        .bind(id)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    /// Whether any task names this user as creator or executor.
    pub async fn is_in_use(conn: &mut SqliteConnection, id: i64) -> Result<bool, sqlx::Error> {
        let (used,): (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM tasks WHERE creator_id = ? OR executor_id = ?)",
        )
        .bind(id)
        .bind(id)
        .fetch_one(&mut *conn)
        .await?;
        Ok(used)
    }

    pub async fn delete(conn: &mut SqliteConnection, id: i64) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
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

    fn input(username: &str, password1: &str, password2: &str) -> UserInput {
        UserInput {
            username: username.to_string(),
            first_name: "Albert".to_string(),
            last_name: "Einstein".to_string(),
            password1: password1.to_string(),
            password2: password2.to_string(),
        }
    }

    #[test]
    fn test_user_input_validation() {
        assert!(input("albert_einstein", "qwer1234", "qwer1234").clean(true).is_ok());

        let errors = input("albert einstein!", "qwer1234", "qwer1234")
            .clean(true)
            .unwrap_err();
        assert!(errors.contains("username"));

        let errors = input("", "qwer1234", "qwer1234").clean(true).unwrap_err();
        assert_eq!(errors.get("username").unwrap(), [REQUIRED.to_string()]);

        let errors = input("albert", "qwer1234", "qwer4321").clean(true).unwrap_err();
        assert_eq!(
            errors.get("password2").unwrap(),
            ["The two password fields didn't match.".to_string()]
        );

        let errors = input("albert", "qw", "qw").clean(true).unwrap_err();
        assert!(errors.contains("password1"));
    }

    #[test]
    fn test_passwords_optional_on_update() {
        let keep = input("albert", "", "");
        assert!(keep.clean(false).is_ok());
        assert_eq!(keep.password(), None);
        assert!(keep.clean(true).is_err());

        let half = input("albert", "qwer1234", "");
        let errors = half.clean(false).unwrap_err();
        assert_eq!(errors.get("password2").unwrap(), [REQUIRED.to_string()]);
    }

    #[test]
    fn test_full_name() {
        let user = User {
            id: 1,
            username: "confucius".into(),
            first_name: "".into(),
            last_name: "Kong".into(),
            password_hash: String::new(),
            created_at: Utc::now(),
        };
        assert_eq!(user.full_name(), "Kong");
        assert!(!serde_json::to_string(&user).unwrap().contains("password_hash"));
    }

    #[actix_rt::test]
    async fn test_user_queries() {
        let pool = db::connect_in_memory().await.unwrap();
        let mut conn = pool.acquire().await.unwrap();

        let user = User::insert(&mut conn, &input("albert", "x", "x"), "hash-1")
            .await
            .unwrap();
        assert!(User::exists(&mut conn, user.id).await.unwrap());
        assert!(User::username_taken(&mut conn, "albert", None).await.unwrap());
        assert!(!User::username_taken(&mut conn, "albert", Some(user.id)).await.unwrap());

        let mut changes = input("albert_e", "", "");
        changes.first_name = "Al".to_string();
        User::update(&mut conn, user.id, &changes, None).await.unwrap();
        let reloaded = User::find(&mut conn, user.id).await.unwrap().unwrap();
        assert_eq!(reloaded.username, "albert_e");
        assert_eq!(reloaded.first_name, "Al");
        assert_eq!(reloaded.password_hash, "hash-1");

        User::update(&mut conn, user.id, &changes, Some("hash-2")).await.unwrap();
        let reloaded = User::find_by_username(&mut conn, "albert_e")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reloaded.password_hash, "hash-2");

        assert!(!User::is_in_use(&mut conn, user.id).await.unwrap());
        assert_eq!(User::delete(&mut conn, user.id).await.unwrap(), 1);
        assert!(!User::exists(&mut conn, user.id).await.unwrap());
    }
}
