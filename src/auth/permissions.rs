//! Capability checks evaluated at the start of a handler.
//!
//! A failed check is not an error: the handler answers with
//! [`Denied::into_response`], a redirect carrying an error notice, and the
//! target record stays untouched.

use actix_web::HttpResponse;

use super::AuthenticatedUserId;
use crate::models::{Task, User};
use crate::notice::{redirect, Message, Notice};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Denied {
    pub redirect_to: &'static str,
    pub message: Message,
}

impl Denied {
    pub fn into_response(self) -> HttpResponse {
        redirect(self.redirect_to, Notice::error(self.message))
    }
}

/// Only the user themself may change or remove their profile.
pub fn must_be_self(actor: AuthenticatedUserId, target: &User) -> Result<(), Denied> {
    if actor.is(target.id) {
        Ok(())
    } else {
        Err(Denied {
            redirect_to: "/users",
            message: Message::UserNoPermission,
        })
    }
}

/// Only the creator may remove a task.
pub fn must_be_creator(actor: AuthenticatedUserId, task: &Task) -> Result<(), Denied> {
    if actor.is(task.creator_id) {
        Ok(())
    } else {
        Err(Denied {
            redirect_to: "/tasks",
            message: Message::TaskNotCreator,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::header;
    use chrono::Utc;

    fn user(id: i64) -> User {
        User {
            id,
            username: format!("user{}", id),
            first_name: String::new(),
            last_name: String::new(),
            password_hash: String::new(),
            created_at: Utc::now(),
        }
    }

    fn task(creator_id: i64) -> Task {
        Task {
            id: 10,
            name: "Task".into(),
            description: String::new(),
            status_id: 1,
            creator_id,
            executor_id: Some(3),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_must_be_self() {
        assert!(must_be_self(AuthenticatedUserId(1), &user(1)).is_ok());
        let denied = must_be_self(AuthenticatedUserId(2), &user(1)).unwrap_err();
        assert_eq!(denied.message, Message::UserNoPermission);

        let response = denied.into_response();
        assert_eq!(response.status(), 302);
        assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/users");
    }

    #[test]
    fn test_must_be_creator() {
        assert!(must_be_creator(AuthenticatedUserId(1), &task(1)).is_ok());
        // Being the executor is not enough.
        let denied = must_be_creator(AuthenticatedUserId(3), &task(1)).unwrap_err();
        assert_eq!(denied.redirect_to, "/tasks");
        assert_eq!(denied.message, Message::TaskNotCreator);
    }
}
