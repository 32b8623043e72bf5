pub mod extractors;
pub mod middleware;
pub mod password;
pub mod permissions;
pub mod token;

use actix_web::cookie::{Cookie, SameSite};
use validator::Validate;

use crate::forms::{FieldKind, FieldSpec, FormData, FormErrors};

// Re-export necessary items
pub use extractors::AuthenticatedUserId;
pub use middleware::AuthMiddleware;
pub use password::{hash_password, verify_password};
pub use token::{generate_token, verify_token, Claims};

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "session";

/// Where unauthenticated requests are sent.
pub const LOGIN_PATH: &str = "/login";

/// The login form.
#[derive(Debug, Validate)]
pub struct LoginInput {
    #[validate(length(min = 1))]
    pub username: String,
    #[validate(length(min = 1))]
    pub password: String,
}

impl LoginInput {
    pub const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::new("username", FieldKind::Text, true),
        FieldSpec::new("password", FieldKind::Password, true),
    ];

    pub fn bind(form: &FormData) -> Self {
        Self {
            username: form.text("username"),
            password: form.raw("password"),
        }
    }

    pub fn clean(&self) -> Result<(), FormErrors> {
        FormErrors::from_result(self.validate()).into_result()
    }
}

/// The HttpOnly cookie that carries `token`.
pub fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE, token)
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_input_validation() {
        let form: FormData = vec![
            ("username".to_string(), " albert ".to_string()),
            ("password".to_string(), " secret ".to_string()),
        ]
        .into();
        let login = LoginInput::bind(&form);
        assert_eq!(login.username, "albert");
        assert_eq!(login.password, " secret ");
        assert!(login.clean().is_ok());

        let empty = LoginInput::bind(&FormData::default());
        let errors = empty.clean().unwrap_err();
        assert!(errors.contains("username"));
        assert!(errors.contains("password"));
    }

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = session_cookie("token-value".to_string());
        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.value(), "token-value");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.path(), Some("/"));
    }
}
