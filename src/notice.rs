//! One-shot notices attached to redirects.
//!
//! A mutation (or a refused one) answers with a redirect that carries a
//! `notice` cookie of the form `kind:key`. The next page rendered for that
//! client picks the notice up, translates it, embeds it in the response body
//! and clears the cookie, so every notice is shown exactly once.

use actix_web::cookie::Cookie;
use actix_web::dev::Payload;
use actix_web::{http::header, FromRequest, HttpRequest, HttpResponse};
use serde::Serialize;
use serde_json::Value;
use std::future::{ready, Ready};

use crate::i18n::{translate, Locale};

pub const NOTICE_COOKIE: &str = "notice";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    Success,
    Error,
}

impl NoticeKind {
    fn as_str(self) -> &'static str {
        match self {
            NoticeKind::Success => "success",
            NoticeKind::Error => "error",
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "success" => Some(NoticeKind::Success),
            "error" => Some(NoticeKind::Error),
            _ => None,
        }
    }
}

/// Every user-facing notice the application can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message {
    LoginRequired,
    LoggedIn,
    LoggedOut,
    UserRegistered,
    UserUpdated,
    UserDeleted,
    UserNoPermission,
    UserInUse,
    StatusCreated,
    StatusUpdated,
    StatusDeleted,
    StatusInUse,
    LabelCreated,
    LabelUpdated,
    LabelDeleted,
    LabelInUse,
    TaskCreated,
    TaskUpdated,
    TaskDeleted,
    TaskNotCreator,
}

impl Message {
    const ALL: [Message; 20] = [
        Message::LoginRequired,
        Message::LoggedIn,
        Message::LoggedOut,
        Message::UserRegistered,
        Message::UserUpdated,
        Message::UserDeleted,
        Message::UserNoPermission,
        Message::UserInUse,
        Message::StatusCreated,
        Message::StatusUpdated,
        Message::StatusDeleted,
        Message::StatusInUse,
        Message::LabelCreated,
        Message::LabelUpdated,
        Message::LabelDeleted,
        Message::LabelInUse,
        Message::TaskCreated,
        Message::TaskUpdated,
        Message::TaskDeleted,
        Message::TaskNotCreator,
    ];

    /// Stable identifier used on the wire.
    pub fn key(self) -> &'static str {
        match self {
            Message::LoginRequired => "login_required",
            Message::LoggedIn => "logged_in",
            Message::LoggedOut => "logged_out",
            Message::UserRegistered => "user_registered",
            Message::UserUpdated => "user_updated",
            Message::UserDeleted => "user_deleted",
            Message::UserNoPermission => "user_no_permission",
            Message::UserInUse => "user_in_use",
            Message::StatusCreated => "status_created",
            Message::StatusUpdated => "status_updated",
            Message::StatusDeleted => "status_deleted",
            Message::StatusInUse => "status_in_use",
            Message::LabelCreated => "label_created",
            Message::LabelUpdated => "label_updated",
            Message::LabelDeleted => "label_deleted",
            Message::LabelInUse => "label_in_use",
            Message::TaskCreated => "task_created",
            Message::TaskUpdated => "task_updated",
            Message::TaskDeleted => "task_deleted",
            Message::TaskNotCreator => "task_not_creator",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Message::ALL.iter().copied().find(|message| message.key() == key)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: Message,
}

/// A notice translated for display.
#[derive(Debug, Serialize)]
pub struct RenderedNotice {
    pub kind: NoticeKind,
    pub message: &'static str,
}

impl Notice {
    pub fn success(message: Message) -> Self {
        Self {
            kind: NoticeKind::Success,
            message,
        }
    }

    pub fn error(message: Message) -> Self {
        Self {
            kind: NoticeKind::Error,
            message,
        }
    }

    pub fn encode(&self) -> String {
        format!("{}:{}", self.kind.as_str(), self.message.key())
    }

    pub fn decode(raw: &str) -> Option<Self> {
        let (kind, key) = raw.split_once(':')?;
        Some(Self {
            kind: NoticeKind::parse(kind)?,
            message: Message::from_key(key)?,
        })
    }

    pub fn render(&self, locale: Locale) -> RenderedNotice {
        RenderedNotice {
            kind: self.kind,
            message: translate(self.message, locale),
        }
    }

    pub fn cookie(&self) -> Cookie<'static> {
        Cookie::build(NOTICE_COOKIE, self.encode())
            .path("/")
            .http_only(true)
            .finish()
    }
}

/// The notice left for this client by the previous response, if any.
#[derive(Debug, Clone, Copy, Default)]
pub struct PendingNotice(pub Option<Notice>);

impl FromRequest for PendingNotice {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let notice = req
            .cookie(NOTICE_COOKIE)
            .and_then(|cookie| Notice::decode(cookie.value()));
        ready(Ok(PendingNotice(notice)))
    }
}

pub fn removal_cookie(name: &'static str) -> Cookie<'static> {
    let mut cookie = Cookie::build(name, "").path("/").finish();
    cookie.make_removal();
    cookie
}

/// `302 Found` to `location`, carrying `notice` for the next page.
pub fn redirect(location: &str, notice: Notice) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, location.to_string()))
        .cookie(notice.cookie())
        .finish()
}

/// Renders a JSON page, consuming the pending notice.
pub fn render_page(locale: Locale, pending: PendingNotice, mut body: Value) -> HttpResponse {
    let mut builder = HttpResponse::Ok();
    let notice = match pending.0 {
        Some(notice) => {
            builder.cookie(removal_cookie(NOTICE_COOKIE));
            serde_json::to_value(notice.render(locale)).unwrap_or(Value::Null)
        }
        None => Value::Null,
    };
    if let Some(object) = body.as_object_mut() {
        object.insert("notice".to_string(), notice);
    }
    builder.json(body)
}
