//! Locale selection and the message catalog used for notices.

use actix_web::dev::Payload;
use actix_web::{http::header, web, FromRequest, HttpRequest};
use std::future::{ready, Ready};

use crate::config::Config;
use crate::notice::Message;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Locale {
    En,
    Ru,
}

impl Locale {
    /// Maps a language tag such as `ru`, `ru-RU` or `en_US` to a supported locale.
    pub fn from_tag(tag: &str) -> Option<Self> {
        let primary = tag
            .trim()
            .split(&['-', '_'][..])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        match primary.as_str() {
            "en" => Some(Locale::En),
            "ru" => Some(Locale::Ru),
            _ => None,
        }
    }

    /// Picks the first supported language listed in an `Accept-Language` value.
    pub fn from_accept_language(value: &str) -> Option<Self> {
        value
            .split(',')
            .filter_map(|part| part.split(';').next())
            .find_map(Locale::from_tag)
    }
}

impl FromRequest for Locale {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let requested = req
            .headers()
            .get(header::ACCEPT_LANGUAGE)
            .and_then(|value| value.to_str().ok())
            .and_then(Locale::from_accept_language);
        let fallback = req
            .app_data::<web::Data<Config>>()
            .map(|config| config.default_locale)
            .unwrap_or(Locale::En);
        ready(Ok(requested.unwrap_or(fallback)))
    }
}

pub fn translate(message: Message, locale: Locale) -> &'static str {
    match locale {
        Locale::En => english(message),
        Locale::Ru => russian(message),
    }
}

fn english(message: Message) -> &'static str {
    match message {
        Message::LoginRequired => "You are not logged in! Please log in.",
        Message::LoggedIn => "You are logged in",
        Message::LoggedOut => "You are logged out",
        Message::UserRegistered => "The user has been successfully registered",
        Message::UserUpdated => "User successfully updated",
        Message::UserDeleted => "User successfully deleted",
        Message::UserNoPermission => "You do not have permission to modify another user.",
        Message::UserInUse => "Unable to delete a user because it is being used",
        Message::StatusCreated => "The status has been successfully created",
        Message::StatusUpdated => "The status has been successfully changed",
        Message::StatusDeleted => "The status has been successfully deleted",
        Message::StatusInUse => "Unable to delete a status because it is being used",
        Message::LabelCreated => "The label has been successfully created",
        Message::LabelUpdated => "The label has been successfully changed",
        Message::LabelDeleted => "The label has been successfully deleted",
        Message::LabelInUse => "Unable to delete a label because it is being used",
        Message::TaskCreated => "The task has been created",
        Message::TaskUpdated => "The task has been successfully changed",
        Message::TaskDeleted => "The task has been successfully deleted",
        Message::TaskNotCreator => "Only the author of the task can delete it",
    }
}

fn russian(message: Message) -> &'static str {
    match message {
        Message::LoginRequired => "Вы не авторизованы! Пожалуйста, выполните вход.",
        Message::LoggedIn => "Вы залогинены",
        Message::LoggedOut => "Вы разлогинены",
        Message::UserRegistered => "Пользователь успешно зарегистрирован",
        Message::UserUpdated => "Пользователь успешно изменен",
        Message::UserDeleted => "Пользователь успешно удален",
        Message::UserNoPermission => "У вас нет прав для изменения другого пользователя.",
        Message::UserInUse => "Невозможно удалить пользователя, потому что он используется",
        Message::StatusCreated => "Статус успешно создан",
        Message::StatusUpdated => "Статус успешно изменен",
        Message::StatusDeleted => "Статус успешно удален",
        Message::StatusInUse => "Невозможно удалить статус, потому что он используется",
        Message::LabelCreated => "Метка успешно создана",
        Message::LabelUpdated => "Метка успешно изменена",
        Message::LabelDeleted => "Метка успешно удалена",
        Message::LabelInUse => "Невозможно удалить метку, потому что она используется",
        Message::TaskCreated => "Задача успешно создана",
        Message::TaskUpdated => "Задача успешно изменена",
        Message::TaskDeleted => "Задача успешно удалена",
        Message::TaskNotCreator => "Задачу может удалить только ее автор",
    }
}
