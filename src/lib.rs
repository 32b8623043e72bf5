#![doc = "The `task_manager` library crate."]
#![doc = ""]
#![doc = "Domain models, session handling, routing and error handling for a multi-user"]
#![doc = "task manager. The binary (`main.rs`) wires these into an actix-web server."]

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod forms;
pub mod i18n;
pub mod models;
pub mod notice;
pub mod routes;

pub use crate::config::Config;
pub use crate::error::AppError;
