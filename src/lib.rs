//! newsdesk: a small content backend.
//!
//! Articles, a task list, frontend error logs and user accounts stored in
//! SQLite, served over JSON REST, GraphQL and server-rendered HTML pages.
pub mod auth;
pub mod config;
pub mod env_file;
pub mod files;
pub mod generator;
pub mod graphql;
pub mod logging;
pub mod migration;
pub mod storage;
pub mod util;
pub mod web;
