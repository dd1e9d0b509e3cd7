#![doc = "The `taskforge_auth` library crate."]
#![doc = ""]
#![doc = "Cookie-based JWT authentication and session lifecycle for TaskForge: token issuing,"]
#![doc = "the session middleware with live role lookup, role gates, refresh rotation, logout,"]
#![doc = "and an HTTP client that refreshes expired sessions once before giving up."]
#![doc = "The binary (`main.rs`) only loads configuration and calls into [`startup`]."]

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod response;
pub mod routes;
pub mod seed;
pub mod startup;
pub mod state;
pub mod store;

pub use crate::error::AppError;
pub use crate::state::AppState;
