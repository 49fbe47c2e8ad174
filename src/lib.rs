#![doc = "The `tasknest` library crate."]
#![doc = ""]
#![doc = "Accounts with bearer-token authentication and a private todo list per account."]
#![doc = "Services sit behind store ports with PostgreSQL and in-memory adapters; the"]
#![doc = "binary (`main.rs`) wires configuration, stores and the HTTP server together."]

pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod store;
pub mod tasks;

pub use crate::error::AppError;
