//! Client for the task board API: session handling, the todo list with its
//! filters and dashboard views, and the actions that change it.

pub mod api;
pub mod config;
pub mod error;
pub mod filter;
pub mod notify;
pub mod session;
pub mod stats;
pub mod todo;
pub mod ui;

pub use taskdesk_api::v1 as model;

pub const API_URL: &str = "http://localhost:8080/api/v1.0";
