//! Middleware for the POS Retail Suite backend

pub mod auth;

pub use auth::{auth_middleware, AuthUser, CurrentUser};
