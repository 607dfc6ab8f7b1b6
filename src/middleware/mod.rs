//! Middleware module
//!
//! Contains Tower middleware for client authentication.

pub mod auth;
