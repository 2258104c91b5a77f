//! Account registration, password login and bearer-token identity.

pub mod app;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod state;
