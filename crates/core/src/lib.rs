//! Core library for the task dashboard
//!
//! This crate contains the dashboard's business logic, including:
//! - Task model and per-user task repositories
//! - Sessions and the auth gate
//! - The list controller and its summary projection

pub mod auth;
pub mod config;
pub mod controller;
pub mod dashboard;
pub mod error;
pub mod gate;
pub mod navigation;
pub mod session;
pub mod summary;
pub mod task;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use error::Error;
pub type Result<T> = std::result::Result<T, Error>;
