#![forbid(unsafe_code)]

//! `task-digest`: task classification, daily project reports and
//! stakeholder notifications.

pub mod api;
pub mod config;
pub mod document;
pub mod engine;
pub mod errors;
pub mod models;
pub mod notify;
pub mod orchestrator;
pub mod persistence;
pub mod source;
pub mod summarizer;

pub use config::GlobalConfig;
pub use errors::{AppError, Result};
