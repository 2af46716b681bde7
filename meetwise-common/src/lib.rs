//! # MeetWise Common Library
//!
//! Shared code for the MeetWise API server and sync client:
//! - Domain models (action items, meetings, users) and wire types
//! - Write-boundary normalization of action items
//! - Configuration loading and root folder resolution
//! - Database schema initialization
//! - Bearer token and webhook signature primitives

pub mod api;
pub mod config;
#[cfg(feature = "sqlx")]
pub mod db;
pub mod error;
pub mod models;
pub mod time;

pub use error::{Error, Result};
