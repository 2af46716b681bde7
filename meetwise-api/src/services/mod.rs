//! Business logic between HTTP handlers and the database layer
//!
//! Every entry point takes the caller's [`AuthContext`](crate::api::auth::AuthContext)
//! explicitly.

pub mod action_items;
pub mod briefing;
pub mod meetings;
pub mod sparring;
