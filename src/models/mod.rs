// src/models/mod.rs
//! Data structures shared by the trust provider and the API server.

pub mod attribute;
pub mod scheme;
pub mod signed_message;
