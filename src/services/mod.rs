// src/services/mod.rs
//! Long-lived services: the trust store and the HTTP API in front of it.

pub mod api_server;
pub mod trust_store;
