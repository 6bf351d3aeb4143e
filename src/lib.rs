//! Logwarden library interface
//!
//! Exposes core modules for use by binaries and tests.

pub mod config;
pub mod consumer;
pub mod engine;
pub mod models;
pub mod normalizer;
pub mod producer;
pub mod rules;
