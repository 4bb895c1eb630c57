//! Shared domain types for Chatrelay.
//!
//! This crate contains the domain types used across the relay: chat turns,
//! log rows, completion errors, and configuration.
//!
//! Zero infrastructure dependencies -- only serde, chrono, thiserror, secrecy.

pub mod chat;
pub mod config;
pub mod error;
pub mod llm;
pub mod log;
