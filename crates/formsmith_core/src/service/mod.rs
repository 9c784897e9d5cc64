//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate store, history and validation into session-level APIs.
//! - Keep UI/FFI layers decoupled from snapshot and cache bookkeeping.

pub mod editor;
