//! Flutter-facing bindings for the form builder engine.

pub mod api;
