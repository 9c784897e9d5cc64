//! Form builder domain model.
//!
//! # Responsibility
//! - Define canonical element/definition structures used by every engine
//!   component.
//! - Own the per-kind default table.
//!
//! # Invariants
//! - Kinds form a closed set; unknown names fail with `UnknownKind`.
//! - Element ids are unique within a definition.

use crate::model::element::ElementId;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod definition;
pub mod element;
pub mod kind;

/// Errors raised while constructing or importing model values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// Wire kind name is not part of the closed kind set.
    UnknownKind(String),
    /// Two elements of one definition share an id.
    DuplicateElementId(ElementId),
    /// JSON payload does not match the definition schema.
    Json(String),
}

impl Display for ModelError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownKind(kind) => write!(f, "unknown element kind: {kind}"),
            Self::DuplicateElementId(id) => write!(f, "duplicate element id: {id}"),
            Self::Json(message) => write!(f, "invalid form definition json: {message}"),
        }
    }
}

impl Error for ModelError {}
