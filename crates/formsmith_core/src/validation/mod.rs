//! Field and form validation.
//!
//! # Responsibility
//! - Run the per-field pipeline (structure, required, constraints, custom
//!   rule) and then registered cross-field rules.
//! - Check definition configuration before export.
//!
//! # Invariants
//! - Validation is pure: the same snapshot and rules give the same report.
//! - Failures are data (`FieldResult`), never errors.
//! - Only field kinds produce report entries.
//!
//! # See also
//! - `crate::expr` for the custom rule language.

use crate::model::element::ElementId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub mod cache;
pub mod config_check;
pub mod cross_field;
pub mod engine;
pub mod field;

pub use cache::ValidationCache;
pub use config_check::{check_definition, DefinitionConfigError};
pub use cross_field::{CrossFieldCheck, CrossFieldRule};
pub use engine::FormValidator;
pub use field::{CUSTOM_RULE_FAILED_MESSAGE, PATTERN_MISMATCH_MESSAGE, REQUIRED_MESSAGE};

/// Outcome for one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldResult {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl FieldResult {
    pub fn valid() -> Self {
        Self {
            valid: true,
            message: None,
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            valid: false,
            message: Some(message.into()),
        }
    }
}

/// What a validation call covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationTarget {
    All,
    Element(ElementId),
}

/// Results keyed by element id, serialized as a plain JSON object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationReport {
    results: BTreeMap<ElementId, FieldResult>,
}

impl ValidationReport {
    pub fn new(results: BTreeMap<ElementId, FieldResult>) -> Self {
        Self { results }
    }

    /// True when every entry is valid.
    pub fn is_submit_valid(&self) -> bool {
        self.results.values().all(|result| result.valid)
    }

    pub fn get(&self, id: ElementId) -> Option<&FieldResult> {
        self.results.get(&id)
    }

    pub fn results(&self) -> &BTreeMap<ElementId, FieldResult> {
        &self.results
    }

    pub fn into_results(self) -> BTreeMap<ElementId, FieldResult> {
        self.results
    }

    pub fn invalid_ids(&self) -> Vec<ElementId> {
        self.results
            .iter()
            .filter(|(_, result)| !result.valid)
            .map(|(id, _)| *id)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}
