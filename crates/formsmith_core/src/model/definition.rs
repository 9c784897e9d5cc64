//! Form definition aggregate root.
//!
//! # Responsibility
//! - Own the ordered element list plus form metadata.
//! - Provide the JSON exchange shape used by persistence collaborators.
//!
//! # Invariants
//! - Element ids are unique within one definition.
//! - List order is the render/tab order; no index field is persisted.
//! - `updated_at >= created_at` for definitions produced by the engine.

use crate::model::element::{ElementId, FormElement};
use crate::model::ModelError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Stable identifier of one form definition.
pub type DefinitionId = Uuid;

/// Ordered collection of elements plus metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormDefinition {
    pub id: DefinitionId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub elements: Vec<FormElement>,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Unix epoch milliseconds.
    pub updated_at: i64,
}

impl FormDefinition {
    /// Creates an empty definition with a generated id.
    pub fn new(name: impl Into<String>) -> Self {
        let now = now_epoch_ms();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            description: String::new(),
            elements: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Parses a definition received from a persistence collaborator.
    ///
    /// # Errors
    /// - `ModelError::Json` when the payload does not match the schema
    ///   (including unknown element kinds).
    /// - `ModelError::DuplicateElementId` when two elements share an id.
    pub fn from_json(payload: &str) -> Result<Self, ModelError> {
        let definition: Self =
            serde_json::from_str(payload).map_err(|err| ModelError::Json(err.to_string()))?;
        definition.ensure_unique_ids()?;
        Ok(definition)
    }

    /// Serializes the definition as pretty JSON.
    pub fn to_json(&self) -> Result<String, ModelError> {
        serde_json::to_string_pretty(self).map_err(|err| ModelError::Json(err.to_string()))
    }

    /// Verifies the unique-id invariant.
    pub fn ensure_unique_ids(&self) -> Result<(), ModelError> {
        let mut seen = HashSet::with_capacity(self.elements.len());
        for element in &self.elements {
            if !seen.insert(element.id) {
                return Err(ModelError::DuplicateElementId(element.id));
            }
        }
        Ok(())
    }

    pub fn element(&self, id: ElementId) -> Option<&FormElement> {
        self.elements.iter().find(|element| element.id == id)
    }

    pub fn element_mut(&mut self, id: ElementId) -> Option<&mut FormElement> {
        self.elements.iter_mut().find(|element| element.id == id)
    }

    pub fn index_of(&self, id: ElementId) -> Option<usize> {
        self.elements.iter().position(|element| element.id == id)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Element ids in list order.
    pub fn element_ids(&self) -> Vec<ElementId> {
        self.elements.iter().map(|element| element.id).collect()
    }

    /// Refreshes `updated_at`, never moving it backwards.
    pub fn touch(&mut self) {
        self.updated_at = now_epoch_ms().max(self.updated_at);
    }
}

/// Current wall-clock time in Unix epoch milliseconds.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}
