//! Element store: the committed form definition and its mutations.
//!
//! # Responsibility
//! - Own the current `Arc<FormDefinition>` snapshot and its revision.
//! - Apply element mutations (add, update, delete, duplicate, reorder, drag)
//!   as snapshot replacements.
//!
//! # Invariants
//! - A snapshot handed out is never mutated; every change builds a new one.
//! - `revision` grows by exactly one per successful mutation.
//! - Locked elements reject delete, reorder, drag and non-content updates.
//! - Failed mutations leave snapshot and revision unchanged.
//!
//! # See also
//! - `crate::service::editor` for history and drag transactions.

use crate::config::DEFAULT_DUPLICATE_OFFSET;
use crate::model::definition::FormDefinition;
use crate::model::element::{ElementId, FormElement};
use crate::model::kind::ElementKind;
use crate::model::ModelError;
use log::{debug, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use uuid::Uuid;

pub mod patch;

pub use patch::{ElementPatch, PositionPatch, StylePatch};

const COPY_SUFFIX: &str = " (copy)";

pub type StoreResult<T> = Result<T, StoreError>;

/// Store mutation failure.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreError {
    UnknownKind(String),
    ElementNotFound(ElementId),
    ElementLocked(ElementId),
    IndexOutOfRange { from: usize, to: usize, len: usize },
    InvalidDefinition(ModelError),
}

impl StoreError {
    /// Stable code used in log lines and FFI envelopes.
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnknownKind(_) => "unknown_kind",
            Self::ElementNotFound(_) => "element_not_found",
            Self::ElementLocked(_) => "element_locked",
            Self::IndexOutOfRange { .. } => "index_out_of_range",
            Self::InvalidDefinition(_) => "invalid_definition",
        }
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownKind(kind) => write!(f, "unknown element kind `{kind}`"),
            Self::ElementNotFound(id) => write!(f, "element not found: {id}"),
            Self::ElementLocked(id) => write!(f, "element is locked: {id}"),
            Self::IndexOutOfRange { from, to, len } => {
                write!(f, "reorder {from} -> {to} out of range for {len} elements")
            }
            Self::InvalidDefinition(err) => write!(f, "invalid definition: {err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidDefinition(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ModelError> for StoreError {
    fn from(value: ModelError) -> Self {
        match value {
            ModelError::UnknownKind(kind) => Self::UnknownKind(kind),
            other => Self::InvalidDefinition(other),
        }
    }
}

/// In-memory owner of the committed definition.
#[derive(Debug, Clone)]
pub struct ElementStore {
    current: Arc<FormDefinition>,
    revision: u64,
    duplicate_offset: f64,
}

impl ElementStore {
    pub fn new(definition: FormDefinition) -> Self {
        Self {
            current: Arc::new(definition),
            revision: 0,
            duplicate_offset: DEFAULT_DUPLICATE_OFFSET,
        }
    }

    /// Sets the (dx, dy) offset applied by `duplicate`.
    pub fn with_duplicate_offset(mut self, offset: f64) -> Self {
        self.duplicate_offset = offset;
        self
    }

    pub fn snapshot(&self) -> Arc<FormDefinition> {
        Arc::clone(&self.current)
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Appends a default element of `kind`; returns the new snapshot and id.
    pub fn add(&mut self, kind: ElementKind) -> (Arc<FormDefinition>, ElementId) {
        let element = FormElement::create_default(kind);
        let id = element.id;
        let mut next = self.draft();
        next.elements.push(element);
        let snapshot = self.install(next);
        debug!(
            "event=element_add module=store status=ok element_id={} kind={} revision={}",
            id, kind, self.revision
        );
        (snapshot, id)
    }

    /// Like `add`, but from a wire kind name.
    ///
    /// # Errors
    /// - `StoreError::UnknownKind` for unsupported kind names.
    pub fn add_named(&mut self, kind: &str) -> StoreResult<(Arc<FormDefinition>, ElementId)> {
        let kind = kind.parse::<ElementKind>().map_err(|err| {
            warn!("event=element_add module=store status=error error_code=unknown_kind");
            StoreError::from(err)
        })?;
        Ok(self.add(kind))
    }

    /// Merges `patch` into element `id`.
    ///
    /// # Errors
    /// - `ElementNotFound` when `id` is absent.
    /// - `ElementLocked` when `id` is locked and the patch leaves the
    ///   content scope.
    pub fn update(&mut self, id: ElementId, patch: &ElementPatch) -> StoreResult<Arc<FormDefinition>> {
        let element = self.existing(id)?;
        if element.locked && patch.touches_locked_scope() {
            return Err(self.reject(StoreError::ElementLocked(id), "update"));
        }
        let mut next = self.draft();
        if let Some(target) = next.element_mut(id) {
            patch.apply_to(target);
        }
        let snapshot = self.install(next);
        debug!(
            "event=element_update module=store status=ok element_id={} revision={}",
            id, self.revision
        );
        Ok(snapshot)
    }

    /// Removes element `id`.
    ///
    /// # Errors
    /// - `ElementNotFound` when `id` is absent.
    /// - `ElementLocked` when `id` is locked.
    pub fn delete(&mut self, id: ElementId) -> StoreResult<Arc<FormDefinition>> {
        if self.existing(id)?.locked {
            return Err(self.reject(StoreError::ElementLocked(id), "delete"));
        }
        let mut next = self.draft();
        next.elements.retain(|element| element.id != id);
        let snapshot = self.install(next);
        debug!(
            "event=element_delete module=store status=ok element_id={} revision={}",
            id, self.revision
        );
        Ok(snapshot)
    }

    /// Appends an unlocked copy of `id` with a fresh id, `" (copy)"` content
    /// suffix and the position shifted by the duplicate offset.
    ///
    /// # Errors
    /// - `ElementNotFound` when `id` is absent.
    pub fn duplicate(&mut self, id: ElementId) -> StoreResult<(Arc<FormDefinition>, ElementId)> {
        let mut clone = self.existing(id)?.clone();
        clone.id = Uuid::new_v4();
        clone.content.push_str(COPY_SUFFIX);
        clone.position.x += self.duplicate_offset;
        clone.position.y += self.duplicate_offset;
        clone.locked = false;
        let clone_id = clone.id;

        let mut next = self.draft();
        next.elements.push(clone);
        let snapshot = self.install(next);
        debug!(
            "event=element_duplicate module=store status=ok element_id={} source_id={} revision={}",
            clone_id, id, self.revision
        );
        Ok((snapshot, clone_id))
    }

    /// Moves the element at `from` to index `to`.
    ///
    /// # Errors
    /// - `IndexOutOfRange` when either index is past the end.
    /// - `ElementLocked` when the moved element is locked.
    pub fn reorder(&mut self, from: usize, to: usize) -> StoreResult<Arc<FormDefinition>> {
        let len = self.current.len();
        if from >= len || to >= len {
            return Err(self.reject(StoreError::IndexOutOfRange { from, to, len }, "reorder"));
        }
        let moved = &self.current.elements[from];
        if moved.locked {
            let id = moved.id;
            return Err(self.reject(StoreError::ElementLocked(id), "reorder"));
        }
        let mut next = self.draft();
        let element = next.elements.remove(from);
        next.elements.insert(to, element);
        let snapshot = self.install(next);
        debug!(
            "event=element_reorder module=store status=ok from={} to={} revision={}",
            from, to, self.revision
        );
        Ok(snapshot)
    }

    /// Builds a drag preview: `base` with element `id` moved by (dx, dy).
    ///
    /// The committed snapshot is not touched; callers pass the previous
    /// preview as `base` to accumulate deltas.
    ///
    /// # Errors
    /// - `ElementNotFound` when `id` is absent from `base`.
    /// - `ElementLocked` when `id` is locked.
    pub fn apply_drag(
        &self,
        base: &FormDefinition,
        id: ElementId,
        dx: f64,
        dy: f64,
    ) -> StoreResult<FormDefinition> {
        let element = base
            .element(id)
            .ok_or(StoreError::ElementNotFound(id))?;
        if element.locked {
            return Err(self.reject(StoreError::ElementLocked(id), "drag"));
        }
        let mut preview = base.clone();
        if let Some(target) = preview.element_mut(id) {
            target.position.x += dx;
            target.position.y += dy;
        }
        preview.touch();
        Ok(preview)
    }

    /// Installs `definition` as the committed snapshot.
    ///
    /// # Errors
    /// - `InvalidDefinition` when element ids are not unique.
    pub fn replace(&mut self, definition: FormDefinition) -> StoreResult<Arc<FormDefinition>> {
        definition.ensure_unique_ids()?;
        Ok(self.install_untouched(Arc::new(definition)))
    }

    /// Installs an existing snapshot (undo/redo) without copying it.
    pub fn restore(&mut self, snapshot: Arc<FormDefinition>) -> Arc<FormDefinition> {
        self.install_untouched(snapshot)
    }

    fn existing(&self, id: ElementId) -> StoreResult<&FormElement> {
        self.current
            .element(id)
            .ok_or(StoreError::ElementNotFound(id))
    }

    fn draft(&self) -> FormDefinition {
        self.current.as_ref().clone()
    }

    fn install(&mut self, mut next: FormDefinition) -> Arc<FormDefinition> {
        next.touch();
        self.install_untouched(Arc::new(next))
    }

    fn install_untouched(&mut self, snapshot: Arc<FormDefinition>) -> Arc<FormDefinition> {
        self.current = snapshot;
        self.revision += 1;
        Arc::clone(&self.current)
    }

    fn reject(&self, err: StoreError, op: &str) -> StoreError {
        warn!(
            "event=element_{} module=store status=error error_code={} revision={}",
            op,
            err.code(),
            self.revision
        );
        err
    }
}

impl Default for ElementStore {
    fn default() -> Self {
        Self::new(FormDefinition::new("Untitled form"))
    }
}

#[cfg(test)]
mod tests {
    use super::{ElementPatch, ElementStore, StoreError};
    use crate::model::definition::FormDefinition;
    use crate::model::kind::ElementKind;

    #[test]
    fn failed_mutation_keeps_revision() {
        let mut store = ElementStore::default();
        let (_, id) = store.add(ElementKind::Text);
        let revision = store.revision();
        let patch = ElementPatch {
            locked: Some(true),
            ..ElementPatch::default()
        };
        store.update(id, &patch).unwrap();
        assert_eq!(store.delete(id), Err(StoreError::ElementLocked(id)));
        assert_eq!(store.revision(), revision + 1);
    }

    #[test]
    fn previous_snapshot_is_not_mutated() {
        let mut store = ElementStore::default();
        let (before, id) = store.add(ElementKind::Heading);
        store.duplicate(id).unwrap();
        assert_eq!(before.len(), 1);
        assert_eq!(store.snapshot().len(), 2);
    }

    #[test]
    fn drag_preview_leaves_committed_snapshot_alone() {
        let mut store = ElementStore::default();
        let (snapshot, id) = store.add(ElementKind::Button);
        let preview = store.apply_drag(&snapshot, id, 5.0, -3.0).unwrap();
        let preview = store.apply_drag(&preview, id, 5.0, -3.0).unwrap();
        let moved = preview.element(id).unwrap();
        assert_eq!((moved.position.x, moved.position.y), (10.0, -6.0));
        assert_eq!(store.snapshot().element(id).unwrap().position.x, 0.0);
    }

    #[test]
    fn replace_rejects_duplicate_ids() {
        let mut store = ElementStore::default();
        let mut definition = FormDefinition::new("dup");
        let element = crate::model::element::FormElement::create_default(ElementKind::Text);
        definition.elements = vec![element.clone(), element];
        assert!(matches!(
            store.replace(definition),
            Err(StoreError::InvalidDefinition(_))
        ));
    }
}
