//! Editing session use-case service.
//!
//! # Responsibility
//! - Pair every committed store mutation with exactly one history entry.
//! - Run drag gestures as a transaction: deltas accumulate in a preview and
//!   commit once on drag end.
//! - Serve validation with a revision-keyed cache and async tickets.
//! - Produce render frames and the persistence JSON exchange.
//!
//! # Invariants
//! - An active drag is committed before any other mutation, undo, redo or
//!   import; deleting the dragged element discards it instead.
//! - A ticket result is applied only if its revision is still current and
//!   its element still exists.
//! - Cached validation never outlives the revision it was computed for.

use crate::config::EngineConfig;
use crate::history::{HistoryError, HistoryManager};
use crate::layout::{self, Breakpoint, LayoutContext, LayoutMode, ResolvedGeometry};
use crate::model::definition::FormDefinition;
use crate::model::element::{ElementId, FormElement};
use crate::model::kind::ElementKind;
use crate::model::ModelError;
use crate::store::{ElementPatch, ElementStore, StoreError};
use crate::validation::{
    check_definition, CrossFieldRule, DefinitionConfigError, FieldResult, FormValidator,
    ValidationCache, ValidationReport, ValidationTarget,
};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

pub type EditorResult<T> = Result<T, EditorError>;

/// Editing session failure.
#[derive(Debug, Clone, PartialEq)]
pub enum EditorError {
    Store(StoreError),
    History(HistoryError),
    Model(ModelError),
    Config(DefinitionConfigError),
    NoActiveDrag,
}

impl EditorError {
    /// Stable code used in log lines and FFI envelopes.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Store(err) => err.code(),
            Self::History(HistoryError::NothingToUndo) => "nothing_to_undo",
            Self::History(HistoryError::NothingToRedo) => "nothing_to_redo",
            Self::Model(_) => "invalid_definition",
            Self::Config(_) => "invalid_configuration",
            Self::NoActiveDrag => "no_active_drag",
        }
    }
}

impl Display for EditorError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(err) => write!(f, "{err}"),
            Self::History(err) => write!(f, "{err}"),
            Self::Model(err) => write!(f, "{err}"),
            Self::Config(err) => write!(f, "{err}"),
            Self::NoActiveDrag => write!(f, "no drag in progress for this element"),
        }
    }
}

impl Error for EditorError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::History(err) => Some(err),
            Self::Model(err) => Some(err),
            Self::Config(err) => Some(err),
            Self::NoActiveDrag => None,
        }
    }
}

impl From<StoreError> for EditorError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<HistoryError> for EditorError {
    fn from(value: HistoryError) -> Self {
        Self::History(value)
    }
}

impl From<ModelError> for EditorError {
    fn from(value: ModelError) -> Self {
        Self::Model(value)
    }
}

impl From<DefinitionConfigError> for EditorError {
    fn from(value: DefinitionConfigError) -> Self {
        Self::Config(value)
    }
}

/// One pointer-move event from the drag collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DragMove {
    pub element_id: ElementId,
    pub delta_x: f64,
    pub delta_y: f64,
}

/// Handle for a validation computed off the editing thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationTicket {
    pub revision: u64,
    pub element_id: ElementId,
}

/// What happened to an async validation result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AsyncValidationOutcome {
    Applied(FieldResult),
    /// The snapshot changed after the ticket was issued.
    Stale,
    /// The element was deleted after the ticket was issued.
    ElementGone,
}

/// One element as the renderer should paint it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedElement {
    pub element: FormElement,
    pub geometry: ResolvedGeometry,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation: Option<FieldResult>,
}

/// Everything the renderer needs for one paint.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderFrame {
    pub revision: u64,
    pub layout_mode: LayoutMode,
    pub breakpoint: Breakpoint,
    pub dragging: bool,
    pub elements: Vec<RenderedElement>,
}

#[derive(Debug, Clone)]
struct DragState {
    element_id: ElementId,
    preview: Arc<FormDefinition>,
    moves: u32,
}

/// One editing session over a single form definition.
pub struct EditorSession {
    config: EngineConfig,
    store: ElementStore,
    history: HistoryManager,
    drag: Option<DragState>,
    validator: FormValidator,
    cache: ValidationCache,
    pending: BTreeSet<ValidationTicket>,
}

impl EditorSession {
    /// Opens a session on `definition`; history starts at that snapshot.
    pub fn new(definition: FormDefinition, config: EngineConfig) -> Self {
        let config = config.normalized();
        let store = ElementStore::new(definition).with_duplicate_offset(config.duplicate_offset);
        let history = HistoryManager::new(store.snapshot(), config.history_depth);
        let validator = FormValidator::from_config(&config);
        info!(
            "event=session_open module=service status=ok history_depth={} elements={}",
            config.history_depth,
            store.snapshot().len()
        );
        Self {
            config,
            store,
            history,
            drag: None,
            validator,
            cache: ValidationCache::new(),
            pending: BTreeSet::new(),
        }
    }

    /// Opens a session on an empty definition named `name`.
    pub fn empty(name: impl Into<String>, config: EngineConfig) -> Self {
        Self::new(FormDefinition::new(name), config)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Committed snapshot; excludes any in-progress drag.
    pub fn snapshot(&self) -> Arc<FormDefinition> {
        self.store.snapshot()
    }

    /// In-progress drag preview, if a drag is active.
    pub fn drag_preview(&self) -> Option<Arc<FormDefinition>> {
        self.drag.as_ref().map(|drag| Arc::clone(&drag.preview))
    }

    pub fn active_drag(&self) -> Option<ElementId> {
        self.drag.as_ref().map(|drag| drag.element_id)
    }

    pub fn revision(&self) -> u64 {
        self.store.revision()
    }

    pub fn can_undo(&self) -> bool {
        self.drag.is_some() || self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.drag.is_none() && self.history.can_redo()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    // Structural operations: one history entry each.

    pub fn add(&mut self, kind: ElementKind) -> EditorResult<ElementId> {
        self.settle_drag();
        let (snapshot, id) = self.store.add(kind);
        self.history.commit(snapshot);
        Ok(id)
    }

    pub fn add_named(&mut self, kind: &str) -> EditorResult<ElementId> {
        let kind = kind.parse::<ElementKind>().map_err(StoreError::from)?;
        self.add(kind)
    }

    pub fn update(&mut self, id: ElementId, patch: &ElementPatch) -> EditorResult<()> {
        self.settle_drag();
        let snapshot = self.store.update(id, patch)?;
        self.history.commit(snapshot);
        Ok(())
    }

    /// Deletes `id`, cancelling its pending tickets and cached result.
    pub fn delete(&mut self, id: ElementId) -> EditorResult<()> {
        if self.active_drag() == Some(id) {
            if let Some(drag) = self.drag.take() {
                debug!(
                    "event=drag_discard module=service status=ok element_id={} moves={}",
                    id, drag.moves
                );
            }
        } else {
            self.settle_drag();
        }
        let snapshot = self.store.delete(id)?;
        self.history.commit(snapshot);
        self.pending.retain(|ticket| ticket.element_id != id);
        self.cache.invalidate(id);
        Ok(())
    }

    /// Duplicates `id`; returns the clone's id.
    pub fn duplicate(&mut self, id: ElementId) -> EditorResult<ElementId> {
        self.settle_drag();
        let (snapshot, clone_id) = self.store.duplicate(id)?;
        self.history.commit(snapshot);
        Ok(clone_id)
    }

    pub fn reorder(&mut self, from: usize, to: usize) -> EditorResult<()> {
        self.settle_drag();
        let snapshot = self.store.reorder(from, to)?;
        self.history.commit(snapshot);
        Ok(())
    }

    /// Moves `id` to the index currently held by `over_id`.
    pub fn reorder_by_id(&mut self, id: ElementId, over_id: ElementId) -> EditorResult<()> {
        self.settle_drag();
        let current = self.store.snapshot();
        let from = current
            .index_of(id)
            .ok_or(StoreError::ElementNotFound(id))?;
        let to = current
            .index_of(over_id)
            .ok_or(StoreError::ElementNotFound(over_id))?;
        if from == to {
            return Ok(());
        }
        self.reorder(from, to)
    }

    // Drag transaction.

    /// Accumulates a drag delta into the preview.
    ///
    /// A move for a different element commits the previous drag first.
    pub fn apply_drag(&mut self, id: ElementId, dx: f64, dy: f64) -> EditorResult<()> {
        if self.active_drag().is_some_and(|active| active != id) {
            self.settle_drag();
        }
        let base = match &self.drag {
            Some(drag) => Arc::clone(&drag.preview),
            None => self.store.snapshot(),
        };
        let preview = Arc::new(self.store.apply_drag(&base, id, dx, dy)?);
        match &mut self.drag {
            Some(drag) => {
                drag.preview = preview;
                drag.moves += 1;
            }
            None => {
                self.drag = Some(DragState {
                    element_id: id,
                    preview,
                    moves: 1,
                });
            }
        }
        Ok(())
    }

    pub fn drag_move(&mut self, event: DragMove) -> EditorResult<()> {
        self.apply_drag(event.element_id, event.delta_x, event.delta_y)
    }

    /// Commits the drag on `id` as one history entry.
    ///
    /// # Errors
    /// - `EditorError::NoActiveDrag` when `id` is not being dragged.
    pub fn drag_end(&mut self, id: ElementId) -> EditorResult<()> {
        if self.active_drag() != Some(id) {
            warn!(
                "event=drag_end module=service status=error error_code=no_active_drag element_id={}",
                id
            );
            return Err(EditorError::NoActiveDrag);
        }
        self.settle_drag();
        Ok(())
    }

    fn settle_drag(&mut self) {
        let Some(drag) = self.drag.take() else {
            return;
        };
        let snapshot = self.store.restore(drag.preview);
        self.history.commit(snapshot);
        debug!(
            "event=drag_commit module=service status=ok element_id={} moves={} revision={}",
            drag.element_id,
            drag.moves,
            self.store.revision()
        );
    }

    // History.

    pub fn undo(&mut self) -> EditorResult<()> {
        self.settle_drag();
        let snapshot = self.history.undo()?;
        self.store.restore(snapshot);
        Ok(())
    }

    pub fn redo(&mut self) -> EditorResult<()> {
        self.settle_drag();
        let snapshot = self.history.redo()?;
        self.store.restore(snapshot);
        Ok(())
    }

    // Validation.

    /// Registers a cross-field rule; clears cached results and pending
    /// tickets computed under the old rules.
    pub fn add_rule(&mut self, rule: CrossFieldRule) {
        self.validator.add_rule(rule);
        self.forget_results();
    }

    pub fn remove_rule(&mut self, name: &str) -> bool {
        let removed = self.validator.remove_rule(name);
        if removed {
            self.forget_results();
        }
        removed
    }

    fn forget_results(&mut self) {
        self.cache.clear();
        self.pending.clear();
    }

    pub fn rules(&self) -> &[CrossFieldRule] {
        self.validator.rules()
    }

    /// Validates the committed snapshot, reusing cached entries.
    pub fn validate(&mut self, target: ValidationTarget) -> ValidationReport {
        let revision = self.store.revision();
        let snapshot = self.store.snapshot();
        let wanted: Vec<ElementId> = match target {
            ValidationTarget::All => snapshot
                .elements
                .iter()
                .filter(|element| element.kind.is_field())
                .map(|element| element.id)
                .collect(),
            ValidationTarget::Element(id) => vec![id],
        };

        let cached: Option<BTreeMap<ElementId, FieldResult>> = wanted
            .iter()
            .map(|id| self.cache.get(revision, *id).map(|result| (*id, result.clone())))
            .collect();
        if let Some(results) = cached {
            return ValidationReport::new(results);
        }

        let report = self.validator.validate(&snapshot, target);
        for (id, result) in report.results() {
            self.cache.insert(revision, *id, result.clone());
        }
        debug!(
            "event=validate module=service status=ok fields={} invalid={} revision={}",
            report.len(),
            report.invalid_ids().len(),
            revision
        );
        report
    }

    /// Last result stored for `id` at the current revision.
    pub fn get_validation(&self, id: ElementId) -> Option<FieldResult> {
        self.cache.get(self.store.revision(), id).cloned()
    }

    /// Issues a ticket plus the snapshot to validate off-thread.
    ///
    /// Tickets issued at older revisions are dropped; they can only be stale.
    ///
    /// # Errors
    /// - `StoreError::ElementNotFound` when `id` is absent.
    pub fn begin_async_validation(
        &mut self,
        id: ElementId,
    ) -> EditorResult<(ValidationTicket, Arc<FormDefinition>, FormValidator)> {
        let snapshot = self.store.snapshot();
        if snapshot.element(id).is_none() {
            return Err(StoreError::ElementNotFound(id).into());
        }
        let revision = self.store.revision();
        self.pending.retain(|ticket| ticket.revision == revision);
        let ticket = ValidationTicket {
            revision,
            element_id: id,
        };
        self.pending.insert(ticket);
        Ok((ticket, snapshot, self.validator.clone()))
    }

    /// Applies an off-thread result if its ticket is still current.
    pub fn complete_async_validation(
        &mut self,
        ticket: ValidationTicket,
        result: FieldResult,
    ) -> AsyncValidationOutcome {
        let was_pending = self.pending.remove(&ticket);
        if self.store.snapshot().element(ticket.element_id).is_none() {
            debug!(
                "event=async_validation module=service status=rejected reason=element_gone element_id={}",
                ticket.element_id
            );
            return AsyncValidationOutcome::ElementGone;
        }
        if !was_pending || ticket.revision != self.store.revision() {
            debug!(
                "event=async_validation module=service status=rejected reason=stale element_id={} ticket_revision={} revision={}",
                ticket.element_id,
                ticket.revision,
                self.store.revision()
            );
            return AsyncValidationOutcome::Stale;
        }
        self.cache
            .insert(ticket.revision, ticket.element_id, result.clone());
        AsyncValidationOutcome::Applied(result)
    }

    pub fn pending_validations(&self) -> usize {
        self.pending.len()
    }

    // Rendering and persistence.

    /// Resolves every element for painting; shows the drag preview if any.
    pub fn render_frame(&self, mode: LayoutMode, breakpoint: Breakpoint) -> RenderFrame {
        let revision = self.store.revision();
        let definition = self.drag_preview().unwrap_or_else(|| self.store.snapshot());
        let ctx = LayoutContext::new(mode, breakpoint, self.config.grid_columns);
        let elements = definition
            .elements
            .iter()
            .zip(layout::resolve_all(&definition, &ctx))
            .map(|(element, geometry)| RenderedElement {
                element: element.clone(),
                geometry,
                validation: self.cache.get(revision, element.id).cloned(),
            })
            .collect();
        RenderFrame {
            revision,
            layout_mode: mode,
            breakpoint,
            dragging: self.drag.is_some(),
            elements,
        }
    }

    /// Checks the committed definition and serializes it.
    ///
    /// # Errors
    /// - `EditorError::Config` when the definition is misconfigured.
    pub fn export_json(&mut self) -> EditorResult<String> {
        self.settle_drag();
        let snapshot = self.store.snapshot();
        if let Err(err) = check_definition(&snapshot, self.validator.rules()) {
            warn!("event=definition_export module=service status=error error_code=invalid_configuration");
            return Err(err.into());
        }
        let json = snapshot.to_json()?;
        info!(
            "event=definition_export module=service status=ok elements={} bytes={}",
            snapshot.len(),
            json.len()
        );
        Ok(json)
    }

    /// Replaces the definition and restarts history from it.
    ///
    /// # Errors
    /// - `EditorError::Model` when the payload is malformed or ids repeat.
    pub fn import_json(&mut self, payload: &str) -> EditorResult<()> {
        self.settle_drag();
        let definition = FormDefinition::from_json(payload).map_err(|err| {
            warn!("event=definition_import module=service status=error error_code=invalid_definition");
            err
        })?;
        let count = definition.len();
        let snapshot = self.store.replace(definition)?;
        self.history.reset(snapshot);
        self.forget_results();
        info!(
            "event=definition_import module=service status=ok elements={} revision={}",
            count,
            self.store.revision()
        );
        Ok(())
    }
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::empty("Untitled form", EngineConfig::default())
    }
}
