//! Core form-definition builder engine.
//! This crate owns the element model, editing invariants and validation;
//! renderers and persistence live outside it.

pub mod config;
pub mod expr;
pub mod history;
pub mod layout;
pub mod logging;
pub mod model;
pub mod service;
pub mod store;
pub mod validation;

pub use config::EngineConfig;
pub use expr::{CompiledRule, EvalLimits, InvalidExpressionError, ValueContext};
pub use history::{HistoryError, HistoryManager};
pub use layout::{
    Breakpoint, EffectiveWidth, LayoutContext, LayoutMode, Placement, ResolvedGeometry,
};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::definition::{DefinitionId, FormDefinition};
pub use model::element::{ElementId, ElementPosition, ElementStyle, FieldValue, FormElement};
pub use model::kind::{ElementKind, KindFamily};
pub use model::ModelError;
pub use service::editor::{
    AsyncValidationOutcome, DragMove, EditorError, EditorResult, EditorSession, RenderFrame,
    RenderedElement, ValidationTicket,
};
pub use store::{
    ElementPatch, ElementStore, PositionPatch, StoreError, StoreResult, StylePatch,
};
pub use validation::{
    check_definition, CrossFieldCheck, CrossFieldRule, DefinitionConfigError, FieldResult,
    FormValidator, ValidationReport, ValidationTarget,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
