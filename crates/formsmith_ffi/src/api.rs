//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose editing sessions to Dart via FRB as sync, use-case-level calls.
//! - Translate core errors into flat envelopes with stable error codes.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Structured payloads cross the boundary as UTF-8 JSON strings.
//! - A session is only reachable through the id returned by `session_open`.

use formsmith_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    Breakpoint, CrossFieldRule, EditorError, EditorSession, ElementId, ElementPatch, EngineConfig,
    LayoutMode, ValidationTarget,
};
use log::warn;
use std::collections::BTreeMap;
use std::sync::{Mutex, OnceLock};
use uuid::Uuid;

static SESSIONS: OnceLock<Mutex<BTreeMap<String, EditorSession>>> = OnceLock::new();

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Result envelope for opening a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOpenResponse {
    /// Whether the session was created.
    pub ok: bool,
    /// Opaque session handle for subsequent calls.
    pub session_id: Option<String>,
    /// Human-readable response message for diagnostics.
    pub message: String,
}

/// Generic action response envelope for editing commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorActionResponse {
    /// Whether operation succeeded.
    pub ok: bool,
    /// Element created or affected by the operation, when there is one.
    pub element_id: Option<String>,
    /// Snapshot revision after the call.
    pub revision: u64,
    /// Stable error code on failure, empty on success.
    pub error_code: String,
    /// Human-readable response message for diagnostics/UI.
    pub message: String,
}

/// Envelope for calls that return a JSON document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorJsonResponse {
    pub ok: bool,
    /// JSON payload on success.
    pub json: Option<String>,
    pub error_code: String,
    pub message: String,
}

impl EditorActionResponse {
    fn success(message: impl Into<String>, element_id: Option<ElementId>, revision: u64) -> Self {
        Self {
            ok: true,
            element_id: element_id.map(|id| id.to_string()),
            revision,
            error_code: String::new(),
            message: message.into(),
        }
    }

    fn failure(error_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            ok: false,
            element_id: None,
            revision: 0,
            error_code: error_code.into(),
            message: message.into(),
        }
    }
}

impl EditorJsonResponse {
    fn success(json: String) -> Self {
        Self {
            ok: true,
            json: Some(json),
            error_code: String::new(),
            message: String::new(),
        }
    }

    fn failure(error_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            ok: false,
            json: None,
            error_code: error_code.into(),
            message: message.into(),
        }
    }
}

/// Opens an editing session on an empty definition.
///
/// Input semantics:
/// - `name`: display name of the new form; blank becomes `Untitled form`.
/// - `config_json`: optional engine config JSON; absent keys keep defaults.
///
/// # FFI contract
/// - Never panics; invalid config returns `ok=false`.
#[flutter_rust_bridge::frb(sync)]
pub fn session_open(name: String, config_json: Option<String>) -> SessionOpenResponse {
    let config = match config_json.as_deref().map(EngineConfig::from_json) {
        None => EngineConfig::default(),
        Some(Ok(config)) => config,
        Some(Err(err)) => {
            return SessionOpenResponse {
                ok: false,
                session_id: None,
                message: err,
            };
        }
    };
    let name = match name.trim() {
        "" => "Untitled form".to_string(),
        trimmed => trimmed.to_string(),
    };
    let session_id = Uuid::new_v4().to_string();
    let result = with_registry(|sessions| {
        sessions.insert(session_id.clone(), EditorSession::empty(name, config));
    });
    match result {
        Ok(()) => SessionOpenResponse {
            ok: true,
            session_id: Some(session_id),
            message: "Session opened.".to_string(),
        },
        Err(message) => SessionOpenResponse {
            ok: false,
            session_id: None,
            message,
        },
    }
}

/// Drops a session and everything it holds.
#[flutter_rust_bridge::frb(sync)]
pub fn session_close(session_id: String) -> EditorActionResponse {
    match with_registry(|sessions| sessions.remove(&session_id).is_some()) {
        Ok(true) => EditorActionResponse::success("Session closed.", None, 0),
        Ok(false) => unknown_session(),
        Err(message) => EditorActionResponse::failure("registry_unavailable", message),
    }
}

/// Appends a default element of wire kind `kind` (`text`, `number`, ...).
#[flutter_rust_bridge::frb(sync)]
pub fn session_add_element(session_id: String, kind: String) -> EditorActionResponse {
    with_session_action(&session_id, "session_add_element", |session| {
        let id = session.add_named(kind.trim())?;
        Ok(("Element added.", Some(id)))
    })
}

/// Applies a partial-update JSON object to `element_id`.
#[flutter_rust_bridge::frb(sync)]
pub fn session_update_element(
    session_id: String,
    element_id: String,
    patch_json: String,
) -> EditorActionResponse {
    let Some(id) = parse_element_id(&element_id) else {
        return invalid_element_id(&element_id);
    };
    let patch = match ElementPatch::from_json(&patch_json) {
        Ok(patch) => patch,
        Err(err) => {
            return EditorActionResponse::failure("invalid_patch", format!("invalid patch: {err}"))
        }
    };
    with_session_action(&session_id, "session_update_element", |session| {
        session.update(id, &patch)?;
        Ok(("Element updated.", Some(id)))
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn session_delete_element(session_id: String, element_id: String) -> EditorActionResponse {
    let Some(id) = parse_element_id(&element_id) else {
        return invalid_element_id(&element_id);
    };
    with_session_action(&session_id, "session_delete_element", |session| {
        session.delete(id)?;
        Ok(("Element deleted.", Some(id)))
    })
}

/// Duplicates `element_id`; the response carries the clone's id.
#[flutter_rust_bridge::frb(sync)]
pub fn session_duplicate_element(session_id: String, element_id: String) -> EditorActionResponse {
    let Some(id) = parse_element_id(&element_id) else {
        return invalid_element_id(&element_id);
    };
    with_session_action(&session_id, "session_duplicate_element", |session| {
        let clone_id = session.duplicate(id)?;
        Ok(("Element duplicated.", Some(clone_id)))
    })
}

/// Moves `element_id` into the slot currently held by `over_element_id`.
#[flutter_rust_bridge::frb(sync)]
pub fn session_reorder_element(
    session_id: String,
    element_id: String,
    over_element_id: String,
) -> EditorActionResponse {
    let Some(id) = parse_element_id(&element_id) else {
        return invalid_element_id(&element_id);
    };
    let Some(over_id) = parse_element_id(&over_element_id) else {
        return invalid_element_id(&over_element_id);
    };
    with_session_action(&session_id, "session_reorder_element", |session| {
        session.reorder_by_id(id, over_id)?;
        Ok(("Element moved.", Some(id)))
    })
}

/// Feeds one pointer-move delta into the active drag preview.
///
/// # FFI contract
/// - Does not create a history entry; see `session_drag_end`.
#[flutter_rust_bridge::frb(sync)]
pub fn session_drag_move(
    session_id: String,
    element_id: String,
    delta_x: f64,
    delta_y: f64,
) -> EditorActionResponse {
    let Some(id) = parse_element_id(&element_id) else {
        return invalid_element_id(&element_id);
    };
    with_session_action(&session_id, "session_drag_move", |session| {
        session.apply_drag(id, delta_x, delta_y)?;
        Ok(("Drag updated.", Some(id)))
    })
}

/// Commits the active drag on `element_id` as one history entry.
#[flutter_rust_bridge::frb(sync)]
pub fn session_drag_end(session_id: String, element_id: String) -> EditorActionResponse {
    let Some(id) = parse_element_id(&element_id) else {
        return invalid_element_id(&element_id);
    };
    with_session_action(&session_id, "session_drag_end", |session| {
        session.drag_end(id)?;
        Ok(("Drag committed.", Some(id)))
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn session_undo(session_id: String) -> EditorActionResponse {
    with_session_action(&session_id, "session_undo", |session| {
        session.undo()?;
        Ok(("Undone.", None))
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn session_redo(session_id: String) -> EditorActionResponse {
    with_session_action(&session_id, "session_redo", |session| {
        session.redo()?;
        Ok(("Redone.", None))
    })
}

/// Registers a cross-field rule given as JSON.
#[flutter_rust_bridge::frb(sync)]
pub fn session_add_rule(session_id: String, rule_json: String) -> EditorActionResponse {
    let rule = match serde_json::from_str::<CrossFieldRule>(&rule_json) {
        Ok(rule) => rule,
        Err(err) => {
            return EditorActionResponse::failure("invalid_rule", format!("invalid rule: {err}"))
        }
    };
    with_session_action(&session_id, "session_add_rule", |session| {
        let target = rule.target;
        session.add_rule(rule);
        Ok(("Rule registered.", Some(target)))
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn session_remove_rule(session_id: String, name: String) -> EditorActionResponse {
    with_session_action(&session_id, "session_remove_rule", |session| {
        if session.remove_rule(name.trim()) {
            Ok(("Rule removed.", None))
        } else {
            Ok(("No rule with that name.", None))
        }
    })
}

/// Validates the whole form, or one element when `element_id` is set.
///
/// Returns the `{ elementId: { valid, message? } }` report as JSON.
#[flutter_rust_bridge::frb(sync)]
pub fn session_validate(session_id: String, element_id: Option<String>) -> EditorJsonResponse {
    let target = match element_id.as_deref() {
        None => ValidationTarget::All,
        Some(raw) => match parse_element_id(raw) {
            Some(id) => ValidationTarget::Element(id),
            None => {
                return EditorJsonResponse::failure(
                    "invalid_element_id",
                    format!("invalid element id: {raw}"),
                )
            }
        },
    };
    with_session_json(&session_id, |session| {
        let report = session.validate(target);
        serde_json::to_string(&report).map_err(|err| ("serialization_failed", err.to_string()))
    })
}

/// Resolves layout for one paint.
///
/// Input semantics:
/// - `layout_mode`: one of `free|grid|columns|rows`.
/// - `viewport_width`: canvas width in px, classified into a breakpoint.
#[flutter_rust_bridge::frb(sync)]
pub fn session_render_frame(
    session_id: String,
    layout_mode: String,
    viewport_width: u32,
) -> EditorJsonResponse {
    let Some(mode) = parse_layout_mode(&layout_mode) else {
        return EditorJsonResponse::failure(
            "invalid_layout_mode",
            format!("unsupported layout mode: {layout_mode}"),
        );
    };
    let breakpoint = Breakpoint::from_viewport_width(viewport_width);
    with_session_json(&session_id, |session| {
        let frame = session.render_frame(mode, breakpoint);
        serde_json::to_string(&frame).map_err(|err| ("serialization_failed", err.to_string()))
    })
}

/// Exports the committed definition as persistence JSON.
#[flutter_rust_bridge::frb(sync)]
pub fn session_export(session_id: String) -> EditorJsonResponse {
    with_session_json(&session_id, |session| {
        session
            .export_json()
            .map_err(|err| (err.code(), err.to_string()))
    })
}

/// Replaces the session's definition with `payload`; history restarts.
#[flutter_rust_bridge::frb(sync)]
pub fn session_import(session_id: String, payload: String) -> EditorActionResponse {
    with_session_action(&session_id, "session_import", |session| {
        session.import_json(&payload)?;
        Ok(("Definition imported.", None))
    })
}

fn with_registry<T>(
    f: impl FnOnce(&mut BTreeMap<String, EditorSession>) -> T,
) -> Result<T, String> {
    let registry = SESSIONS.get_or_init(|| Mutex::new(BTreeMap::new()));
    let mut sessions = registry
        .lock()
        .map_err(|_| "session registry is unavailable".to_string())?;
    Ok(f(&mut sessions))
}

fn with_session_action(
    session_id: &str,
    operation: &str,
    f: impl FnOnce(&mut EditorSession) -> Result<(&'static str, Option<ElementId>), EditorError>,
) -> EditorActionResponse {
    let outcome = with_registry(|sessions| {
        sessions.get_mut(session_id).map(|session| {
            let result = f(session);
            (result, session.revision())
        })
    });
    match outcome {
        Err(message) => EditorActionResponse::failure("registry_unavailable", message),
        Ok(None) => unknown_session(),
        Ok(Some((Ok((message, element_id)), revision))) => {
            EditorActionResponse::success(message, element_id, revision)
        }
        Ok(Some((Err(err), revision))) => {
            warn!(
                "event=ffi_call module=ffi status=error operation={} error_code={}",
                operation,
                err.code()
            );
            EditorActionResponse {
                revision,
                ..EditorActionResponse::failure(err.code(), format!("{operation} failed: {err}"))
            }
        }
    }
}

fn with_session_json(
    session_id: &str,
    f: impl FnOnce(&mut EditorSession) -> Result<String, (&'static str, String)>,
) -> EditorJsonResponse {
    match with_registry(|sessions| sessions.get_mut(session_id).map(f)) {
        Err(message) => EditorJsonResponse::failure("registry_unavailable", message),
        Ok(None) => EditorJsonResponse::failure("unknown_session", "unknown session"),
        Ok(Some(Ok(json))) => EditorJsonResponse::success(json),
        Ok(Some(Err((code, message)))) => EditorJsonResponse::failure(code, message),
    }
}

fn parse_element_id(raw: &str) -> Option<ElementId> {
    Uuid::parse_str(raw.trim()).ok()
}

fn parse_layout_mode(raw: &str) -> Option<LayoutMode> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "free" => Some(LayoutMode::Free),
        "grid" => Some(LayoutMode::Grid),
        "columns" => Some(LayoutMode::Columns),
        "rows" => Some(LayoutMode::Rows),
        _ => None,
    }
}

fn unknown_session() -> EditorActionResponse {
    EditorActionResponse::failure("unknown_session", "unknown session")
}

fn invalid_element_id(raw: &str) -> EditorActionResponse {
    EditorActionResponse::failure("invalid_element_id", format!("invalid element id: {raw}"))
}

#[cfg(test)]
mod tests {
    use super::{
        core_version, init_logging, ping, session_add_element, session_add_rule, session_close,
        session_delete_element, session_drag_end, session_drag_move, session_export,
        session_import, session_open, session_render_frame, session_undo, session_update_element,
        session_validate,
    };
    use serde_json::Value;

    fn open() -> String {
        let response = session_open("Signup".to_string(), None);
        assert!(response.ok, "{}", response.message);
        response.session_id.expect("session id")
    }

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_unsupported_level() {
        let error = init_logging("verbose".to_string(), "tmp/logs".to_string());
        assert!(!error.is_empty());
    }

    #[test]
    fn open_rejects_malformed_config() {
        let response = session_open("x".to_string(), Some("{\"historyDepth\": \"ten\"}".into()));
        assert!(!response.ok);
        assert!(response.session_id.is_none());
    }

    #[test]
    fn unknown_session_and_kind_are_reported() {
        let response = session_add_element("missing".to_string(), "text".to_string());
        assert_eq!(response.error_code, "unknown_session");

        let session = open();
        let response = session_add_element(session.clone(), "hologram".to_string());
        assert!(!response.ok);
        assert_eq!(response.error_code, "unknown_kind");
        assert!(session_close(session).ok);
    }

    #[test]
    fn edit_validate_and_undo_flow() {
        let session = open();
        let added = session_add_element(session.clone(), "text".to_string());
        assert!(added.ok, "{}", added.message);
        let element_id = added.element_id.expect("element id");

        let updated = session_update_element(
            session.clone(),
            element_id.clone(),
            r#"{"required": true}"#.to_string(),
        );
        assert!(updated.ok, "{}", updated.message);

        let report = session_validate(session.clone(), None);
        let report: Value = serde_json::from_str(&report.json.expect("report")).unwrap();
        assert_eq!(report[&element_id]["message"], "required");

        assert!(session_undo(session.clone()).ok);
        let report = session_validate(session.clone(), Some(element_id.clone()));
        let report: Value = serde_json::from_str(&report.json.expect("report")).unwrap();
        assert_eq!(report[&element_id]["valid"], true);

        let invalid = session_validate(session.clone(), Some("nope".to_string()));
        assert_eq!(invalid.error_code, "invalid_element_id");
        assert!(session_close(session).ok);
    }

    #[test]
    fn drag_commits_once_and_renders_preview() {
        let session = open();
        let element_id = session_add_element(session.clone(), "button".to_string())
            .element_id
            .expect("element id");
        let before = session_drag_move(session.clone(), element_id.clone(), 12.0, 4.0);
        assert!(before.ok);
        assert!(session_drag_move(session.clone(), element_id.clone(), 8.0, 0.0).ok);

        let frame = session_render_frame(session.clone(), "free".to_string(), 1280);
        let frame: Value = serde_json::from_str(&frame.json.expect("frame")).unwrap();
        assert_eq!(frame["dragging"], true);
        assert_eq!(frame["elements"][0]["geometry"]["placement"]["x"], 20.0);

        let ended = session_drag_end(session.clone(), element_id.clone());
        assert!(ended.ok);
        assert_eq!(ended.revision, before.revision + 1);
        let again = session_drag_end(session.clone(), element_id);
        assert_eq!(again.error_code, "no_active_drag");

        let bad_mode = session_render_frame(session.clone(), "masonry".to_string(), 1280);
        assert_eq!(bad_mode.error_code, "invalid_layout_mode");
        assert!(session_close(session).ok);
    }

    #[test]
    fn export_import_round_trip_between_sessions() {
        let source = open();
        let element_id = session_add_element(source.clone(), "number".to_string())
            .element_id
            .expect("element id");
        session_add_rule(
            source.clone(),
            format!(
                r#"{{"name":"positive","target":"{element_id}","dependsOn":[],"check":{{"kind":"expression","expression":"value > 0"}},"message":"Must be positive"}}"#
            ),
        );
        let exported = session_export(source.clone());
        assert!(exported.ok, "{}", exported.message);
        let payload = exported.json.expect("export json");

        let target = open();
        let imported = session_import(target.clone(), payload.clone());
        assert!(imported.ok, "{}", imported.message);
        assert_eq!(session_export(target.clone()).json, Some(payload));
        assert_eq!(session_undo(target.clone()).error_code, "nothing_to_undo");

        assert!(session_delete_element(source.clone(), element_id).ok);
        let broken = session_import(target.clone(), "not json".to_string());
        assert_eq!(broken.error_code, "invalid_definition");
        assert!(session_close(source).ok);
        assert!(session_close(target).ok);
    }
}
