//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `formsmith_core` linkage.
//! - Drive one short editing flow with deterministic output.

use formsmith_core::{
    Breakpoint, EditorSession, ElementKind, ElementPatch, LayoutMode, ValidationTarget,
};
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("formsmith_core ping={}", formsmith_core::ping());
    println!("formsmith_core version={}", formsmith_core::core_version());
    match run_sample_flow() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("formsmith_cli sample flow failed: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run_sample_flow() -> Result<(), formsmith_core::EditorError> {
    let mut session = EditorSession::default();
    session.add(ElementKind::Title)?;
    let email = session.add(ElementKind::Input)?;
    session.update(
        email,
        &ElementPatch {
            required: Some(true),
            ..ElementPatch::default()
        },
    )?;
    session.apply_drag(email, 40.0, 16.0)?;
    session.drag_end(email)?;

    let report = session.validate(ValidationTarget::All);
    println!(
        "sample revision={} fields={} invalid={}",
        session.revision(),
        report.len(),
        report.invalid_ids().len()
    );

    let frame = session.render_frame(LayoutMode::Free, Breakpoint::Desktop);
    println!("sample rendered={}", frame.elements.len());

    session.undo()?;
    let exported = session.export_json()?;
    println!("sample export_bytes={}", exported.len());
    Ok(())
}
