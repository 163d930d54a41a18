//! Plain-text reports.

use regal_diagnostic::emitter::{ColorMode, DiagnosticEmitter, TerminalEmitter};

use crate::AnalysisOutput;

/// Render every diagnostic of `output` against `source`, followed by a
/// summary line. An accepted unit without warnings renders as `""`.
pub fn render_report(output: &AnalysisOutput, source: &str) -> String {
    let mut emitter =
        TerminalEmitter::with_color_mode(Vec::new(), ColorMode::Never, false).with_source(source);
    emitter.emit_all(&output.diagnostics);
    emitter.emit_summary(output.error_count(), output.warning_count());
    String::from_utf8_lossy(&emitter.into_inner()).into_owned()
}
