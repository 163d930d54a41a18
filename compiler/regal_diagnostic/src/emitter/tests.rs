use pretty_assertions::assert_eq;
use regal_ir::Span;

use super::*;
use crate::ErrorCode;

fn render(emitter: TerminalEmitter<Vec<u8>>, diags: &[Diagnostic]) -> String {
    let mut emitter = emitter;
    emitter.emit_all(diags);
    let errors = diags.iter().filter(|d| d.is_error()).count();
    emitter.emit_summary(errors, diags.len() - errors);
    String::from_utf8(emitter.into_inner()).unwrap()
}

#[test]
fn test_plain_output_with_source_positions() {
    let source = "int x = 10;\n&stack int a = &x;\n&stack int b = &x;\n";
    let diag = Diagnostic::error(ErrorCode::E0401)
        .with_message("cannot borrow `x` as mutable more than once")
        .with_label(Span::new(46, 48), "second mutable borrow here")
        .with_secondary_label(Span::new(27, 29), "first mutable borrow here");

    let emitter =
        TerminalEmitter::with_color_mode(Vec::new(), ColorMode::Never, false).with_source(source);
    assert_eq!(
        render(emitter, &[diag]),
        "error[E0401]: cannot borrow `x` as mutable more than once\n  \
         --> 3:16: second mutable borrow here\n      \
         2:16: first mutable borrow here\n\n\
         error: aborting due to 1 previous error\n"
    );
}

#[test]
fn test_spans_without_source() {
    let diag = Diagnostic::error(ErrorCode::E0701)
        .with_message("index 10 is out of bounds")
        .with_label(Span::new(4, 6), "array has length 5")
        .with_note("valid indices are 0..5");
    let emitter = TerminalEmitter::with_color_mode(Vec::new(), ColorMode::Never, true);
    let out = render(emitter, &[diag]);
    assert!(out.contains("--> 4..6: array has length 5"));
    assert!(out.contains("= note: valid indices are 0..5"));
}

#[test]
fn test_colors_when_enabled() {
    let diag = Diagnostic::error(ErrorCode::E0601).with_message("null");
    let emitter = TerminalEmitter::with_color_mode(Vec::new(), ColorMode::Always, false);
    let out = render(emitter, &[diag]);
    assert!(out.contains("\x1b[1;31merror\x1b[0m"));
}

#[test]
fn test_summary_pluralizes() {
    let diags = vec![
        Diagnostic::error(ErrorCode::E0201).with_message("a"),
        Diagnostic::error(ErrorCode::E0201).with_message("b"),
        Diagnostic::warning(ErrorCode::E0702).with_message("c"),
    ];
    let emitter = TerminalEmitter::with_color_mode(Vec::new(), ColorMode::Never, false);
    let out = render(emitter, &diags);
    assert!(out.ends_with("error: aborting due to 2 previous errors; 1 warning emitted\n"));
}

#[test]
fn test_color_mode_resolution() {
    assert!(ColorMode::Auto.should_use_colors(true));
    assert!(!ColorMode::Auto.should_use_colors(false));
    assert!(ColorMode::Always.should_use_colors(false));
    assert!(!ColorMode::Never.should_use_colors(true));
}
