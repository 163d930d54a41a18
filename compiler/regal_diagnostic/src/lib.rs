//! Diagnostic system for the Regal safety analyzer.
//!
//! Every violation the analyzer finds becomes a [`Diagnostic`]:
//! - Error codes for searchability (each code names one safety rule)
//! - Clear messages (what went wrong)
//! - Primary span (where it went wrong)
//! - Context labels (why it's wrong, e.g. where a conflicting borrow began)
//! - Suggestions (how to fix)
//!
//! # Error Guarantees
//!
//! [`ErrorGuaranteed`] is type-level proof that at least one error was
//! emitted. The driver's verdict is `Result<(), ErrorGuaranteed>`, so a
//! rejected unit can never come back without a reported error.

mod diagnostic;
pub mod emitter;
mod error_code;
mod guarantee;
pub mod queue;
pub mod span_utils;

pub use diagnostic::{Diagnostic, Label, Severity};
pub use error_code::ErrorCode;
pub use guarantee::ErrorGuaranteed;
pub use queue::{DiagnosticConfig, DiagnosticQueue};
