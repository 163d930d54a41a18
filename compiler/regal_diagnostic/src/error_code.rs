//! Error codes for all analyzer diagnostics.
//!
//! Each code is a unique identifier (e.g., `E0401`) whose first two digits
//! select the analysis that reports it. Every code maps to exactly one
//! safety rule name, used in summaries.

use std::fmt;

/// Error codes for all analyzer diagnostics.
///
/// Format: E#### where the leading digits indicate the analysis:
/// - E01xx: scope and region construction
/// - E02xx: definite initialization
/// - E03xx: escape analysis
/// - E04xx: alias/borrow checking
/// - E05xx: region invalidation
/// - E06xx: nullability
/// - E07xx: bounds checking and constant folding
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, PartialOrd, Ord)]
pub enum ErrorCode {
    /// Region declared twice in visible scopes
    E0101,
    /// Read of a possibly uninitialized place
    E0201,
    /// Reference stored where it would outlive its region
    E0301,
    /// Stack reference returned out of its frame
    E0302,
    /// Conflicting live borrows of the same storage
    E0401,
    /// Use of an arena reference after the arena was reset
    E0501,
    /// Dereference of a possibly-null reference
    E0601,
    /// Constant index outside a static array length
    E0701,
    /// Constant folding exceeded its step budget
    E0702,
}

impl ErrorCode {
    /// Every code, in numeric order.
    pub const ALL: &'static [ErrorCode] = &[
        ErrorCode::E0101,
        ErrorCode::E0201,
        ErrorCode::E0301,
        ErrorCode::E0302,
        ErrorCode::E0401,
        ErrorCode::E0501,
        ErrorCode::E0601,
        ErrorCode::E0701,
        ErrorCode::E0702,
    ];

    /// The code as written in output, e.g. `"E0401"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::E0101 => "E0101",
            ErrorCode::E0201 => "E0201",
            ErrorCode::E0301 => "E0301",
            ErrorCode::E0302 => "E0302",
            ErrorCode::E0401 => "E0401",
            ErrorCode::E0501 => "E0501",
            ErrorCode::E0601 => "E0601",
            ErrorCode::E0701 => "E0701",
            ErrorCode::E0702 => "E0702",
        }
    }

    /// The safety rule this code reports.
    pub fn rule(&self) -> &'static str {
        match self {
            ErrorCode::E0101 => "DuplicateRegion",
            ErrorCode::E0201 => "UseOfUninitialized",
            ErrorCode::E0301 => "RegionEscape",
            ErrorCode::E0302 => "StackEscape",
            ErrorCode::E0401 => "AliasConflict",
            ErrorCode::E0501 => "StaleArenaReference",
            ErrorCode::E0601 => "NullDerefRisk",
            ErrorCode::E0701 => "OutOfBounds",
            ErrorCode::E0702 => "ConstEvalBudgetExceeded",
        }
    }

    /// Whether an `unsafe` block silences this rule.
    ///
    /// Escapes, aliasing and null dereferences are the programmer's
    /// responsibility inside an escape hatch. Initialization, region
    /// declarations, arena staleness, constant out-of-bounds indexing and
    /// folding limits are enforced everywhere.
    pub fn is_suppressible(&self) -> bool {
        matches!(
            self,
            ErrorCode::E0301 | ErrorCode::E0302 | ErrorCode::E0401 | ErrorCode::E0601
        )
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
