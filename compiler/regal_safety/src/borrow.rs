//! Loans and the exclusivity rule.
//!
//! A loan records one `&place` expression: the borrowed path, whether the
//! reference is mutable, and where it was taken. Loans live in a
//! per-function [`LoanTable`]; the flow state only stores loan IDs in the
//! reference facts of the places holding them. A loan is live while some
//! holder still needs it (see [`crate::liveness::LastUse::holds`]) or while
//! the statement that created it is running.
//!
//! Two live loans conflict when their paths overlap and at least one of
//! them is mutable.

use std::fmt;

use regal_ir::{Mutability, PlacePath, Projection, Span, StmtId};

#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LoanId(u32);

impl LoanId {
    #[inline]
    pub const fn new(raw: u32) -> Self {
        LoanId(raw)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for LoanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LoanId({})", self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Loan {
    pub path: PlacePath,
    pub kind: Mutability,
    pub span: Span,
    pub issued: StmtId,
}

impl Loan {
    pub fn is_mutable(&self) -> bool {
        self.kind == Mutability::Mutable
    }

    /// Whether `self` and `other` may not be live at the same time.
    pub fn conflicts_with(&self, other: &Loan) -> bool {
        (self.is_mutable() || other.is_mutable()) && paths_overlap(&self.path, &other.path)
    }
}

/// Whether two paths may name overlapping storage.
///
/// One must be a prefix of the other. Distinct fields are disjoint; index
/// projections always overlap because indices are not compared.
pub fn paths_overlap(a: &PlacePath, b: &PlacePath) -> bool {
    a.root == b.root
        && a
            .projections
            .iter()
            .zip(b.projections.iter())
            .all(|pair| match pair {
                (Projection::Field(x), Projection::Field(y)) => x == y,
                (Projection::Deref, Projection::Deref)
                | (Projection::Index(_), Projection::Index(_)) => true,
                _ => false,
            })
}

#[derive(Clone, Debug, Default)]
pub struct LoanTable {
    loans: Vec<Loan>,
}

impl LoanTable {
    pub fn insert(&mut self, loan: Loan) -> LoanId {
        let id = LoanId::new(u32::try_from(self.loans.len()).unwrap_or(u32::MAX));
        self.loans.push(loan);
        id
    }

    #[inline]
    pub fn get(&self, id: LoanId) -> Option<&Loan> {
        self.loans.get(id.index())
    }

    pub fn len(&self) -> usize {
        self.loans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loans.is_empty()
    }
}
