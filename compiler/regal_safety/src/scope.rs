//! Scope tree.
//!
//! Scopes live in a flat vector and refer to their parent by index. A scope
//! is sealed when the walk leaves it and is never reopened; nothing is ever
//! removed, so a [`ScopeId`] stays valid for the whole analysis.

use std::fmt;

use regal_ir::Span;

/// Index of a scope in a [`ScopeTree`].
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(u32);

impl ScopeId {
    /// The module (root) scope.
    pub const MODULE: ScopeId = ScopeId(0);

    #[inline]
    pub const fn new(raw: u32) -> Self {
        ScopeId(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ScopeId({})", self.0)
    }
}

/// What introduced a scope.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ScopeKind {
    Module,
    /// A function body; parameters are declared here.
    Function,
    Block,
    /// A `while` body.
    Loop,
    /// An `unsafe { }` escape hatch.
    Unsafe,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Scope {
    pub parent: Option<ScopeId>,
    pub depth: u32,
    pub kind: ScopeKind,
    pub sealed: bool,
    pub span: Span,
}

/// Arena-indexed tree of lexical scopes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScopeTree {
    scopes: Vec<Scope>,
}

impl Default for ScopeTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeTree {
    /// A tree holding only the module scope.
    pub fn new() -> Self {
        ScopeTree {
            scopes: vec![Scope {
                parent: None,
                depth: 0,
                kind: ScopeKind::Module,
                sealed: false,
                span: Span::DUMMY,
            }],
        }
    }

    /// Add a child of `parent`.
    pub fn push(&mut self, parent: ScopeId, kind: ScopeKind, span: Span) -> ScopeId {
        let depth = self.depth(parent) + 1;
        let id = ScopeId::new(u32::try_from(self.scopes.len()).unwrap_or(u32::MAX));
        self.scopes.push(Scope {
            parent: Some(parent),
            depth,
            kind,
            sealed: false,
            span,
        });
        id
    }

    /// Mark a scope as exited.
    pub fn seal(&mut self, id: ScopeId) {
        if let Some(scope) = self.scopes.get_mut(id.index()) {
            debug_assert!(!scope.sealed, "scope {id:?} sealed twice");
            scope.sealed = true;
        }
    }

    #[inline]
    pub fn get(&self, id: ScopeId) -> Option<&Scope> {
        self.scopes.get(id.index())
    }

    pub fn parent(&self, id: ScopeId) -> Option<ScopeId> {
        self.get(id).and_then(|s| s.parent)
    }

    pub fn depth(&self, id: ScopeId) -> u32 {
        self.get(id).map_or(0, |s| s.depth)
    }

    pub fn kind(&self, id: ScopeId) -> Option<ScopeKind> {
        self.get(id).map(|s| s.kind)
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    /// `id` followed by each enclosing scope up to the module scope.
    pub fn ancestors(&self, id: ScopeId) -> impl Iterator<Item = ScopeId> + '_ {
        std::iter::successors(Some(id), move |s| self.parent(*s))
    }

    /// Whether `ancestor` is `id` or encloses it.
    pub fn is_ancestor_or_equal(&self, ancestor: ScopeId, id: ScopeId) -> bool {
        let target_depth = self.depth(ancestor);
        self.ancestors(id)
            .take_while(|s| self.depth(*s) >= target_depth)
            .any(|s| s == ancestor)
    }

    /// Of two scopes on one ancestor chain, the deeper (shorter-lived) one.
    pub fn deeper(&self, a: ScopeId, b: ScopeId) -> ScopeId {
        if self.depth(b) > self.depth(a) {
            b
        } else {
            a
        }
    }

    /// Whether `id` is inside an escape hatch.
    pub fn in_unsafe(&self, id: ScopeId) -> bool {
        self.ancestors(id)
            .any(|s| self.kind(s) == Some(ScopeKind::Unsafe))
    }

    pub fn iter(&self) -> impl Iterator<Item = (ScopeId, &Scope)> {
        self.scopes
            .iter()
            .enumerate()
            .map(|(i, s)| (ScopeId::new(i as u32), s))
    }
}

#[cfg(test)]
mod tests;
