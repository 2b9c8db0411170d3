//! Per-function local-variable tables and the analyzer's scope stack

use serde::Serialize;

/// Distance between consecutive stack slots, in bytes
pub const SLOT_SIZE: usize = 8;

/// A local variable (or parameter) bound to a stack slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Local {
    pub name: String,
    /// Bytes from the frame base
    pub offset: usize,
}

/// Ordered mapping from declared name to frame offset.
///
/// Offsets are handed out in declaration order, `SLOT_SIZE` apart, starting
/// at `SLOT_SIZE`. A name can be declared once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LocalTable {
    locals: Vec<Local>,
}

impl LocalTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name` to the next free slot. Returns `None` if already declared.
    pub fn declare(&mut self, name: &str) -> Option<usize> {
        if self.lookup(name).is_some() {
            return None;
        }
        let offset = (self.locals.len() + 1) * SLOT_SIZE;
        self.locals.push(Local {
            name: name.to_string(),
            offset,
        });
        Some(offset)
    }

    pub fn lookup(&self, name: &str) -> Option<usize> {
        self.locals.iter().find(|l| l.name == name).map(|l| l.offset)
    }

    pub fn len(&self) -> usize {
        self.locals.len()
    }

    /// Locals in declaration order (parameters first)
    pub fn iter(&self) -> impl Iterator<Item = &Local> {
        self.locals.iter()
    }
}

/// Stack of local tables, one per function currently being analyzed.
///
/// Only the innermost table is visible: a nested function cannot see the
/// locals of the function enclosing it.
#[derive(Debug, Default)]
pub struct ScopeStack {
    tables: Vec<LocalTable>,
}

impl ScopeStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter a function: install a fresh table
    pub fn enter(&mut self) {
        self.tables.push(LocalTable::new());
    }

    /// Leave a function, returning its finished table
    pub fn exit(&mut self) -> LocalTable {
        self.tables.pop().unwrap_or_default()
    }

    pub fn current(&self) -> Option<&LocalTable> {
        self.tables.last()
    }

    pub fn current_mut(&mut self) -> Option<&mut LocalTable> {
        self.tables.last_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offsets_are_monotonic() {
        let mut table = LocalTable::new();
        assert_eq!(table.declare("a"), Some(8));
        assert_eq!(table.declare("b"), Some(16));
        assert_eq!(table.declare("c"), Some(24));
        assert_eq!(table.lookup("b"), Some(16));
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_duplicate_is_rejected() {
        let mut table = LocalTable::new();
        table.declare("a");
        assert_eq!(table.declare("a"), None);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_scope_stack_hides_outer_tables() {
        let mut scopes = ScopeStack::new();
        scopes.enter();
        scopes.current_mut().unwrap().declare("outer");
        scopes.enter();
        assert_eq!(scopes.current().unwrap().lookup("outer"), None);
        scopes.exit();
        assert_eq!(scopes.current().unwrap().lookup("outer"), Some(8));
        scopes.exit();
        assert!(scopes.current().is_none());
    }
}
