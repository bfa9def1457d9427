use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

use crate::ast::{SymbolKind, Value};
use crate::error::{ParseError, ParseResult};

pub type SymbolId = usize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    pub declared_at_line: usize,
    /// Constant value, kept only while every write so far was a literal.
    pub value: Option<Value>,
    pub initialized_at_line: Option<usize>,
}

impl Symbol {
    pub fn new(name: String, kind: SymbolKind, line: usize) -> Self {
        Self {
            name,
            kind,
            declared_at_line: line,
            value: None,
            initialized_at_line: None,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized_at_line.is_some()
    }
}

/// Whole-program symbol table. There are no scopes: a name declared anywhere
/// stays declared until the parse ends and can never be declared again.
#[derive(Debug, Default)]
pub struct SymbolTable {
    symbols: Vec<Symbol>,
    names: HashMap<String, SymbolId>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn exists(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }

    /// Insert a new symbol. Fails with `AlreadyDeclared` whatever the kind of
    /// the existing entry.
    pub fn declare(&mut self, name: &str, kind: SymbolKind, line: usize) -> ParseResult<SymbolId> {
        if let Some(existing) = self.lookup(name) {
            return Err(ParseError::AlreadyDeclared {
                name: name.to_string(),
                first_line: existing.declared_at_line,
                line,
            });
        }

        let symbol_id = self.symbols.len();
        self.symbols.push(Symbol::new(name.to_string(), kind, line));
        self.names.insert(name.to_string(), symbol_id);
        debug!(name, %kind, line, "declared symbol");
        Ok(symbol_id)
    }

    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.names.get(name).map(|&id| &self.symbols[id])
    }

    pub fn lookup_mut(&mut self, name: &str) -> Option<&mut Symbol> {
        match self.names.get(name) {
            Some(&id) => self.symbols.get_mut(id),
            None => None,
        }
    }

    /// Record an initializing write. `value` replaces the tracked constant, so
    /// a non-constant write clears it.
    pub fn mark_initialized(&mut self, name: &str, line: usize, value: Option<Value>) {
        if let Some(symbol) = self.lookup_mut(name) {
            debug!(name, line, constant = ?value, "initialized symbol");
            symbol.initialized_at_line = Some(line);
            symbol.value = value;
        }
    }

    /// Drop the tracked constant without touching initialization state.
    pub fn forget_value(&mut self, name: &str) {
        if let Some(symbol) = self.lookup_mut(name) {
            if symbol.value.take().is_some() {
                debug!(name, "forgot tracked constant");
            }
        }
    }

    /// Symbols in declaration order.
    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}
