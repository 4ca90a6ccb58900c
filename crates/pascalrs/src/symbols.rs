// Symbol and constant tables
// Scope-stack lookup over an append-only entry list; the constant table is
// shared by the lexer, the optimizer and the interpreter

use ahash::AHashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum TypeKind {
    Integer,
    Real,
}

impl TypeKind {
    /// Declared storage size in bytes, used for address assignment
    pub fn size(self) -> usize {
        match self {
            TypeKind::Integer => 4,
            TypeKind::Real => 8,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum SymbolKind {
    Variable,
    Procedure,
    Function,
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SymbolEntry {
    pub name: String,
    pub kind: SymbolKind,
    pub ty: TypeKind,
    pub address: usize,
    pub scope_level: usize,
}

/// Symbol table with a scope stack and a deduplicated `f64` constant table.
///
/// Entries are append-only: leaving a scope removes its names from lookup but
/// keeps the entries, so `entries()` always describes every declaration the
/// program ever made (the conservative "live at program end" set).
#[derive(Debug)]
pub struct SymbolTable {
    entries: Vec<SymbolEntry>,
    scopes: Vec<AHashMap<String, usize>>,
    constants: Vec<f64>,
    next_address: usize,
}

impl SymbolTable {
    pub fn new() -> SymbolTable {
        SymbolTable {
            entries: Vec::new(),
            scopes: vec![AHashMap::new()],
            constants: Vec::new(),
            next_address: 0,
        }
    }

    pub fn enter_scope(&mut self) {
        self.scopes.push(AHashMap::new());
    }

    pub fn exit_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    pub fn scope_level(&self) -> usize {
        self.scopes.len() - 1
    }

    /// Declare a name in the current scope. Returns the entry index, or
    /// `None` when the name already exists in this scope.
    pub fn declare(&mut self, name: &str, kind: SymbolKind, ty: TypeKind) -> Option<usize> {
        let level = self.scope_level();
        if self.scopes.last().is_none_or(|s| s.contains_key(name)) {
            return None;
        }

        let address = match kind {
            SymbolKind::Variable => {
                let addr = self.next_address;
                self.next_address += ty.size();
                addr
            }
            // Procedures and functions are name-addressed, not data-addressed
            SymbolKind::Procedure | SymbolKind::Function => 0,
        };

        let index = self.entries.len();
        self.entries.push(SymbolEntry {
            name: name.to_string(),
            kind,
            ty,
            address,
            scope_level: level,
        });
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), index);
        }
        Some(index)
    }

    /// Look a name up from the innermost scope outward
    pub fn lookup(&self, name: &str) -> Option<&SymbolEntry> {
        for scope in self.scopes.iter().rev() {
            if let Some(&index) = scope.get(name) {
                return self.entries.get(index);
            }
        }
        None
    }

    /// Look up the nearest procedure/function with this name, skipping
    /// shadowing variables (a function's result variable shadows its own
    /// name inside the body; calls still need to reach the chunk)
    pub fn lookup_callable(&self, name: &str) -> Option<&SymbolEntry> {
        for scope in self.scopes.iter().rev() {
            if let Some(&index) = scope.get(name) {
                let entry = self.entries.get(index)?;
                if entry.kind != SymbolKind::Variable {
                    return Some(entry);
                }
            }
        }
        None
    }

    /// Every entry ever declared, in declaration order
    pub fn entries(&self) -> &[SymbolEntry] {
        &self.entries
    }

    pub fn constants(&self) -> &[f64] {
        &self.constants
    }

    pub fn constant(&self, index: usize) -> Option<f64> {
        self.constants.get(index).copied()
    }

    /// Intern a constant, deduplicating by exact value equality.
    ///
    /// The linear scan with `==` deliberately does not unify values that are
    /// mathematically equal but differ in the last bit; duplicate entries from
    /// different fold orders are accepted behavior.
    pub fn lookup_or_add_constant(&mut self, value: f64) -> usize {
        for (i, &existing) in self.constants.iter().enumerate() {
            if existing == value {
                return i;
            }
        }
        self.constants.push(value);
        self.constants.len() - 1
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        SymbolTable::new()
    }
}
