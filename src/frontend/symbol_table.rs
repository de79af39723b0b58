//! Symbol Table for MiniCS
//!
//! Symbols live in an append-only arena. The live view is a stack of arena
//! ids, and each open scope remembers the stack height at which it began, so
//! closing a scope is a single truncate. The arena itself is never shrunk and
//! doubles as the history used for symbol dumps.

use std::collections::HashMap;
use std::fmt::Write as _;

use crate::frontend::ast::Ident;
use crate::types::{ClassResolver, TypeRegistry, TypeTag};
use crate::utils::Span;

/// Index into the symbol arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SymbolId(pub usize);

/// Where a symbol was declared
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclSite {
    Global,
    Local,
    Param,
    Field,
    Constant,
    Method,
    Class,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SymbolKind {
    Variable { constant: bool },
    Method { ret: TypeTag, params: Vec<TypeTag> },
    Class,
}

/// Symbol information
#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub name: String,
    pub span: Span,
    /// Span of the declaration that introduced the name
    pub decl: Span,
    pub ty: TypeTag,
    /// Scope level active when the symbol was inserted
    pub level: i32,
    pub site: DeclSite,
    pub kind: SymbolKind,
}

impl Symbol {
    pub fn is_constant(&self) -> bool {
        matches!(self.kind, SymbolKind::Variable { constant: true })
    }

    pub fn is_variable(&self) -> bool {
        matches!(self.kind, SymbolKind::Variable { .. })
    }

    /// Variant-specific description for dumps
    pub fn detail(&self, registry: &TypeRegistry) -> String {
        match &self.kind {
            SymbolKind::Variable { constant: true } => "const".to_string(),
            SymbolKind::Variable { .. } => match self.site {
                DeclSite::Param => "param".to_string(),
                DeclSite::Field => "field".to_string(),
                DeclSite::Global => "global".to_string(),
                _ => "var".to_string(),
            },
            SymbolKind::Method { ret, params } => {
                let params: Vec<String> = params.iter().map(|p| registry.pretty_print(*p)).collect();
                format!("({}) -> {}", params.join(", "), registry.pretty_print(*ret))
            }
            SymbolKind::Class => "class".to_string(),
        }
    }
}

/// Symbol table with nested scopes
#[derive(Debug)]
pub struct SymbolTable {
    registry: TypeRegistry,
    history: Vec<Symbol>,
    active: Vec<SymbolId>,
    boundaries: Vec<usize>,
    fields: HashMap<String, Vec<SymbolId>>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self {
            registry: TypeRegistry::new(),
            history: Vec::new(),
            active: Vec::new(),
            boundaries: Vec::new(),
            fields: HashMap::new(),
        }
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    // ==================== Scopes ====================

    /// Current scope level; -1 before the first `open_scope`
    pub fn level(&self) -> i32 {
        self.boundaries.len() as i32 - 1
    }

    pub fn open_scope(&mut self) {
        self.boundaries.push(self.active.len());
        log::trace!("open scope {}", self.level());
    }

    /// Drop every symbol of the innermost level
    ///
    /// # Panics
    /// If no scope is open.
    pub fn close_scope(&mut self) {
        let start = match self.boundaries.pop() {
            Some(start) => start,
            None => panic!("close_scope called with no open scope"),
        };
        self.active.truncate(start);
        log::trace!("closed scope, now at level {}", self.level());
    }

    fn current_start(&self) -> usize {
        self.boundaries.last().copied().unwrap_or(0)
    }

    // ==================== Insertion ====================

    fn push(&mut self, symbol: Symbol) -> SymbolId {
        let id = SymbolId(self.history.len());
        log::trace!("declare '{}' at level {}", symbol.name, symbol.level);
        self.history.push(symbol);
        self.active.push(id);
        id
    }

    fn make(&self, name: &Ident, ty: TypeTag, site: DeclSite, kind: SymbolKind, decl: Span) -> Symbol {
        Symbol {
            name: name.name.clone(),
            span: name.span,
            decl,
            ty,
            level: self.level(),
            site,
            kind,
        }
    }

    /// Insert a variable; false if the name already exists at this level
    pub fn insert_variable(
        &mut self,
        name: &Ident,
        ty: TypeTag,
        constant: bool,
        site: DeclSite,
        decl: Span,
    ) -> bool {
        if self.lookup_in_current_level(&name.name).is_some() {
            return false;
        }
        let symbol = self.make(name, ty, site, SymbolKind::Variable { constant }, decl);
        self.push(symbol);
        true
    }

    pub fn insert_method(&mut self, name: &Ident, ret: TypeTag, params: Vec<TypeTag>, decl: Span) -> bool {
        if self.lookup_in_current_level(&name.name).is_some() {
            return false;
        }
        let symbol = self.make(name, ret, DeclSite::Method, SymbolKind::Method { ret, params }, decl);
        self.push(symbol);
        true
    }

    /// Insert a class and register its type tag
    pub fn insert_class(&mut self, name: &Ident, decl: Span) -> bool {
        if self.lookup_in_current_level(&name.name).is_some() {
            return false;
        }
        let tag = self.registry.register_class(&name.name);
        let symbol = self.make(name, tag, DeclSite::Class, SymbolKind::Class, decl);
        self.push(symbol);
        self.fields.entry(name.name.clone()).or_default();
        true
    }

    /// Insert a field of `class_name`; independent of the live scopes
    pub fn insert_field(&mut self, class_name: &str, name: &Ident, ty: TypeTag, decl: Span) -> bool {
        let exists = self
            .fields
            .get(class_name)
            .map(|ids| ids.iter().any(|id| self.history[id.0].name == name.name))
            .unwrap_or(false);
        if exists {
            return false;
        }
        let id = SymbolId(self.history.len());
        let symbol = self.make(name, ty, DeclSite::Field, SymbolKind::Variable { constant: false }, decl);
        self.history.push(symbol);
        self.fields.entry(class_name.to_string()).or_default().push(id);
        true
    }

    // ==================== Lookup ====================

    /// Innermost visible symbol with this name
    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.active
            .iter()
            .rev()
            .map(|id| &self.history[id.0])
            .find(|s| s.name == name)
    }

    pub fn lookup_in_current_level(&self, name: &str) -> Option<&Symbol> {
        self.active[self.current_start()..]
            .iter()
            .map(|id| &self.history[id.0])
            .find(|s| s.name == name)
    }

    /// Field `name` of the class identified by `class_tag`
    pub fn lookup_field(&self, class_tag: TypeTag, name: &str) -> Option<&Symbol> {
        let class_name = self.registry.class_name(class_tag)?;
        self.fields
            .get(class_name)?
            .iter()
            .map(|id| &self.history[id.0])
            .find(|s| s.name == name)
    }

    /// Fields of a class in declaration order
    pub fn fields_of(&self, class_name: &str) -> Vec<&Symbol> {
        self.fields
            .get(class_name)
            .map(|ids| ids.iter().map(|id| &self.history[id.0]).collect())
            .unwrap_or_default()
    }

    // ==================== Types ====================

    pub fn type_from_name(&self, name: &str) -> TypeTag {
        self.registry.from_name(name, self)
    }

    pub fn type_from_bracketed(&self, text: &str) -> TypeTag {
        self.registry.from_bracketed_name(text, self)
    }

    pub fn pretty(&self, tag: TypeTag) -> String {
        self.registry.pretty_print(tag)
    }

    // ==================== Dump ====================

    /// Every symbol ever inserted, in insertion order
    pub fn history(&self) -> &[Symbol] {
        &self.history
    }

    /// Text dump, one symbol per line: `name  level  type  detail`
    pub fn dump(&self) -> String {
        let mut out = String::new();
        for symbol in &self.history {
            let _ = writeln!(
                out,
                "{:<16} {:>3}  {:<12} {}",
                symbol.name,
                symbol.level,
                self.pretty(symbol.ty),
                symbol.detail(&self.registry)
            );
        }
        out
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ClassResolver for SymbolTable {
    fn resolve_class(&self, name: &str) -> Option<TypeTag> {
        match self.lookup(name) {
            Some(Symbol {
                kind: SymbolKind::Class,
                ty,
                ..
            }) => Some(*ty),
            _ => None,
        }
    }
}
