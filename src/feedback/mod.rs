//! Structured Feedback Module
//!
//! Machine-readable output of a compilation run:
//! - diagnostics with stable codes and categories
//! - the symbol history dump
//! - compilation statistics

use serde::{Deserialize, Serialize};

use crate::frontend::semantic::Analysis;
use crate::frontend::symbol_table::SymbolKind;
use crate::middle::ir::IRModule;
use crate::utils::{Category, Error};

// ==================== Diagnostics ====================

/// One reported problem
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    /// Stable code, e.g. "E0006"
    pub code: String,
    pub category: Category,
    pub message: String,
    pub line: u32,
    pub column: u32,
}

impl Diagnostic {
    pub fn from_error(error: &Error) -> Self {
        let (line, column) = error.span().map(|s| (s.line, s.column)).unwrap_or((0, 0));
        Self {
            code: error.code().to_string(),
            category: error.category(),
            message: error.to_string(),
            line,
            column,
        }
    }

    /// `line:column: error[category]: message`
    pub fn render(&self) -> String {
        format!(
            "{}:{}: error[{}]: {}",
            self.line, self.column, self.category, self.message
        )
    }
}

// ==================== Symbols ====================

/// One line of the symbol history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolEntry {
    pub name: String,
    pub level: i32,
    #[serde(rename = "type")]
    pub ty: String,
    pub detail: String,
}

// ==================== Report ====================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompilationStats {
    pub symbol_count: usize,
    pub class_count: usize,
    pub method_count: usize,
    /// Expression nodes with a resolved type
    pub annotated_nodes: usize,
    /// Total instructions across all method bodies, once generated
    pub instruction_count: Option<usize>,
}

/// Complete compilation report
#[derive(Debug, Clone, Serialize)]
pub struct CompilationReport {
    pub success: bool,
    pub source_file: String,
    pub entry_point: String,
    pub diagnostics: Vec<Diagnostic>,
    pub symbols: Vec<SymbolEntry>,
    pub stats: CompilationStats,
}

impl CompilationReport {
    /// Report on a finished semantic analysis
    pub fn from_analysis(source_file: &str, entry_point: &str, analysis: &Analysis) -> Self {
        let table = &analysis.symbols;
        let history = table.history();

        let symbols = history
            .iter()
            .map(|sym| SymbolEntry {
                name: sym.name.clone(),
                level: sym.level,
                ty: table.pretty(sym.ty),
                detail: sym.detail(table.registry()),
            })
            .collect();

        let stats = CompilationStats {
            symbol_count: history.len(),
            class_count: history
                .iter()
                .filter(|s| matches!(s.kind, SymbolKind::Class))
                .count(),
            method_count: history
                .iter()
                .filter(|s| matches!(s.kind, SymbolKind::Method { .. }))
                .count(),
            annotated_nodes: analysis.annotations.count(),
            instruction_count: None,
        };

        Self {
            success: analysis.is_ok(),
            source_file: source_file.to_string(),
            entry_point: entry_point.to_string(),
            diagnostics: analysis.errors.iter().map(Diagnostic::from_error).collect(),
            symbols,
            stats,
        }
    }

    /// Record the generated module's size
    pub fn with_module(mut self, module: &IRModule) -> Self {
        let ctor_code: usize = module.classes.iter().map(|c| c.ctor.code.len()).sum();
        let method_code: usize = module.methods.iter().map(|m| m.code.len()).sum();
        self.stats.instruction_count = Some(ctor_code + method_code);
        self
    }

    /// Record a fatal generation failure
    pub fn with_failure(mut self, error: &Error) -> Self {
        self.success = false;
        self.diagnostics.push(Diagnostic::from_error(error));
        self
    }

    /// Diagnostics one per line, then a summary count
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        for diag in &self.diagnostics {
            out.push_str(&diag.render());
            out.push('\n');
        }
        match self.diagnostics.len() {
            0 => out.push_str("no errors\n"),
            1 => out.push_str("1 error\n"),
            n => out.push_str(&format!("{} errors\n", n)),
        }
        out
    }

    /// Output as JSON
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }
}
