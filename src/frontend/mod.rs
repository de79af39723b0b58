//! Frontend module - Syntax tree, Symbol Table, Semantic Analysis

pub mod ast;
pub mod semantic;
pub mod symbol_table;

#[cfg(test)]
pub mod testing;
