//! Middle-end module - stack IR and its generation

pub mod ir;
pub mod ir_gen;
pub mod ir_printer;
