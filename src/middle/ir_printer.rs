//! IR Printer - Pretty print MiniCS IR
//!
//! Outputs a human-readable listing of a generated module.

use std::fmt::{self, Write};

use crate::middle::ir::*;

/// Pretty printer for MiniCS IR
pub struct IRPrinter {
    output: String,
}

impl IRPrinter {
    pub fn new() -> Self {
        Self {
            output: String::new(),
        }
    }

    /// Print an IR module to string
    pub fn print_module(&mut self, module: &IRModule) -> String {
        self.output.clear();
        // Writing into a String cannot fail
        let _ = self.write_module(module);
        std::mem::take(&mut self.output)
    }

    fn write_module(&mut self, module: &IRModule) -> fmt::Result {
        writeln!(self.output, "; Module: {}", module.name)?;
        writeln!(
            self.output,
            "; Classes: {}, Methods: {}",
            module.classes.len(),
            module.methods.len()
        )?;
        if let Some(entry) = &module.entry_point {
            writeln!(self.output, "; Entry: {}", entry)?;
        }
        writeln!(self.output)?;

        writeln!(self.output, "class {} {{", module.name)?;
        for class in &module.classes {
            self.write_class(class)?;
        }
        for field in &module.statics {
            writeln!(self.output, "  static field {} {}", field.ty, field.name)?;
        }
        for method in &module.methods {
            writeln!(self.output)?;
            self.write_method(method, "  ")?;
        }
        writeln!(self.output, "}}")
    }

    fn write_class(&mut self, class: &IRClass) -> fmt::Result {
        writeln!(self.output, "  class {} {{", class.name)?;
        for field in &class.fields {
            writeln!(self.output, "    field {} {}", field.ty, field.name)?;
        }
        self.write_method(&class.ctor, "    ")?;
        writeln!(self.output, "  }}")?;
        writeln!(self.output)
    }

    fn write_method(&mut self, method: &IRMethod, indent: &str) -> fmt::Result {
        let modifier = match method.kind {
            MethodKind::Static => "static ",
            MethodKind::Constructor => "",
        };
        write!(self.output, "{}method {}{} {}(", indent, modifier, method.ret, method.name)?;
        for (i, (name, ty)) in method.params.iter().enumerate() {
            if i > 0 {
                write!(self.output, ", ")?;
            }
            write!(self.output, "{} {}", ty, name)?;
        }
        writeln!(self.output, ") {{")?;

        for (slot, local) in method.locals.iter().enumerate() {
            writeln!(self.output, "{}  .local {} {} {}", indent, slot, local.ty, local.name)?;
        }

        for inst in &method.code {
            match inst {
                // Labels sit at the method's indentation
                Instruction::Mark(_) => writeln!(self.output, "{} {}", indent, inst)?,
                _ => writeln!(self.output, "{}    {}", indent, inst)?,
            }
        }
        writeln!(self.output, "{}}}", indent)
    }
}

impl Default for IRPrinter {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience function to print IR
pub fn print_ir(module: &IRModule) -> String {
    IRPrinter::new().print_module(module)
}
