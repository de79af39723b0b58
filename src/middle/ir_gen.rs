//! IR Generator - checked AST to stack IR
//!
//! Runs only on trees the semantic checker accepted. It reads the symbol
//! table (global scope still open) and the checker's type annotations; any
//! miss in either is an internal consistency failure and aborts generation
//! with `Error::UnsupportedConstruct`.

use std::collections::HashMap;

use crate::frontend::ast::*;
use crate::frontend::semantic::{literal_type, Analysis, TypeAnnotations};
use crate::frontend::symbol_table::{SymbolKind, SymbolTable};
use crate::middle::ir::*;
use crate::stdlib::Intrinsic;
use crate::types::TypeTag;
use crate::utils::{Error, Result};

fn internal(message: impl Into<String>) -> Error {
    Error::UnsupportedConstruct(message.into())
}

/// How a designator's base name is stored
#[derive(Debug, Clone)]
enum Storage {
    Local(u16, TypeTag),
    Static(String, TypeTag),
    Constant(Literal),
}

/// IR Generator
pub struct IRGenerator {
    module: IRModule,
    symbols: SymbolTable,
    annotations: TypeAnnotations,
    entry_point: String,
    /// Literal values of `const` declarations, inlined at each use
    constants: HashMap<String, Literal>,
    /// Method being built
    current: IRMethod,
    /// Local slots visible in each open block
    scopes: Vec<HashMap<String, (u16, TypeTag)>>,
    break_targets: Vec<Label>,
    temp_count: usize,
}

impl IRGenerator {
    pub fn new(symbols: SymbolTable, annotations: TypeAnnotations, entry_point: &str) -> Self {
        Self {
            module: IRModule::default(),
            symbols,
            annotations,
            entry_point: entry_point.to_string(),
            constants: HashMap::new(),
            current: IRMethod::default(),
            scopes: Vec::new(),
            break_targets: Vec::new(),
            temp_count: 0,
        }
    }

    /// Generate the module for a checked program
    ///
    /// Closes the global scope the checker left open, so a generator is
    /// single-use.
    pub fn generate(&mut self, program: &Program) -> Result<IRModule> {
        self.module = IRModule::new(&program.name.name);

        for item in &program.items {
            match item {
                Item::Class(class) => self.generate_class(class)?,
                Item::Const(decl) => {
                    self.constants
                        .insert(decl.name.name.clone(), decl.value.clone());
                }
                Item::Var(decl) => {
                    let ty = self.ir_type_of_name(&decl.ty)?;
                    for name in &decl.names {
                        self.module.statics.push(IRField {
                            name: name.name.clone(),
                            ty: ty.clone(),
                        });
                    }
                }
                Item::Method(_) => {}
            }
        }

        for item in &program.items {
            if let Item::Method(method) = item {
                self.generate_method(method)?;
            }
        }

        if self.module.method(&self.entry_point).is_some() {
            self.module.entry_point = Some(self.entry_point.clone());
        }
        self.symbols.close_scope();
        log::debug!(
            "generated module '{}': {} class(es), {} method(s)",
            self.module.name,
            self.module.classes.len(),
            self.module.methods.len()
        );
        Ok(std::mem::take(&mut self.module))
    }

    // ==================== Types ====================

    fn ir_type(&self, tag: TypeTag) -> Result<IRType> {
        if tag.is_list() {
            return Ok(IRType::List(Box::new(self.ir_type(tag.element())?)));
        }
        let ty = match tag {
            TypeTag::VOID => IRType::Void,
            TypeTag::INT => IRType::Int32,
            TypeTag::CHAR => IRType::Char,
            TypeTag::BOOL => IRType::Bool,
            TypeTag::FLOAT => IRType::Float32,
            TypeTag::DOUBLE => IRType::Float64,
            TypeTag::STRING => IRType::String,
            _ => match self.symbols.registry().class_name(tag) {
                Some(name) => IRType::Class(name.to_string()),
                None => return Err(internal(format!("no target type for tag {}", tag))),
            },
        };
        Ok(ty)
    }

    fn tag_of_name(&self, ty: &TypeName) -> Result<TypeTag> {
        let tag = self.symbols.type_from_bracketed(&ty.name);
        if tag.is_unknown() {
            return Err(internal(format!("unresolved type '{}'", ty.name)));
        }
        Ok(tag)
    }

    fn ir_type_of_name(&self, ty: &TypeName) -> Result<IRType> {
        self.ir_type(self.tag_of_name(ty)?)
    }

    /// Annotated type of an expression-level node
    fn type_of(&self, id: NodeId) -> Result<TypeTag> {
        self.annotations
            .get(id)
            .ok_or_else(|| internal(format!("node {} has no type annotation", id.0)))
    }

    fn class_name(&self, tag: TypeTag) -> Result<String> {
        self.symbols
            .registry()
            .class_name(tag)
            .map(str::to_string)
            .ok_or_else(|| internal(format!("tag {} is not a class", tag)))
    }

    // ==================== Declarations ====================

    fn generate_class(&mut self, class: &ClassDecl) -> Result<()> {
        let fields = self
            .symbols
            .fields_of(&class.name.name)
            .into_iter()
            .map(|sym| {
                Ok(IRField {
                    name: sym.name.clone(),
                    ty: self.ir_type(sym.ty)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        self.module.classes.push(IRClass::new(&class.name.name, fields));
        Ok(())
    }

    fn generate_method(&mut self, method: &MethodDecl) -> Result<()> {
        let ret_tag = match &method.ret {
            Some(ty) => self.tag_of_name(ty)?,
            None => TypeTag::VOID,
        };
        let mut params = Vec::new();
        let mut param_tags = Vec::new();
        for param in &method.params {
            let tag = self.tag_of_name(&param.ty)?;
            params.push((param.name.name.clone(), self.ir_type(tag)?));
            param_tags.push(tag);
        }
        let ret = self.ir_type(ret_tag)?;

        self.current = IRMethod::new(&method.name.name, MethodKind::Static, params, ret.clone());
        self.scopes = vec![HashMap::new()];
        self.temp_count = 0;

        for (i, (param, tag)) in method.params.iter().zip(param_tags).enumerate() {
            let slot = self.declare_local(&param.name.name, tag)?;
            let arg = u16::try_from(i).map_err(|_| internal("too many parameters"))?;
            self.emit(Instruction::LdArg(arg));
            self.emit(Instruction::StLoc(slot));
        }

        self.generate_items(&method.body.items)?;

        if self.current.code.last() != Some(&Instruction::Ret) {
            if let Some(default) = default_value(&ret) {
                self.emit(default);
            }
            self.emit(Instruction::Ret);
        }

        self.scopes.clear();
        if !self.current.labels_resolved() {
            return Err(internal(format!("unresolved branch target in '{}'", method.name.name)));
        }
        let generated = std::mem::take(&mut self.current);
        log::debug!(
            "emitted method '{}' ({} instructions, {} locals)",
            generated.name,
            generated.code.len(),
            generated.locals.len()
        );
        self.module.methods.push(generated);
        Ok(())
    }

    fn declare_local(&mut self, name: &str, tag: TypeTag) -> Result<u16> {
        let slot = u16::try_from(self.current.locals.len()).map_err(|_| internal("too many locals"))?;
        self.current.locals.push(IRLocal {
            name: name.to_string(),
            ty: self.ir_type(tag)?,
        });
        match self.scopes.last_mut() {
            Some(scope) => {
                scope.insert(name.to_string(), (slot, tag));
            }
            None => return Err(internal("local declared outside a method")),
        }
        Ok(slot)
    }

    /// Unnamed slot for lowering that needs scratch storage
    fn temp(&mut self, tag: TypeTag) -> Result<u16> {
        let slot = u16::try_from(self.current.locals.len()).map_err(|_| internal("too many locals"))?;
        self.current.locals.push(IRLocal {
            name: format!("$t{}", self.temp_count),
            ty: self.ir_type(tag)?,
        });
        self.temp_count += 1;
        Ok(slot)
    }

    fn emit(&mut self, inst: Instruction) {
        self.current.emit(inst);
    }

    fn new_label(&mut self) -> Label {
        self.current.new_label()
    }

    fn resolve(&self, name: &str) -> Result<Storage> {
        for scope in self.scopes.iter().rev() {
            if let Some(&(slot, tag)) = scope.get(name) {
                return Ok(Storage::Local(slot, tag));
            }
        }
        if let Some(value) = self.constants.get(name) {
            return Ok(Storage::Constant(value.clone()));
        }
        match self.symbols.lookup(name) {
            Some(sym) if sym.is_variable() => Ok(Storage::Static(name.to_string(), sym.ty)),
            _ => Err(internal(format!("unresolved designator '{}'", name))),
        }
    }

    // ==================== Statements ====================

    fn generate_items(&mut self, items: &[BlockItem]) -> Result<()> {
        for item in items {
            match item {
                BlockItem::Var(decl) => {
                    let tag = self.tag_of_name(&decl.ty)?;
                    for name in &decl.names {
                        self.declare_local(&name.name, tag)?;
                    }
                }
                BlockItem::Stmt(stmt) => self.generate_stmt(stmt)?,
            }
        }
        Ok(())
    }

    fn generate_stmt(&mut self, stmt: &Stmt) -> Result<()> {
        match stmt {
            Stmt::Assign { target, value, .. } => self.generate_store(target, Value::Expr(value)),
            Stmt::Read { target, .. } => self.generate_store(target, Value::ReadInt),
            Stmt::Increment { target, .. } => self.generate_step(target, Instruction::Add),
            Stmt::Decrement { target, .. } => self.generate_step(target, Instruction::Sub),
            Stmt::Call { callee, args, .. } => {
                let ret = self.generate_call(callee, args)?;
                if ret != TypeTag::VOID {
                    self.emit(Instruction::Pop);
                }
                Ok(())
            }
            Stmt::Write { value, width, .. } => {
                self.generate_expr(value)?;
                let ty = self.ir_type(self.type_of(value.id)?)?;
                match width {
                    Some(width) => {
                        let width = i32::try_from(*width).map_err(|_| internal("write width out of range"))?;
                        self.emit(Instruction::LdcI4(width));
                        self.emit(Instruction::CallHost(HostCall::WritePadded(ty)));
                    }
                    None => self.emit(Instruction::CallHost(HostCall::Write(ty))),
                }
                Ok(())
            }
            Stmt::If {
                cond,
                then_branch,
                else_branch,
                ..
            } => {
                let end = self.new_label();
                match else_branch {
                    Some(else_branch) => {
                        let otherwise = self.new_label();
                        self.generate_condition(cond)?;
                        self.emit(Instruction::BrFalse(otherwise));
                        self.generate_stmt(then_branch)?;
                        self.emit(Instruction::Br(end));
                        self.emit(Instruction::Mark(otherwise));
                        self.generate_stmt(else_branch)?;
                    }
                    None => {
                        self.generate_condition(cond)?;
                        self.emit(Instruction::BrFalse(end));
                        self.generate_stmt(then_branch)?;
                    }
                }
                self.emit(Instruction::Mark(end));
                Ok(())
            }
            Stmt::While { cond, body, .. } => {
                let start = self.new_label();
                let end = self.new_label();
                self.emit(Instruction::Mark(start));
                self.generate_condition(cond)?;
                self.emit(Instruction::BrFalse(end));
                self.generate_loop_body(body, end)?;
                self.emit(Instruction::Br(start));
                self.emit(Instruction::Mark(end));
                Ok(())
            }
            Stmt::For {
                init,
                cond,
                update,
                body,
                ..
            } => {
                let start = self.new_label();
                let check = self.new_label();
                let end = self.new_label();
                if let Some(init) = init {
                    self.generate_stmt(init)?;
                }
                self.emit(Instruction::Br(check));
                self.emit(Instruction::Mark(start));
                self.generate_loop_body(body, end)?;
                if let Some(update) = update {
                    self.generate_stmt(update)?;
                }
                self.emit(Instruction::Mark(check));
                match cond {
                    Some(cond) => {
                        self.generate_condition(cond)?;
                        self.emit(Instruction::BrTrue(start));
                    }
                    None => self.emit(Instruction::Br(start)),
                }
                self.emit(Instruction::Mark(end));
                Ok(())
            }
            Stmt::Break { .. } => {
                let target = self
                    .break_targets
                    .last()
                    .copied()
                    .ok_or_else(|| internal("'break' with no enclosing loop or switch"))?;
                self.emit(Instruction::Br(target));
                Ok(())
            }
            Stmt::Return { value, .. } => {
                if let Some(value) = value {
                    self.generate_expr(value)?;
                }
                self.emit(Instruction::Ret);
                Ok(())
            }
            Stmt::Switch {
                selector,
                cases,
                default,
                ..
            } => self.generate_switch(selector, cases, default.as_ref()),
            Stmt::Block(block) => {
                self.scopes.push(HashMap::new());
                let result = self.generate_items(&block.items);
                self.scopes.pop();
                result
            }
            Stmt::Empty { .. } => Ok(()),
        }
    }

    fn generate_loop_body(&mut self, body: &Stmt, end: Label) -> Result<()> {
        self.break_targets.push(end);
        let result = self.generate_stmt(body);
        self.break_targets.pop();
        result
    }

    /// Compare-and-branch chain in case order; bodies fall through like C
    fn generate_switch(
        &mut self,
        selector: &Expr,
        cases: &[SwitchCase],
        default: Option<&DefaultCase>,
    ) -> Result<()> {
        let selector_tag = self.type_of(selector.id)?;
        self.generate_expr(selector)?;
        let slot = self.temp(selector_tag)?;
        self.emit(Instruction::StLoc(slot));

        let end = self.new_label();
        let case_labels: Vec<Label> = cases.iter().map(|_| self.new_label()).collect();
        let default_label = default.map(|_| self.new_label());

        for (case, label) in cases.iter().zip(&case_labels) {
            self.emit(Instruction::LdLoc(slot));
            self.generate_literal(&case.label)?;
            self.emit(Instruction::Beq(*label));
        }
        self.emit(Instruction::Br(default_label.unwrap_or(end)));

        self.break_targets.push(end);
        let mut result = Ok(());
        for (case, label) in cases.iter().zip(&case_labels) {
            self.emit(Instruction::Mark(*label));
            result = case.body.iter().try_for_each(|s| self.generate_stmt(s));
            if result.is_err() {
                break;
            }
        }
        if let (true, Some(default), Some(label)) = (result.is_ok(), default, default_label) {
            self.emit(Instruction::Mark(label));
            result = default.body.iter().try_for_each(|s| self.generate_stmt(s));
        }
        self.break_targets.pop();
        result?;

        self.emit(Instruction::Mark(end));
        Ok(())
    }

    // ==================== Designators ====================

    fn generate_base_load(&mut self, name: &str) -> Result<TypeTag> {
        match self.resolve(name)? {
            Storage::Local(slot, tag) => {
                self.emit(Instruction::LdLoc(slot));
                Ok(tag)
            }
            Storage::Static(field, tag) => {
                self.emit(Instruction::LdSFld(field));
                Ok(tag)
            }
            Storage::Constant(value) => {
                self.generate_literal(&value)?;
                Ok(literal_type(&value))
            }
        }
    }

    /// Apply one selector to the value on the stack
    fn generate_select(&mut self, container: TypeTag, selector: &Selector) -> Result<TypeTag> {
        match selector {
            Selector::Field(field) => {
                let class = self.class_name(container)?;
                let field_tag = self.field_type(container, &field.name)?;
                self.emit(Instruction::LdFld {
                    class,
                    field: field.name.clone(),
                });
                Ok(field_tag)
            }
            Selector::Index(index) => {
                self.generate_expr(index)?;
                let elem = container.element();
                self.emit(Instruction::CallVirt {
                    method: ListMethod::GetItem,
                    elem: self.ir_type(elem)?,
                });
                Ok(elem)
            }
        }
    }

    fn field_type(&self, class: TypeTag, field: &str) -> Result<TypeTag> {
        self.symbols
            .lookup_field(class, field)
            .map(|sym| sym.ty)
            .ok_or_else(|| internal(format!("no field '{}' on tag {}", field, class)))
    }

    /// Load the base and every selector but the last; returns the container type
    fn generate_prefix<'d>(&mut self, desig: &'d Designator) -> Result<(TypeTag, Option<&'d Selector>)> {
        let mut tag = self.generate_base_load(&desig.base.name)?;
        let (last, init) = match desig.selectors.split_last() {
            Some((last, init)) => (Some(last), init),
            None => return Ok((tag, None)),
        };
        for selector in init {
            tag = self.generate_select(tag, selector)?;
        }
        Ok((tag, last))
    }

    fn generate_load(&mut self, desig: &Designator) -> Result<()> {
        let mut tag = self.generate_base_load(&desig.base.name)?;
        for selector in &desig.selectors {
            tag = self.generate_select(tag, selector)?;
        }
        Ok(())
    }

    fn generate_value(&mut self, value: Value<'_>) -> Result<()> {
        match value {
            Value::Expr(expr) => self.generate_expr(expr),
            Value::ReadInt => {
                self.emit(Instruction::CallHost(HostCall::ReadLine));
                self.emit(Instruction::CallHost(HostCall::ParseInt));
                Ok(())
            }
        }
    }

    fn generate_store(&mut self, target: &Designator, value: Value<'_>) -> Result<()> {
        if target.selectors.is_empty() {
            self.generate_value(value)?;
            return match self.resolve(&target.base.name)? {
                Storage::Local(slot, _) => {
                    self.emit(Instruction::StLoc(slot));
                    Ok(())
                }
                Storage::Static(field, _) => {
                    self.emit(Instruction::StSFld(field));
                    Ok(())
                }
                Storage::Constant(_) => Err(internal(format!(
                    "store to constant '{}'",
                    target.base.name
                ))),
            };
        }

        let (container, last) = self.generate_prefix(target)?;
        match last {
            Some(Selector::Field(field)) => {
                let class = self.class_name(container)?;
                self.generate_value(value)?;
                self.emit(Instruction::StFld {
                    class,
                    field: field.name.clone(),
                });
            }
            Some(Selector::Index(index)) => {
                self.generate_expr(index)?;
                self.generate_value(value)?;
                self.emit(Instruction::CallVirt {
                    method: ListMethod::SetItem,
                    elem: self.ir_type(container.element())?,
                });
            }
            None => return Err(internal("designator lost its selectors")),
        }
        Ok(())
    }

    /// `d++` / `d--`; `op` is `Add` or `Sub`
    fn generate_step(&mut self, target: &Designator, op: Instruction) -> Result<()> {
        if target.selectors.is_empty() {
            self.generate_base_load(&target.base.name)?;
            self.emit(Instruction::LdcI4(1));
            self.emit(op);
            return match self.resolve(&target.base.name)? {
                Storage::Local(slot, _) => {
                    self.emit(Instruction::StLoc(slot));
                    Ok(())
                }
                Storage::Static(field, _) => {
                    self.emit(Instruction::StSFld(field));
                    Ok(())
                }
                Storage::Constant(_) => Err(internal(format!(
                    "increment of constant '{}'",
                    target.base.name
                ))),
            };
        }

        let (container, last) = self.generate_prefix(target)?;
        match last {
            Some(Selector::Field(field)) => {
                let class = self.class_name(container)?;
                self.emit(Instruction::Dup);
                self.emit(Instruction::LdFld {
                    class: class.clone(),
                    field: field.name.clone(),
                });
                self.emit(Instruction::LdcI4(1));
                self.emit(op);
                self.emit(Instruction::StFld {
                    class,
                    field: field.name.clone(),
                });
            }
            Some(Selector::Index(index)) => {
                let elem = self.ir_type(container.element())?;
                let list = self.temp(container)?;
                self.emit(Instruction::StLoc(list));
                self.generate_expr(index)?;
                let idx = self.temp(TypeTag::INT)?;
                self.emit(Instruction::StLoc(idx));
                self.emit(Instruction::LdLoc(list));
                self.emit(Instruction::LdLoc(idx));
                self.emit(Instruction::LdLoc(list));
                self.emit(Instruction::LdLoc(idx));
                self.emit(Instruction::CallVirt {
                    method: ListMethod::GetItem,
                    elem: elem.clone(),
                });
                self.emit(Instruction::LdcI4(1));
                self.emit(op);
                self.emit(Instruction::CallVirt {
                    method: ListMethod::SetItem,
                    elem,
                });
            }
            None => return Err(internal("designator lost its selectors")),
        }
        Ok(())
    }

    // ==================== Calls ====================

    /// Emit a call and return its result type
    fn generate_call(&mut self, callee: &Designator, args: &[Expr]) -> Result<TypeTag> {
        let name = &callee.base.name;
        if let Some(intrinsic) = Intrinsic::from_name(name) {
            return self.generate_intrinsic(intrinsic, args);
        }
        let ret = match self.symbols.lookup(name).map(|s| &s.kind) {
            Some(SymbolKind::Method { ret, .. }) => *ret,
            _ => return Err(internal(format!("call to unknown method '{}'", name))),
        };
        for arg in args {
            self.generate_expr(arg)?;
        }
        self.emit(Instruction::Call {
            method: name.clone(),
            argc: args.len(),
        });
        Ok(ret)
    }

    fn generate_intrinsic(&mut self, intrinsic: Intrinsic, args: &[Expr]) -> Result<TypeTag> {
        if args.len() != intrinsic.arity() {
            return Err(internal(format!("'{}' with {} argument(s)", intrinsic.name(), args.len())));
        }
        for arg in args {
            self.generate_expr(arg)?;
        }
        let list_method = match intrinsic {
            Intrinsic::Len => ListMethod::Count,
            Intrinsic::Add => ListMethod::Add,
            Intrinsic::Del => ListMethod::RemoveAt,
            Intrinsic::Ord => {
                self.emit(Instruction::ConvI4);
                return Ok(intrinsic.result_type());
            }
            Intrinsic::Chr => {
                self.emit(Instruction::ConvU2);
                return Ok(intrinsic.result_type());
            }
        };
        let elem = self.type_of(args[0].id)?.element();
        self.emit(Instruction::CallVirt {
            method: list_method,
            elem: self.ir_type(elem)?,
        });
        Ok(intrinsic.result_type())
    }

    // ==================== Expressions ====================

    fn generate_literal(&mut self, lit: &Literal) -> Result<()> {
        let inst = match lit {
            Literal::Int(n) => Instruction::LdcI4(
                i32::try_from(*n).map_err(|_| internal(format!("integer literal {} out of range", n)))?,
            ),
            Literal::Float(x) => Instruction::LdcR4(*x as f32),
            Literal::Double(x) => Instruction::LdcR8(*x),
            Literal::Char(c) => Instruction::LdcI4(
                i32::try_from(u32::from(*c)).map_err(|_| internal(format!("character literal {} out of range", lit)))?,
            ),
            Literal::Bool(b) => Instruction::LdcI4(i32::from(*b)),
            Literal::Str(s) => Instruction::LdStr(s.clone()),
            Literal::Null => Instruction::LdNull,
        };
        self.emit(inst);
        Ok(())
    }

    fn generate_conversion(&mut self, from: TypeTag, to: TypeTag) -> Result<()> {
        if from == to {
            return Ok(());
        }
        let inst = match to {
            TypeTag::INT => Instruction::ConvI4,
            TypeTag::FLOAT => Instruction::ConvR4,
            TypeTag::DOUBLE => Instruction::ConvR8,
            TypeTag::CHAR => Instruction::ConvU2,
            _ => return Err(internal(format!("no conversion from {} to {}", from, to))),
        };
        self.emit(inst);
        Ok(())
    }

    fn promoted(&self, lt: TypeTag, rt: TypeTag) -> Result<TypeTag> {
        TypeTag::promote(lt, rt).ok_or_else(|| internal(format!("arithmetic on {} and {}", lt, rt)))
    }

    fn generate_expr(&mut self, expr: &Expr) -> Result<()> {
        let mut current = self.type_of(expr.head.id)?;
        if expr.negates_int_min() {
            self.emit(Instruction::LdcI4(i32::MIN));
        } else {
            self.generate_term(&expr.head)?;
            if let Some(cast) = &expr.cast {
                let target = self.tag_of_name(cast)?;
                self.generate_conversion(current, target)?;
                current = target;
            }
            if expr.neg {
                self.emit(Instruction::Neg);
            }
        }
        for (op, term) in &expr.tail {
            let rt = self.type_of(term.id)?;
            let result = self.promoted(current, rt)?;
            self.generate_conversion(current, result)?;
            self.generate_term(term)?;
            self.generate_conversion(rt, result)?;
            self.emit(match op {
                AddOp::Add => Instruction::Add,
                AddOp::Sub => Instruction::Sub,
            });
            current = result;
        }
        Ok(())
    }

    fn generate_term(&mut self, term: &Term) -> Result<()> {
        self.generate_factor(&term.head)?;
        let mut current = self.type_of(term.head.id)?;
        for (op, factor) in &term.tail {
            let rt = self.type_of(factor.id)?;
            let result = self.promoted(current, rt)?;
            self.generate_conversion(current, result)?;
            self.generate_factor(factor)?;
            self.generate_conversion(rt, result)?;
            self.emit(match op {
                MulOp::Mul => Instruction::Mul,
                MulOp::Div => Instruction::Div,
                MulOp::Rem => Instruction::Rem,
            });
            current = result;
        }
        Ok(())
    }

    fn generate_factor(&mut self, factor: &Factor) -> Result<()> {
        match &factor.kind {
            FactorKind::Literal(lit) => self.generate_literal(lit),
            FactorKind::Designator(desig) => self.generate_load(desig),
            FactorKind::Call { callee, args } => self.generate_call(callee, args).map(|_| ()),
            FactorKind::New { class } => {
                self.emit(Instruction::NewObj(class.name.clone()));
                Ok(())
            }
            FactorKind::NewArray { elem, sizes } => self.generate_new_array(elem, sizes),
            FactorKind::Paren(inner) => self.generate_expr(inner),
            FactorKind::List(elems) => {
                // `[]` carries the list type it was checked against
                let elem = self.ir_type(self.type_of(factor.id)?.element())?;
                self.emit(Instruction::NewList {
                    elem: elem.clone(),
                    sized: false,
                });
                for e in elems {
                    self.emit(Instruction::Dup);
                    self.generate_expr(e)?;
                    self.emit(Instruction::CallVirt {
                        method: ListMethod::Add,
                        elem: elem.clone(),
                    });
                }
                Ok(())
            }
        }
    }

    /// `new T[n]` is one sized list; each extra dimension adds a fill loop
    fn generate_new_array(&mut self, elem: &TypeName, sizes: &[Expr]) -> Result<()> {
        let base = self.tag_of_name(elem)?;
        if let [size] = sizes {
            self.generate_expr(size)?;
            self.emit(Instruction::NewList {
                elem: self.ir_type(base)?,
                sized: true,
            });
            return Ok(());
        }
        let mut counts = Vec::with_capacity(sizes.len());
        for size in sizes {
            self.generate_expr(size)?;
            let slot = self.temp(TypeTag::INT)?;
            self.emit(Instruction::StLoc(slot));
            counts.push(slot);
        }
        self.generate_nested_lists(base, &counts)
    }

    /// A list of `counts[0]` elements, each a fresh list for `counts[1..]`
    fn generate_nested_lists(&mut self, base: TypeTag, counts: &[u16]) -> Result<()> {
        let (count, inner) = counts
            .split_first()
            .ok_or_else(|| internal("array creation without a size"))?;
        if inner.is_empty() {
            self.emit(Instruction::LdLoc(*count));
            self.emit(Instruction::NewList {
                elem: self.ir_type(base)?,
                sized: true,
            });
            return Ok(());
        }

        let elem = self.ir_type(inner.iter().fold(base, |ty, _| ty.list_of()))?;
        let i = self.temp(TypeTag::INT)?;
        let body = self.new_label();
        let check = self.new_label();
        self.emit(Instruction::LdcI4(0));
        self.emit(Instruction::StLoc(i));
        self.emit(Instruction::NewList {
            elem: elem.clone(),
            sized: false,
        });
        self.emit(Instruction::Br(check));

        self.emit(Instruction::Mark(body));
        self.emit(Instruction::Dup);
        self.generate_nested_lists(base, inner)?;
        self.emit(Instruction::CallVirt {
            method: ListMethod::Add,
            elem,
        });
        self.emit(Instruction::LdLoc(i));
        self.emit(Instruction::LdcI4(1));
        self.emit(Instruction::Add);
        self.emit(Instruction::StLoc(i));

        self.emit(Instruction::Mark(check));
        self.emit(Instruction::LdLoc(i));
        self.emit(Instruction::LdLoc(*count));
        self.emit(Instruction::Clt);
        self.emit(Instruction::BrTrue(body));
        Ok(())
    }

    // ==================== Conditions ====================

    /// `||` and `&&` combine 0/1 values with `or`/`and`; both sides always run
    fn generate_condition(&mut self, cond: &Condition) -> Result<()> {
        for (i, term) in cond.terms.iter().enumerate() {
            for (j, fact) in term.facts.iter().enumerate() {
                self.generate_fact(fact)?;
                if j > 0 {
                    self.emit(Instruction::And);
                }
            }
            if i > 0 {
                self.emit(Instruction::Or);
            }
        }
        Ok(())
    }

    fn generate_fact(&mut self, fact: &CondFact) -> Result<()> {
        let (left, op, right) = match &fact.kind {
            CondFactKind::Expr(expr) => return self.generate_expr(expr),
            CondFactKind::Relation { left, op, right } => (left, *op, right),
        };
        let strings = self.type_of(left.id)? == TypeTag::STRING && self.type_of(right.id)? == TypeTag::STRING;
        self.generate_expr(left)?;
        self.generate_expr(right)?;

        let (compare, negate) = match op {
            RelOp::Eq | RelOp::Ne if strings => (Instruction::CallHost(HostCall::StringEquals), op == RelOp::Ne),
            RelOp::Eq => (Instruction::Ceq, false),
            RelOp::Ne => (Instruction::Ceq, true),
            RelOp::Lt => (Instruction::Clt, false),
            RelOp::Ge => (Instruction::Clt, true),
            RelOp::Gt => (Instruction::Cgt, false),
            RelOp::Le => (Instruction::Cgt, true),
        };
        self.emit(compare);
        if negate {
            self.emit(Instruction::LdcI4(0));
            self.emit(Instruction::Ceq);
        }
        Ok(())
    }
}

/// Value a store writes
#[derive(Debug, Clone, Copy)]
enum Value<'e> {
    Expr(&'e Expr),
    ReadInt,
}

/// Value pushed by a method that falls off its end
fn default_value(ret: &IRType) -> Option<Instruction> {
    match ret {
        IRType::Void => None,
        IRType::Int32 | IRType::Char | IRType::Bool => Some(Instruction::LdcI4(0)),
        IRType::Float32 => Some(Instruction::LdcR4(0.0)),
        IRType::Float64 => Some(Instruction::LdcR8(0.0)),
        IRType::String | IRType::Class(_) | IRType::List(_) => Some(Instruction::LdNull),
    }
}

/// Lower a program the checker has finished with
///
/// Nothing is generated while the analysis carries diagnostics; `Err` then
/// holds all of them, or the single generation failure otherwise.
pub fn generate_checked(
    program: &Program,
    analysis: Analysis,
    entry_point: &str,
) -> std::result::Result<IRModule, Vec<Error>> {
    if !analysis.is_ok() {
        return Err(analysis.errors);
    }
    IRGenerator::new(analysis.symbols, analysis.annotations, entry_point)
        .generate(program)
        .map_err(|e| vec![e])
}

/// Check and lower a program in one go
#[cfg(test)]
pub fn compile(
    program: &Program,
    config: crate::frontend::semantic::CheckerConfig,
) -> std::result::Result<IRModule, Vec<Error>> {
    let entry = config.entry_point.clone();
    let analysis = crate::frontend::semantic::check_program(program, config);
    generate_checked(program, analysis, &entry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::semantic::CheckerConfig;
    use crate::frontend::testing::*;
    use crate::utils::Span;
    use pretty_assertions::assert_eq;
    use Instruction::*;

    fn build(items: Vec<Item>) -> IRModule {
        let p = program(items);
        match compile(&p, CheckerConfig::default()) {
            Ok(module) => module,
            Err(errors) => panic!("compilation failed: {:?}", errors),
        }
    }

    fn main_code(decls: Vec<Item>, body: Vec<BlockItem>) -> Vec<Instruction> {
        let mut items = decls;
        items.push(main_with(body));
        let module = build(items);
        let main = module.method("Main").expect("Main");
        assert!(main.labels_resolved(), "unresolved labels in {:?}", main.code);
        main.code.clone()
    }

    #[test]
    fn test_global_sum() {
        let code = main_code(
            vec![global("int", &["x"])],
            vec![
                assign("x", plus(lit_int(40), lit_int(2))).into(),
                write(var("x")).into(),
            ],
        );
        assert_eq!(
            code,
            vec![
                LdcI4(40),
                LdcI4(2),
                Add,
                StSFld("x".to_string()),
                LdSFld("x".to_string()),
                CallHost(HostCall::Write(IRType::Int32)),
                Ret,
            ]
        );
    }

    #[test]
    fn test_demo_program_builds() {
        let mut p: Program = serde_json::from_str(include_str!("../../demos/sum.json")).expect("demo parses");
        p.assign_ids();
        let module = compile(&p, CheckerConfig::default()).expect("demo compiles");
        assert_eq!(module.name, "Sum");
        assert_eq!(
            module.method("Main").expect("Main").code,
            vec![
                LdcI4(40),
                LdcI4(2),
                Add,
                StSFld("x".to_string()),
                LdSFld("x".to_string()),
                LdcI4(4),
                CallHost(HostCall::WritePadded(IRType::Int32)),
                Ret,
            ]
        );
    }

    #[test]
    fn test_module_shape() {
        let module = build(vec![
            class("Node", &[("int", "val"), ("Node", "next")]),
            global("int[]", &["xs"]),
            method("Sum", Some("int"), &[("int", "a"), ("int", "b")], vec![
                ret(Some(plus(var("a"), var("b")))).into(),
            ]),
            main_with(vec![]),
        ]);
        assert_eq!(module.name, "P");
        assert_eq!(module.entry_point.as_deref(), Some("Main"));
        let node = module.classes.iter().find(|c| c.name == "Node").expect("Node");
        assert_eq!(
            node.fields,
            vec![
                IRField { name: "val".to_string(), ty: IRType::Int32 },
                IRField { name: "next".to_string(), ty: IRType::Class("Node".to_string()) },
            ]
        );
        assert_eq!(node.ctor.code, vec![LdArg(0), CallBaseCtor, Ret]);
        assert_eq!(
            module.statics,
            vec![IRField { name: "xs".to_string(), ty: IRType::List(Box::new(IRType::Int32)) }]
        );

        let sum = module.method("Sum").expect("Sum");
        assert_eq!(sum.ret, IRType::Int32);
        assert_eq!(sum.locals.len(), 2);
        assert_eq!(
            sum.code,
            vec![LdArg(0), StLoc(0), LdArg(1), StLoc(1), LdLoc(0), LdLoc(1), Add, Ret]
        );
    }

    #[test]
    fn test_if_else_lowering() {
        let code = main_code(
            vec![],
            vec![
                local("int", &["i"]),
                if_(
                    rel(var("i"), RelOp::Lt, lit_int(3)),
                    assign("i", lit_int(1)),
                    Some(assign("i", lit_int(2))),
                )
                .into(),
            ],
        );
        let (end, otherwise) = (Label(0), Label(1));
        assert_eq!(
            code,
            vec![
                LdLoc(0),
                LdcI4(3),
                Clt,
                BrFalse(otherwise),
                LdcI4(1),
                StLoc(0),
                Br(end),
                Mark(otherwise),
                LdcI4(2),
                StLoc(0),
                Mark(end),
                Ret,
            ]
        );
    }

    #[test]
    fn test_while_lowering_with_break() {
        let code = main_code(
            vec![],
            vec![
                local("int", &["i"]),
                while_(
                    rel(var("i"), RelOp::Ne, lit_int(10)),
                    block(vec![inc(desig("i")).into(), brk().into()]),
                )
                .into(),
            ],
        );
        let (start, end) = (Label(0), Label(1));
        assert_eq!(
            code,
            vec![
                Mark(start),
                LdLoc(0),
                LdcI4(10),
                Ceq,
                LdcI4(0),
                Ceq,
                BrFalse(end),
                LdLoc(0),
                LdcI4(1),
                Add,
                StLoc(0),
                Br(end),
                Br(start),
                Mark(end),
                Ret,
            ]
        );
    }

    #[test]
    fn test_for_checks_condition_at_bottom() {
        let code = main_code(
            vec![],
            vec![
                local("int", &["i"]),
                for_(
                    Some(assign("i", lit_int(0))),
                    Some(rel(var("i"), RelOp::Le, lit_int(4))),
                    Some(inc(desig("i"))),
                    write(var("i")),
                )
                .into(),
            ],
        );
        let (start, check, end) = (Label(0), Label(1), Label(2));
        assert_eq!(
            code,
            vec![
                LdcI4(0),
                StLoc(0),
                Br(check),
                Mark(start),
                LdLoc(0),
                CallHost(HostCall::Write(IRType::Int32)),
                LdLoc(0),
                LdcI4(1),
                Add,
                StLoc(0),
                Mark(check),
                LdLoc(0),
                LdcI4(4),
                Cgt,
                LdcI4(0),
                Ceq,
                BrTrue(start),
                Mark(end),
                Ret,
            ]
        );
    }

    #[test]
    fn test_switch_is_linear_dispatch() {
        let code = main_code(
            vec![],
            vec![
                local("char", &["c"]),
                switch(
                    var("c"),
                    vec![
                        case(Literal::Char('a'), vec![write(lit_int(1)), brk()]),
                        case(Literal::Char('b'), vec![write(lit_int(2))]),
                    ],
                    Some(vec![write(lit_int(3))]),
                )
                .into(),
            ],
        );
        let (end, case_a, case_b, default) = (Label(0), Label(1), Label(2), Label(3));
        let write_int = || CallHost(HostCall::Write(IRType::Int32));
        assert_eq!(
            code,
            vec![
                LdLoc(0),
                StLoc(1),
                LdLoc(1),
                LdcI4('a' as i32),
                Beq(case_a),
                LdLoc(1),
                LdcI4('b' as i32),
                Beq(case_b),
                Br(default),
                Mark(case_a),
                LdcI4(1),
                write_int(),
                Br(end),
                Mark(case_b),
                LdcI4(2),
                write_int(),
                Mark(default),
                LdcI4(3),
                write_int(),
                Mark(end),
                Ret,
            ]
        );
    }

    #[test]
    fn test_switch_without_default_branches_to_end() {
        let code = main_code(
            vec![],
            vec![
                local("int", &["n"]),
                switch(var("n"), vec![case(Literal::Int(7), vec![brk()])], None).into(),
            ],
        );
        assert_eq!(code[5], Br(Label(0)));
        assert_eq!(code.last(), Some(&Ret));
    }

    #[test]
    fn test_logical_operators_are_not_short_circuit() {
        let code = main_code(
            vec![],
            vec![
                local("bool", &["a", "b", "c"]),
                if_(
                    or(and(cond_expr(var("a")), cond_expr(var("b"))), cond_expr(var("c"))),
                    empty(),
                    None,
                )
                .into(),
            ],
        );
        assert_eq!(
            &code[..6],
            &[LdLoc(0), LdLoc(1), And, LdLoc(2), Or, BrFalse(Label(0))]
        );
    }

    #[test]
    fn test_promotion_inserts_conversions() {
        let code = main_code(
            vec![],
            vec![
                local("int", &["i"]),
                local("double", &["d"]),
                assign("d", plus(var("i"), var("d"))).into(),
                assign("i", cast("int", var("d"))).into(),
            ],
        );
        assert_eq!(
            code,
            vec![
                LdLoc(0),
                ConvR8,
                LdLoc(1),
                Add,
                StLoc(1),
                LdLoc(1),
                ConvI4,
                StLoc(0),
                Ret,
            ]
        );
    }

    #[test]
    fn test_float_arithmetic_and_negation() {
        let code = main_code(
            vec![],
            vec![
                local("int", &["i"]),
                local("float", &["f"]),
                assign("f", times(paren(minus(var("f"), lit_float(0.5))), var("i"))).into(),
                assign("i", rem(div(var("i"), lit_int(2)), lit_int(3))).into(),
                assign("i", neg(var("i"))).into(),
                dec(desig("i")).into(),
            ],
        );
        assert_eq!(
            code,
            vec![
                LdLoc(1),
                LdcR4(0.5),
                Sub,
                LdLoc(0),
                ConvR4,
                Mul,
                StLoc(1),
                LdLoc(0),
                LdcI4(2),
                Div,
                LdcI4(3),
                Rem,
                StLoc(0),
                LdLoc(0),
                Neg,
                StLoc(0),
                LdLoc(0),
                LdcI4(1),
                Sub,
                StLoc(0),
                Ret,
            ]
        );
    }

    #[test]
    fn test_string_equality_uses_host_call() {
        let code = main_code(
            vec![],
            vec![
                local("string", &["s"]),
                if_(rel(var("s"), RelOp::Ne, lit_str("x")), empty(), None).into(),
            ],
        );
        assert_eq!(
            &code[..5],
            &[
                LdLoc(0),
                LdStr("x".to_string()),
                CallHost(HostCall::StringEquals),
                LdcI4(0),
                Ceq,
            ]
        );
    }

    #[test]
    fn test_intrinsics_lower_to_list_calls_and_conversions() {
        let int = || IRType::Int32;
        let code = main_code(
            vec![],
            vec![
                local("int[]", &["xs"]),
                local("int", &["n"]),
                local("char", &["c"]),
                call_stmt("add", vec![var("xs"), lit_int(5)]).into(),
                assign("n", call("len", vec![var("xs")])).into(),
                call_stmt("del", vec![var("xs"), lit_int(0)]).into(),
                assign("n", call("ord", vec![var("c")])).into(),
                assign("c", call("chr", vec![var("n")])).into(),
            ],
        );
        assert_eq!(
            code,
            vec![
                LdLoc(0),
                LdcI4(5),
                CallVirt { method: ListMethod::Add, elem: int() },
                LdLoc(0),
                CallVirt { method: ListMethod::Count, elem: int() },
                StLoc(1),
                LdLoc(0),
                LdcI4(0),
                CallVirt { method: ListMethod::RemoveAt, elem: int() },
                LdLoc(2),
                ConvI4,
                StLoc(1),
                LdLoc(1),
                ConvU2,
                StLoc(2),
                Ret,
            ]
        );
    }

    #[test]
    fn test_user_call_result_is_popped_in_statement() {
        let code = main_code(
            vec![method("F", Some("int"), &[("int", "a")], vec![ret(Some(var("a"))).into()])],
            vec![call_stmt("F", vec![lit_int(1)]).into()],
        );
        assert_eq!(
            code,
            vec![LdcI4(1), Call { method: "F".to_string(), argc: 1 }, Pop, Ret]
        );
    }

    #[test]
    fn test_fields_indexes_and_creation() {
        let node = || "Node".to_string();
        let code = main_code(
            vec![class("Node", &[("int[]", "data")])],
            vec![
                local("Node", &["n"]),
                assign("n", new_obj("Node")).into(),
                assign_to(field(desig("n"), "data"), new_array("int", lit_int(3))).into(),
                assign_to(index(field(desig("n"), "data"), lit_int(0)), lit_int(9)).into(),
                read(index(field(desig("n"), "data"), lit_int(1))).into(),
            ],
        );
        let int = || IRType::Int32;
        assert_eq!(
            code,
            vec![
                NewObj(node()),
                StLoc(0),
                LdLoc(0),
                LdcI4(3),
                NewList { elem: int(), sized: true },
                StFld { class: node(), field: "data".to_string() },
                LdLoc(0),
                LdFld { class: node(), field: "data".to_string() },
                LdcI4(0),
                LdcI4(9),
                CallVirt { method: ListMethod::SetItem, elem: int() },
                LdLoc(0),
                LdFld { class: node(), field: "data".to_string() },
                LdcI4(1),
                CallHost(HostCall::ReadLine),
                CallHost(HostCall::ParseInt),
                CallVirt { method: ListMethod::SetItem, elem: int() },
                Ret,
            ]
        );
    }

    #[test]
    fn test_indexed_increment_uses_scratch_locals() {
        let module = build(vec![main_with(vec![
            local("int[]", &["xs"]),
            inc(index(desig("xs"), lit_int(2))).into(),
        ])]);
        let main = module.method("Main").expect("Main");
        let int = || IRType::Int32;
        assert_eq!(main.locals.len(), 3);
        assert_eq!(
            main.code,
            vec![
                LdLoc(0),
                StLoc(1),
                LdcI4(2),
                StLoc(2),
                LdLoc(1),
                LdLoc(2),
                LdLoc(1),
                LdLoc(2),
                CallVirt { method: ListMethod::GetItem, elem: int() },
                LdcI4(1),
                Add,
                CallVirt { method: ListMethod::SetItem, elem: int() },
                Ret,
            ]
        );
    }

    #[test]
    fn test_constants_are_inlined_and_lists_built() {
        let code = main_code(
            vec![constant("int", "N", Literal::Int(4))],
            vec![
                local("int[]", &["xs"]),
                assign("xs", list(vec![var("N"), lit_int(5)])).into(),
                write_w(var("N"), 6).into(),
            ],
        );
        let int = || IRType::Int32;
        assert_eq!(
            code,
            vec![
                NewList { elem: int(), sized: false },
                Dup,
                LdcI4(4),
                CallVirt { method: ListMethod::Add, elem: int() },
                Dup,
                LdcI4(5),
                CallVirt { method: ListMethod::Add, elem: int() },
                StLoc(0),
                LdcI4(4),
                LdcI4(6),
                CallHost(HostCall::WritePadded(int())),
                Ret,
            ]
        );
    }

    #[test]
    fn test_non_void_method_gets_default_return() {
        let module = build(vec![
            method("F", Some("double"), &[], vec![
                if_(cond_expr(lit_bool(true)), ret(Some(lit_double(1.5))), None).into(),
            ]),
            main_with(vec![]),
        ]);
        let f = module.method("F").expect("F");
        assert_eq!(&f.code[f.code.len() - 2..], &[LdcR8(0.0), Ret]);
    }

    #[test]
    fn test_nested_blocks_get_distinct_slots() {
        let module = build(vec![main_with(vec![
            block(vec![local("int", &["t"]), assign("t", lit_int(1)).into()]).into(),
            block(vec![local("char", &["t"]), assign("t", lit_char('z')).into()]).into(),
        ])]);
        let main = module.method("Main").expect("Main");
        assert_eq!(
            main.locals,
            vec![
                IRLocal { name: "t".to_string(), ty: IRType::Int32 },
                IRLocal { name: "t".to_string(), ty: IRType::Char },
            ]
        );
        assert_eq!(main.code, vec![LdcI4(1), StLoc(0), LdcI4('z' as i32), StLoc(1), Ret]);
    }

    #[test]
    fn test_missing_annotation_is_fatal() {
        let p = program(vec![main_with(vec![write(lit_int(1)).into()])]);
        let mut symbols = SymbolTable::new();
        symbols.open_scope();
        symbols.insert_method(&ident("Main"), TypeTag::VOID, vec![], Span::dummy());
        let err = IRGenerator::new(symbols, TypeAnnotations::default(), "Main")
            .generate(&p)
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedConstruct(_)));
        assert_eq!(err.span(), None);
    }

    #[test]
    fn test_diagnostics_block_generation() {
        let p = program(vec![main_with(vec![assign("ghost", lit_int(1)).into()])]);
        let errors = compile(&p, CheckerConfig::default()).unwrap_err();
        assert!(matches!(errors[0], Error::UndeclaredSymbol { .. }));
    }

    #[test]
    fn test_int_range_boundaries() {
        let code = main_code(
            vec![],
            vec![
                local("int", &["i"]),
                assign("i", lit_int(2147483647)).into(),
                assign("i", neg(lit_int(2147483648))).into(),
                assign("i", minus(neg(lit_int(2147483648)), lit_int(1))).into(),
                assign("i", neg(lit_int(5))).into(),
            ],
        );
        assert_eq!(
            code,
            vec![
                LdcI4(i32::MAX),
                StLoc(0),
                LdcI4(i32::MIN),
                StLoc(0),
                LdcI4(i32::MIN),
                LdcI4(1),
                Sub,
                StLoc(0),
                LdcI4(5),
                Neg,
                StLoc(0),
                Ret,
            ]
        );

        let p = program(vec![main_with(vec![
            local("int", &["i"]),
            assign("i", lit_int(3000000000)).into(),
        ])]);
        let errors = compile(&p, CheckerConfig::default()).unwrap_err();
        assert!(matches!(errors.as_slice(), [Error::TypeMismatch { .. }]));
    }

    #[test]
    fn test_empty_list_is_a_fresh_list() {
        let code = main_code(
            vec![],
            vec![
                local("int[]", &["xs"]),
                local("int[][]", &["grid"]),
                assign("xs", list(vec![])).into(),
                call_stmt("add", vec![var("xs"), lit_int(1)]).into(),
                call_stmt("add", vec![var("grid"), list(vec![])]).into(),
            ],
        );
        let int = || IRType::Int32;
        assert_eq!(
            code,
            vec![
                NewList { elem: int(), sized: false },
                StLoc(0),
                LdLoc(0),
                LdcI4(1),
                CallVirt { method: ListMethod::Add, elem: int() },
                LdLoc(1),
                NewList { elem: int(), sized: false },
                CallVirt { method: ListMethod::Add, elem: IRType::List(Box::new(int())) },
                Ret,
            ]
        );
    }

    #[test]
    fn test_multi_dimensional_array_fills_rows() {
        let module = build(vec![main_with(vec![
            local("int[][]", &["grid"]),
            assign("grid", new_array_dims("int", vec![lit_int(2), lit_int(3)])).into(),
        ])]);
        let main = module.method("Main").expect("Main");
        let int = || IRType::Int32;
        let row = || IRType::List(Box::new(int()));
        assert_eq!(main.locals.len(), 4);
        assert_eq!(main.locals[1].name, "$t0");
        assert_eq!(
            main.code,
            vec![
                LdcI4(2),
                StLoc(1),
                LdcI4(3),
                StLoc(2),
                LdcI4(0),
                StLoc(3),
                NewList { elem: row(), sized: false },
                Br(Label(1)),
                Mark(Label(0)),
                Dup,
                LdLoc(2),
                NewList { elem: int(), sized: true },
                CallVirt { method: ListMethod::Add, elem: row() },
                LdLoc(3),
                LdcI4(1),
                Add,
                StLoc(3),
                Mark(Label(1)),
                LdLoc(3),
                LdLoc(1),
                Clt,
                BrTrue(Label(0)),
                StLoc(0),
                Ret,
            ]
        );
        assert!(main.labels_resolved());
    }
}
