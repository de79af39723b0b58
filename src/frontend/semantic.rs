//! Semantic Analysis for MiniCS
//!
//! Performs:
//! - Declaration of classes, fields, constants, globals, methods and locals
//! - Type checking of every expression and statement
//! - Control-flow legality (`break`, `return`, `switch`)
//! - Entry-point verification
//!
//! The checker never stops at the first problem. Every violation is pushed
//! into `errors` and the walk continues with `TypeTag::UNKNOWN` standing in for
//! whatever could not be resolved.

use std::collections::HashMap;

use crate::frontend::ast::*;
use crate::frontend::symbol_table::{DeclSite, SymbolKind, SymbolTable};
use crate::stdlib::builtins::{is_readable, is_writable};
use crate::stdlib::Intrinsic;
use crate::types::TypeTag;
use crate::utils::{Error, Span};

// ==================== Configuration ====================

/// Checker settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckerConfig {
    /// Name of the required `void Name()` method
    pub entry_point: String,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            entry_point: "Main".to_string(),
        }
    }
}

// ==================== Annotations ====================

/// Resolved type of every expression-level node
#[derive(Debug, Clone, Default)]
pub struct TypeAnnotations {
    types: HashMap<NodeId, TypeTag>,
}

impl TypeAnnotations {
    pub fn record(&mut self, id: NodeId, ty: TypeTag) {
        self.types.insert(id, ty);
    }

    pub fn get(&self, id: NodeId) -> Option<TypeTag> {
        self.types.get(&id).copied()
    }

    /// Number of annotated nodes
    pub fn count(&self) -> usize {
        self.types.len()
    }
}

/// Everything the checker hands on to code generation
#[derive(Debug)]
pub struct Analysis {
    pub symbols: SymbolTable,
    pub annotations: TypeAnnotations,
    pub errors: Vec<Error>,
}

impl Analysis {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

// ==================== Checker ====================

/// Semantic checker
pub struct SemanticChecker {
    symbols: SymbolTable,
    annotations: TypeAnnotations,
    errors: Vec<Error>,
    config: CheckerConfig,
    loop_depth: u32,
    switch_depth: u32,
    /// Declared return type of the method being checked
    current_return: TypeTag,
    /// Uses of names whose declared type already failed to resolve
    unresolved_uses: usize,
}

impl SemanticChecker {
    pub fn new(config: CheckerConfig) -> Self {
        Self {
            symbols: SymbolTable::new(),
            annotations: TypeAnnotations::default(),
            errors: Vec::new(),
            config,
            loop_depth: 0,
            switch_depth: 0,
            current_return: TypeTag::VOID,
            unresolved_uses: 0,
        }
    }

    /// Hand over the symbol table (global scope still open) and annotations
    pub fn finish(self) -> Analysis {
        Analysis {
            symbols: self.symbols,
            annotations: self.annotations,
            errors: self.errors,
        }
    }

    /// Check a whole program
    pub fn analyze(&mut self, program: &Program) {
        self.symbols.open_scope();

        // Classes first so any declaration may name any class
        let mut fresh_classes = Vec::new();
        for item in &program.items {
            if let Item::Class(class) = item {
                if self.symbols.insert_class(&class.name, class.span) {
                    fresh_classes.push(class);
                } else {
                    self.redeclared(&class.name);
                }
            }
        }
        for class in fresh_classes {
            self.declare_fields(class);
        }
        log::debug!("declared classes of program '{}'", program.name.name);

        for item in &program.items {
            match item {
                Item::Const(decl) => self.declare_const(decl),
                Item::Var(decl) => self.declare_vars(decl, DeclSite::Global),
                Item::Method(method) => self.declare_method(method),
                Item::Class(_) => {}
            }
        }

        for item in &program.items {
            if let Item::Method(method) = item {
                self.check_method(method);
            }
        }

        self.check_entry_point(program);
        log::debug!(
            "semantic analysis of '{}' finished with {} error(s)",
            program.name.name,
            self.errors.len()
        );
    }

    // ==================== Diagnostics helpers ====================

    fn report(&mut self, error: Error) {
        log::trace!("diagnostic: {}", error);
        self.errors.push(error);
    }

    fn mismatch(&mut self, message: impl Into<String>, span: Span) {
        self.report(Error::mismatch(message, span));
    }

    fn redeclared(&mut self, name: &Ident) {
        self.report(Error::Redeclaration {
            name: name.name.clone(),
            span: name.span,
        });
    }

    /// Errors reported so far; pair with `poisoned` to silence follow-ups
    fn mark(&self) -> usize {
        self.errors.len() + self.unresolved_uses
    }

    fn poisoned(&self, mark: usize, tys: &[TypeTag]) -> bool {
        self.mark() > mark && tys.iter().any(|t| t.is_unknown())
    }

    /// `ty` as read from a symbol; an unknown one was reported at its declaration
    fn declared(&mut self, ty: TypeTag) -> TypeTag {
        if ty.is_unknown() {
            self.unresolved_uses += 1;
        }
        ty
    }

    fn pretty(&self, tag: TypeTag) -> String {
        self.symbols.pretty(tag)
    }

    // ==================== Declarations ====================

    fn resolve_type(&mut self, ty: &TypeName) -> TypeTag {
        let tag = self.symbols.type_from_bracketed(&ty.name);
        if tag.is_unknown() {
            self.report(Error::UnknownType {
                name: ty.name.clone(),
                span: ty.span,
            });
        }
        tag
    }

    /// Like `resolve_type`, but `void` is rejected
    fn resolve_value_type(&mut self, ty: &TypeName) -> TypeTag {
        let tag = self.resolve_type(ty);
        if tag == TypeTag::VOID {
            self.mismatch("'void' is not a valid variable type", ty.span);
            return TypeTag::UNKNOWN;
        }
        tag
    }

    fn declare_fields(&mut self, class: &ClassDecl) {
        for decl in &class.fields {
            let ty = self.resolve_value_type(&decl.ty);
            for name in &decl.names {
                if !self.symbols.insert_field(&class.name.name, name, ty, decl.span) {
                    self.redeclared(name);
                }
            }
        }
    }

    fn declare_const(&mut self, decl: &ConstDecl) {
        let ty = self.resolve_value_type(&decl.ty);
        let value_ty = self.check_literal(&decl.value, decl.name.span);
        if !ty.is_unknown() && !self.assignable(ty, value_ty) {
            self.mismatch(
                format!(
                    "constant '{}' of type {} cannot hold {}",
                    decl.name.name,
                    self.pretty(ty),
                    decl.value
                ),
                decl.name.span,
            );
        }
        if !self
            .symbols
            .insert_variable(&decl.name, ty, true, DeclSite::Constant, decl.span)
        {
            self.redeclared(&decl.name);
        }
    }

    fn declare_vars(&mut self, decl: &VarDecl, site: DeclSite) {
        let ty = self.resolve_value_type(&decl.ty);
        for name in &decl.names {
            if !self.symbols.insert_variable(name, ty, false, site, decl.span) {
                self.redeclared(name);
            }
        }
    }

    /// Signature types are reported here, once, before any body is checked
    fn declare_method(&mut self, method: &MethodDecl) {
        let ret = match &method.ret {
            Some(ty) => self.resolve_type(ty),
            None => TypeTag::VOID,
        };
        let params = method
            .params
            .iter()
            .map(|p| self.resolve_value_type(&p.ty))
            .collect();
        if !self.symbols.insert_method(&method.name, ret, params, method.span) {
            self.redeclared(&method.name);
        }
    }

    /// Signature type already reported by `declare_method`
    fn signature_type(&self, ty: &TypeName) -> TypeTag {
        match self.symbols.type_from_bracketed(&ty.name) {
            TypeTag::VOID => TypeTag::UNKNOWN,
            tag => tag,
        }
    }

    fn check_method(&mut self, method: &MethodDecl) {
        self.current_return = match &method.ret {
            Some(ty) => self.symbols.type_from_bracketed(&ty.name),
            None => TypeTag::VOID,
        };
        self.symbols.open_scope();
        for param in &method.params {
            let ty = self.signature_type(&param.ty);
            let decl = pick(param.ty.span, param.name.span);
            if !self
                .symbols
                .insert_variable(&param.name, ty, false, DeclSite::Param, decl)
            {
                self.redeclared(&param.name);
            }
        }
        // The body shares the parameter scope
        self.check_block_items(&method.body.items);
        self.symbols.close_scope();
        self.current_return = TypeTag::VOID;
        log::debug!("checked method '{}'", method.name.name);
    }

    fn check_entry_point(&mut self, program: &Program) {
        let name = self.config.entry_point.clone();
        let valid = matches!(
            self.symbols.lookup_in_current_level(&name),
            Some(sym) if matches!(
                &sym.kind,
                SymbolKind::Method { ret, params } if *ret == TypeTag::VOID && params.is_empty()
            )
        );
        if !valid {
            self.report(Error::MissingEntryPoint {
                name,
                span: program.span,
            });
        }
    }

    // ==================== Statements ====================

    fn check_block_items(&mut self, items: &[BlockItem]) {
        for item in items {
            match item {
                BlockItem::Var(decl) => self.declare_vars(decl, DeclSite::Local),
                BlockItem::Stmt(stmt) => self.check_stmt(stmt),
            }
        }
    }

    fn check_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Assign { target, value, span } => {
                let lt = self.check_target(target);
                let mark = self.mark();
                let rt = self.check_expr_against(value, lt);
                if !self.poisoned(mark, &[rt]) && !lt.is_unknown() && !self.assignable(lt, rt) {
                    self.mismatch(
                        format!("cannot assign {} to {}", self.pretty(rt), self.pretty(lt)),
                        pick(*span, value.span),
                    );
                }
            }
            Stmt::Call { callee, args, span } => {
                self.check_call(callee, args, *span);
            }
            Stmt::Increment { target, span } | Stmt::Decrement { target, span } => {
                let mark = self.mark();
                let ty = self.check_target(target);
                if ty != TypeTag::INT && !self.poisoned(mark, &[ty]) {
                    let op = if matches!(stmt, Stmt::Increment { .. }) { "++" } else { "--" };
                    self.mismatch(
                        format!("'{}' requires an int designator, found {}", op, self.pretty(ty)),
                        pick(*span, target.span),
                    );
                }
            }
            Stmt::If {
                cond,
                then_branch,
                else_branch,
                ..
            } => {
                self.check_condition(cond);
                self.check_stmt(then_branch);
                if let Some(else_branch) = else_branch {
                    self.check_stmt(else_branch);
                }
            }
            Stmt::While { cond, body, .. } => {
                self.check_condition(cond);
                self.loop_depth += 1;
                self.check_stmt(body);
                self.loop_depth -= 1;
            }
            Stmt::For {
                init,
                cond,
                update,
                body,
                ..
            } => {
                if let Some(init) = init {
                    self.check_stmt(init);
                }
                if let Some(cond) = cond {
                    self.check_condition(cond);
                }
                if let Some(update) = update {
                    self.check_stmt(update);
                }
                self.loop_depth += 1;
                self.check_stmt(body);
                self.loop_depth -= 1;
            }
            Stmt::Break { span } => {
                if self.loop_depth == 0 && self.switch_depth == 0 {
                    self.report(Error::ControlFlowMisuse {
                        message: "'break' outside of a loop or switch".to_string(),
                        span: *span,
                    });
                }
            }
            Stmt::Return { value, span } => self.check_return(value.as_ref(), *span),
            Stmt::Read { target, span } => {
                let mark = self.mark();
                let ty = self.check_target(target);
                if !is_readable(ty) && !self.poisoned(mark, &[ty]) {
                    self.mismatch(
                        format!("read requires an int designator, found {}", self.pretty(ty)),
                        pick(*span, target.span),
                    );
                }
            }
            Stmt::Write { value, width, span } => {
                let mark = self.mark();
                let ty = self.check_expr(value);
                if !is_writable(ty) && !self.poisoned(mark, &[ty]) {
                    self.mismatch(
                        format!("cannot write a value of type {}", self.pretty(ty)),
                        pick(*span, value.span),
                    );
                }
                if let Some(width) = width {
                    if i32::try_from(*width).is_err() {
                        self.mismatch(format!("write width {} is out of range for int", width), *span);
                    }
                }
            }
            Stmt::Switch {
                selector,
                cases,
                default,
                span,
            } => self.check_switch(selector, cases, default.as_ref(), *span),
            Stmt::Block(block) => {
                self.symbols.open_scope();
                self.check_block_items(&block.items);
                self.symbols.close_scope();
            }
            Stmt::Empty { .. } => {}
        }
    }

    fn check_return(&mut self, value: Option<&Expr>, span: Span) {
        let expected = self.current_return;
        match value {
            None => {
                if expected != TypeTag::VOID && !expected.is_unknown() {
                    self.mismatch(
                        format!("missing return value of type {}", self.pretty(expected)),
                        span,
                    );
                }
            }
            Some(expr) => {
                let mark = self.mark();
                let ty = self.check_expr_against(expr, expected);
                if expected == TypeTag::VOID {
                    self.mismatch("a void method cannot return a value", pick(span, expr.span));
                } else if !expected.is_unknown()
                    && !self.poisoned(mark, &[ty])
                    && !self.assignable(expected, ty)
                {
                    self.mismatch(
                        format!(
                            "return type {} does not match declared {}",
                            self.pretty(ty),
                            self.pretty(expected)
                        ),
                        pick(span, expr.span),
                    );
                }
            }
        }
    }

    fn check_switch(
        &mut self,
        selector: &Expr,
        cases: &[SwitchCase],
        default: Option<&DefaultCase>,
        span: Span,
    ) {
        let mark = self.mark();
        let st = self.check_expr(selector);
        let typed = st == TypeTag::INT || st == TypeTag::CHAR;
        if !typed && !self.poisoned(mark, &[st]) {
            self.mismatch(
                format!("switch selector must be int or char, found {}", self.pretty(st)),
                pick(selector.span, span),
            );
        }

        self.switch_depth += 1;
        let mut seen: Vec<&Literal> = Vec::new();
        for case in cases {
            let lt = self.check_literal(&case.label, case.span);
            if typed && lt != st {
                self.mismatch(
                    format!(
                        "case label {} does not match selector type {}",
                        case.label,
                        self.pretty(st)
                    ),
                    case.span,
                );
            }
            if seen.contains(&&case.label) {
                self.report(Error::DuplicateCaseLabel {
                    label: case.label.to_string(),
                    span: case.span,
                });
            } else {
                seen.push(&case.label);
            }
            for stmt in &case.body {
                self.check_stmt(stmt);
            }
        }
        if let Some(default) = default {
            for stmt in &default.body {
                self.check_stmt(stmt);
            }
        }
        self.switch_depth -= 1;
    }

    // ==================== Designators ====================

    /// Resolve a designator that is about to be written
    fn check_target(&mut self, target: &Designator) -> TypeTag {
        let ty = self.check_designator(target);
        let constant = target.selectors.is_empty()
            && self
                .symbols
                .lookup(&target.base.name)
                .map(|s| s.is_constant())
                .unwrap_or(false);
        if constant {
            self.report(Error::ConstantAssignment {
                name: target.base.name.clone(),
                span: target.base.span,
            });
        }
        ty
    }

    fn check_designator(&mut self, desig: &Designator) -> TypeTag {
        let mut ty = match self.symbols.lookup(&desig.base.name) {
            None => {
                self.report(Error::UndeclaredSymbol {
                    name: desig.base.name.clone(),
                    span: desig.base.span,
                });
                TypeTag::UNKNOWN
            }
            Some(sym) if !sym.is_variable() => {
                let name = sym.name.clone();
                self.mismatch(format!("'{}' is not a variable", name), desig.base.span);
                TypeTag::UNKNOWN
            }
            Some(sym) => {
                let ty = sym.ty;
                self.declared(ty)
            }
        };

        for selector in &desig.selectors {
            match selector {
                Selector::Field(field) => {
                    if ty.is_unknown() {
                        continue;
                    }
                    match self.symbols.lookup_field(ty, &field.name) {
                        Some(sym) => {
                            let field_ty = sym.ty;
                            ty = self.declared(field_ty);
                        }
                        None => {
                            self.report(Error::UnknownField {
                                field: field.name.clone(),
                                ty: self.pretty(ty),
                                span: field.span,
                            });
                            ty = TypeTag::UNKNOWN;
                        }
                    }
                }
                Selector::Index(index) => {
                    let mark = self.mark();
                    let it = self.check_expr(index);
                    if it != TypeTag::INT && !self.poisoned(mark, &[it]) {
                        self.mismatch(
                            format!("index must be int, found {}", self.pretty(it)),
                            index.span,
                        );
                    }
                    if ty.is_unknown() {
                        continue;
                    }
                    if ty.is_list() {
                        ty = ty.element();
                    } else {
                        self.mismatch(
                            format!("cannot index a value of type {}", self.pretty(ty)),
                            pick(index.span, desig.span),
                        );
                        ty = TypeTag::UNKNOWN;
                    }
                }
            }
        }

        self.annotations.record(desig.id, ty);
        ty
    }

    // ==================== Calls ====================

    /// Argument types, each checked against its parameter type when known
    fn check_args(&mut self, args: &[Expr], params: &[TypeTag]) -> Vec<(TypeTag, bool)> {
        args.iter()
            .enumerate()
            .map(|(i, arg)| {
                let mark = self.mark();
                let expected = params.get(i).copied().unwrap_or(TypeTag::UNKNOWN);
                let ty = self.check_expr_against(arg, expected);
                (ty, self.poisoned(mark, &[ty]))
            })
            .collect()
    }

    /// Type-check a call and return its result type
    fn check_call(&mut self, callee: &Designator, args: &[Expr], span: Span) -> TypeTag {
        let name = callee.base.name.clone();
        let span = pick(span, callee.span);
        if !callee.selectors.is_empty() {
            self.check_args(args, &[]);
            self.report(Error::NotCallable { name, span });
            return TypeTag::UNKNOWN;
        }
        if let Some(intrinsic) = Intrinsic::from_name(&name) {
            return self.check_intrinsic(intrinsic, args, span);
        }

        let signature = self.symbols.lookup(&name).map(|s| s.kind.clone());
        let (ret, params) = match signature {
            None => {
                self.check_args(args, &[]);
                self.report(Error::UndeclaredSymbol { name, span });
                return TypeTag::UNKNOWN;
            }
            Some(SymbolKind::Method { ret, params }) => (self.declared(ret), params),
            Some(_) => {
                self.check_args(args, &[]);
                self.report(Error::NotCallable { name, span });
                return TypeTag::UNKNOWN;
            }
        };
        let actual = self.check_args(args, &params);

        if params.len() != actual.len() {
            self.report(Error::ArityMismatch {
                name,
                expected: params.len(),
                got: actual.len(),
                span,
            });
            return ret;
        }
        for (i, ((param, (got, poisoned)), arg)) in params.iter().zip(&actual).zip(args).enumerate() {
            if !*poisoned && !param.is_unknown() && !self.assignable(*param, *got) {
                self.mismatch(
                    format!(
                        "argument {} of '{}' expects {}, found {}",
                        i + 1,
                        name,
                        self.pretty(*param),
                        self.pretty(*got)
                    ),
                    pick(arg.span, span),
                );
            }
        }
        ret
    }

    fn check_intrinsic(&mut self, intrinsic: Intrinsic, args: &[Expr], span: Span) -> TypeTag {
        let (head, rest) = args.split_at(args.len().min(1));
        let mut actual = self.check_args(head, &[]);
        // `add(xs, [])` takes the element type of `xs`
        let element = match (intrinsic, actual.first()) {
            (Intrinsic::Add, Some((first, _))) if first.is_list() => first.element(),
            _ => TypeTag::UNKNOWN,
        };
        actual.extend(self.check_args(rest, &[element]));
        let result = intrinsic.result_type();
        if actual.len() != intrinsic.arity() {
            self.report(Error::ArityMismatch {
                name: intrinsic.name().to_string(),
                expected: intrinsic.arity(),
                got: actual.len(),
                span,
            });
            return result;
        }

        let name = intrinsic.name();
        let (first, first_poisoned) = actual[0];
        let first_is_list = first.is_list() || first_poisoned;
        match intrinsic {
            Intrinsic::Len | Intrinsic::Add | Intrinsic::Del if !first_is_list => {
                self.mismatch(
                    format!("'{}' expects a list, found {}", name, self.pretty(first)),
                    pick(args[0].span, span),
                );
            }
            Intrinsic::Add => {
                let (value, poisoned) = actual[1];
                if !first_poisoned && !poisoned && !self.assignable(first.element(), value) {
                    self.mismatch(
                        format!(
                            "cannot add {} to {}",
                            self.pretty(value),
                            self.pretty(first)
                        ),
                        pick(args[1].span, span),
                    );
                }
            }
            Intrinsic::Del => {
                let (index, poisoned) = actual[1];
                if index != TypeTag::INT && !poisoned {
                    self.mismatch(
                        format!("'del' index must be int, found {}", self.pretty(index)),
                        pick(args[1].span, span),
                    );
                }
            }
            Intrinsic::Ord if first != TypeTag::CHAR && !first_poisoned => {
                self.mismatch(
                    format!("'ord' expects char, found {}", self.pretty(first)),
                    pick(args[0].span, span),
                );
            }
            Intrinsic::Chr if first != TypeTag::INT && !first_poisoned => {
                self.mismatch(
                    format!("'chr' expects int, found {}", self.pretty(first)),
                    pick(args[0].span, span),
                );
            }
            _ => {}
        }
        result
    }

    // ==================== Expressions ====================

    /// Like `check_expr`, but a bare `[]` takes the list type `expected`
    /// An `unknown` expectation comes from an error already reported, so it
    /// is accepted silently.
    fn check_expr_against(&mut self, expr: &Expr, expected: TypeTag) -> TypeTag {
        let inferred = expected.is_list() || expected.is_unknown();
        if !inferred || !expr.is_empty_list() {
            return self.check_expr(expr);
        }
        self.annotations.record(expr.head.head.id, expected);
        self.annotations.record(expr.head.id, expected);
        self.annotations.record(expr.id, expected);
        expected
    }

    fn check_expr(&mut self, expr: &Expr) -> TypeTag {
        let mark = self.mark();
        let mut ty = if expr.negates_int_min() {
            self.annotations.record(expr.head.head.id, TypeTag::INT);
            self.annotations.record(expr.head.id, TypeTag::INT);
            TypeTag::INT
        } else {
            self.check_term(&expr.head)
        };

        if let Some(target) = &expr.cast {
            let target_ty = self.resolve_type(target);
            if !target_ty.is_unknown() && !target_ty.is_numeric() {
                self.mismatch(
                    format!("cast target must be numeric, found {}", self.pretty(target_ty)),
                    target.span,
                );
            } else if !ty.is_numeric() && !self.poisoned(mark, &[ty]) {
                self.mismatch(
                    format!(
                        "cannot cast {} to {}",
                        self.pretty(ty),
                        self.pretty(target_ty)
                    ),
                    pick(expr.span, target.span),
                );
            }
            ty = target_ty;
        }

        if expr.neg && !ty.is_numeric() {
            if !self.poisoned(mark, &[ty]) {
                self.mismatch(
                    format!("unary '-' requires a numeric operand, found {}", self.pretty(ty)),
                    expr.span,
                );
            }
            ty = TypeTag::UNKNOWN;
        }

        for (op, term) in &expr.tail {
            let rt = self.check_term(term);
            let symbol = match op {
                AddOp::Add => "+",
                AddOp::Sub => "-",
            };
            ty = self.arith(ty, rt, symbol, pick(term.span, expr.span), mark);
        }

        self.annotations.record(expr.id, ty);
        ty
    }

    fn check_term(&mut self, term: &Term) -> TypeTag {
        let mark = self.mark();
        let mut ty = self.check_factor(&term.head);
        for (op, factor) in &term.tail {
            let rt = self.check_factor(factor);
            let symbol = match op {
                MulOp::Mul => "*",
                MulOp::Div => "/",
                MulOp::Rem => "%",
            };
            ty = self.arith(ty, rt, symbol, pick(factor.span, term.span), mark);
        }
        self.annotations.record(term.id, ty);
        ty
    }

    /// Result of a binary arithmetic operator under numeric promotion
    fn arith(&mut self, lt: TypeTag, rt: TypeTag, op: &str, span: Span, mark: usize) -> TypeTag {
        if let Some(ty) = TypeTag::promote(lt, rt) {
            return ty;
        }
        if !self.poisoned(mark, &[lt, rt]) {
            self.mismatch(
                format!(
                    "operator '{}' cannot be applied to {} and {}",
                    op,
                    self.pretty(lt),
                    self.pretty(rt)
                ),
                span,
            );
        }
        TypeTag::UNKNOWN
    }

    /// Literal type; values the host int and char cannot hold are rejected
    fn check_literal(&mut self, lit: &Literal, span: Span) -> TypeTag {
        match lit {
            Literal::Int(n) if i32::try_from(*n).is_err() => {
                self.mismatch(format!("integer literal {} is out of range for int", n), span);
            }
            Literal::Char(c) if u32::from(*c) > 0xFFFF => {
                self.mismatch(format!("character literal {} does not fit in a char", lit), span);
            }
            _ => {}
        }
        literal_type(lit)
    }

    fn check_factor(&mut self, factor: &Factor) -> TypeTag {
        let ty = match &factor.kind {
            FactorKind::Literal(lit) => self.check_literal(lit, factor.span),
            FactorKind::Designator(desig) => self.check_designator(desig),
            FactorKind::Call { callee, args } => {
                let ret = self.check_call(callee, args, factor.span);
                if ret == TypeTag::VOID {
                    self.mismatch(
                        format!("'{}' does not return a value", callee.base.name),
                        pick(factor.span, callee.span),
                    );
                    TypeTag::UNKNOWN
                } else {
                    ret
                }
            }
            FactorKind::New { class } => {
                let tag = self.symbols.type_from_name(&class.name);
                if !self.symbols.registry().is_custom_class(tag) {
                    self.report(Error::UnknownType {
                        name: class.name.clone(),
                        span: class.span,
                    });
                    TypeTag::UNKNOWN
                } else {
                    tag
                }
            }
            FactorKind::NewArray { elem, sizes } => {
                let elem_ty = self.resolve_value_type(elem);
                for size in sizes {
                    let mark = self.mark();
                    let size_ty = self.check_expr(size);
                    if size_ty != TypeTag::INT && !self.poisoned(mark, &[size_ty]) {
                        self.mismatch(
                            format!("array size must be int, found {}", self.pretty(size_ty)),
                            size.span,
                        );
                    }
                }
                sizes.iter().fold(elem_ty, |ty, _| ty.list_of())
            }
            FactorKind::Paren(inner) => self.check_expr(inner),
            FactorKind::List(elems) => self.check_list_literal(elems, factor.span),
        };
        self.annotations.record(factor.id, ty);
        ty
    }

    /// `[e1, e2, ...]`; `[]` is typed only where a list type is expected
    fn check_list_literal(&mut self, elems: &[Expr], span: Span) -> TypeTag {
        let mark = self.mark();
        let types: Vec<TypeTag> = elems.iter().map(|e| self.check_expr(e)).collect();
        let first = match types.first() {
            Some(first) => *first,
            None => {
                self.mismatch("the type of '[]' cannot be inferred here", span);
                return TypeTag::UNKNOWN;
            }
        };
        for (ty, elem) in types.iter().zip(elems).skip(1) {
            if *ty != first && !self.poisoned(mark, &[first, *ty]) {
                self.mismatch(
                    format!(
                        "list elements must share one type: {} and {}",
                        self.pretty(first),
                        self.pretty(*ty)
                    ),
                    pick(elem.span, span),
                );
                return TypeTag::UNKNOWN;
            }
        }
        first.list_of()
    }

    // ==================== Conditions ====================

    fn check_condition(&mut self, cond: &Condition) -> TypeTag {
        for term in &cond.terms {
            for fact in &term.facts {
                let mark = self.mark();
                let ty = self.check_fact(fact);
                if ty != TypeTag::BOOL && !self.poisoned(mark, &[ty]) {
                    self.mismatch(
                        format!("condition must be bool, found {}", self.pretty(ty)),
                        pick(fact.span, cond.span),
                    );
                }
            }
            self.annotations.record(term.id, TypeTag::BOOL);
        }
        self.annotations.record(cond.id, TypeTag::BOOL);
        TypeTag::BOOL
    }

    fn check_fact(&mut self, fact: &CondFact) -> TypeTag {
        let ty = match &fact.kind {
            CondFactKind::Expr(expr) => self.check_expr(expr),
            CondFactKind::Relation { left, op, right } => {
                let mark = self.mark();
                let lt = self.check_expr(left);
                let rt = self.check_expr(right);
                if !self.poisoned(mark, &[lt, rt]) && !self.comparable(lt, *op, rt) {
                    self.mismatch(
                        format!(
                            "cannot compare {} {} {}",
                            self.pretty(lt),
                            op.symbol(),
                            self.pretty(rt)
                        ),
                        pick(fact.span, left.span),
                    );
                }
                TypeTag::BOOL
            }
        };
        self.annotations.record(fact.id, ty);
        ty
    }

    // ==================== Type relations ====================

    /// Can a value of `src` be stored where `dst` is expected
    fn assignable(&self, dst: TypeTag, src: TypeTag) -> bool {
        dst == src || (src.is_unknown() && self.symbols.registry().is_reference(dst))
    }

    fn comparable(&self, lt: TypeTag, op: RelOp, rt: TypeTag) -> bool {
        let registry = self.symbols.registry();
        if op.is_equality() {
            if lt == rt {
                return lt.is_primitive() || registry.is_reference(lt);
            }
            // `x == null`
            return (lt.is_unknown() && registry.is_reference(rt))
                || (rt.is_unknown() && registry.is_reference(lt));
        }
        lt == rt && (lt.is_numeric() || lt == TypeTag::CHAR)
    }
}

impl Default for SemanticChecker {
    fn default() -> Self {
        Self::new(CheckerConfig::default())
    }
}

/// Static type of a literal; `null` has no type of its own
pub fn literal_type(lit: &Literal) -> TypeTag {
    match lit {
        Literal::Int(_) => TypeTag::INT,
        Literal::Float(_) => TypeTag::FLOAT,
        Literal::Double(_) => TypeTag::DOUBLE,
        Literal::Char(_) => TypeTag::CHAR,
        Literal::Str(_) => TypeTag::STRING,
        Literal::Bool(_) => TypeTag::BOOL,
        Literal::Null => TypeTag::UNKNOWN,
    }
}

/// Prefer the first span unless it is a placeholder
fn pick(primary: Span, fallback: Span) -> Span {
    if primary.is_dummy() {
        fallback
    } else {
        primary
    }
}

/// Check a program with the given configuration
pub fn check_program(program: &Program, config: CheckerConfig) -> Analysis {
    let mut checker = SemanticChecker::new(config);
    checker.analyze(program);
    checker.finish()
}
