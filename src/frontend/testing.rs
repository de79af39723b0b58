//! Syntax-tree builders for unit tests
//!
//! The parser lives outside this crate, so tests assemble trees by hand.
//! Spans default to the dummy position unless a `*_at` builder is used.
#![allow(dead_code)]

use crate::frontend::ast::*;
use crate::utils::Span;

// ==================== Leaves ====================

pub fn ident(name: &str) -> Ident {
    Ident {
        name: name.to_string(),
        span: Span::dummy(),
    }
}

pub fn ident_at(name: &str, line: u32, column: u32) -> Ident {
    Ident {
        name: name.to_string(),
        span: Span::new(line, column),
    }
}

pub fn ty(name: &str) -> TypeName {
    TypeName {
        name: name.to_string(),
        span: Span::dummy(),
    }
}

pub fn factor(kind: FactorKind) -> Factor {
    Factor {
        id: NodeId::default(),
        kind,
        span: Span::dummy(),
    }
}

pub fn term_of(f: Factor) -> Term {
    Term {
        id: NodeId::default(),
        head: f,
        tail: Vec::new(),
        span: Span::dummy(),
    }
}

pub fn expr_of(f: Factor) -> Expr {
    Expr {
        id: NodeId::default(),
        neg: false,
        cast: None,
        head: term_of(f),
        tail: Vec::new(),
        span: Span::dummy(),
    }
}

fn is_plain(e: &Expr) -> bool {
    !e.neg && e.cast.is_none() && e.tail.is_empty()
}

/// View an expression as a single factor, parenthesising when needed
pub fn as_factor(e: Expr) -> Factor {
    if is_plain(&e) && e.head.tail.is_empty() {
        e.head.head
    } else {
        factor(FactorKind::Paren(Box::new(e)))
    }
}

fn as_term(e: Expr) -> Term {
    if is_plain(&e) {
        e.head
    } else {
        term_of(factor(FactorKind::Paren(Box::new(e))))
    }
}

// ==================== Expressions ====================

pub fn lit(l: Literal) -> Expr {
    expr_of(factor(FactorKind::Literal(l)))
}

pub fn lit_int(n: i64) -> Expr {
    lit(Literal::Int(n))
}

pub fn lit_double(x: f64) -> Expr {
    lit(Literal::Double(x))
}

pub fn lit_float(x: f64) -> Expr {
    lit(Literal::Float(x))
}

pub fn lit_str(s: &str) -> Expr {
    lit(Literal::Str(s.to_string()))
}

pub fn lit_char(c: char) -> Expr {
    lit(Literal::Char(c))
}

pub fn lit_bool(b: bool) -> Expr {
    lit(Literal::Bool(b))
}

pub fn lit_null() -> Expr {
    lit(Literal::Null)
}

pub fn desig(name: &str) -> Designator {
    Designator {
        id: NodeId::default(),
        base: ident(name),
        selectors: Vec::new(),
        span: Span::dummy(),
    }
}

/// `d.name`
pub fn field(mut d: Designator, name: &str) -> Designator {
    d.selectors.push(Selector::Field(ident(name)));
    d
}

/// `d[i]`
pub fn index(mut d: Designator, i: Expr) -> Designator {
    d.selectors.push(Selector::Index(Box::new(i)));
    d
}

pub fn load(d: Designator) -> Expr {
    expr_of(factor(FactorKind::Designator(d)))
}

pub fn var(name: &str) -> Expr {
    load(desig(name))
}

pub fn plus(mut a: Expr, b: Expr) -> Expr {
    a.tail.push((AddOp::Add, as_term(b)));
    a
}

pub fn minus(mut a: Expr, b: Expr) -> Expr {
    a.tail.push((AddOp::Sub, as_term(b)));
    a
}

fn mul_op(a: Expr, op: MulOp, b: Expr) -> Expr {
    let mut a = if is_plain(&a) {
        a
    } else {
        expr_of(factor(FactorKind::Paren(Box::new(a))))
    };
    a.head.tail.push((op, as_factor(b)));
    a
}

pub fn times(a: Expr, b: Expr) -> Expr {
    mul_op(a, MulOp::Mul, b)
}

pub fn div(a: Expr, b: Expr) -> Expr {
    mul_op(a, MulOp::Div, b)
}

pub fn rem(a: Expr, b: Expr) -> Expr {
    mul_op(a, MulOp::Rem, b)
}

pub fn neg(e: Expr) -> Expr {
    let mut out = expr_of(as_factor(e));
    out.neg = true;
    out
}

pub fn cast(target: &str, e: Expr) -> Expr {
    let mut out = expr_of(as_factor(e));
    out.cast = Some(ty(target));
    out
}

pub fn paren(e: Expr) -> Expr {
    expr_of(factor(FactorKind::Paren(Box::new(e))))
}

pub fn call(name: &str, args: Vec<Expr>) -> Expr {
    expr_of(factor(FactorKind::Call {
        callee: desig(name),
        args,
    }))
}

pub fn new_obj(class: &str) -> Expr {
    expr_of(factor(FactorKind::New { class: ident(class) }))
}

pub fn new_array(elem: &str, size: Expr) -> Expr {
    new_array_dims(elem, vec![size])
}

/// `new T[a][b]...`
pub fn new_array_dims(elem: &str, sizes: Vec<Expr>) -> Expr {
    expr_of(factor(FactorKind::NewArray { elem: ty(elem), sizes }))
}

pub fn list(elems: Vec<Expr>) -> Expr {
    expr_of(factor(FactorKind::List(elems)))
}

// ==================== Conditions ====================

fn cond_of(kind: CondFactKind) -> Condition {
    Condition {
        id: NodeId::default(),
        terms: vec![CondTerm {
            id: NodeId::default(),
            facts: vec![CondFact {
                id: NodeId::default(),
                kind,
                span: Span::dummy(),
            }],
            span: Span::dummy(),
        }],
        span: Span::dummy(),
    }
}

pub fn rel(left: Expr, op: RelOp, right: Expr) -> Condition {
    cond_of(CondFactKind::Relation { left, op, right })
}

pub fn cond_expr(e: Expr) -> Condition {
    cond_of(CondFactKind::Expr(e))
}

/// `a && b`; both sides must be single-term conditions
pub fn and(mut a: Condition, b: Condition) -> Condition {
    for term in b.terms {
        a.terms[0].facts.extend(term.facts);
    }
    a
}

/// `a || b`
pub fn or(mut a: Condition, b: Condition) -> Condition {
    a.terms.extend(b.terms);
    a
}

// ==================== Statements ====================

pub fn assign_to(target: Designator, value: Expr) -> Stmt {
    Stmt::Assign {
        target,
        value,
        span: Span::dummy(),
    }
}

pub fn assign(name: &str, value: Expr) -> Stmt {
    assign_to(desig(name), value)
}

pub fn call_stmt(name: &str, args: Vec<Expr>) -> Stmt {
    Stmt::Call {
        callee: desig(name),
        args,
        span: Span::dummy(),
    }
}

pub fn inc(target: Designator) -> Stmt {
    Stmt::Increment {
        target,
        span: Span::dummy(),
    }
}

pub fn dec(target: Designator) -> Stmt {
    Stmt::Decrement {
        target,
        span: Span::dummy(),
    }
}

pub fn if_(cond: Condition, then_branch: Stmt, else_branch: Option<Stmt>) -> Stmt {
    Stmt::If {
        cond,
        then_branch: Box::new(then_branch),
        else_branch: else_branch.map(Box::new),
        span: Span::dummy(),
    }
}

pub fn while_(cond: Condition, body: Stmt) -> Stmt {
    Stmt::While {
        cond,
        body: Box::new(body),
        span: Span::dummy(),
    }
}

pub fn for_(init: Option<Stmt>, cond: Option<Condition>, update: Option<Stmt>, body: Stmt) -> Stmt {
    Stmt::For {
        init: init.map(Box::new),
        cond,
        update: update.map(Box::new),
        body: Box::new(body),
        span: Span::dummy(),
    }
}

pub fn brk() -> Stmt {
    Stmt::Break { span: Span::dummy() }
}

pub fn brk_at(line: u32, column: u32) -> Stmt {
    Stmt::Break {
        span: Span::new(line, column),
    }
}

pub fn ret(value: Option<Expr>) -> Stmt {
    Stmt::Return {
        value,
        span: Span::dummy(),
    }
}

pub fn read(target: Designator) -> Stmt {
    Stmt::Read {
        target,
        span: Span::dummy(),
    }
}

pub fn write(value: Expr) -> Stmt {
    Stmt::Write {
        value,
        width: None,
        span: Span::dummy(),
    }
}

pub fn write_w(value: Expr, width: i64) -> Stmt {
    Stmt::Write {
        value,
        width: Some(width),
        span: Span::dummy(),
    }
}

pub fn case(label: Literal, body: Vec<Stmt>) -> SwitchCase {
    SwitchCase {
        label,
        body,
        span: Span::dummy(),
    }
}

pub fn case_at(label: Literal, body: Vec<Stmt>, line: u32, column: u32) -> SwitchCase {
    SwitchCase {
        label,
        body,
        span: Span::new(line, column),
    }
}

pub fn switch(selector: Expr, cases: Vec<SwitchCase>, default: Option<Vec<Stmt>>) -> Stmt {
    Stmt::Switch {
        selector,
        cases,
        default: default.map(|body| DefaultCase {
            body,
            span: Span::dummy(),
        }),
        span: Span::dummy(),
    }
}

pub fn block(items: Vec<BlockItem>) -> Stmt {
    Stmt::Block(Block {
        items,
        span: Span::dummy(),
    })
}

pub fn empty() -> Stmt {
    Stmt::Empty { span: Span::dummy() }
}

// ==================== Declarations ====================

pub fn var_decl(type_name: &str, names: &[&str]) -> VarDecl {
    VarDecl {
        ty: ty(type_name),
        names: names.iter().map(|n| ident(n)).collect(),
        span: Span::dummy(),
    }
}

pub fn local(type_name: &str, names: &[&str]) -> BlockItem {
    BlockItem::Var(var_decl(type_name, names))
}

pub fn global(type_name: &str, names: &[&str]) -> Item {
    Item::Var(var_decl(type_name, names))
}

pub fn constant(type_name: &str, name: &str, value: Literal) -> Item {
    Item::Const(ConstDecl {
        ty: ty(type_name),
        name: ident(name),
        value,
        span: Span::dummy(),
    })
}

pub fn class(name: &str, fields: &[(&str, &str)]) -> Item {
    Item::Class(ClassDecl {
        name: ident(name),
        fields: fields.iter().map(|(t, n)| var_decl(t, &[n])).collect(),
        span: Span::dummy(),
    })
}

pub fn method_decl(
    name: Ident,
    ret: Option<&str>,
    params: &[(&str, &str)],
    body: Vec<BlockItem>,
) -> MethodDecl {
    let span = name.span;
    MethodDecl {
        name,
        ret: ret.map(ty),
        params: params
            .iter()
            .map(|(t, n)| Param {
                ty: ty(t),
                name: ident(n),
            })
            .collect(),
        body: Block {
            items: body,
            span,
        },
        span,
    }
}

pub fn method(name: &str, ret: Option<&str>, params: &[(&str, &str)], body: Vec<BlockItem>) -> Item {
    Item::Method(method_decl(ident(name), ret, params, body))
}

pub fn method_at(
    name: &str,
    line: u32,
    column: u32,
    ret: Option<&str>,
    params: &[(&str, &str)],
    body: Vec<BlockItem>,
) -> Item {
    Item::Method(method_decl(ident_at(name, line, column), ret, params, body))
}

/// `void Main() { body }`
pub fn main_with(body: Vec<BlockItem>) -> Item {
    method("Main", None, &[], body)
}

/// Wrap items into a numbered program named `P`
pub fn program(items: Vec<Item>) -> Program {
    let mut p = Program {
        name: ident("P"),
        items,
        span: Span::new(1, 0),
    };
    p.assign_ids();
    p
}
