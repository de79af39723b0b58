//! Abstract Syntax Tree definitions for MiniCS
//!
//! The tree is produced by an external parser and handed over as JSON, so
//! every node derives `Serialize`/`Deserialize`. Expression-level nodes carry
//! a `NodeId` that keys the checker's type annotations.

use crate::utils::Span;
use serde::{Deserialize, Serialize};

/// Identity of an expression-level node
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

/// A complete program: `class Name { declarations methods }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub name: Ident,
    #[serde(default)]
    pub items: Vec<Item>,
    #[serde(default)]
    pub span: Span,
}

/// Declarations at program level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Item {
    Const(ConstDecl),
    Var(VarDecl),
    Class(ClassDecl),
    Method(MethodDecl),
}

/// Identifier with position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ident {
    pub name: String,
    #[serde(default)]
    pub span: Span,
}

/// Written type, possibly with `[]` suffixes (`int[][]`, `Node[]`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeName {
    pub name: String,
    #[serde(default)]
    pub span: Span,
}

/// `const T name = literal;`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstDecl {
    pub ty: TypeName,
    pub name: Ident,
    pub value: Literal,
    #[serde(default)]
    pub span: Span,
}

/// `T a, b, c;`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VarDecl {
    pub ty: TypeName,
    pub names: Vec<Ident>,
    #[serde(default)]
    pub span: Span,
}

/// `class Name { T field; ... }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassDecl {
    pub name: Ident,
    #[serde(default)]
    pub fields: Vec<VarDecl>,
    #[serde(default)]
    pub span: Span,
}

/// Method definition; `ret: None` means `void`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodDecl {
    pub name: Ident,
    #[serde(default)]
    pub ret: Option<TypeName>,
    #[serde(default)]
    pub params: Vec<Param>,
    pub body: Block,
    #[serde(default)]
    pub span: Span,
}

/// Method parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub ty: TypeName,
    pub name: Ident,
}

/// `{ declarations and statements }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    #[serde(default)]
    pub items: Vec<BlockItem>,
    #[serde(default)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BlockItem {
    Var(VarDecl),
    Stmt(Stmt),
}

impl From<VarDecl> for BlockItem {
    fn from(decl: VarDecl) -> Self {
        BlockItem::Var(decl)
    }
}

impl From<Stmt> for BlockItem {
    fn from(stmt: Stmt) -> Self {
        BlockItem::Stmt(stmt)
    }
}

// ==================== Statements ====================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Stmt {
    /// `designator = expr;`
    Assign {
        target: Designator,
        value: Expr,
        #[serde(default)]
        span: Span,
    },
    /// `designator(args);`
    Call {
        callee: Designator,
        #[serde(default)]
        args: Vec<Expr>,
        #[serde(default)]
        span: Span,
    },
    /// `designator++;`
    Increment {
        target: Designator,
        #[serde(default)]
        span: Span,
    },
    /// `designator--;`
    Decrement {
        target: Designator,
        #[serde(default)]
        span: Span,
    },
    If {
        cond: Condition,
        then_branch: Box<Stmt>,
        #[serde(default)]
        else_branch: Option<Box<Stmt>>,
        #[serde(default)]
        span: Span,
    },
    While {
        cond: Condition,
        body: Box<Stmt>,
        #[serde(default)]
        span: Span,
    },
    /// `for (init; cond; update) body`, every header part optional
    For {
        #[serde(default)]
        init: Option<Box<Stmt>>,
        #[serde(default)]
        cond: Option<Condition>,
        #[serde(default)]
        update: Option<Box<Stmt>>,
        body: Box<Stmt>,
        #[serde(default)]
        span: Span,
    },
    Break {
        #[serde(default)]
        span: Span,
    },
    Return {
        #[serde(default)]
        value: Option<Expr>,
        #[serde(default)]
        span: Span,
    },
    Read {
        target: Designator,
        #[serde(default)]
        span: Span,
    },
    /// `write(expr)` or `write(expr, width)`
    Write {
        value: Expr,
        #[serde(default)]
        width: Option<i64>,
        #[serde(default)]
        span: Span,
    },
    Switch {
        selector: Expr,
        #[serde(default)]
        cases: Vec<SwitchCase>,
        #[serde(default)]
        default: Option<DefaultCase>,
        #[serde(default)]
        span: Span,
    },
    Block(Block),
    Empty {
        #[serde(default)]
        span: Span,
    },
}

/// `case literal: statements`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwitchCase {
    pub label: Literal,
    #[serde(default)]
    pub body: Vec<Stmt>,
    #[serde(default)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefaultCase {
    #[serde(default)]
    pub body: Vec<Stmt>,
    #[serde(default)]
    pub span: Span,
}

// ==================== Expressions ====================

/// `[-] [(T)] term { addop term }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expr {
    #[serde(default)]
    pub id: NodeId,
    #[serde(default)]
    pub neg: bool,
    #[serde(default)]
    pub cast: Option<TypeName>,
    pub head: Term,
    #[serde(default)]
    pub tail: Vec<(AddOp, Term)>,
    #[serde(default)]
    pub span: Span,
}

impl Expr {
    /// `-2147483648`: the literal only fits in an int once negated
    pub fn negates_int_min(&self) -> bool {
        self.neg
            && self.cast.is_none()
            && self.head.tail.is_empty()
            && matches!(self.head.head.kind, FactorKind::Literal(Literal::Int(n)) if n == 1 << 31)
    }

    /// A bare `[]` with no sign, cast or operator around it
    pub fn is_empty_list(&self) -> bool {
        !self.neg
            && self.cast.is_none()
            && self.tail.is_empty()
            && self.head.tail.is_empty()
            && matches!(&self.head.head.kind, FactorKind::List(elems) if elems.is_empty())
    }
}

/// `factor { mulop factor }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Term {
    #[serde(default)]
    pub id: NodeId,
    pub head: Factor,
    #[serde(default)]
    pub tail: Vec<(MulOp, Factor)>,
    #[serde(default)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Factor {
    #[serde(default)]
    pub id: NodeId,
    pub kind: FactorKind,
    #[serde(default)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FactorKind {
    Literal(Literal),
    Designator(Designator),
    Call {
        callee: Designator,
        #[serde(default)]
        args: Vec<Expr>,
    },
    /// `new C()`
    New { class: Ident },
    /// `new T[n]`, `new T[n][m]`, ...
    NewArray { elem: TypeName, sizes: Vec<Expr> },
    Paren(Box<Expr>),
    /// `[e1, e2, ...]`
    List(Vec<Expr>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    Int(i64),
    Float(f64),
    Double(f64),
    Char(char),
    Str(String),
    Bool(bool),
    Null,
}

impl std::fmt::Display for Literal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Literal::Int(n) => write!(f, "{}", n),
            Literal::Float(x) => write!(f, "{}f", x),
            Literal::Double(x) => write!(f, "{}", x),
            Literal::Char(c) => write!(f, "'{}'", c.escape_default()),
            Literal::Str(s) => write!(f, "\"{}\"", s.escape_default()),
            Literal::Bool(b) => write!(f, "{}", b),
            Literal::Null => write!(f, "null"),
        }
    }
}

/// `name { .field | [index] }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Designator {
    #[serde(default)]
    pub id: NodeId,
    pub base: Ident,
    #[serde(default)]
    pub selectors: Vec<Selector>,
    #[serde(default)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Selector {
    Field(Ident),
    Index(Box<Expr>),
}

/// Disjunction of `CondTerm`s
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    #[serde(default)]
    pub id: NodeId,
    pub terms: Vec<CondTerm>,
    #[serde(default)]
    pub span: Span,
}

/// Conjunction of `CondFact`s
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CondTerm {
    #[serde(default)]
    pub id: NodeId,
    pub facts: Vec<CondFact>,
    #[serde(default)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CondFact {
    #[serde(default)]
    pub id: NodeId,
    pub kind: CondFactKind,
    #[serde(default)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CondFactKind {
    Relation { left: Expr, op: RelOp, right: Expr },
    /// A bare expression used as a truth value
    Expr(Expr),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AddOp {
    Add,
    Sub,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MulOp {
    Mul,
    Div,
    Rem,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RelOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl RelOp {
    pub fn is_equality(self) -> bool {
        matches!(self, RelOp::Eq | RelOp::Ne)
    }

    pub fn symbol(self) -> &'static str {
        match self {
            RelOp::Eq => "==",
            RelOp::Ne => "!=",
            RelOp::Lt => "<",
            RelOp::Le => "<=",
            RelOp::Gt => ">",
            RelOp::Ge => ">=",
        }
    }
}

// ==================== Node numbering ====================

impl Program {
    /// Give every expression-level node a fresh id, in tree order
    ///
    /// Trees deserialized from JSON usually arrive with every id at zero.
    pub fn assign_ids(&mut self) {
        let mut next = 0u32;
        for item in &mut self.items {
            if let Item::Method(method) = item {
                number_block(&mut method.body, &mut next);
            }
        }
    }
}

fn fresh(next: &mut u32) -> NodeId {
    *next += 1;
    NodeId(*next)
}

fn number_block(block: &mut Block, next: &mut u32) {
    for item in &mut block.items {
        if let BlockItem::Stmt(stmt) = item {
            number_stmt(stmt, next);
        }
    }
}

fn number_stmt(stmt: &mut Stmt, next: &mut u32) {
    match stmt {
        Stmt::Assign { target, value, .. } => {
            number_designator(target, next);
            number_expr(value, next);
        }
        Stmt::Call { callee, args, .. } => {
            number_designator(callee, next);
            args.iter_mut().for_each(|a| number_expr(a, next));
        }
        Stmt::Increment { target, .. } | Stmt::Decrement { target, .. } | Stmt::Read { target, .. } => {
            number_designator(target, next)
        }
        Stmt::If { cond, then_branch, else_branch, .. } => {
            number_condition(cond, next);
            number_stmt(then_branch, next);
            if let Some(e) = else_branch {
                number_stmt(e, next);
            }
        }
        Stmt::While { cond, body, .. } => {
            number_condition(cond, next);
            number_stmt(body, next);
        }
        Stmt::For { init, cond, update, body, .. } => {
            if let Some(s) = init {
                number_stmt(s, next);
            }
            if let Some(c) = cond {
                number_condition(c, next);
            }
            if let Some(s) = update {
                number_stmt(s, next);
            }
            number_stmt(body, next);
        }
        Stmt::Return { value: Some(e), .. } | Stmt::Write { value: e, .. } => number_expr(e, next),
        Stmt::Switch { selector, cases, default, .. } => {
            number_expr(selector, next);
            for case in cases {
                case.body.iter_mut().for_each(|s| number_stmt(s, next));
            }
            if let Some(d) = default {
                d.body.iter_mut().for_each(|s| number_stmt(s, next));
            }
        }
        Stmt::Block(block) => number_block(block, next),
        Stmt::Return { value: None, .. } | Stmt::Break { .. } | Stmt::Empty { .. } => {}
    }
}

fn number_condition(cond: &mut Condition, next: &mut u32) {
    cond.id = fresh(next);
    for term in &mut cond.terms {
        term.id = fresh(next);
        for fact in &mut term.facts {
            fact.id = fresh(next);
            match &mut fact.kind {
                CondFactKind::Relation { left, right, .. } => {
                    number_expr(left, next);
                    number_expr(right, next);
                }
                CondFactKind::Expr(e) => number_expr(e, next),
            }
        }
    }
}

fn number_expr(expr: &mut Expr, next: &mut u32) {
    expr.id = fresh(next);
    number_term(&mut expr.head, next);
    for (_, term) in &mut expr.tail {
        number_term(term, next);
    }
}

fn number_term(term: &mut Term, next: &mut u32) {
    term.id = fresh(next);
    number_factor(&mut term.head, next);
    for (_, factor) in &mut term.tail {
        number_factor(factor, next);
    }
}

fn number_factor(factor: &mut Factor, next: &mut u32) {
    factor.id = fresh(next);
    match &mut factor.kind {
        FactorKind::Designator(d) => number_designator(d, next),
        FactorKind::Call { callee, args } => {
            number_designator(callee, next);
            args.iter_mut().for_each(|a| number_expr(a, next));
        }
        FactorKind::NewArray { sizes, .. } => sizes.iter_mut().for_each(|e| number_expr(e, next)),
        FactorKind::Paren(e) => number_expr(e, next),
        FactorKind::List(elems) => elems.iter_mut().for_each(|e| number_expr(e, next)),
        FactorKind::Literal(_) | FactorKind::New { .. } => {}
    }
}

fn number_designator(desig: &mut Designator, next: &mut u32) {
    desig.id = fresh(next);
    for sel in &mut desig.selectors {
        if let Selector::Index(e) = sel {
            number_expr(e, next);
        }
    }
}
