//! MiniCS IR definitions
//!
//! A stack-machine module: one top-level program type holding static fields
//! and static methods, plus nested class types with instance fields and a
//! trivial constructor. Method bodies are flat instruction streams with
//! symbolic labels.

use std::fmt;

/// IR Module - the program type and everything nested in it
#[derive(Debug, Clone, PartialEq, Default)]
pub struct IRModule {
    pub name: String,
    pub classes: Vec<IRClass>,
    /// Static fields of the program type
    pub statics: Vec<IRField>,
    pub methods: Vec<IRMethod>,
    pub entry_point: Option<String>,
}

impl IRModule {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn method(&self, name: &str) -> Option<&IRMethod> {
        self.methods.iter().find(|m| m.name == name)
    }
}

/// Nested class type
#[derive(Debug, Clone, PartialEq)]
pub struct IRClass {
    pub name: String,
    pub fields: Vec<IRField>,
    pub ctor: IRMethod,
}

impl IRClass {
    /// Class with a zero-argument constructor that only runs the base constructor
    pub fn new(name: &str, fields: Vec<IRField>) -> Self {
        let mut ctor = IRMethod::new(".ctor", MethodKind::Constructor, Vec::new(), IRType::Void);
        ctor.emit(Instruction::LdArg(0));
        ctor.emit(Instruction::CallBaseCtor);
        ctor.emit(Instruction::Ret);
        Self {
            name: name.to_string(),
            fields,
            ctor,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IRField {
    pub name: String,
    pub ty: IRType,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IRLocal {
    pub name: String,
    pub ty: IRType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MethodKind {
    #[default]
    Static,
    Constructor,
}

/// IR Method
#[derive(Debug, Clone, PartialEq, Default)]
pub struct IRMethod {
    pub name: String,
    pub kind: MethodKind,
    pub params: Vec<(String, IRType)>,
    pub ret: IRType,
    pub locals: Vec<IRLocal>,
    pub code: Vec<Instruction>,
    label_count: usize,
}

impl IRMethod {
    pub fn new(name: &str, kind: MethodKind, params: Vec<(String, IRType)>, ret: IRType) -> Self {
        Self {
            name: name.to_string(),
            kind,
            params,
            ret,
            ..Default::default()
        }
    }

    pub fn new_label(&mut self) -> Label {
        let label = Label(self.label_count);
        self.label_count += 1;
        label
    }

    pub fn emit(&mut self, inst: Instruction) {
        self.code.push(inst);
    }

    /// Every branch target is marked exactly once
    pub fn labels_resolved(&self) -> bool {
        let mut marks = vec![0usize; self.label_count];
        for inst in &self.code {
            if let Instruction::Mark(l) = inst {
                match marks.get_mut(l.0) {
                    Some(count) => *count += 1,
                    None => return false,
                }
            }
        }
        self.code.iter().all(|inst| match inst.branch_target() {
            Some(l) => marks.get(l.0) == Some(&1),
            None => true,
        })
    }
}

// ==================== Types ====================

/// Target type representation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum IRType {
    #[default]
    Void,
    Int32,
    Char,
    Bool,
    Float32,
    Float64,
    String,
    /// Nested class of the program type
    Class(String),
    /// Host dynamic sequence; arrays use it too
    List(Box<IRType>),
}

impl fmt::Display for IRType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IRType::Void => write!(f, "void"),
            IRType::Int32 => write!(f, "int32"),
            IRType::Char => write!(f, "char"),
            IRType::Bool => write!(f, "bool"),
            IRType::Float32 => write!(f, "float32"),
            IRType::Float64 => write!(f, "float64"),
            IRType::String => write!(f, "string"),
            IRType::Class(name) => write!(f, "class {}", name),
            IRType::List(elem) => write!(f, "List<{}>", elem),
        }
    }
}

/// Branch target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Label(pub usize);

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.0)
    }
}

// ==================== Instructions ====================

/// Members of the host sequence type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListMethod {
    GetItem,
    SetItem,
    Count,
    Add,
    RemoveAt,
}

impl fmt::Display for ListMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ListMethod::GetItem => "get_Item",
            ListMethod::SetItem => "set_Item",
            ListMethod::Count => "get_Count",
            ListMethod::Add => "Add",
            ListMethod::RemoveAt => "RemoveAt",
        };
        write!(f, "{}", s)
    }
}

/// Host I/O and runtime helpers
#[derive(Debug, Clone, PartialEq)]
pub enum HostCall {
    /// `-> string`
    ReadLine,
    /// `string -> int32`
    ParseInt,
    /// `T ->`
    Write(IRType),
    /// `T, int32 ->`, right-aligned in a field of the given width
    WritePadded(IRType),
    /// `string, string -> bool`
    StringEquals,
}

impl fmt::Display for HostCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostCall::ReadLine => write!(f, "Console::ReadLine()"),
            HostCall::ParseInt => write!(f, "Int32::Parse(string)"),
            HostCall::Write(ty) => write!(f, "Console::Write({})", ty),
            HostCall::WritePadded(ty) => write!(f, "Console::WritePadded({}, int32)", ty),
            HostCall::StringEquals => write!(f, "String::Equals(string, string)"),
        }
    }
}

/// Stack-machine instruction
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    // Constants
    LdcI4(i32),
    LdcR4(f32),
    LdcR8(f64),
    LdStr(String),
    LdNull,

    // Storage
    LdLoc(u16),
    StLoc(u16),
    LdArg(u16),
    LdSFld(String),
    StSFld(String),
    LdFld { class: String, field: String },
    StFld { class: String, field: String },

    // Allocation
    NewObj(String),
    /// `sized` pops a count and fills the sequence with default values
    NewList { elem: IRType, sized: bool },

    // Arithmetic and logic
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Neg,
    And,
    Or,
    Ceq,
    Cgt,
    Clt,

    // Conversions
    ConvI4,
    ConvR4,
    ConvR8,
    ConvU2,

    // Control flow
    Br(Label),
    BrTrue(Label),
    BrFalse(Label),
    Beq(Label),
    Mark(Label),
    Ret,

    // Calls
    Call { method: String, argc: usize },
    CallVirt { method: ListMethod, elem: IRType },
    CallHost(HostCall),
    CallBaseCtor,

    // Stack
    Dup,
    Pop,
}

impl Instruction {
    pub fn branch_target(&self) -> Option<Label> {
        match self {
            Instruction::Br(l) | Instruction::BrTrue(l) | Instruction::BrFalse(l) | Instruction::Beq(l) => {
                Some(*l)
            }
            _ => None,
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Instruction::*;
        match self {
            LdcI4(n) => write!(f, "ldc.i4 {}", n),
            LdcR4(x) => write!(f, "ldc.r4 {:?}", x),
            LdcR8(x) => write!(f, "ldc.r8 {:?}", x),
            LdStr(s) => write!(f, "ldstr \"{}\"", s.escape_default()),
            LdNull => write!(f, "ldnull"),
            LdLoc(i) => write!(f, "ldloc {}", i),
            StLoc(i) => write!(f, "stloc {}", i),
            LdArg(i) => write!(f, "ldarg {}", i),
            LdSFld(name) => write!(f, "ldsfld {}", name),
            StSFld(name) => write!(f, "stsfld {}", name),
            LdFld { class, field } => write!(f, "ldfld {}::{}", class, field),
            StFld { class, field } => write!(f, "stfld {}::{}", class, field),
            NewObj(class) => write!(f, "newobj {}::.ctor()", class),
            NewList { elem, sized: true } => write!(f, "newlist List<{}>(int32)", elem),
            NewList { elem, sized: false } => write!(f, "newlist List<{}>()", elem),
            Add => write!(f, "add"),
            Sub => write!(f, "sub"),
            Mul => write!(f, "mul"),
            Div => write!(f, "div"),
            Rem => write!(f, "rem"),
            Neg => write!(f, "neg"),
            And => write!(f, "and"),
            Or => write!(f, "or"),
            Ceq => write!(f, "ceq"),
            Cgt => write!(f, "cgt"),
            Clt => write!(f, "clt"),
            ConvI4 => write!(f, "conv.i4"),
            ConvR4 => write!(f, "conv.r4"),
            ConvR8 => write!(f, "conv.r8"),
            ConvU2 => write!(f, "conv.u2"),
            Br(l) => write!(f, "br {}", l),
            BrTrue(l) => write!(f, "brtrue {}", l),
            BrFalse(l) => write!(f, "brfalse {}", l),
            Beq(l) => write!(f, "beq {}", l),
            Mark(l) => write!(f, "{}:", l),
            Ret => write!(f, "ret"),
            Call { method, argc } => write!(f, "call {}/{}", method, argc),
            CallVirt { method, elem } => write!(f, "callvirt List<{}>::{}", elem, method),
            CallHost(host) => write!(f, "call {}", host),
            CallBaseCtor => write!(f, "call Object::.ctor()"),
            Dup => write!(f, "dup"),
            Pop => write!(f, "pop"),
        }
    }
}
