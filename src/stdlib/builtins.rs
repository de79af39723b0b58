//! Built-in Operations
//!
//! The intrinsics recognised by name ahead of user-method lookup, and the
//! value types the host I/O surface can read and write.

use crate::types::TypeTag;

/// Built-in operation resolved by name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Intrinsic {
    /// `len(list) -> int`
    Len,
    /// `add(list, value)`
    Add,
    /// `del(list, index)`
    Del,
    /// `ord(char) -> int`
    Ord,
    /// `chr(int) -> char`
    Chr,
}

impl Intrinsic {
    pub const ALL: [Intrinsic; 5] = [
        Intrinsic::Len,
        Intrinsic::Add,
        Intrinsic::Del,
        Intrinsic::Ord,
        Intrinsic::Chr,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|i| i.name() == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            Intrinsic::Len => "len",
            Intrinsic::Add => "add",
            Intrinsic::Del => "del",
            Intrinsic::Ord => "ord",
            Intrinsic::Chr => "chr",
        }
    }

    pub fn arity(self) -> usize {
        match self {
            Intrinsic::Len | Intrinsic::Ord | Intrinsic::Chr => 1,
            Intrinsic::Add | Intrinsic::Del => 2,
        }
    }

    pub fn result_type(self) -> TypeTag {
        match self {
            Intrinsic::Len | Intrinsic::Ord => TypeTag::INT,
            Intrinsic::Chr => TypeTag::CHAR,
            Intrinsic::Add | Intrinsic::Del => TypeTag::VOID,
        }
    }
}

/// Types with a `write` overload on the host
pub fn is_writable(tag: TypeTag) -> bool {
    matches!(
        tag,
        TypeTag::INT | TypeTag::CHAR | TypeTag::BOOL | TypeTag::FLOAT | TypeTag::DOUBLE | TypeTag::STRING
    )
}

/// Types `read` can fill
pub fn is_readable(tag: TypeTag) -> bool {
    tag == TypeTag::INT
}
