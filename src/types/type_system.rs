//! Type System for MiniCS
//!
//! Every type is a single integer tag. Primitives have reserved tags, an
//! N-dimensional sequence of a base type is `base + N * LIST_BASE`, and user
//! classes get tags handed out by a per-compilation `TypeRegistry`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Distance between two dimension levels of the same base type
pub const LIST_BASE: i32 = 1000;

/// First tag handed out to a user class; classes live in `CLASS_BASE..LIST_BASE`
pub const CLASS_BASE: i32 = 100;

/// Integer type identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TypeTag(pub i32);

impl TypeTag {
    pub const VOID: Self = Self(-1);
    pub const UNKNOWN: Self = Self(0);
    pub const INT: Self = Self(1);
    pub const CHAR: Self = Self(2);
    pub const BOOL: Self = Self(3);
    pub const FLOAT: Self = Self(4);
    pub const STRING: Self = Self(5);
    pub const DOUBLE: Self = Self(6);

    pub fn is_unknown(self) -> bool {
        self == Self::UNKNOWN
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, Self::INT | Self::FLOAT | Self::DOUBLE)
    }

    pub fn is_primitive(self) -> bool {
        (Self::INT.0..=Self::DOUBLE.0).contains(&self.0)
    }

    /// Array/list of any base, any dimension
    pub fn is_list(self) -> bool {
        self.0 >= LIST_BASE
    }

    /// Number of `[]` levels
    pub fn dimensions(self) -> i32 {
        if self.0 < 0 {
            0
        } else {
            self.0 / LIST_BASE
        }
    }

    /// Tag with every dimension stripped
    pub fn base(self) -> Self {
        if self.0 < 0 {
            self
        } else {
            Self(self.0 % LIST_BASE)
        }
    }

    /// Drop one dimension level
    pub fn element(self) -> Self {
        if self.is_list() {
            Self(self.0 - LIST_BASE)
        } else {
            Self::UNKNOWN
        }
    }

    /// Add one dimension level
    pub fn list_of(self) -> Self {
        if self.0 <= 0 {
            return Self::UNKNOWN;
        }
        self.0
            .checked_add(LIST_BASE)
            .map(Self)
            .unwrap_or(Self::UNKNOWN)
    }

    /// Numeric promotion for `+ - * / %`
    ///
    /// double wins over float, float wins over int, and int only pairs with int.
    pub fn promote(a: Self, b: Self) -> Option<Self> {
        if !a.is_numeric() || !b.is_numeric() {
            return None;
        }
        if a == Self::DOUBLE || b == Self::DOUBLE {
            Some(Self::DOUBLE)
        } else if a == Self::FLOAT || b == Self::FLOAT {
            Some(Self::FLOAT)
        } else {
            Some(Self::INT)
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Something that knows which identifiers name declared classes
pub trait ClassResolver {
    fn resolve_class(&self, name: &str) -> Option<TypeTag>;
}

/// Per-compilation registry of class tags
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    class_tags: HashMap<String, TypeTag>,
    class_names: HashMap<TypeTag, String>,
    next_class: i32,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self {
            class_tags: HashMap::new(),
            class_names: HashMap::new(),
            next_class: CLASS_BASE,
        }
    }

    /// Tag for a primitive keyword, or the class the resolver knows by that name
    pub fn from_name(&self, name: &str, classes: &dyn ClassResolver) -> TypeTag {
        match name {
            "int" => TypeTag::INT,
            "char" => TypeTag::CHAR,
            "bool" => TypeTag::BOOL,
            "float" => TypeTag::FLOAT,
            "string" => TypeTag::STRING,
            "double" => TypeTag::DOUBLE,
            "void" => TypeTag::VOID,
            _ => classes.resolve_class(name).unwrap_or(TypeTag::UNKNOWN),
        }
    }

    /// Tag for a type written with trailing `[]` pairs, e.g. `int[][]`
    pub fn from_bracketed_name(&self, text: &str, classes: &dyn ClassResolver) -> TypeTag {
        let (base_name, dims) = split_brackets(text);
        let base = self.from_name(base_name, classes);
        if dims == 0 {
            return base;
        }
        if base.0 <= 0 {
            return TypeTag::UNKNOWN;
        }
        dims.checked_mul(LIST_BASE)
            .and_then(|offset| base.0.checked_add(offset))
            .map(TypeTag)
            .unwrap_or(TypeTag::UNKNOWN)
    }

    /// Allocate (or return the existing) tag for a class name
    pub fn register_class(&mut self, name: &str) -> TypeTag {
        if let Some(&tag) = self.class_tags.get(name) {
            return tag;
        }
        if self.next_class >= LIST_BASE {
            log::warn!("class tag space exhausted, '{}' left unregistered", name);
            return TypeTag::UNKNOWN;
        }
        let tag = TypeTag(self.next_class);
        self.next_class += 1;
        self.class_tags.insert(name.to_string(), tag);
        self.class_names.insert(tag, name.to_string());
        log::trace!("registered class '{}' as {}", name, tag);
        tag
    }

    /// Is this exact tag (no dimensions) a registered class
    pub fn is_custom_class(&self, tag: TypeTag) -> bool {
        self.class_names.contains_key(&tag)
    }

    pub fn class_name(&self, tag: TypeTag) -> Option<&str> {
        self.class_names.get(&tag).map(String::as_str)
    }

    /// Reference-like types accept `null`
    pub fn is_reference(&self, tag: TypeTag) -> bool {
        tag == TypeTag::STRING || tag.is_list() || self.is_custom_class(tag)
    }

    /// Render a tag for diagnostics
    pub fn pretty_print(&self, tag: TypeTag) -> String {
        if tag.is_list() {
            let mut name = self.pretty_print(tag.base());
            for _ in 0..tag.dimensions() {
                name.push_str("[]");
            }
            return name;
        }
        if let Some(name) = self.class_name(tag) {
            return name.to_string();
        }
        match tag {
            TypeTag::VOID => "void",
            TypeTag::INT => "int",
            TypeTag::CHAR => "char",
            TypeTag::BOOL => "bool",
            TypeTag::FLOAT => "float",
            TypeTag::STRING => "string",
            TypeTag::DOUBLE => "double",
            _ => "unknown",
        }
        .to_string()
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ClassResolver for TypeRegistry {
    fn resolve_class(&self, name: &str) -> Option<TypeTag> {
        self.class_tags.get(name).copied()
    }
}

/// `"int[][]"` -> `("int", 2)`
pub fn split_brackets(text: &str) -> (&str, i32) {
    let mut name = text.trim();
    let mut dims = 0;
    while let Some(stripped) = name.strip_suffix("[]") {
        name = stripped.trim_end();
        dims += 1;
    }
    (name, dims)
}
