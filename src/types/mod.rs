//! Type identities and the per-compilation class registry

pub mod type_system;

pub use type_system::{ClassResolver, TypeRegistry, TypeTag};
