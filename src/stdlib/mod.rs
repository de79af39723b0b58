//! Intrinsics and the host I/O surface

pub mod builtins;

pub use builtins::Intrinsic;
