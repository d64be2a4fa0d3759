//! Backend module - Code generation

pub mod codegen;
pub mod conformance;

pub mod go;

pub use codegen::{CodeGen, EnumFile, RenderProfile};
pub use go::GoCodeGen;
