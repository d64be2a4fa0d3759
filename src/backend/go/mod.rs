//! Go Backend - Generate the `_enums.go` companion file
//!
//! Every annotated type gets a wrapper struct implementing
//! `enums.Enum`, a container of named values and the optional
//! serialization and state-machine methods its flags ask for.

mod go_codegen;

pub use go_codegen::GoCodeGen;
