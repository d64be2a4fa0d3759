//! Frontend module - Lexer, Parser, Annotation Interpreter

pub mod token;
pub mod lexer;
pub mod ast;
pub mod parser;
pub mod annotation;
