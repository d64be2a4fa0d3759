//! Code Generation trait - Backend abstraction

use serde::Serialize;

use crate::middle::model::EnumDeclaration;
use crate::utils::Result;

/// How much documentation the generated artifact carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RenderProfile {
    /// Generated doc comments plus the documentation preserved from the source
    #[default]
    Full,
    /// Code only
    Minimal,
}

/// Everything generated from one input file
#[derive(Debug, Clone)]
pub struct EnumFile {
    pub package: String,
    /// Path of the input, as given on the command line
    pub source: String,
    pub enums: Vec<EnumDeclaration>,
}

/// Code generation backend trait
pub trait CodeGen {
    /// Render the whole artifact for one input file
    fn generate(&mut self, file: &EnumFile) -> Result<String>;

    /// Get the backend name
    fn name(&self) -> &str;

    /// Suffix replacing `.go` in the input file name
    fn file_suffix(&self) -> &str;
}
