//! Normalized enum model
//!
//! Built once per input file by the builder and only read afterwards. The
//! code generator and the `model` subcommand both consume it.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::Serialize;

use crate::frontend::annotation::EnumOptions;
use crate::middle::values::ValueSource;
use crate::utils::Span;

/// One member of an enum declaration
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Variant {
    /// Go constant identifier (`step1Pending`)
    pub ident: String,
    /// Effective value
    pub value: i64,
    pub value_source: ValueSource,
    /// Display names, canonical first; never empty
    pub names: Vec<String>,
    pub valid: bool,
    /// Insertion ordered, no duplicates
    pub tags: Vec<String>,
    /// Identifiers of the variants this one may move to
    pub transitions: Vec<String>,
    pub terminal: bool,
    /// Comment, banner and blank lines preceding the member, verbatim
    pub doc_lines: Vec<String>,
    #[serde(skip)]
    pub span: Span,
}

/// One annotated Go type and its members
#[derive(Debug, Clone, Serialize)]
pub struct EnumDeclaration {
    /// Go type identifier (`swapStatus`)
    pub type_ident: String,
    /// Exported wrapper type (`SwapStatus`)
    pub name: String,
    /// Underlying type (`int`)
    pub base_type: String,
    pub package: String,
    pub file: String,
    pub options: EnumOptions,
    /// Exported container variable (`SwapStatuses`)
    pub container_name: String,
    pub variants: Vec<Variant>,
    /// Every tag used by any variant, lexically ordered
    pub all_tags: BTreeSet<String>,
    /// Display name -> variant positions
    #[serde(skip)]
    pub name_index: HashMap<String, Vec<usize>>,
    /// Tag -> variant positions
    #[serde(skip)]
    pub tag_index: BTreeMap<String, Vec<usize>>,
    #[serde(skip)]
    pub span: Span,
}

impl EnumDeclaration {
    pub fn new(
        type_ident: String,
        name: String,
        base_type: String,
        package: String,
        file: String,
        options: EnumOptions,
        container_name: String,
        span: Span,
    ) -> Self {
        Self {
            type_ident,
            name,
            base_type,
            package,
            file,
            options,
            container_name,
            variants: Vec::new(),
            all_tags: BTreeSet::new(),
            name_index: HashMap::new(),
            tag_index: BTreeMap::new(),
            span,
        }
    }

    /// Rebuild the name and tag indexes from the variant list
    pub fn rebuild_indexes(&mut self) {
        self.name_index.clear();
        self.tag_index.clear();
        self.all_tags.clear();

        for (pos, variant) in self.variants.iter().enumerate() {
            for name in &variant.names {
                let positions = self.name_index.entry(name.clone()).or_default();
                if !positions.contains(&pos) {
                    positions.push(pos);
                }
            }
            for tag in &variant.tags {
                self.tag_index.entry(tag.clone()).or_default().push(pos);
                self.all_tags.insert(tag.clone());
            }
        }
    }

    /// Look up a variant by its Go identifier
    pub fn variant(&self, ident: &str) -> Option<&Variant> {
        self.variants.iter().find(|v| v.ident == ident)
    }

    /// All variants answering to a display name, in declaration order
    pub fn variants_named(&self, name: &str) -> Vec<&Variant> {
        self.name_index
            .get(name)
            .map(|positions| positions.iter().map(|&p| &self.variants[p]).collect())
            .unwrap_or_default()
    }

    /// Variant holding `value`. Among aliases the first declared wins.
    pub fn variant_by_value(&self, value: i64) -> Option<&Variant> {
        self.variants.iter().find(|v| v.value == value)
    }

    /// Variants carrying `tag`, in declaration order
    pub fn variants_tagged(&self, tag: &str) -> Vec<&Variant> {
        self.tag_index
            .get(tag)
            .map(|positions| positions.iter().map(|&p| &self.variants[p]).collect())
            .unwrap_or_default()
    }

    pub fn terminal_variants(&self) -> impl Iterator<Item = &Variant> {
        self.variants.iter().filter(|v| v.terminal)
    }

    /// The first variant marked `invalid`
    pub fn canonical_invalid(&self) -> Option<&Variant> {
        self.variants.iter().find(|v| !v.valid)
    }

    /// One-hop transition check between two identifiers
    pub fn can_transition(&self, from: &str, to: &str) -> bool {
        self.variant(from)
            .map_or(false, |v| v.transitions.iter().any(|t| t == to))
    }
}
