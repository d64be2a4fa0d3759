//! Enum Model Builder
//!
//! Turns a parsed source file into `EnumDeclaration`s in three passes:
//! annotated type declarations, then the const blocks declaring their
//! members, then validation and indexing.

use std::collections::{HashMap, HashSet};

use log::{debug, info, warn};

use crate::frontend::annotation::{parse_options, parse_variant_comment, EnumOptions};
use crate::frontend::ast::{ConstDecl, Decl, SourceFile, TypeDecl, TypeSpec};
use crate::middle::model::{EnumDeclaration, Variant};
use crate::middle::naming::{container_name, first_upper, NamingStrategy};
use crate::middle::values;
use crate::utils::{Error, Result};

/// Knobs the builder honours
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildOptions {
    pub naming: NamingStrategy,
    /// Reject transitions to identifiers the enum does not declare
    pub validate_transitions: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            naming: NamingStrategy::default(),
            validate_transitions: true,
        }
    }
}

/// Builds the enum model of one source file
pub struct ModelBuilder<'a> {
    source: &'a str,
    path: String,
    options: BuildOptions,
    enums: Vec<EnumDeclaration>,
}

impl<'a> ModelBuilder<'a> {
    pub fn new(source: &'a str, path: impl Into<String>, options: BuildOptions) -> Self {
        Self {
            source,
            path: path.into(),
            options,
            enums: Vec::new(),
        }
    }

    /// Run all passes over a parsed file
    pub fn build(mut self, file: &SourceFile) -> Result<Vec<EnumDeclaration>> {
        for decl in &file.decls {
            match decl {
                Decl::Type(type_decl) => self.collect_types(type_decl, &file.package.name)?,
                Decl::Other(span) => debug!("line {}: skipping declaration", span.line),
                Decl::Const(_) => {}
            }
        }
        if self.enums.is_empty() {
            return Ok(Vec::new());
        }

        for decl in &file.decls {
            if let Decl::Const(const_decl) = decl {
                self.collect_members(const_decl)?;
            }
        }

        for decl in &mut self.enums {
            finish(decl, self.options.validate_transitions)?;
        }
        info!("{}: built {} enum declaration(s)", self.path, self.enums.len());
        Ok(self.enums)
    }

    // ==================== Pass 1: types ====================

    fn collect_types(&mut self, decl: &TypeDecl, package: &str) -> Result<()> {
        for spec in &decl.specs {
            let options = spec
                .doc
                .iter()
                .chain(decl.doc.iter())
                .find_map(|doc| parse_options(&doc.text()));
            let Some(options) = options else {
                continue;
            };
            let enum_decl = self.declare(spec, package, options)?;
            debug!(
                "enum `{}` over `{}` (container `{}`)",
                enum_decl.name, enum_decl.base_type, enum_decl.container_name
            );
            self.enums.push(enum_decl);
        }
        Ok(())
    }

    fn declare(
        &self,
        spec: &TypeSpec,
        package: &str,
        options: EnumOptions,
    ) -> Result<EnumDeclaration> {
        let type_ident = &spec.name.name;
        let base_type = match (&spec.underlying, spec.alias) {
            (Some(base), false) => base.name.clone(),
            _ => {
                return Err(Error::UnsupportedBaseType {
                    name: type_ident.clone(),
                    span: spec.name.span,
                })
            }
        };

        let name = first_upper(type_ident);
        if &name == type_ident {
            return Err(Error::WrapperNameCollision {
                name: name.clone(),
                span: spec.name.span,
            });
        }

        let container = container_name(&name, self.options.naming);
        Ok(EnumDeclaration::new(
            type_ident.clone(),
            name,
            base_type,
            package.to_string(),
            self.path.clone(),
            options,
            container,
            spec.span,
        ))
    }

    // ==================== Pass 2: members ====================

    fn collect_members(&mut self, decl: &ConstDecl) -> Result<()> {
        let enum_types: HashSet<&str> = self.enums.iter().map(|e| e.type_ident.as_str()).collect();
        let mentions_enum = decl
            .specs
            .iter()
            .any(|s| s.ty.as_ref().map_or(false, |t| enum_types.contains(t.name.as_str())));
        if !mentions_enum {
            return Ok(());
        }

        let resolved = values::resolve(decl)?;
        debug!(
            "line {}: {} const declaring {} constant(s)",
            decl.span.line,
            if decl.grouped { "grouped" } else { "single" },
            resolved.len()
        );
        let block = self.source.get(decl.span.start..decl.span.end).unwrap_or("");
        let declared: HashSet<&str> = resolved.iter().map(|r| r.ident.name.as_str()).collect();

        for enum_decl in &mut self.enums {
            let members: Vec<_> = resolved
                .iter()
                .filter(|r| r.ty.as_deref() == Some(enum_decl.type_ident.as_str()))
                .filter(|r| r.ident.name != "_")
                .collect();
            if members.is_empty() {
                continue;
            }

            let wanted: HashSet<&str> = members.iter().map(|&r| r.ident.name.as_str()).collect();
            let mut docs = preceding_lines(block, &wanted, &declared);

            for member in members {
                let spec = &decl.specs[member.spec];
                let annotation = parse_variant_comment(&spec.comment_text());

                let mut doc_lines = docs.remove(member.ident.name.as_str()).unwrap_or_default();
                if let Some(trailing) = &spec.comment {
                    doc_lines.extend(trailing.comments.iter().map(|c| c.text.clone()));
                }

                enum_decl.variants.push(Variant {
                    ident: member.ident.name.clone(),
                    value: member.value,
                    value_source: member.source,
                    names: annotation.names_or(&member.ident.name),
                    valid: !annotation.invalid,
                    tags: annotation.tags,
                    transitions: annotation.transitions,
                    terminal: annotation.terminal,
                    doc_lines,
                    span: member.ident.span,
                });
            }
        }
        Ok(())
    }
}

/// Collect the comment, banner and blank lines written above each wanted
/// member in the raw text of a const block.
///
/// A line belongs to a member when its first identifier is one of the
/// block's declared constants. Lines of constants that are not wanted
/// discard what was collected so far.
fn preceding_lines<'b>(
    block: &str,
    wanted: &HashSet<&'b str>,
    declared: &HashSet<&str>,
) -> HashMap<&'b str, Vec<String>> {
    let mut found = HashMap::new();
    let mut pending: Vec<String> = Vec::new();
    let mut in_block_comment = false;

    for (i, raw) in block.lines().enumerate() {
        let mut line = raw.trim();
        if i == 0 {
            line = line.strip_prefix("const").unwrap_or(line).trim_start();
            line = line.strip_prefix('(').unwrap_or(line).trim_start();
            if line.is_empty() {
                continue;
            }
        }

        if in_block_comment {
            pending.push(line.to_string());
            in_block_comment = !line.contains("*/");
            continue;
        }
        if line.is_empty() || line.starts_with("//") {
            pending.push(line.to_string());
            continue;
        }
        if line.starts_with("/*") {
            pending.push(line.to_string());
            in_block_comment = !line.contains("*/");
            continue;
        }
        if line.starts_with(')') {
            continue;
        }

        let ident = first_identifier(line);
        if let Some(&member) = wanted.get(ident) {
            found.insert(member, std::mem::take(&mut pending));
        } else if declared.contains(ident) {
            pending.clear();
        }
    }

    found
}

fn first_identifier(line: &str) -> &str {
    let end = line
        .char_indices()
        .find(|(_, c)| !(c.is_alphanumeric() || *c == '_'))
        .map_or(line.len(), |(i, _)| i);
    &line[..end]
}

// ==================== Pass 3: validation ====================

fn finish(decl: &mut EnumDeclaration, validate_transitions: bool) -> Result<()> {
    let mut seen = HashSet::new();
    for variant in &decl.variants {
        if !seen.insert(variant.ident.as_str()) {
            return Err(Error::DuplicateVariant {
                enum_name: decl.name.clone(),
                variant: variant.ident.clone(),
                span: variant.span,
            });
        }
    }

    for variant in &decl.variants {
        for target in &variant.transitions {
            if seen.contains(target.as_str()) {
                continue;
            }
            if validate_transitions {
                return Err(Error::UnknownTransitionTarget {
                    enum_name: decl.name.clone(),
                    variant: variant.ident.clone(),
                    target: target.clone(),
                    span: variant.span,
                });
            }
            warn!(
                "line {}: `{}` transitions to unknown state `{}` in enum `{}`",
                variant.span.line, variant.ident, target, decl.name
            );
        }
        if variant.terminal && !variant.transitions.is_empty() {
            warn!(
                "line {}: `{}` is final but declares transitions",
                variant.span.line, variant.ident
            );
        }
    }

    let invalid = decl.variants.iter().filter(|v| !v.valid).count();
    if invalid > 1 {
        warn!(
            "enum `{}` has {} invalid variants; `{}` is the canonical one",
            decl.name,
            invalid,
            decl.canonical_invalid().map_or("", |v| v.ident.as_str())
        );
    }
    for variant in &decl.variants {
        if let Some(original) = decl.variant_by_value(variant.value) {
            if original.ident != variant.ident {
                warn!(
                    "`{}` aliases value {} of `{}` in enum `{}`",
                    variant.ident, original.value, original.ident, decl.name
                );
            }
        }
    }
    if decl.variants.is_empty() {
        warn!("enum `{}` has no members", decl.name);
    }

    decl.rebuild_indexes();

    let mut reported = HashSet::new();
    for variant in &decl.variants {
        if decl.can_transition(&variant.ident, &variant.ident) {
            warn!("line {}: `{}` transitions to itself", variant.span.line, variant.ident);
        }
        for name in &variant.names {
            let clashing = decl
                .variants_named(name)
                .iter()
                .any(|other| other.value != variant.value);
            if clashing && reported.insert(name.as_str()) {
                warn!(
                    "display name `{}` is shared by variants with different values in enum `{}`; FromName returns the first",
                    name, decl.name
                );
            }
        }
    }
    Ok(())
}

/// Build the enum model of a parsed file
pub fn build(
    file: &SourceFile,
    source: &str,
    path: &str,
    options: BuildOptions,
) -> Result<Vec<EnumDeclaration>> {
    ModelBuilder::new(source, path, options).build(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::parser::parse_source;
    use crate::middle::values::ValueSource;
    use pretty_assertions::assert_eq;

    const SWAP: &str = r#"package main

// goenums: -json -sql -statemachine
// SwapStatus
type swapStatus int

const (
	_invalid swapStatus = 0 // invalid

	////////// STEP1 //////////

	// pending
	// freshly created
	// state: -> done, canceled
	pending swapStatus = 1000
	// canceled
	// state: [final]
	canceled swapStatus = 1030

	// tag: slow
	waiting swapStatus = 2000
	// waiting_too
	// tag: slow, manual
	waitingAlias swapStatus = 2000
	// done
	// state: [final]
	done swapStatus = 3000
)
"#;

    fn build_str(source: &str, options: BuildOptions) -> Result<Vec<EnumDeclaration>> {
        let file = parse_source(source)?;
        build(&file, source, "swap.go", options)
    }

    fn build_ok(source: &str) -> Vec<EnumDeclaration> {
        build_str(source, BuildOptions::default()).unwrap()
    }

    #[test]
    fn test_declaration_shape() {
        let enums = build_ok(SWAP);
        assert_eq!(enums.len(), 1);
        let decl = &enums[0];
        assert_eq!(decl.type_ident, "swapStatus");
        assert_eq!(decl.name, "SwapStatus");
        assert_eq!(decl.base_type, "int");
        assert_eq!(decl.package, "main");
        assert_eq!(decl.container_name, "SwapStatuses");
        assert!(decl.options.json && decl.options.sql && decl.options.state_machine);

        let idents: Vec<&str> = decl.variants.iter().map(|v| v.ident.as_str()).collect();
        assert_eq!(idents, vec!["_invalid", "pending", "canceled", "waiting", "waitingAlias", "done"]);
    }

    #[test]
    fn test_annotations_reach_variants() {
        let enums = build_ok(SWAP);
        let decl = &enums[0];

        let invalid = decl.variant("_invalid").unwrap();
        assert!(!invalid.valid);
        assert_eq!(invalid.names, vec!["_invalid".to_string()]);

        let pending = decl.variant("pending").unwrap();
        assert_eq!(pending.names, vec!["pending".to_string()]);
        assert_eq!(pending.transitions, vec!["done".to_string(), "canceled".to_string()]);
        assert!(!pending.terminal);

        assert!(decl.variant("done").unwrap().terminal);
        assert_eq!(decl.variant("waiting").unwrap().names, vec!["waiting".to_string()]);

        let tags: Vec<&str> = decl.all_tags.iter().map(String::as_str).collect();
        assert_eq!(tags, vec!["manual", "slow"]);
    }

    #[test]
    fn test_aliases_share_value() {
        let enums = build_ok(SWAP);
        let decl = &enums[0];
        assert_eq!(decl.variant("waiting").unwrap().value, 2000);
        assert_eq!(decl.variant("waitingAlias").unwrap().value, 2000);
        assert_eq!(decl.variant_by_value(2000).unwrap().ident, "waiting");
        assert_eq!(decl.variant("pending").unwrap().value_source, ValueSource::Literal);
    }

    #[test]
    fn test_preceding_lines_are_preserved() {
        let enums = build_ok(SWAP);
        let decl = &enums[0];
        assert_eq!(decl.variant("_invalid").unwrap().doc_lines, vec!["// invalid".to_string()]);
        assert_eq!(
            decl.variant("pending").unwrap().doc_lines,
            vec![
                "".to_string(),
                "////////// STEP1 //////////".to_string(),
                "".to_string(),
                "// pending".to_string(),
                "// freshly created".to_string(),
                "// state: -> done, canceled".to_string(),
            ]
        );
        assert_eq!(
            decl.variant("canceled").unwrap().doc_lines,
            vec!["// canceled".to_string(), "// state: [final]".to_string()]
        );
    }

    #[test]
    fn test_iota_members_and_other_types() {
        let source = r#"package colors

// goenums: -text
type color uint8

const (
	// red
	red color = iota
	green
	blank = 99
	// blue
	blue color = iota
)
"#;
        let enums = build_ok(source);
        let decl = &enums[0];
        let got: Vec<(&str, i64)> = decl.variants.iter().map(|v| (v.ident.as_str(), v.value)).collect();
        assert_eq!(got, vec![("red", 0), ("green", 1), ("blue", 3)]);
        assert_eq!(decl.variant("green").unwrap().doc_lines, Vec::<String>::new());
        assert_eq!(decl.variant("blue").unwrap().doc_lines, vec!["// blue".to_string()]);
        assert_eq!(decl.container_name, "Colors");
    }

    #[test]
    fn test_unannotated_types_are_ignored() {
        let enums = build_ok("package p\n\ntype plain int\n\nconst a plain = 1\n");
        assert!(enums.is_empty());
    }

    #[test]
    fn test_strip_naming() {
        let options = BuildOptions {
            naming: NamingStrategy::Strip,
            ..BuildOptions::default()
        };
        let enums = build_str(SWAP, options).unwrap();
        assert_eq!(enums[0].container_name, "Swaps");
    }

    #[test]
    fn test_unknown_transition_target() {
        let source = SWAP.replace("-> done, canceled", "-> dnoe");
        let err = build_str(&source, BuildOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            Error::UnknownTransitionTarget { ref variant, ref target, .. }
                if variant == "pending" && target == "dnoe"
        ));

        let lenient = BuildOptions {
            validate_transitions: false,
            ..BuildOptions::default()
        };
        let enums = build_str(&source, lenient).unwrap();
        assert_eq!(enums[0].variant("pending").unwrap().transitions, vec!["dnoe".to_string()]);
    }

    #[test]
    fn test_several_invalid_markers() {
        let source = "package p\n\n// goenums:\ntype level int\n\nconst (\n\
                      \tunknown level = iota // invalid\n\
                      \tbroken // invalid\n\
                      \tlow\n)\n";
        let enums = build_ok(source);
        let decl = &enums[0];
        let invalid: Vec<&str> = decl.variants.iter().filter(|v| !v.valid).map(|v| v.ident.as_str()).collect();
        assert_eq!(invalid, vec!["unknown", "broken"]);
        assert_eq!(decl.canonical_invalid().unwrap().ident, "unknown");
        assert!(decl.variant("low").unwrap().valid);
    }

    #[test]
    fn test_lone_const_doc_annotates_member() {
        let source = "package p\n\n// goenums:\ntype kind int\n\n// tag: slow\nconst a kind = 1\n\nconst b kind = 2 // invalid\n";
        let enums = build_ok(source);
        let decl = &enums[0];
        assert_eq!(decl.variant("a").unwrap().tags, vec!["slow".to_string()]);
        assert!(decl.variant("a").unwrap().valid);
        assert!(!decl.variant("b").unwrap().valid);
    }

    #[test]
    fn test_duplicate_variant() {
        let source = "package p\n\n// goenums:\ntype kind int\n\nconst a kind = 1\n\nconst a kind = 2\n";
        let err = build_str(source, BuildOptions::default()).unwrap_err();
        assert!(matches!(err, Error::DuplicateVariant { ref variant, .. } if variant == "a"));
    }

    #[test]
    fn test_type_errors() {
        let exported = "package p\n\n// goenums: -json\ntype Kind int\n";
        assert!(matches!(
            build_str(exported, BuildOptions::default()),
            Err(Error::WrapperNameCollision { .. })
        ));

        let structured = "package p\n\n// goenums: -json\ntype kind struct{ a int }\n";
        assert!(matches!(
            build_str(structured, BuildOptions::default()),
            Err(Error::UnsupportedBaseType { .. })
        ));
    }
}
