//! Annotation Interpreter
//!
//! Reads the comment micro-DSL attached to enum type declarations (feature
//! flags) and to enum members (names, tags, state transitions, validity).
//! Nothing in here fails: text that does not match the grammar is left for
//! the documentation and the defaults fill the gaps.

use log::debug;
use serde::Serialize;

/// Marker that turns a type declaration into an enum declaration
pub const MARKER: &str = "goenums:";

/// How the generated type serializes itself
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SerdeFormat {
    Name,
    #[default]
    Value,
}

/// Feature flags read from the marker line
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EnumOptions {
    /// `-sql`: `Scan` / `Value`
    pub sql: bool,
    /// `-json`
    pub json: bool,
    /// `-yaml`
    pub yaml: bool,
    /// `-text`
    pub text: bool,
    /// `-binary`
    pub binary: bool,
    /// `-serde/name` or `-serde/value`
    pub serde_format: SerdeFormat,
    /// `-genName`: display-name constants
    pub gen_name: bool,
    /// `-statemachine`
    pub state_machine: bool,
}

impl EnumOptions {
    /// Apply one flag token, returning false if it is not recognized
    fn apply(&mut self, flag: &str) -> bool {
        match flag {
            "-sql" => self.sql = true,
            "-json" => self.json = true,
            "-yaml" => self.yaml = true,
            "-text" => self.text = true,
            "-binary" => self.binary = true,
            "-serde/name" => self.serde_format = SerdeFormat::Name,
            "-serde/value" => self.serde_format = SerdeFormat::Value,
            "-genName" => self.gen_name = true,
            "-statemachine" => self.state_machine = true,
            _ => return false,
        }
        true
    }
}

/// Find the marker line in a comment and read its flags.
///
/// Returns `None` when no line carries the marker.
pub fn parse_options(comment: &str) -> Option<EnumOptions> {
    let line = comment.lines().find(|line| line.contains(MARKER))?;
    let (_, rest) = line.split_once(MARKER)?;

    let mut options = EnumOptions::default();
    for flag in rest.split_whitespace() {
        if !options.apply(flag) {
            debug!("ignoring unknown enum flag `{}`", flag);
        }
    }
    Some(options)
}

/// Semantics extracted from the comments attached to one member
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariantAnnotation {
    /// Display names, canonical first; empty means "use the identifier"
    pub names: Vec<String>,
    pub invalid: bool,
    pub tags: Vec<String>,
    pub transitions: Vec<String>,
    pub terminal: bool,
}

impl VariantAnnotation {
    /// Display names, falling back to the member identifier
    pub fn names_or(&self, ident: &str) -> Vec<String> {
        if self.names.is_empty() {
            vec![ident.to_string()]
        } else {
            self.names.clone()
        }
    }
}

/// Split a comma separated list, trimming entries and dropping empty ones
fn split_list(list: &str) -> impl Iterator<Item = &str> {
    list.split(',').map(str::trim).filter(|item| !item.is_empty())
}

/// Interpret the comment text attached to one member.
///
/// The text is read line by line. Each line loses one `//` marker and its
/// surrounding whitespace; a line that still starts with `//` is a banner or
/// a continuation and only ever counts as documentation.
pub fn parse_variant_comment(text: &str) -> VariantAnnotation {
    let mut annotation = VariantAnnotation::default();
    let mut names_seen = false;

    for raw in text.lines() {
        let line = raw.trim();
        let line = line.strip_prefix("//").unwrap_or(line).trim();
        if line.is_empty() {
            continue;
        }

        if line == "invalid" {
            annotation.invalid = true;
            continue;
        }

        if let Some(state) = line.strip_prefix("state:") {
            let state = state.trim();
            if state == "[final]" {
                annotation.terminal = true;
            } else if let Some(targets) = state.strip_prefix("->") {
                annotation
                    .transitions
                    .extend(split_list(targets).map(str::to_string));
            } else {
                debug!("ignoring state annotation `{}`", state);
            }
            continue;
        }

        if let Some(tags) = line.strip_prefix("tag:") {
            for tag in split_list(tags) {
                if !annotation.tags.iter().any(|t| t == tag) {
                    annotation.tags.push(tag.to_string());
                }
            }
            continue;
        }

        if !names_seen && !line.contains(':') && !line.starts_with("//") {
            names_seen = true;
            annotation.names = split_list(line)
                .filter(|name| *name != "invalid")
                .map(str::to_string)
                .collect();
        }
    }

    annotation
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_options_from_marker_line() {
        let options = parse_options(" SwapStatus\n goenums: -json -sql -serde/name -statemachine").unwrap();
        assert!(options.json);
        assert!(options.sql);
        assert!(options.state_machine);
        assert!(!options.yaml && !options.text && !options.binary && !options.gen_name);
        assert_eq!(options.serde_format, SerdeFormat::Name);
    }

    #[test]
    fn test_options_defaults_and_unknown_flags() {
        let options = parse_options("goenums: -frobnicate -genName").unwrap();
        assert!(options.gen_name);
        assert_eq!(options.serde_format, SerdeFormat::Value);

        let bare = parse_options("goenums:").unwrap();
        assert_eq!(bare, EnumOptions::default());
    }

    #[test]
    fn test_options_require_marker() {
        assert!(parse_options("just a type\nnothing to see").is_none());
    }

    #[test]
    fn test_no_annotation_uses_identifier() {
        let annotation = parse_variant_comment("");
        assert_eq!(annotation, VariantAnnotation::default());
        assert_eq!(annotation.names_or("pending"), vec!["pending".to_string()]);
    }

    #[test]
    fn test_names_and_transitions() {
        let annotation = parse_variant_comment(" pending\n state: -> a, b");
        assert_eq!(annotation.names, vec!["pending".to_string()]);
        assert_eq!(annotation.transitions, vec!["a".to_string(), "b".to_string()]);
        assert!(!annotation.terminal);
    }

    #[test]
    fn test_final_state() {
        let annotation = parse_variant_comment(" canceled\n state: [final]");
        assert!(annotation.terminal);
        assert!(annotation.transitions.is_empty());
    }

    #[test]
    fn test_invalid_and_alias_names() {
        let annotation = parse_variant_comment(" invalid\n unknown, invalid, , none");
        assert!(annotation.invalid);
        assert_eq!(annotation.names, vec!["unknown".to_string(), "none".to_string()]);
    }

    #[test]
    fn test_only_first_name_line_counts() {
        let annotation = parse_variant_comment(" wait_tx_confirm\n waiting for the tx to confirm");
        assert_eq!(annotation.names, vec!["wait_tx_confirm".to_string()]);
    }

    #[test]
    fn test_banner_lines_are_not_names() {
        let annotation = parse_variant_comment("////// STEP1-START\n step1");
        assert_eq!(annotation.names, vec!["step1".to_string()]);
    }

    #[test]
    fn test_tags_accumulate_without_duplicates() {
        let annotation = parse_variant_comment(" tag: slow, retry\n tag: retry,, manual");
        assert_eq!(
            annotation.tags,
            vec!["slow".to_string(), "retry".to_string(), "manual".to_string()]
        );
    }

    #[test]
    fn test_unrecognized_lines_are_ignored() {
        let annotation = parse_variant_comment(" note: something\n state: sideways");
        assert_eq!(annotation, VariantAnnotation::default());
    }
}
