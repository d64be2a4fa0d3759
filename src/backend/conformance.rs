//! Conformance check for generated code
//!
//! Go only finds out that a wrapper misses an `enums.Enum` method when the
//! generated file is compiled. This pass scans the rendered text for the
//! method set every declaration must carry, so a broken artifact is never
//! written.

use std::collections::{HashMap, HashSet};

use crate::middle::model::EnumDeclaration;
use crate::utils::{Error, Result};

/// Methods of the `enums.Enum` interface
const ENUM_METHODS: &[&str] = &[
    "Val",
    "All",
    "IsValid",
    "Name",
    "NameWith",
    "Names",
    "String",
    "SerdeFormat",
    "FromName",
    "FromValue",
];

/// Every method the wrapper type of `decl` must define
pub fn required_methods(decl: &EnumDeclaration) -> Vec<&'static str> {
    let options = &decl.options;
    let mut methods = ENUM_METHODS.to_vec();
    if options.sql {
        methods.extend(["Scan", "Value"]);
    }
    if options.json {
        methods.extend(["MarshalJSON", "UnmarshalJSON"]);
    }
    if options.yaml {
        methods.extend(["MarshalYAML", "UnmarshalYAML"]);
    }
    if options.text {
        methods.extend(["MarshalText", "UnmarshalText"]);
    }
    if options.binary {
        methods.extend(["MarshalBinary", "UnmarshalBinary"]);
    }
    if options.state_machine {
        methods.extend(["CanTransitionTo", "ValidTransitions", "IsTerminalState", "TerminalStateSlice"]);
    }
    methods
}

/// Parse `func (t *Recv) Method(` into its receiver type and method name
fn method_decl(line: &str) -> Option<(&str, &str)> {
    let rest = line.strip_prefix("func (")?;
    let (receiver, rest) = rest.split_once(')')?;
    let receiver = receiver.split_whitespace().last()?.trim_start_matches('*');
    let (method, _) = rest.trim_start().split_once('(')?;
    Some((receiver, method.trim()))
}

/// Verify that every declaration's wrapper defines its required methods
pub fn check(output: &str, enums: &[EnumDeclaration]) -> Result<()> {
    let mut defined: HashMap<&str, HashSet<&str>> = HashMap::new();
    for line in output.lines() {
        if let Some((receiver, method)) = method_decl(line) {
            defined.entry(receiver).or_default().insert(method);
        }
    }

    for decl in enums {
        let methods = defined.get(decl.name.as_str());
        let mut missing: Vec<String> = required_methods(decl)
            .into_iter()
            .filter(|m| !methods.map_or(false, |set| set.contains(m)))
            .map(str::to_string)
            .collect();

        let assertion = format!("var _ enums.Enum[{}, {}] = {}{{}}", decl.base_type, decl.name, decl.name);
        if !output.lines().any(|line| line == assertion) {
            missing.push("enums.Enum assertion".to_string());
        }

        if !missing.is_empty() {
            return Err(Error::Conformance {
                enum_name: decl.name.clone(),
                missing,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::annotation::EnumOptions;
    use crate::utils::Span;
    use pretty_assertions::assert_eq;

    fn declaration(options: EnumOptions) -> EnumDeclaration {
        EnumDeclaration::new(
            "color".to_string(),
            "Color".to_string(),
            "int".to_string(),
            "paint".to_string(),
            "color.go".to_string(),
            options,
            "Colors".to_string(),
            Span::dummy(),
        )
    }

    fn full_method_set(extra: &[&str]) -> String {
        let mut out = String::from("var _ enums.Enum[int, Color] = Color{}\n");
        for method in ENUM_METHODS.iter().chain(extra) {
            out.push_str(&format!("func (t Color) {}() {{\n}}\n", method));
        }
        out
    }

    #[test]
    fn test_method_decl() {
        assert_eq!(method_decl("func (t *Color) Scan(value any) error {"), Some(("Color", "Scan")));
        assert_eq!(method_decl("func (t colorContainer) allSlice() []Color {"), Some(("colorContainer", "allSlice")));
        assert_eq!(method_decl("\treturn nil"), None);
    }

    #[test]
    fn test_complete_output_passes() {
        let decl = declaration(EnumOptions::default());
        assert!(check(&full_method_set(&[]), &[decl]).is_ok());
    }

    #[test]
    fn test_missing_flag_methods_fail() {
        let options = EnumOptions {
            sql: true,
            ..EnumOptions::default()
        };
        let decl = declaration(options);
        let err = check(&full_method_set(&["Scan"]), &[decl]).unwrap_err();
        assert_eq!(err.to_string(), "generated `Color` is missing Value");
    }

    #[test]
    fn test_missing_assertion_fails() {
        let decl = declaration(EnumOptions::default());
        let output = full_method_set(&[]).replacen("var _ enums.Enum[int, Color] = Color{}\n", "", 1);
        assert!(matches!(
            check(&output, &[decl]),
            Err(Error::Conformance { ref missing, .. }) if missing == &vec!["enums.Enum assertion".to_string()]
        ));
    }

    #[test]
    fn test_methods_on_other_types_do_not_count() {
        let decl = declaration(EnumOptions::default());
        let output = full_method_set(&[]).replace("func (t Color) Val()", "func (t colorContainer) Val()");
        let err = check(&output, &[decl]).unwrap_err();
        assert!(matches!(err, Error::Conformance { ref missing, .. } if missing == &vec!["Val".to_string()]));
    }
}
