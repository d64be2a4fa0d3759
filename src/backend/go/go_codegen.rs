//! Go Code Generator
//!
//! Renders the enum model as Go source. Output is written line by line into
//! an in-memory buffer; nothing touches the file system here.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::Path;

use log::debug;

use crate::backend::codegen::{CodeGen, EnumFile, RenderProfile};
use crate::backend::conformance;
use crate::middle::model::EnumDeclaration;
use crate::middle::naming::{first_upper, to_identifier};
use crate::frontend::annotation::{EnumOptions, SerdeFormat};
use crate::utils::{Error, Result};

const ENUMS_IMPORT: &str = "github.com/donutnomad/goenum/enums";

/// Methods the container type defines itself
const CONTAINER_METHODS: &[&str] = &["All", "FromName", "FromValue", "allSlice"];

/// Methods the wrapper type may define, used to catch tag accessor clashes
const WRAPPER_METHODS: &[&str] = &["IsValid", "IsTerminalState"];

/// One optional encoding hook pair, e.g. `MarshalJSON` / `UnmarshalJSON`
struct Codec {
    /// Suffix of the `enums` helpers and the generated methods
    format: &'static str,
    /// Prefix of the standard interfaces, completed by `Marshaler`
    interface: &'static str,
    /// Return type of the marshal method besides `error`
    marshal_type: &'static str,
    /// Parameter of the unmarshal method
    unmarshal_param: &'static str,
    unmarshal_arg: &'static str,
    enabled: fn(&EnumOptions) -> bool,
}

/// Encoding blocks in emission order
const CODECS: &[Codec] = &[
    Codec {
        format: "JSON",
        interface: "json.",
        marshal_type: "[]byte",
        unmarshal_param: "data []byte",
        unmarshal_arg: "data",
        enabled: |o| o.json,
    },
    Codec {
        format: "YAML",
        interface: "yaml.",
        marshal_type: "any",
        unmarshal_param: "node *yaml.Node",
        unmarshal_arg: "node",
        enabled: |o| o.yaml,
    },
    Codec {
        format: "Text",
        interface: "encoding.Text",
        marshal_type: "[]byte",
        unmarshal_param: "data []byte",
        unmarshal_arg: "data",
        enabled: |o| o.text,
    },
    Codec {
        format: "Binary",
        interface: "encoding.Binary",
        marshal_type: "[]byte",
        unmarshal_param: "data []byte",
        unmarshal_arg: "data",
        enabled: |o| o.binary,
    },
];

/// Quote a string as a Go interpreted string literal
fn go_quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 || c == '\u{7f}' => out.push_str(&format!("\\x{:02x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Names and alias-merged tables derived from one declaration
struct Layout<'d> {
    decl: &'d EnumDeclaration,
    /// `swapStatusContainer`
    container_type: String,
    /// `swapstatusNamesMap`
    names_map: String,
    /// `swapstatusTagsMap`
    tags_map: String,
    /// Container field per variant
    fields: Vec<String>,
    /// One entry per distinct value: owning variant, merged names and tags
    entries: Vec<(usize, Vec<String>, Vec<String>)>,
    /// (tag, Go identifier), lexical by tag
    tags: Vec<(String, String)>,
}

impl<'d> Layout<'d> {
    fn new(decl: &'d EnumDeclaration) -> Result<Self> {
        let line = decl.span.line;
        let raw = format!("{}Raw", decl.name);
        if decl.container_name == decl.name || decl.container_name == raw {
            return Err(Error::CodeGen(format!(
                "line {}: container `{}` of enum `{}` clashes with a generated type",
                line, decl.container_name, decl.name
            )));
        }

        let fields: Vec<String> = decl.variants.iter().map(|v| first_upper(&v.ident)).collect();

        let mut taken: HashMap<&str, &str> = HashMap::new();
        for (field, variant) in fields.iter().zip(&decl.variants) {
            if CONTAINER_METHODS.contains(&field.as_str()) {
                return Err(Error::CodeGen(format!(
                    "line {}: `{}` in enum `{}` becomes container field `{}`, which clashes with a container method",
                    variant.span.line, variant.ident, decl.name, field
                )));
            }
            if let Some(other) = taken.insert(field.as_str(), variant.ident.as_str()) {
                return Err(Error::CodeGen(format!(
                    "line {}: `{}` and `{}` in enum `{}` both become container field `{}`",
                    variant.span.line, other, variant.ident, decl.name, field
                )));
            }
        }

        let mut entries: Vec<(usize, Vec<String>, Vec<String>)> = Vec::new();
        let mut by_value: HashMap<i64, usize> = HashMap::new();
        for (pos, variant) in decl.variants.iter().enumerate() {
            match by_value.get(&variant.value) {
                Some(&entry) => {
                    let (_, names, tags) = &mut entries[entry];
                    for name in &variant.names {
                        if !names.contains(name) {
                            names.push(name.clone());
                        }
                    }
                    for tag in &variant.tags {
                        if !tags.contains(tag) {
                            tags.push(tag.clone());
                        }
                    }
                }
                None => {
                    by_value.insert(variant.value, entries.len());
                    entries.push((pos, variant.names.clone(), variant.tags.clone()));
                }
            }
        }

        let mut tags = Vec::new();
        let mut idents: HashMap<String, &str> = HashMap::new();
        for tag in &decl.all_tags {
            let ident = to_identifier(tag);
            let accessor = format!("Is{}", ident);
            if WRAPPER_METHODS.contains(&accessor.as_str()) {
                return Err(Error::CodeGen(format!(
                    "line {}: tag `{}` in enum `{}` would generate `{}`, which clashes with a generated method",
                    line, tag, decl.name, accessor
                )));
            }
            let slice = format!("{}Slice", ident);
            if fields.contains(&slice) {
                return Err(Error::CodeGen(format!(
                    "line {}: tag `{}` in enum `{}` would generate container method `{}`, which clashes with a container field",
                    line, tag, decl.name, slice
                )));
            }
            if let Some(other) = idents.insert(ident.clone(), tag.as_str()) {
                return Err(Error::CodeGen(format!(
                    "line {}: tags `{}` and `{}` in enum `{}` both generate `Is{}`",
                    line, other, tag, decl.name, ident
                )));
            }
            tags.push((tag.clone(), ident));
        }

        let lower = decl.name.to_lowercase();
        Ok(Self {
            decl,
            container_type: format!("{}Container", decl.type_ident),
            names_map: format!("{}NamesMap", lower),
            tags_map: format!("{}TagsMap", lower),
            fields,
            entries,
            tags,
        })
    }

    /// Package-level identifiers the declaration emits
    fn package_idents(&self) -> Vec<String> {
        let decl = self.decl;
        let mut idents = vec![
            decl.name.clone(),
            format!("{}Raw", decl.name),
            decl.container_name.clone(),
            self.container_type.clone(),
            self.names_map.clone(),
        ];
        if !decl.all_tags.is_empty() {
            idents.push(self.tags_map.clone());
        }
        if decl.options.gen_name {
            idents.extend(self.fields.iter().map(|f| format!("{}Name{}", decl.name, f)));
        }
        idents
    }

    /// `SwapStatuses.Pending`
    fn value_ref(&self, pos: usize) -> String {
        format!("{}.{}", self.decl.container_name, self.fields[pos])
    }

    /// Container reference for a transition target, if it names a variant
    fn target_ref(&self, target: &str) -> Option<String> {
        self.decl
            .variants
            .iter()
            .position(|v| v.ident == target)
            .map(|pos| self.value_ref(pos))
    }
}

/// Go code generator
pub struct GoCodeGen {
    profile: RenderProfile,
    output: String,
    indent: usize,
}

impl GoCodeGen {
    pub fn new(profile: RenderProfile) -> Self {
        Self {
            profile,
            output: String::new(),
            indent: 0,
        }
    }

    /// Write indented line
    fn writeln(&mut self, line: &str) {
        if !line.is_empty() {
            for _ in 0..self.indent {
                self.output.push('\t');
            }
            self.output.push_str(line);
        }
        self.output.push('\n');
    }

    fn blank(&mut self) {
        self.output.push('\n');
    }

    /// Write a line and indent what follows
    fn open(&mut self, line: &str) {
        self.writeln(line);
        self.indent += 1;
    }

    /// Dedent and write a closing line
    fn close(&mut self, line: &str) {
        self.indent = self.indent.saturating_sub(1);
        self.writeln(line);
    }

    /// Generated doc comment, dropped by the minimal profile
    fn doc(&mut self, text: &str) {
        if self.profile == RenderProfile::Full {
            for line in text.lines() {
                self.writeln(&format!("// {}", line));
            }
        }
    }

    /// `var zero T; return zero, false`
    fn return_zero(&mut self, name: &str) {
        self.writeln(&format!("var zero {}", name));
        self.writeln("return zero, false");
    }

    // ==================== File ====================

    fn emit_header(&mut self, file: &EnumFile) {
        self.writeln("// Code generated by goenum. DO NOT EDIT.");
        let source = Path::new(&file.source)
            .file_name()
            .map_or(file.source.clone(), |n| n.to_string_lossy().into_owned());
        self.writeln(&format!("// Source: {}", source));
        self.blank();
        self.writeln(&format!("package {}", file.package));
        self.blank();

        let mut imports: BTreeSet<&str> = ["fmt", "iter", ENUMS_IMPORT].into_iter().collect();
        if file.enums.iter().any(|e| e.options.sql) {
            imports.insert("database/sql/driver");
        }
        if file.enums.iter().any(|e| e.options.yaml) {
            imports.insert("gopkg.in/yaml.v3");
        }

        self.open("import (");
        for import in imports {
            self.writeln(&go_quote(import));
        }
        self.close(")");
    }

    fn emit_enum(&mut self, layout: &Layout) {
        let decl = layout.decl;
        debug!("emitting `{}` with {} variant(s)", decl.name, decl.variants.len());

        self.emit_types(layout);
        self.emit_tables(layout);
        self.emit_core_methods(layout);
        self.emit_container_methods(layout);
        if decl.options.gen_name {
            self.emit_name_constants(layout);
        }
        self.emit_tag_accessors(layout);
        if decl.options.sql {
            self.emit_sql(decl);
        }
        for codec in CODECS {
            if (codec.enabled)(&decl.options) {
                self.emit_codec(decl, codec);
            }
        }
        if decl.options.state_machine {
            self.emit_state_machine(layout);
        }
    }

    // ==================== Core ====================

    fn emit_types(&mut self, layout: &Layout) {
        let decl = layout.decl;
        let name = &decl.name;

        if self.profile == RenderProfile::Full {
            self.blank();
            self.writeln(&format!("// {}", "=".repeat(97)));
            self.writeln(&format!("// {}", name));
            self.writeln(&format!("// {}", "=".repeat(97)));
        }

        self.blank();
        self.doc(&format!(
            "{} is a type that represents a single enum value.\n\
             It combines the core information about the enum constant and its defined fields.",
            name
        ));
        self.open(&format!("type {} struct {{", name));
        self.writeln(&decl.type_ident);
        self.close("}");

        self.blank();
        self.doc(&format!("Verify that {} implements the Enum interface", name));
        self.writeln(&format!("var _ enums.Enum[{}, {}] = {}{{}}", decl.base_type, name, name));

        self.blank();
        self.doc(&format!(
            "{} is the container for all enum values.\n\
             It is private and should not be used directly use the public methods on the {} type.",
            layout.container_type, name
        ));
        self.open(&format!("type {} struct {{", layout.container_type));
        for (pos, variant) in decl.variants.iter().enumerate() {
            if self.profile == RenderProfile::Full {
                self.emit_preserved_doc(pos == 0, &variant.doc_lines, variant.value);
            }
            self.writeln(&format!("{} {}", layout.fields[pos], name));
        }
        self.close("}");

        self.blank();
        self.doc(&format!(
            "{} is a main entry point using the {} type.\n\
             It is a container for all enum values and provides a convenient way to access all enum values and perform\n\
             operations, with convenience methods for common use cases.",
            decl.container_name, name
        ));
        self.open(&format!("var {} = {}{{", decl.container_name, layout.container_type));
        for (pos, variant) in decl.variants.iter().enumerate() {
            self.writeln(&format!("{}: {}{{{}}},", layout.fields[pos], name, variant.ident));
        }
        self.close("}");
    }

    /// Source documentation above a container field. The first plain
    /// comment line is annotated with the resolved value.
    fn emit_preserved_doc(&mut self, first: bool, lines: &[String], value: i64) {
        let mut annotated = false;
        let skip = if first {
            lines.iter().take_while(|l| l.trim().is_empty()).count()
        } else {
            0
        };

        for line in &lines[skip..] {
            let line = line.trim();
            if line.is_empty() {
                self.blank();
            } else if !annotated && line.starts_with("//") && !line.contains("////") {
                annotated = true;
                self.writeln(&format!("{} ({})", line, value));
            } else {
                self.writeln(line);
            }
        }
    }

    fn emit_tables(&mut self, layout: &Layout) {
        let decl = layout.decl;

        self.blank();
        self.doc(&format!("{} maps enum values to their names array", layout.names_map));
        self.open(&format!("var {} = map[{}][]string{{", layout.names_map, decl.name));
        for (pos, names, _) in &layout.entries {
            self.emit_string_list(&layout.value_ref(*pos), names);
        }
        self.close("}");

        if !decl.all_tags.is_empty() {
            self.blank();
            self.doc(&format!("{} maps enum values to their tags array", layout.tags_map));
            self.open(&format!("var {} = map[{}][]string{{", layout.tags_map, decl.name));
            for (pos, _, tags) in &layout.entries {
                if !tags.is_empty() {
                    self.emit_string_list(&layout.value_ref(*pos), tags);
                }
            }
            self.close("}");
        }

        self.blank();
        self.doc(&format!(
            "{}Raw is a type alias for the underlying enum type {}.\n\
             It provides direct access to the raw enum values for cases where you need\n\
             to work with the underlying type directly.",
            decl.name, decl.type_ident
        ));
        self.writeln(&format!("type {}Raw = {}", decl.name, decl.type_ident));

        self.blank();
        self.doc("allSlice returns a slice of all enum values.");
        self.open(&format!("func (t {}) allSlice() []{} {{", layout.container_type, decl.name));
        self.open(&format!("return []{}{{", decl.name));
        for pos in 0..decl.variants.len() {
            self.writeln(&format!("{},", layout.value_ref(pos)));
        }
        self.close("}");
        self.close("}");
    }

    fn emit_string_list(&mut self, key: &str, items: &[String]) {
        self.open(&format!("{}: {{", key));
        for item in items {
            self.writeln(&format!("{},", go_quote(item)));
        }
        self.close("},");
    }

    fn emit_core_methods(&mut self, layout: &Layout) {
        let decl = layout.decl;
        let name = &decl.name;
        let names_map = &layout.names_map;

        self.blank();
        self.doc("Val implements the Enum interface.");
        self.open(&format!("func (t {}) Val() {} {{", name, decl.base_type));
        self.writeln(&format!("return {}(t.{})", decl.base_type, decl.type_ident));
        self.close("}");

        self.blank();
        self.doc("All implements the Enum interface.");
        self.open(&format!("func (t {}) All() iter.Seq[{}] {{", name, name));
        self.open(&format!("return func(yield func({}) bool) {{", name));
        self.open(&format!("for _, v := range {}.allSlice() {{", decl.container_name));
        self.open("if !v.IsValid() {");
        self.writeln("continue");
        self.close("}");
        self.open("if !yield(v) {");
        self.writeln("return");
        self.close("}");
        self.close("}");
        self.close("}");
        self.close("}");

        self.blank();
        self.doc("IsValid implements the Enum interface.");
        self.open(&format!("func (t {}) IsValid() bool {{", name));
        for (pos, variant) in decl.variants.iter().enumerate() {
            if !variant.valid {
                self.open(&format!("if t == {} {{", layout.value_ref(pos)));
                self.writeln("return false");
                self.close("}");
            }
        }
        self.writeln("return true");
        self.close("}");

        self.blank();
        self.doc("Name implements the Enum interface.\nReturns the first name of the enum value.");
        self.open(&format!("func (t {}) Name() string {{", name));
        self.open(&format!("if names, ok := {}[t]; ok && len(names) > 0 {{", names_map));
        self.writeln("return names[0]");
        self.close("}");
        self.writeln("return \"\"");
        self.close("}");

        self.blank();
        self.doc("NameWith returns the name at the specified index.\nIf the index is out of bounds, returns the last name.");
        self.open(&format!("func (t {}) NameWith(idx int) string {{", name));
        self.writeln(&format!("names, ok := {}[t]", names_map));
        self.open("if !ok || len(names) == 0 {");
        self.writeln("return \"\"");
        self.close("}");
        self.open("if idx < 0 || idx >= len(names) {");
        self.writeln("return names[len(names)-1]");
        self.close("}");
        self.writeln("return names[idx]");
        self.close("}");

        self.blank();
        self.doc("Names returns all names of the enum value.");
        self.open(&format!("func (t {}) Names() []string {{", name));
        self.open(&format!("if names, ok := {}[t]; ok {{", names_map));
        self.writeln("return names");
        self.close("}");
        self.writeln("return []string{}");
        self.close("}");

        self.blank();
        self.doc("String implements the Stringer interface.");
        self.open(&format!("func (t {}) String() string {{", name));
        self.open(&format!("if names, ok := {}[t]; ok && len(names) > 0 {{", names_map));
        self.writeln("return names[0]");
        self.close("}");
        self.writeln(&format!(
            "return fmt.Sprintf({}, t.{})",
            go_quote(&format!("{}(%v)", decl.type_ident)),
            decl.type_ident
        ));
        self.close("}");

        self.blank();
        self.doc("SerdeFormat implements the Enum interface.");
        self.open(&format!("func (t {}) SerdeFormat() enums.Format {{", name));
        self.writeln(match decl.options.serde_format {
            SerdeFormat::Name => "return enums.FormatName",
            SerdeFormat::Value => "return enums.FormatValue",
        });
        self.close("}");

        self.blank();
        self.doc("FromName implements the Enum interface.");
        self.open(&format!("func (t {}) FromName(name string) ({}, bool) {{", name, name));
        self.open(&format!("for _, v := range {}.allSlice() {{", decl.container_name));
        self.open("for _, n := range v.Names() {");
        self.open("if n == name {");
        self.writeln("return v, v.IsValid()");
        self.close("}");
        self.close("}");
        self.close("}");
        self.return_zero(name);
        self.close("}");

        self.blank();
        self.doc("FromValue implements the Enum interface.");
        self.open(&format!("func (t {}) FromValue(value {}) ({}, bool) {{", name, decl.base_type, name));
        self.open(&format!("for v := range {}.All() {{", decl.container_name));
        self.open("if v.Val() == value {");
        self.writeln("return v, true");
        self.close("}");
        self.close("}");
        self.return_zero(name);
        self.close("}");
    }

    fn emit_container_methods(&mut self, layout: &Layout) {
        let decl = layout.decl;
        let name = &decl.name;
        let container = &layout.container_type;

        self.blank();
        self.doc("All container methods for convenience");
        self.open(&format!("func (t {}) All() iter.Seq[{}] {{", container, name));
        self.writeln(&format!("return {}{{}}.All()", name));
        self.close("}");

        self.blank();
        self.open(&format!("func (t {}) FromName(name string) ({}, bool) {{", container, name));
        self.writeln(&format!("return {}{{}}.FromName(name)", name));
        self.close("}");

        self.blank();
        self.open(&format!(
            "func (t {}) FromValue(value {}) ({}, bool) {{",
            container, decl.base_type, name
        ));
        self.writeln(&format!("return {}{{}}.FromValue(value)", name));
        self.close("}");
    }

    fn emit_name_constants(&mut self, layout: &Layout) {
        let decl = layout.decl;
        if decl.variants.is_empty() {
            return;
        }

        self.blank();
        self.doc(&format!("Display names of the {} values.", decl.name));
        self.open("const (");
        for (pos, variant) in decl.variants.iter().enumerate() {
            let canonical = variant.names.first().map_or(variant.ident.as_str(), String::as_str);
            self.writeln(&format!(
                "{}Name{} = {}",
                decl.name,
                layout.fields[pos],
                go_quote(canonical)
            ));
        }
        self.close(")");
    }

    // ==================== Tags ====================

    fn emit_tag_accessors(&mut self, layout: &Layout) {
        let decl = layout.decl;
        for (tag, ident) in &layout.tags {
            let quoted = go_quote(tag);

            self.blank();
            self.doc(&format!("{}Slice returns all enum values that have the {} tag.", ident, quoted));
            self.open(&format!(
                "func (t {}) {}Slice() []{} {{",
                layout.container_type, ident, decl.name
            ));
            self.writeln(&format!("var result []{}", decl.name));
            self.open("for _, v := range t.allSlice() {");
            self.open(&format!("if v.Is{}() {{", ident));
            self.writeln("result = append(result, v)");
            self.close("}");
            self.close("}");
            self.writeln("return result");
            self.close("}");

            self.blank();
            self.doc(&format!("Is{} returns true if this enum value has the {} tag.", ident, quoted));
            self.open(&format!("func (t {}) Is{}() bool {{", decl.name, ident));
            self.open(&format!("if tags, ok := {}[t]; ok {{", layout.tags_map));
            self.open("for _, tag := range tags {");
            self.open(&format!("if tag == {} {{", quoted));
            self.writeln("return true");
            self.close("}");
            self.close("}");
            self.close("}");
            self.writeln("return false");
            self.close("}");
        }
    }

    // ==================== Serialization ====================

    /// `*t = *result` tail shared by every decoding hook
    fn emit_assign_result(&mut self) {
        self.open("if err != nil {");
        self.writeln("return err");
        self.close("}");
        self.writeln("*t = *result");
        self.writeln("return nil");
    }

    fn emit_sql(&mut self, decl: &EnumDeclaration) {
        let name = &decl.name;

        self.blank();
        self.doc(&format!("Scan implements the database/sql.Scanner interface for {}.", name));
        self.open(&format!("func (t *{}) Scan(value any) error {{", name));
        self.writeln("result, err := enums.SQLScan(*t, value)");
        self.emit_assign_result();
        self.close("}");

        self.blank();
        self.doc(&format!(
            "Value implements the database/sql/driver.Valuer interface for {}.",
            name
        ));
        self.open(&format!("func (t {}) Value() (driver.Value, error) {{", name));
        self.writeln("return enums.SQLValue(t)");
        self.close("}");
    }

    fn emit_codec(&mut self, decl: &EnumDeclaration, codec: &Codec) {
        let name = &decl.name;
        let format = codec.format;

        self.blank();
        self.doc(&format!(
            "Marshal{} implements the {}Marshaler interface for {}.",
            format, codec.interface, name
        ));
        self.open(&format!(
            "func (t {}) Marshal{}() ({}, error) {{",
            name, format, codec.marshal_type
        ));
        self.writeln(&format!("return enums.Marshal{}(t, t.{})", format, decl.type_ident));
        self.close("}");

        self.blank();
        self.doc(&format!(
            "Unmarshal{} implements the {}Unmarshaler interface for {}.",
            format, codec.interface, name
        ));
        self.open(&format!(
            "func (t *{}) Unmarshal{}({}) error {{",
            name, format, codec.unmarshal_param
        ));
        self.writeln(&format!(
            "result, err := enums.Unmarshal{}(*t, {})",
            format, codec.unmarshal_arg
        ));
        self.emit_assign_result();
        self.close("}");
    }

    // ==================== State machine ====================

    fn emit_state_machine(&mut self, layout: &Layout) {
        let decl = layout.decl;
        let name = &decl.name;

        self.blank();
        self.doc("CanTransitionTo checks if the current state can transition to the target state.");
        self.open(&format!("func (t {}) CanTransitionTo(target {}) bool {{", name, name));
        self.writeln("transitions := t.ValidTransitions()");
        self.open("for _, validTarget := range transitions {");
        self.open("if validTarget == target {");
        self.writeln("return true");
        self.close("}");
        self.close("}");
        self.writeln("return false");
        self.close("}");

        self.blank();
        self.doc("ValidTransitions returns all valid target states that this state can transition to.");
        self.open(&format!("func (t {}) ValidTransitions() []{} {{", name, name));
        for (pos, variant) in decl.variants.iter().enumerate() {
            if variant.transitions.is_empty() {
                continue;
            }
            self.open(&format!("if t == {} {{", layout.value_ref(pos)));
            self.open(&format!("return []{}{{", name));
            for target in &variant.transitions {
                match layout.target_ref(target) {
                    Some(reference) => self.writeln(&format!("{},", reference)),
                    None => self.writeln(&format!("// unresolved: {}", target)),
                }
            }
            self.close("}");
            self.close("}");
        }
        self.writeln(&format!("return []{}{{}}", name));
        self.close("}");

        self.blank();
        self.doc("IsTerminalState returns true if this state is a terminal (final) state.");
        self.open(&format!("func (t {}) IsTerminalState() bool {{", name));
        for (pos, variant) in decl.variants.iter().enumerate() {
            if variant.terminal {
                self.open(&format!("if t == {} {{", layout.value_ref(pos)));
                self.writeln("return true");
                self.close("}");
            }
        }
        self.writeln("return false");
        self.close("}");

        self.blank();
        self.doc("TerminalStateSlice returns a slice of all terminal states.");
        self.open(&format!("func (t {}) TerminalStateSlice() []{} {{", name, name));
        let terminal: Vec<String> = decl
            .variants
            .iter()
            .enumerate()
            .filter(|(_, v)| v.terminal)
            .map(|(pos, _)| layout.value_ref(pos))
            .collect();
        if terminal.is_empty() {
            self.writeln(&format!("return []{}{{}}", name));
        } else {
            self.open(&format!("return []{}{{", name));
            for reference in &terminal {
                self.writeln(&format!("{},", reference));
            }
            self.close("}");
        }
        self.close("}");
    }
}

impl CodeGen for GoCodeGen {
    fn generate(&mut self, file: &EnumFile) -> Result<String> {
        self.output.clear();
        self.indent = 0;

        let layouts = file.enums.iter().map(Layout::new).collect::<Result<Vec<_>>>()?;

        let mut declared: HashMap<String, &str> = HashMap::new();
        for layout in &layouts {
            let decl = layout.decl;
            let mut own = HashSet::new();
            for ident in layout.package_idents() {
                if !own.insert(ident.clone()) {
                    return Err(Error::CodeGen(format!(
                        "line {}: enum `{}` declares `{}` twice",
                        decl.span.line, decl.name, ident
                    )));
                }
                if let Some(other) = declared.insert(ident.clone(), decl.type_ident.as_str()) {
                    return Err(Error::CodeGen(format!(
                        "line {}: enums `{}` and `{}` both declare `{}`",
                        decl.span.line, other, decl.type_ident, ident
                    )));
                }
            }
        }

        self.emit_header(file);
        for layout in &layouts {
            self.emit_enum(layout);
        }

        let output = std::mem::take(&mut self.output);
        conformance::check(&output, &file.enums)?;
        Ok(output)
    }

    fn name(&self) -> &str {
        "go"
    }

    fn file_suffix(&self) -> &str {
        "_enums.go"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::parser::parse_source;
    use crate::middle::builder::{build, BuildOptions};
    use pretty_assertions::assert_eq;

    fn enum_file(source: &str) -> EnumFile {
        let file = parse_source(source).unwrap();
        let enums = build(&file, source, "status.go", BuildOptions::default()).unwrap();
        EnumFile {
            package: file.package.name.clone(),
            source: "status.go".to_string(),
            enums,
        }
    }

    fn render(source: &str, profile: RenderProfile) -> String {
        GoCodeGen::new(profile).generate(&enum_file(source)).unwrap()
    }

    fn with_flags(flags: &str) -> String {
        format!(
            "package orders\n\n// goenums: {}\ntype orderStatus int\n\nconst (\n\
             \t_invalid orderStatus = 0 // invalid\n\
             \tpending orderStatus = 1000 // queued\n\
             \tdone orderStatus = 2000 // state: [final]\n)\n",
            flags
        )
    }

    #[test]
    fn test_end_to_end_core() {
        let out = render(&with_flags("-statemachine"), RenderProfile::Full);

        assert!(out.starts_with(
            "// Code generated by goenum. DO NOT EDIT.\n// Source: status.go\n\npackage orders\n"
        ));
        assert!(out.contains("type OrderStatus struct {\n\torderStatus\n}\n"));
        assert!(out.contains("var _ enums.Enum[int, OrderStatus] = OrderStatus{}\n"));
        assert!(out.contains(
            "var OrderStatuses = orderStatusContainer{\n\
             \t_invalid: OrderStatus{_invalid},\n\
             \tPending: OrderStatus{pending},\n\
             \tDone: OrderStatus{done},\n}\n"
        ));
        assert!(out.contains(
            "func (t OrderStatus) IsValid() bool {\n\
             \tif t == OrderStatuses._invalid {\n\t\treturn false\n\t}\n\
             \treturn true\n}\n"
        ));
        assert!(out.contains(
            "func (t OrderStatus) TerminalStateSlice() []OrderStatus {\n\
             \treturn []OrderStatus{\n\t\tOrderStatuses.Done,\n\t}\n}\n"
        ));
        assert!(out.contains("\tOrderStatuses.Pending: {\n\t\t\"queued\",\n\t},\n"));
    }

    #[test]
    fn test_preserved_doc_carries_value() {
        let out = render(&with_flags(""), RenderProfile::Full);
        assert!(out.contains(
            "type orderStatusContainer struct {\n\
             \t// invalid (0)\n\
             \t_invalid OrderStatus\n\
             \t// queued (1000)\n\
             \tPending OrderStatus\n\
             \t// state: [final] (2000)\n\
             \tDone OrderStatus\n}\n"
        ));
    }

    #[test]
    fn test_flags_select_blocks() {
        let out = render(&with_flags("-sql -json -statemachine"), RenderProfile::Full);

        assert!(out.contains("func (t *OrderStatus) Scan(value any) error {"));
        assert!(out.contains("func (t OrderStatus) Value() (driver.Value, error) {"));
        assert!(out.contains("func (t OrderStatus) MarshalJSON() ([]byte, error) {"));
        assert!(out.contains("func (t *OrderStatus) UnmarshalJSON(data []byte) error {"));
        assert!(out.contains("func (t OrderStatus) CanTransitionTo(target OrderStatus) bool {"));
        assert!(out.contains("\"database/sql/driver\""));

        assert!(!out.contains("MarshalYAML"));
        assert!(!out.contains("MarshalText"));
        assert!(!out.contains("MarshalBinary"));
        assert!(!out.contains("gopkg.in/yaml.v3"));
    }

    #[test]
    fn test_imports_follow_flags() {
        let plain = render(&with_flags(""), RenderProfile::Full);
        assert!(plain.contains(
            "import (\n\t\"fmt\"\n\t\"github.com/donutnomad/goenum/enums\"\n\t\"iter\"\n)\n"
        ));

        let yaml = render(&with_flags("-yaml -text -binary"), RenderProfile::Full);
        assert!(yaml.contains(
            "import (\n\t\"fmt\"\n\t\"github.com/donutnomad/goenum/enums\"\n\t\"gopkg.in/yaml.v3\"\n\t\"iter\"\n)\n"
        ));
        assert!(yaml.contains("func (t *OrderStatus) UnmarshalYAML(node *yaml.Node) error {"));
        assert!(yaml.contains("func (t OrderStatus) MarshalYAML() (any, error) {"));
        assert!(yaml.contains("// MarshalText implements the encoding.TextMarshaler interface for OrderStatus."));
        assert!(yaml.contains("func (t *OrderStatus) UnmarshalBinary(data []byte) error {"));
    }

    #[test]
    fn test_serde_and_gen_name() {
        let out = render(&with_flags("-serde/name -genName"), RenderProfile::Full);
        assert!(out.contains("\treturn enums.FormatName\n"));
        assert!(out.contains("\tOrderStatusNamePending = \"queued\"\n"));
        assert!(out.contains("\tOrderStatusName_invalid = \"_invalid\"\n"));
    }

    #[test]
    fn test_tag_accessors_are_lexical() {
        let source = "package jobs\n\n// goenums:\ntype jobState int\n\nconst (\n\
                      \t// tag: slow, needs-review\n\tqueued jobState = iota\n\
                      \t// tag: fast\n\trunning\n)\n";
        let out = render(source, RenderProfile::Full);

        let fast = out.find("func (t jobStateContainer) FastSlice() []JobState {").unwrap();
        let review = out.find("func (t jobStateContainer) NeedsReviewSlice() []JobState {").unwrap();
        let slow = out.find("func (t jobStateContainer) SlowSlice() []JobState {").unwrap();
        assert!(fast < review && review < slow);
        assert!(out.contains("func (t JobState) IsNeedsReview() bool {"));
        assert!(out.contains("\t\t\tif tag == \"needs-review\" {\n"));
        assert!(out.contains("var jobstateTagsMap = map[JobState][]string{\n"));
    }

    #[test]
    fn test_aliases_merge_into_first_entry() {
        let source = "package swap\n\n// goenums:\ntype swapStatus int\n\nconst (\n\
                      \t// wait_counterparty_sign\n\twaitSign swapStatus = 2000\n\
                      \t// wait_sender_accept_cancel\n\twaitAccept swapStatus = 2000\n)\n";
        let out = render(source, RenderProfile::Full);
        assert!(out.contains(
            "var swapstatusNamesMap = map[SwapStatus][]string{\n\
             \tSwapStatuses.WaitSign: {\n\
             \t\t\"wait_counterparty_sign\",\n\
             \t\t\"wait_sender_accept_cancel\",\n\
             \t},\n}\n"
        ));
        assert!(out.contains("\t\tSwapStatuses.WaitSign,\n\t\tSwapStatuses.WaitAccept,\n"));
    }

    #[test]
    fn test_minimal_profile_drops_docs() {
        let out = render(&with_flags("-statemachine"), RenderProfile::Minimal);
        assert!(!out.contains("// queued"));
        assert!(!out.contains("implements the Enum interface"));
        assert!(!out.contains("// ====="));
        assert!(out.contains("type orderStatusContainer struct {\n\t_invalid OrderStatus\n\tPending OrderStatus\n"));
        assert!(out.contains("func (t OrderStatus) IsTerminalState() bool {"));
    }

    #[test]
    fn test_output_is_deterministic() {
        let source = with_flags("-sql -json -yaml -statemachine");
        assert_eq!(render(&source, RenderProfile::Full), render(&source, RenderProfile::Full));
    }

    #[test]
    fn test_field_clash_is_an_error() {
        let source = "package p\n\n// goenums:\ntype kind int\n\nconst (\n\tall kind = iota\n\tother\n)\n";
        let err = GoCodeGen::new(RenderProfile::Full).generate(&enum_file(source)).unwrap_err();
        assert!(matches!(err, Error::CodeGen(_)));
    }

    #[test]
    fn test_tag_slice_clashes_with_field() {
        let source = "package p\n\n// goenums:\ntype job int\n\nconst (\n\t// tag: fast\n\tquick job = iota\n\tfastSlice\n)\n";
        let err = GoCodeGen::new(RenderProfile::Full).generate(&enum_file(source)).unwrap_err();
        assert!(matches!(err, Error::CodeGen(ref msg) if msg.contains("`FastSlice`")));
    }

    #[test]
    fn test_uncountable_type_gets_distinct_container() {
        let source = "package p\n\n// goenums:\ntype sheep int\n\nconst (\n\tdolly sheep = iota\n\tshaun\n)\n";
        let out = render(source, RenderProfile::Full);
        assert!(out.contains("type Sheep struct {\n"));
        assert!(out.contains("var SheepValues = sheepContainer{\n"));
        assert!(!out.contains("var Sheep = "));
    }

    #[test]
    fn test_container_named_like_wrapper_is_an_error() {
        let mut file = enum_file("package p\n\n// goenums:\ntype kind int\n\nconst a kind = 1\n");
        file.enums[0].container_name = "Kind".to_string();
        let err = GoCodeGen::new(RenderProfile::Full).generate(&file).unwrap_err();
        assert!(matches!(err, Error::CodeGen(ref msg) if msg.contains("container `Kind`")));

        file.enums[0].container_name = "KindRaw".to_string();
        let err = GoCodeGen::new(RenderProfile::Full).generate(&file).unwrap_err();
        assert!(matches!(err, Error::CodeGen(_)));
    }

    #[test]
    fn test_case_only_different_enums_clash() {
        let source = "package p\n\n// goenums:\ntype fooBar int\n\n// goenums:\ntype foobar int\n\n\
                      const (\n\ta fooBar = iota\n\tb foobar = iota\n)\n";
        let err = GoCodeGen::new(RenderProfile::Full).generate(&enum_file(source)).unwrap_err();
        assert!(matches!(
            err,
            Error::CodeGen(ref msg) if msg.contains("`fooBar` and `foobar` both declare `foobarNamesMap`")
        ));
    }

    #[test]
    fn test_every_invalid_marker_guards_is_valid() {
        let source = "package p\n\n// goenums:\ntype level int\n\nconst (\n\
                      \tunknown level = iota // invalid\n\
                      \tbroken // invalid\n\
                      \tlow\n\
                      \thigh\n)\n";
        let file = enum_file(source);
        assert_eq!(file.enums[0].canonical_invalid().unwrap().ident, "unknown");

        let out = GoCodeGen::new(RenderProfile::Full).generate(&file).unwrap();
        assert!(out.contains(
            "func (t Level) IsValid() bool {\n\
             \tif t == Levels.Unknown {\n\t\treturn false\n\t}\n\
             \tif t == Levels.Broken {\n\t\treturn false\n\t}\n\
             \treturn true\n}\n"
        ));
    }

    #[test]
    fn test_go_quote() {
        assert_eq!(go_quote("plain"), "\"plain\"");
        assert_eq!(go_quote("a\"b\\c\n"), "\"a\\\"b\\\\c\\n\"");
        assert_eq!(go_quote("取消"), "\"取消\"");
    }
}
