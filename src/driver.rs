//! Driver - runs the pipeline for one input file
//!
//! read -> parse -> build model -> emit -> write. The rendered artifact is
//! kept in memory until it is complete and then moved into place, so a
//! failed run never leaves a partial `_enums.go` behind.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use log::{debug, info};

use crate::backend::{CodeGen, EnumFile, GoCodeGen, RenderProfile};
use crate::frontend::parser::parse_source;
use crate::middle::builder::{build, BuildOptions};
use crate::middle::naming::NamingStrategy;
use crate::utils::{Error, Result};

/// Run configuration assembled from the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    pub naming: NamingStrategy,
    pub profile: RenderProfile,
    pub validate_transitions: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            naming: NamingStrategy::Preserve,
            profile: RenderProfile::Full,
            validate_transitions: true,
        }
    }
}

impl Config {
    fn build_options(&self) -> BuildOptions {
        BuildOptions {
            naming: self.naming,
            validate_transitions: self.validate_transitions,
        }
    }
}

/// Parse a source file and build its enum model
pub fn load_model(source: &str, path: &str, config: &Config) -> Result<EnumFile> {
    let file = parse_source(source)?;
    debug!("{}: parsed {} declaration(s)", path, file.decls.len());

    let enums = build(&file, source, path, config.build_options())?;
    Ok(EnumFile {
        package: file.package.name,
        source: path.to_string(),
        enums,
    })
}

/// Render the artifact for a source file.
///
/// Returns `None` when the file declares no annotated types.
pub fn compile_source(source: &str, path: &str, config: &Config) -> Result<Option<String>> {
    let file = load_model(source, path, config)?;
    if file.enums.is_empty() {
        return Ok(None);
    }

    let mut codegen = GoCodeGen::new(config.profile);
    let output = codegen.generate(&file)?;
    info!(
        "{}: rendered {} enum(s) with the {} backend",
        path,
        file.enums.len(),
        codegen.name()
    );
    Ok(Some(output))
}

/// `dir/status.go` -> `dir/status_enums.go`
pub fn output_path(input: &Path, suffix: &str) -> PathBuf {
    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = name.strip_suffix(".go").unwrap_or(&name);
    input.with_file_name(format!("{}{}", stem, suffix))
}

/// Write `contents` through a temporary sibling and rename it over `path`
pub fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let temp = path.with_file_name(format!(".{}.tmp", name));

    let result = fs::write(&temp, contents).and_then(|_| fs::rename(&temp, path));
    if let Err(err) = result {
        let _ = fs::remove_file(&temp);
        return Err(err.into());
    }
    Ok(())
}

fn read_source(input: &Path) -> anyhow::Result<String> {
    fs::read_to_string(input).with_context(|| format!("failed to read {}", input.display()))
}

/// Generate the companion file for `input`.
///
/// Returns the path written, or `None` if there was nothing to generate.
pub fn generate_file(
    input: &Path,
    output: Option<&Path>,
    config: &Config,
) -> anyhow::Result<Option<PathBuf>> {
    let source = read_source(input)?;
    let path = input.display().to_string();

    let Some(rendered) = compile_source(&source, &path, config).map_err(|err| describe(err, &path))?
    else {
        info!("{}: no goenums declarations, nothing to write", path);
        return Ok(None);
    };

    let target = match output {
        Some(output) => output.to_path_buf(),
        None => output_path(input, GoCodeGen::new(config.profile).file_suffix()),
    };
    write_atomic(&target, &rendered)
        .with_context(|| format!("failed to write {}", target.display()))?;
    info!("wrote {}", target.display());
    Ok(Some(target))
}

/// Parse and build `input` without writing anything
pub fn check_file(input: &Path, config: &Config) -> anyhow::Result<EnumFile> {
    let source = read_source(input)?;
    let path = input.display().to_string();
    load_model(&source, &path, config).map_err(|err| describe(err, &path))
}

/// Attach the failing stage and location to a pipeline error
fn describe(err: Error, path: &str) -> anyhow::Error {
    let stage = if err.is_structural() {
        "parse"
    } else {
        "generate enums for"
    };
    let location = match err.span() {
        Some(span) => format!("{}:{}", path, span.line),
        None => path.to_string(),
    };
    anyhow::Error::new(err).context(format!("failed to {} {}", stage, location))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const ORDERS: &str = "package orders

// goenums: -sql -json -statemachine
type orderStatus int

const (
\t_invalid orderStatus = 0 // invalid
\tpending orderStatus = 1000 // queued
\tdone orderStatus = 2000 // state: [final]
)
";

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("goenum-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_output_path() {
        assert_eq!(
            output_path(Path::new("pkg/status.go"), "_enums.go"),
            PathBuf::from("pkg/status_enums.go")
        );
        assert_eq!(output_path(Path::new("status"), "_enums.go"), PathBuf::from("status_enums.go"));
    }

    #[test]
    fn test_compile_source_end_to_end() {
        let out = compile_source(ORDERS, "orders.go", &Config::default()).unwrap().unwrap();

        assert!(out.contains("\t_invalid OrderStatus\n"));
        assert!(out.contains("\tPending OrderStatus\n"));
        assert!(out.contains("\tDone OrderStatus\n"));
        assert_eq!(out.matches(": OrderStatus{").count(), 3);
        assert!(out.contains("func (t *OrderStatus) Scan(value any) error {"));
        assert!(out.contains("func (t OrderStatus) MarshalJSON() ([]byte, error) {"));
        assert!(!out.contains("MarshalYAML"));
    }

    #[test]
    fn test_nothing_to_generate() {
        let out = compile_source("package p\n\ntype plain int\n", "p.go", &Config::default()).unwrap();
        assert!(out.is_none());
    }

    #[test]
    fn test_structural_errors_surface() {
        let err = compile_source("package p\n\nconst (\n\ta = \n", "p.go", &Config::default()).unwrap_err();
        assert!(err.is_structural());
    }

    #[test]
    fn test_unresolved_transitions_by_config() {
        let source = ORDERS.replace("// queued", "// queued\n\t// state: -> shipped");
        let err = compile_source(&source, "orders.go", &Config::default()).unwrap_err();
        assert!(matches!(err, Error::UnknownTransitionTarget { .. }));

        let lenient = Config {
            validate_transitions: false,
            ..Config::default()
        };
        let out = compile_source(&source, "orders.go", &lenient).unwrap().unwrap();
        assert!(out.contains("// unresolved: shipped"));
    }

    #[test]
    fn test_uncountable_type_compiles_to_distinct_names() {
        let source = "package farm\n\n// goenums:\ntype sheep int\n\nconst (\n\tdolly sheep = iota\n\tshaun\n)\n";
        let out = compile_source(source, "farm.go", &Config::default()).unwrap().unwrap();
        assert!(out.contains("type Sheep struct {"));
        assert!(out.contains("var SheepValues = sheepContainer{"));
    }

    #[test]
    fn test_generate_file_writes_sibling() {
        let dir = scratch_dir("write");
        let input = dir.join("orders.go");
        fs::write(&input, ORDERS).unwrap();

        let written = generate_file(&input, None, &Config::default()).unwrap().unwrap();
        assert_eq!(written, dir.join("orders_enums.go"));
        let contents = fs::read_to_string(&written).unwrap();
        assert!(contents.starts_with("// Code generated by goenum. DO NOT EDIT."));
        assert!(!dir.join(".orders_enums.go.tmp").exists());

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_failed_run_leaves_no_artifact() {
        let dir = scratch_dir("fail");
        let input = dir.join("orders.go");
        fs::write(&input, ORDERS.replace("// invalid", "// state: -> nowhere")).unwrap();

        let err = generate_file(&input, None, &Config::default()).unwrap_err();
        assert!(err.to_string().contains("failed to generate enums"));
        assert!(!dir.join("orders_enums.go").exists());

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_missing_input() {
        let err = generate_file(Path::new("/nonexistent/goenum/input.go"), None, &Config::default())
            .unwrap_err();
        assert!(err.to_string().starts_with("failed to read"));
    }

    #[test]
    fn test_check_file_builds_model() {
        let dir = scratch_dir("check");
        let input = dir.join("orders.go");
        fs::write(&input, ORDERS).unwrap();

        let file = check_file(&input, &Config::default()).unwrap();
        assert_eq!(file.package, "orders");
        assert_eq!(file.enums[0].container_name, "OrderStatuses");
        assert!(!dir.join("orders_enums.go").exists());

        fs::remove_dir_all(&dir).unwrap();
    }
}
