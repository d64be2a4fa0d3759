//! goenum
//!
//! Generates rich enum implementations for annotated Go const blocks.

mod frontend;
mod middle;
mod backend;
mod utils;
mod driver;

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process;

use backend::RenderProfile;
use driver::Config;
use middle::naming::NamingStrategy;

/// goenum - declarative enums for Go
#[derive(Parser, Debug)]
#[command(name = "goenum")]
#[command(version)]
#[command(about = "Generate <stem>_enums.go for Go types annotated with `goenums:`")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Input Go source file
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,

    /// Output file (defaults to <stem>_enums.go next to the input)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// How container names are derived from type names
    #[arg(long, value_enum, default_value_t = NamingStrategy::Preserve)]
    naming: NamingStrategy,

    /// How much documentation the generated file carries
    #[arg(long, value_enum, default_value_t = RenderProfile::Full)]
    profile: RenderProfile,

    /// Keep transitions to undeclared states instead of failing
    #[arg(long)]
    allow_unresolved_transitions: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Parse and validate a file without writing anything
    Check {
        /// Input Go source file
        input: PathBuf,
    },
    /// Print the normalized enum model as JSON
    Model {
        /// Input Go source file
        input: PathBuf,
    },
}

impl Cli {
    fn config(&self) -> Config {
        Config {
            naming: self.naming,
            profile: self.profile,
            validate_transitions: !self.allow_unresolved_transitions,
        }
    }
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    let config = cli.config();

    let result = match &cli.command {
        Some(Commands::Check { input }) => check_file(input, &config),
        Some(Commands::Model { input }) => print_model(input, &config),
        None => {
            let Some(input) = cli.input.as_deref() else {
                eprintln!("Error: No input file specified");
                eprintln!("Usage: goenum [OPTIONS] <FILE>");
                process::exit(1);
            };
            generate(input, cli.output.as_deref(), &config)
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

/// Generate the companion file
fn generate(input: &Path, output: Option<&Path>, config: &Config) -> anyhow::Result<()> {
    match driver::generate_file(input, output, config)? {
        Some(path) => println!("Generated: {}", path.display()),
        None => println!("No goenums declarations in {}", input.display()),
    }
    Ok(())
}

/// Check a source file for errors without generating code
fn check_file(input: &Path, config: &Config) -> anyhow::Result<()> {
    println!("Checking: {}", input.display());

    let file = driver::check_file(input, config)?;
    for decl in &file.enums {
        let tags: Vec<&str> = decl.all_tags.iter().map(String::as_str).collect();
        println!(
            "  {} ({} over {}): {} variant(s), container {}{}",
            decl.name,
            decl.type_ident,
            decl.base_type,
            decl.variants.len(),
            decl.container_name,
            if tags.is_empty() {
                String::new()
            } else {
                format!(", tags: {}", tags.join(", "))
            }
        );
        if let Some(invalid) = decl.canonical_invalid() {
            println!("    invalid: {} = {}", invalid.ident, invalid.value);
        }
        if decl.options.state_machine {
            let terminal: Vec<&str> = decl.terminal_variants().map(|v| v.ident.as_str()).collect();
            println!("    final states: {}", terminal.join(", "));
        }
        for tag in &tags {
            println!("    #{}: {} variant(s)", tag, decl.variants_tagged(tag).len());
        }
    }

    println!("✅ No errors found");
    Ok(())
}

/// Print the normalized model
fn print_model(input: &Path, config: &Config) -> anyhow::Result<()> {
    let file = driver::check_file(input, config)?;
    println!("{}", serde_json::to_string_pretty(&file.enums)?);
    Ok(())
}
