//! Command-line interface for Strawberry.
//!
//! # Usage
//!
//! ```bash
//! # Check GraphQL files for errors
//! strawberry check schema.graphql queries/*.graphql
//!
//! # Report operation depths
//! strawberry depth query.graphql --max-depth 5 --ignore pageInfo
//!
//! # Normalize a schema
//! strawberry export-schema schema.graphql --output schema.out.graphql
//!
//! # Serve a schema with GraphiQL (requires the `debug-server` feature)
//! strawberry server schema.graphql --port 8000
//! ```

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use colored::Colorize;
use rayon::prelude::*;
use regex::Regex;
use strawberry::validation::{default_rules, validate, DepthLimitValidator, IgnoreRule};
use strawberry::Schema;
use strawberry_core::{Diagnostic, Interner};
use strawberry_syntax::parse;

#[derive(Parser, Debug)]
#[command(name = "strawberry")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check GraphQL files for errors
    Check {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Print the depth of every operation in a file
    Depth {
        file: PathBuf,

        /// Maximum allowed depth
        #[arg(long)]
        max_depth: usize,

        /// Field names excluded from the count
        #[arg(long = "ignore")]
        ignore: Vec<String>,

        /// Field name patterns excluded from the count
        #[arg(long = "ignore-pattern")]
        ignore_pattern: Vec<String>,
    },

    /// Print a schema as normalized SDL
    ExportSchema {
        /// Schema file path
        schema: PathBuf,

        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Serve a schema with GraphiQL
    Server {
        /// Schema file path
        schema: PathBuf,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to listen on
        #[arg(short, long, default_value = "8000")]
        port: u16,

        /// GraphQL endpoint path
        #[arg(long, default_value = "/graphql")]
        path: String,
    },

    /// Print version information
    Version,
}

/// Runs a command, returning the process exit code.
pub async fn run(cli: Cli) -> Result<i32, Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Check { files } => check_files(&files, cli.verbose, cli.quiet),
        Commands::Depth {
            file,
            max_depth,
            ignore,
            ignore_pattern,
        } => {
            let rule = depth_rule(max_depth, ignore, &ignore_pattern)?;
            print_depths(&file, &rule)
        }
        Commands::ExportSchema { schema, output } => export_schema(&schema, output.as_deref()),
        Commands::Server {
            schema,
            host,
            port,
            path,
        } => serve(&schema, host, port, path).await,
        Commands::Version => {
            println!("strawberry {}", env!("CARGO_PKG_VERSION"));
            Ok(0)
        }
    }
}

/// Problems found in one file.
#[derive(Debug)]
pub struct FileReport {
    pub path: PathBuf,
    pub source: String,
    pub diagnostics: Vec<Diagnostic>,
    /// Schema errors, which carry no span.
    pub schema_errors: Vec<String>,
}

impl FileReport {
    pub fn is_ok(&self) -> bool {
        self.diagnostics.is_empty() && self.schema_errors.is_empty()
    }
}

/// Checks one document.
///
/// Documents with operations or fragments run the executable rules; pure
/// type system documents are built into a schema instead.
pub fn check_source(path: PathBuf, source: String) -> FileReport {
    let mut schema_errors = Vec::new();
    let diagnostics = {
        let interner = Interner::new();
        let result = parse(&source, &interner);
        let mut diagnostics: Vec<Diagnostic> = result.diagnostics.errors().cloned().collect();

        if diagnostics.is_empty() {
            let document = &result.document;
            let executable =
                document.operations().next().is_some() || document.fragments().next().is_some();
            if executable {
                diagnostics.extend(validate(document, &interner, &default_rules()));
            } else if let Err(err) = Schema::from_sdl(&source) {
                schema_errors.push(err.to_string());
            }
        }
        diagnostics
    };

    FileReport {
        path,
        source,
        diagnostics,
        schema_errors,
    }
}

fn check_files(
    files: &[PathBuf],
    verbose: bool,
    quiet: bool,
) -> Result<i32, Box<dyn std::error::Error>> {
    let reports: Vec<FileReport> = files
        .par_iter()
        .map(|file| {
            std::fs::read_to_string(file).map(|source| check_source(file.clone(), source))
        })
        .collect::<Result<_, _>>()?;

    let mut has_errors = false;
    for report in &reports {
        if report.is_ok() {
            if verbose {
                println!("{} {}", "OK".green(), report.path.display());
            }
            continue;
        }
        has_errors = true;
        eprintln!("{} {}", "Error".red().bold(), report.path.display());
        render_diagnostics(&report.path, &report.source, &report.diagnostics);
        for message in &report.schema_errors {
            eprintln!("  {} {}", "-->".blue(), message);
        }
    }

    if has_errors {
        Ok(1)
    } else {
        if !quiet {
            println!(
                "{} {} file(s) checked",
                "Success:".green().bold(),
                reports.len()
            );
        }
        Ok(0)
    }
}

fn render_diagnostics(path: &Path, source: &str, diagnostics: &[Diagnostic]) {
    for diagnostic in diagnostics {
        let report = miette::Report::new(diagnostic.to_miette()).with_source_code(
            miette::NamedSource::new(path.display().to_string(), source.to_string()),
        );
        eprintln!("{report:?}");
    }
}

/// Builds the depth rule from command-line flags.
pub fn depth_rule(
    max_depth: usize,
    ignore: Vec<String>,
    ignore_pattern: &[String],
) -> Result<DepthLimitValidator, regex::Error> {
    let mut rule = DepthLimitValidator::new(max_depth);
    for name in ignore {
        rule = rule.ignore(name);
    }
    for pattern in ignore_pattern {
        rule = rule.ignore(IgnoreRule::Pattern(Regex::new(pattern)?));
    }
    Ok(rule)
}

/// Measures every operation, returning `(name, depth)` pairs and the
/// diagnostics for syntax errors and operations over the limit.
pub fn measure_depths(
    source: &str,
    rule: &DepthLimitValidator,
) -> (Vec<(String, usize)>, Vec<Diagnostic>) {
    let interner = Interner::new();
    let result = parse(source, &interner);
    if result.has_errors() {
        return (Vec::new(), result.diagnostics.into_vec());
    }
    let (depths, diagnostics) = rule.measure(&result.document, &interner);
    (depths.into_iter().collect(), diagnostics.into_vec())
}

fn print_depths(file: &Path, rule: &DepthLimitValidator) -> Result<i32, Box<dyn std::error::Error>> {
    let source = std::fs::read_to_string(file)?;
    let (depths, diagnostics) = measure_depths(&source, rule);

    for (name, depth) in &depths {
        let depth_text = if *depth > rule.max_depth() {
            depth.to_string().red().bold()
        } else {
            depth.to_string().green()
        };
        println!("{name}: {depth_text}");
    }
    tracing::debug!(operations = depths.len(), max_depth = rule.max_depth(), "depth check done");

    if diagnostics.is_empty() {
        Ok(0)
    } else {
        render_diagnostics(file, &source, &diagnostics);
        Ok(1)
    }
}

fn export_schema(schema: &Path, output: Option<&Path>) -> Result<i32, Box<dyn std::error::Error>> {
    let source = std::fs::read_to_string(schema)?;
    let sdl = match Schema::from_sdl(&source) {
        Ok(schema) => schema.to_sdl(),
        Err(err) => {
            eprintln!("{} {}", "Error:".red().bold(), err);
            return Ok(1);
        }
    };

    match output {
        Some(path) => {
            std::fs::write(path, format!("{sdl}\n"))?;
            println!("{} {}", "Wrote".green(), path.display());
        }
        None => println!("{sdl}"),
    }
    Ok(0)
}

#[cfg(feature = "debug-server")]
async fn serve(
    schema: &Path,
    host: String,
    port: u16,
    path: String,
) -> Result<i32, Box<dyn std::error::Error>> {
    use strawberry::server::{DebugServer, ServerConfig};

    let source = std::fs::read_to_string(schema)?;
    let schema = match Schema::from_sdl(&source) {
        Ok(schema) => schema,
        Err(err) => {
            eprintln!("{} {}", "Error:".red().bold(), err);
            return Ok(1);
        }
    };
    let config = ServerConfig::new().host(host).port(port).path(path);
    DebugServer::new(schema).config(config).listen().await?;
    Ok(0)
}

#[cfg(not(feature = "debug-server"))]
async fn serve(
    _schema: &Path,
    _host: String,
    _port: u16,
    _path: String,
) -> Result<i32, Box<dyn std::error::Error>> {
    eprintln!(
        "{} the server command requires the `debug-server` feature",
        "Error:".red().bold()
    );
    Ok(1)
}
