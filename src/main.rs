//! polyextract Command Line Interface
//!
//! Usage:
//!   polyextract [OPTIONS] <input-file>
//!   polyextract --help
//!
//! Examples:
//!   polyextract solve.c                          # Text listing of every function
//!   polyextract --emit=json -o solve.json solve.c
//!   polyextract --function=forward_solve solve.c
//!   polyextract --invariant=rowptr,col spmv.c    # Arrays no statement may write
//!   polyextract --emit=ast solve.c               # Just parse and dump the tree
//!
//! Exit status is 2 when the builder produced an inconsistent model and 1 on
//! any other failure.

use clap::{Parser, ValueEnum};
use polyextract::analysis::{BuilderConfig, ComputationBuilder, ConditionDeclPolicy, ElseBranchPolicy};
use polyextract::polyhedral::ScalarPolicy;
use polyextract::utils::errors::PolyExtractError;
use polyextract::utils::poly_print::{computations_to_json, print_computations};
use std::path::PathBuf;
use std::fs;
use anyhow::{anyhow, bail, Result, Context};
use log::{info, debug};

/// polyextract - Polyhedral model extraction for affine loop nests
#[derive(Parser, Debug)]
#[command(name = "polyextract")]
#[command(version)]
#[command(about = "Extracts iteration spaces, schedules and access relations from C loop nests", long_about = None)]
struct Cli {
    /// Input C file
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Output file (defaults to stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// What to emit
    #[arg(long, default_value = "text")]
    emit: EmitKind,

    /// Only build the named function
    #[arg(long, value_name = "NAME")]
    function: Option<String>,

    /// Reject else branches instead of inverting their predicate
    #[arg(long)]
    no_else: bool,

    /// Emit `if (int x = ...; cond)` declarations as statements before the branch
    #[arg(long)]
    hoist_condition_decls: bool,

    /// Record array accesses only
    #[arg(long)]
    ignore_scalars: bool,

    /// Accept `!=` loop conditions and branch predicates
    #[arg(long)]
    allow_not_equal: bool,

    /// Data spaces that no statement may write (comma-separated, repeatable)
    #[arg(long, value_name = "A,B", value_delimiter = ',', num_args = 1..)]
    invariant: Vec<String>,

    /// Named constant used when checking loop increments (repeatable)
    #[arg(long, value_name = "NAME=VALUE", value_parser = parse_constant)]
    constant: Vec<(String, i64)>,

    /// Verbose output (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode (suppress warnings)
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum EmitKind {
    /// Indented text listing
    Text,
    /// JSON with canonical set and relation strings
    Json,
    /// Statement tree
    Ast,
}

fn parse_constant(arg: &str) -> Result<(String, i64)> {
    let (name, value) = arg
        .split_once('=')
        .ok_or_else(|| anyhow!("expected NAME=VALUE, got '{}'", arg))?;
    let value = value
        .trim()
        .parse::<i64>()
        .with_context(|| format!("invalid value for constant '{}'", name))?;
    Ok((name.trim().to_string(), value))
}

fn main() {
    let cli = Cli::parse();
    init_logging(&cli);

    if let Err(e) = run(&cli) {
        eprintln!("error: {:#}", e);
        let code = if PolyExtractError::from_anyhow(e).is_internal() { 2 } else { 1 };
        std::process::exit(code);
    }
}

fn init_logging(cli: &Cli) {
    let log_level = if cli.quiet {
        log::LevelFilter::Error
    } else {
        match cli.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .format_timestamp(None)
        .init();
}

fn run(cli: &Cli) -> Result<()> {
    info!("polyextract v{}", polyextract::VERSION);
    debug!("Input file: {:?}", cli.input);

    let source = fs::read_to_string(&cli.input)
        .with_context(|| format!("Failed to read input file: {:?}", cli.input))?;

    info!("Parsing...");
    let mut program = polyextract::parse(&source)
        .with_context(|| "Failed to parse input")?;

    if let Some(name) = &cli.function {
        if program.find_function(name).is_none() {
            bail!("No function named '{}' in {:?}", name, cli.input);
        }
        program.functions.retain(|f| &f.name == name);
    }

    if matches!(cli.emit, EmitKind::Ast) {
        let output = format!("{:#?}", program);
        write_output(&cli.output, &output)?;
        return Ok(());
    }

    let config = build_config(cli);
    debug!("Builder config: {:?}", config);

    info!("Building {} computation(s)...", program.functions.len());
    let builder = ComputationBuilder::new(config);
    let computations = program
        .functions
        .iter()
        .map(|function| {
            builder
                .build(function)
                .with_context(|| format!("Failed to build computation for '{}'", function.name))
        })
        .collect::<Result<Vec<_>>>()?;

    let output = match cli.emit {
        EmitKind::Json => computations_to_json(&computations)
            .context("Failed to serialize computations")?,
        _ => print_computations(&computations),
    };
    write_output(&cli.output, &output)?;
    info!("Done.");

    Ok(())
}

fn build_config(cli: &Cli) -> BuilderConfig {
    let mut config = BuilderConfig::default();

    if cli.no_else {
        config = config.else_branches(ElseBranchPolicy::Reject);
    }
    if cli.hoist_condition_decls {
        config = config.condition_decls(ConditionDeclPolicy::Hoist);
    }
    if cli.ignore_scalars {
        config = config.scalars(ScalarPolicy::Ignore);
    }
    if !cli.invariant.is_empty() {
        config = config.invariant(cli.invariant.iter().map(|s| s.trim().to_string()));
    }
    for (name, value) in &cli.constant {
        config = config.constant(name.clone(), *value);
    }

    config.allow_not_equal(cli.allow_not_equal)
}

fn write_output(path: &Option<PathBuf>, content: &str) -> Result<()> {
    match path {
        Some(p) => {
            fs::write(p, content)
                .with_context(|| format!("Failed to write output file: {:?}", p))?;
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
