//! MiniCS Compiler
//!
//! Semantic checker and stack-machine code generator for MiniCS programs.
//! The syntax tree arrives as JSON from an external parser.

mod feedback;
mod frontend;
mod middle;
mod stdlib;
mod types;
mod utils;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use feedback::CompilationReport;
use frontend::ast::Program;
use frontend::semantic::{check_program, Analysis, CheckerConfig};
use middle::ir_gen::generate_checked;
use middle::ir_printer::print_ir;

/// MiniCS Compiler
#[derive(Parser, Debug)]
#[command(name = "minicsc")]
#[command(author = "Z1529")]
#[command(version = "0.1.0")]
#[command(about = "MiniCS compiler - semantic checker and stack-machine code generator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check a syntax tree for errors
    Check {
        /// Syntax tree (.json)
        input: PathBuf,

        #[command(flatten)]
        options: Options,
    },
    /// Check a syntax tree and generate its IR listing
    Build {
        /// Syntax tree (.json)
        input: PathBuf,

        /// Where the IR listing goes (stdout otherwise)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        #[command(flatten)]
        options: Options,
    },
    /// Print version information
    Version,
}

#[derive(Args, Debug)]
struct Options {
    /// Name of the entry method
    #[arg(long, value_name = "NAME", default_value = "Main")]
    entry: String,

    /// Emit a JSON compilation report instead of text
    #[arg(long)]
    json: bool,

    /// Print every symbol ever declared
    #[arg(long)]
    dump_symbols: bool,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let status = match &cli.command {
        Commands::Check { input, options } => check_file(input, options),
        Commands::Build {
            input,
            output,
            options,
        } => build_file(input, output.as_deref(), options),
        Commands::Version => {
            println!("minicsc 0.1.0");
            println!("MiniCS Compiler");
            println!("License: Apache-2.0");
            Ok(0)
        }
    };

    match status {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {:#}", e);
            process::exit(2);
        }
    }
}

fn load_program(input: &Path) -> Result<Program> {
    let source = fs::read_to_string(input)
        .with_context(|| format!("failed to read {}", input.display()))?;
    let mut program: Program = serde_json::from_str(&source)
        .with_context(|| format!("{} is not a valid MiniCS syntax tree", input.display()))?;
    program.assign_ids();
    log::info!(
        "loaded program '{}' ({} top-level items)",
        program.name.name,
        program.items.len()
    );
    Ok(program)
}

fn analyze(program: &Program, options: &Options) -> Analysis {
    let config = CheckerConfig {
        entry_point: options.entry.clone(),
    };
    let analysis = check_program(program, config);
    log::info!("semantic analysis finished with {} error(s)", analysis.errors.len());
    analysis
}

/// Print the report; returns the exit status
fn emit_report(report: &CompilationReport, options: &Options) -> i32 {
    if options.json {
        println!("{}", report.to_json());
    } else if report.success {
        print!("{}", report.render_text());
    } else {
        eprint!("{}", report.render_text());
    }
    if report.success {
        0
    } else {
        1
    }
}

fn check_file(input: &Path, options: &Options) -> Result<i32> {
    let program = load_program(input)?;
    let analysis = analyze(&program, options);
    if options.dump_symbols && !options.json {
        print!("{}", analysis.symbols.dump());
    }

    let report = CompilationReport::from_analysis(&input.to_string_lossy(), &options.entry, &analysis);
    Ok(emit_report(&report, options))
}

fn build_file(input: &Path, output: Option<&Path>, options: &Options) -> Result<i32> {
    let program = load_program(input)?;
    let analysis = analyze(&program, options);
    if options.dump_symbols && !options.json {
        print!("{}", analysis.symbols.dump());
    }

    let report = CompilationReport::from_analysis(&input.to_string_lossy(), &options.entry, &analysis);
    let module = match generate_checked(&program, analysis, &options.entry) {
        Ok(module) => module,
        // The report already lists the checker's diagnostics
        Err(_) if !report.success => return Ok(emit_report(&report, options)),
        Err(errors) => {
            let report = errors.iter().fold(report, |report, e| report.with_failure(e));
            return Ok(emit_report(&report, options));
        }
    };
    let report = report.with_module(&module);
    let listing = print_ir(&module);

    match output {
        Some(path) => {
            fs::write(path, &listing).with_context(|| format!("failed to write {}", path.display()))?;
            log::info!("IR listing written to {}", path.display());
        }
        // JSON mode keeps stdout for the report
        None if options.json => {}
        None => print!("{}", listing),
    }
    Ok(emit_report(&report, options))
}
