//! dcilint CLI - check DCI conventions and export context graphs.

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use dcilint::{lexer, Analyzer, RuleConfig, Severity};
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "dcilint")]
#[command(about = "DCI Context/Role convention checker", long_about = None)]
struct Cli {
    /// Path to a dcilint.toml config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze files and print diagnostics
    Check {
        /// Files or directories to analyze
        #[arg(default_value = ".")]
        paths: Vec<PathBuf>,

        /// Also export vis documents to this directory
        #[arg(long)]
        export_dir: Option<PathBuf>,
    },

    /// Export vis documents without printing diagnostics
    Export {
        /// Files or directories to analyze
        #[arg(default_value = ".")]
        paths: Vec<PathBuf>,

        /// Output directory for the JSON documents
        #[arg(short, long, default_value = "vis-data")]
        out: PathBuf,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(error_count) if error_count > 0 => std::process::exit(1),
        Ok(_) => {}
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(2);
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<usize> {
    let mut config = match &cli.config {
        Some(path) => RuleConfig::load(path),
        None => RuleConfig::load(Path::new("dcilint.toml")),
    };

    let (paths, quiet) = match &cli.command {
        Commands::Check { paths, export_dir } => {
            if export_dir.is_some() {
                config.vis_data_dir = export_dir.clone();
            }
            (paths.clone(), false)
        }
        Commands::Export { paths, out } => {
            config.vis_data_dir = Some(out.clone());
            (paths.clone(), true)
        }
    };

    let analyzer = Analyzer::with_config(config)?;

    let mut error_count = 0;
    let mut warning_count = 0;

    for file in collect_files(&paths) {
        let source = std::fs::read_to_string(&file)
            .with_context(|| format!("reading {}", file.display()))?;
        let stream = lexer::lex(&source);
        let report = analyzer.analyze(&stream)?;

        for diagnostic in &report.diagnostics {
            match diagnostic.severity {
                Severity::Error => error_count += 1,
                Severity::Warning => warning_count += 1,
            }
            if !quiet {
                let severity = match diagnostic.severity {
                    Severity::Error => "error",
                    Severity::Warning => "warning",
                };
                println!(
                    "{}:{} {} {} {}",
                    file.display(),
                    stream.line_of(diagnostic.pos),
                    severity,
                    diagnostic.code,
                    diagnostic.message
                );
            }
        }
    }

    if !quiet {
        println!("{} error(s), {} warning(s)", error_count, warning_count);
    }

    Ok(error_count)
}

/// Collect analyzable files from the given paths, respecting .gitignore.
fn collect_files(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for path in paths {
        if path.is_file() {
            files.push(path.clone());
            continue;
        }
        for entry in WalkBuilder::new(path)
            .hidden(true)
            .git_ignore(true)
            .build()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_some_and(|ft| ft.is_file()))
        {
            let p = entry.into_path();
            if p.extension().is_some_and(|ext| ext == "php") {
                files.push(p);
            }
        }
    }

    files.sort();
    files
}
