//! s2spice - convert Spectre/CDL netlists to ngspice syntax

#[cfg(feature = "cli")]
use clap::{Parser, ValueEnum};
#[cfg(feature = "cli")]
use std::path::PathBuf;
#[cfg(feature = "cli")]
use spicebridge::{convert_path, ConversionReport, Dialect, FileStatus, S2SOptions, Transpiler};

#[cfg(feature = "cli")]
#[derive(Parser)]
#[command(name = "s2spice")]
#[command(version)]
#[command(about = "Convert Spectre/CDL netlists to ngspice syntax", long_about = None)]
struct Cli {
    /// Netlist file, or a directory of netlists
    input: PathBuf,

    /// Output file or directory (default: in place / <input>_spice)
    output: Option<PathBuf>,

    /// Trace every classification decision
    #[arg(short, long)]
    verbose: bool,

    /// Dialect the input starts in
    #[arg(short, long, value_enum, default_value_t = DialectArg::Auto)]
    dialect: DialectArg,

    /// TOML file overriding the conversion tables
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write a JSON conversion report to this path
    #[arg(long)]
    report: Option<PathBuf>,
}

#[cfg(feature = "cli")]
#[derive(Clone, ValueEnum)]
enum DialectArg {
    /// Pick by file extension (.cdl, .sp, .spi, .spice, .cir are SPICE)
    Auto,
    Spectre,
    Spice,
}

#[cfg(feature = "cli")]
fn init_logging(verbose: bool) {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    };
    let _ = env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp(None)
        .parse_default_env()
        .try_init();
}

#[cfg(feature = "cli")]
fn print_summary(report: &ConversionReport) {
    for file in &report.files {
        match file.status {
            FileStatus::Converted => {
                for warning in &file.warnings {
                    match warning.line {
                        Some(line) => log::warn!("{}:{}: {}", file.source, line, warning.message),
                        None => log::warn!("{}: {}", file.source, warning.message),
                    }
                }
                eprintln!("✓ {}", file.output.as_deref().unwrap_or(&file.source));
            }
            FileStatus::Skipped => eprintln!("- {} (skipped)", file.source),
            FileStatus::Failed => eprintln!(
                "✗ {} - {}",
                file.source,
                file.error.as_deref().unwrap_or("conversion failed")
            ),
        }
    }
}

#[cfg(feature = "cli")]
fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut options = match &cli.config {
        Some(path) => match S2SOptions::load(path) {
            Ok(options) => options,
            Err(e) => {
                eprintln!("✗ {}", e);
                std::process::exit(1);
            }
        },
        None => S2SOptions::default(),
    };
    match cli.dialect {
        DialectArg::Auto => {}
        DialectArg::Spectre => options.dialect = Some(Dialect::Spectre),
        DialectArg::Spice => options.dialect = Some(Dialect::Spice),
    }

    let transpiler = Transpiler::new(options);
    let report = match convert_path(&transpiler, &cli.input, cli.output.as_deref()) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("✗ {}", e);
            std::process::exit(1);
        }
    };

    print_summary(&report);
    if cli.input.is_dir() {
        eprintln!(
            "\nBatch conversion complete: {} converted, {} skipped, {} failed ({} warning(s))",
            report.count(FileStatus::Converted),
            report.count(FileStatus::Skipped),
            report.count(FileStatus::Failed),
            report.warning_count()
        );
    }

    if let Some(path) = &cli.report {
        if let Err(e) = report.write_json(path) {
            eprintln!("✗ {}", e);
            std::process::exit(1);
        }
    }

    if report.has_failures() {
        std::process::exit(1);
    }
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI feature not enabled. Build with --features cli");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  cargo install spicebridge --features cli");
    eprintln!("  s2spice [OPTIONS] <INPUT> [OUTPUT]");
}
