//! Command-line driver for the cluster dot product.
//!
//! Usage:
//!   fdotp                         # 2 cores, 4096 random elements
//!   fdotp --cores 4 --len 8192    # custom cluster and size
//!   fdotp --dataset data.json     # fixed input with golden value
//!   fdotp --list-kernels          # show kernel variants

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser};
use tracing_subscriber::EnvFilter;

use cluster_fdotp::cluster::TraceMarker;
use cluster_fdotp::config::{DEFAULT_FPUS_PER_CORE, DEFAULT_NUM_CORES};
use cluster_fdotp::math::dot_product::{available_variants, REFERENCE_VARIANT};
use cluster_fdotp::orchestrator::{run_repeated_with, RepeatedRun};
use cluster_fdotp::prelude::*;
use cluster_fdotp::utils::{tui, HardwareCounter};

#[derive(Parser, Debug)]
#[command(name = "fdotp", version, about = "Double-precision dot product across a core cluster", long_about = None)]
struct Cli {
    /// Number of worker cores
    #[arg(short, long, env = "FDOTP_CORES", default_value_t = DEFAULT_NUM_CORES)]
    cores: usize,

    /// Vector length for generated input
    #[arg(short = 'm', long, default_value_t = 4096)]
    len: usize,

    /// Seed for generated input
    #[arg(short, long, default_value_t = 42)]
    seed: u64,

    /// JSON dataset {"m", "a", "b", "golden_result"} instead of generated input
    #[arg(short, long, conflicts_with_all = ["len", "seed"])]
    dataset: Option<PathBuf>,

    /// Override the golden value
    #[arg(short, long)]
    golden: Option<f64>,

    /// Local kernel variant
    #[arg(short, long, default_value = REFERENCE_VARIANT)]
    kernel: String,

    /// Elements to shift the padded core's slice by
    #[arg(long, default_value_t = 0)]
    padding: usize,

    /// Core whose slice is shifted
    #[arg(long, default_value_t = 1)]
    padded_core: usize,

    /// FPUs per core, for utilization
    #[arg(long, default_value_t = DEFAULT_FPUS_PER_CORE)]
    fpus_per_core: usize,

    /// Scratchpad capacity in KiB
    #[arg(long, default_value_t = 128)]
    scratchpad_kib: usize,

    /// Repeat the run and report cycle statistics
    #[arg(short, long, default_value_t = 1)]
    runs: usize,

    /// Pin each core to its own host CPU
    #[arg(long)]
    pin: bool,

    /// List kernel variants and exit
    #[arg(short, long)]
    list_kernels: bool,

    /// Skip the configuration box
    #[arg(long)]
    no_header: bool,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| level.into()))
        .with_writer(std::io::stderr)
        .with_thread_names(true)
        .init();
}

fn load_dataset(cli: &Cli) -> Result<Dataset> {
    let dataset = match &cli.dataset {
        Some(path) => Dataset::load(path)?,
        None => Dataset::random(cli.len, cli.seed),
    };
    Ok(match cli.golden {
        Some(g) => dataset.with_golden(g),
        None => dataset,
    })
}

fn execute(cli: &Cli) -> Result<RepeatedRun> {
    let config = RunConfig::new(cli.cores)
        .with_fpus_per_core(cli.fpus_per_core)
        .with_padding(cli.padded_core, cli.padding)
        .with_kernel(cli.kernel.clone())
        .with_scratchpad_bytes(cli.scratchpad_kib.saturating_mul(1024))
        .with_pinning(cli.pin);

    // Generated input is only allocated once its length is known to fit
    if cli.dataset.is_none() {
        config.validate(cli.len)?;
    }
    let dataset = load_dataset(cli)?;

    // Fail before the header when the run cannot start
    config.validate(dataset.m())?;

    if !cli.no_header {
        tui::print_header(dataset.m(), &config);
    }

    run_repeated_with(&dataset, &config, cli.runs, &HardwareCounter, &TraceMarker)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if cli.list_kernels {
        tui::print_kernels(&available_variants());
        return ExitCode::SUCCESS;
    }

    match execute(&cli) {
        Ok(repeated) => {
            if let Some(last) = repeated.reports.last() {
                tui::print_report(last);
            }
            if repeated.reports.len() > 1 {
                tui::print_stats(&repeated.stats, repeated.deterministic);
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            match err.report() {
                Some(report) => {
                    tui::print_report(report);
                    println!("Error: {err}");
                }
                None => eprintln!("error: {err}"),
            }
            ExitCode::from(err.exit_code())
        }
    }
}
