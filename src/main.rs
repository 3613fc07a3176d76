use clap::{ArgAction, Parser};
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info, warn};
use pdu::{DiskUsage, DuOptions, LocalFilesystem};
use std::io;
use std::path::PathBuf;
use std::process;
use std::time::Duration;

#[derive(Debug, Parser)]
#[clap(name = "pdu", version, disable_help_flag = true)]
struct Parameters {
    #[clap(
        short = 'j',
        long = "jobs",
        default_value_t = 1,
        help = "Number of worker threads"
    )]
    jobs: usize,

    #[clap(
        short = 'h',
        long = "human-readable",
        help = "Print sizes in powers of 1024 (e.g., 1.5Mi)"
    )]
    human_readable: bool,

    #[clap(
        long = "exclude",
        value_name = "GLOB",
        help = "Skip entries whose name matches GLOB (may be repeated)"
    )]
    exclude: Vec<String>,

    #[clap(long = "progress", help = "Show progress while walking")]
    show_progress: bool,

    #[clap(
        long = "log-level",
        help = "Set the log level (e.g., info, debug, trace)"
    )]
    log_level: Option<String>,

    #[clap(long = "help", action = ArgAction::Help, help = "Print help")]
    help: Option<bool>,

    #[clap(value_parser, default_value = ".")]
    paths: Vec<PathBuf>,
}

fn get_parallelism(arguments: &Parameters) -> usize {
    if arguments.jobs == 0 {
        error!("Number of jobs must be at least 1.");
        process::exit(1);
    }
    let available_parallelism = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    if arguments.jobs > available_parallelism {
        warn!("Requested jobs is greater than available processors.");
    }
    arguments.jobs
}

fn new_progress_bar(show_progress: bool) -> ProgressBar {
    if !show_progress {
        return ProgressBar::hidden();
    }
    let progress_bar = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {pos} directories [{elapsed}]") {
        progress_bar.set_style(style);
    }
    progress_bar.enable_steady_tick(Duration::from_millis(100));
    progress_bar
}

fn main() {
    let arguments = Parameters::parse();

    // Command-line log level wins over RUST_LOG
    let mut logger = env_logger::Builder::from_default_env();
    if let Some(log_level) = &arguments.log_level {
        logger.parse_filters(log_level);
    }
    logger.init();

    info!("Starting pdu");
    let options = DuOptions {
        workers: get_parallelism(&arguments),
        human_readable: arguments.human_readable,
        exclude: arguments.exclude.clone(),
    };

    // Roots come off a stack, so push them backwards to report in argument order
    let usage = DiskUsage::with_roots(options, arguments.paths.iter().rev().cloned())
        .progress(new_progress_bar(arguments.show_progress));

    match usage.run(&LocalFilesystem, io::stdout()) {
        Err(err) => {
            eprintln!("pdu: {}", err);
            process::exit(1);
        }
        Ok(summary) => {
            info!("Done with {} error(s)", summary.errors_total());
            process::exit(summary.exit_code());
        }
    }
}
