//! Command line parsing.

use std::ffi::OsString;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};

use crate::{config::BenchConfig, logging::LOG_LEVELS, verify::Tolerance};

/// Parsed command line.
#[derive(Debug, Clone, PartialEq)]
pub struct Cli {
    pub config: BenchConfig,
    pub log_level: String,
    /// Print the device inventory and exit.
    pub list_devices: bool,
}

fn command() -> Command {
    Command::new("clmatbench")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Benchmark tiled OpenCL matrix multiplication against CPU baselines")
        .arg(dim_arg("n", "Rows of the first operand and of the result"))
        .arg(dim_arg("l", "Shared inner dimension"))
        .arg(dim_arg("m", "Columns of the second operand and of the result"))
        .arg(
            Arg::new("tile-size")
                .long("tile-size")
                .help("Kernel tile size, passed as -D TILE_SIZE")
                .value_name("TS")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("work-per-thread")
                .long("work-per-thread")
                .help("Rows computed per work-item, passed as -D WORK_PER_THREAD")
                .value_name("WPT")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("kernel")
                .short('k')
                .long("kernel")
                .help("Path to the OpenCL C kernel source")
                .value_name("PATH"),
        )
        .arg(
            Arg::new("kernel-name")
                .long("kernel-name")
                .help("Kernel entry point")
                .value_name("NAME"),
        )
        .arg(
            Arg::new("seed")
                .long("seed")
                .help("Seed for the operand generator")
                .value_name("NUMBER")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("tolerance")
                .long("tolerance")
                .help("Absolute tolerance per cell; 0 requires exact equality")
                .value_name("ABS"),
        )
        .arg(
            Arg::new("skip-parallel")
                .long("skip-parallel")
                .help("Skip the rayon baseline")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("skip-naive")
                .long("skip-naive")
                .help("Skip the naive triple-loop baseline")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("list-devices")
                .long("list-devices")
                .help("Print platforms and devices, then exit")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("debug")
                .long("debug")
                .help("Enable debug logging")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .help("Logging level")
                .value_name("LEVEL")
                .value_parser(LOG_LEVELS)
                .default_value("info"),
        )
}

fn dim_arg(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name)
        .long(name)
        .help(help)
        .value_name("SIZE")
        .value_parser(clap::value_parser!(usize))
}

/// Parses the process arguments. `--help`, `--version` and malformed flags
/// are handled by clap, which prints and exits.
pub fn parse_args() -> Result<Cli> {
    from_matches(&command().get_matches())
}

pub fn parse_args_from<I, T>(args: I) -> Result<Cli>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let matches = command().try_get_matches_from(args)?;
    from_matches(&matches)
}

fn from_matches(matches: &ArgMatches) -> Result<Cli> {
    let mut config = BenchConfig::default();

    if let Some(&n) = matches.get_one::<usize>("n") {
        config.n = n;
    }
    if let Some(&l) = matches.get_one::<usize>("l") {
        config.l = l;
    }
    if let Some(&m) = matches.get_one::<usize>("m") {
        config.m = m;
    }
    if let Some(&ts) = matches.get_one::<usize>("tile-size") {
        config.tile_size = ts;
    }
    if let Some(&wpt) = matches.get_one::<usize>("work-per-thread") {
        config.work_per_thread = wpt;
    }
    if let Some(path) = matches.get_one::<String>("kernel") {
        config.kernel_path = PathBuf::from(path);
    }
    if let Some(name) = matches.get_one::<String>("kernel-name") {
        config.kernel_name = name.clone();
    }
    config.seed = matches.get_one::<u64>("seed").copied();

    if let Some(tolerance) = matches.get_one::<String>("tolerance") {
        let abs: f32 = tolerance.parse().context("Invalid tolerance value")?;
        config.tolerance = if abs == 0.0 {
            Tolerance::exact()
        } else {
            Tolerance {
                abs,
                ..Tolerance::default()
            }
        };
    }

    config.skip_parallel = matches.get_flag("skip-parallel");
    config.skip_naive = matches.get_flag("skip-naive");

    let log_level = if matches.get_flag("debug") {
        "debug".to_string()
    } else {
        matches
            .get_one::<String>("log-level")
            .cloned()
            .ok_or_else(|| anyhow!("missing log level"))?
    };

    Ok(Cli {
        config,
        log_level,
        list_devices: matches.get_flag("list-devices"),
    })
}
