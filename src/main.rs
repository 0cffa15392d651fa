use std::process::ExitCode;

use tracing::error;

use clmatbench::{cli, logging};

fn main() -> ExitCode {
    let cli = match cli::parse_args() {
        Ok(cli) => cli,
        Err(e) => {
            eprintln!("Error: {e:#}");
            return failure();
        }
    };

    if let Err(e) = logging::setup_logging(&cli.log_level) {
        eprintln!("Error: {e}");
        return failure();
    }

    match execute(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            failure()
        }
    }
}

/// Exit status for every failure class (-1 as an unsigned byte).
fn failure() -> ExitCode {
    ExitCode::from(255)
}

#[cfg(feature = "opencl")]
fn execute(cli: &cli::Cli) -> clmatbench::Result<()> {
    use clmatbench::{bench, device::opencl::Inventory};

    if cli.list_devices {
        println!("{}", Inventory::scan()?.render());
        return Ok(());
    }

    let report = bench::run(&cli.config)?;
    println!("{report}");
    match report.failure() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

#[cfg(not(feature = "opencl"))]
fn execute(_cli: &cli::Cli) -> clmatbench::Result<()> {
    Err(clmatbench::error::invalid_config(
        "built without the `opencl` feature; no compute device available",
    ))
}
