use std::process::ExitCode;

use anyhow::Result;
use bpaf::Args;
use commands::{ReelscoutArgs, ReelscoutCli};
use tracing::debug;
use utils::init::{init_log_file, init_logger};
use utils::message;

mod commands;
mod config;
mod utils;

async fn run(args: ReelscoutArgs) -> Result<()> {
    init_logger(Some(args.verbosity));
    let config = config::Config::parse()?;
    // The session owns the terminal, so logs go to a file from here on.
    let _log_guard = init_log_file(&config.cache_dir)?;
    args.handle(config).await?;
    Ok(())
}

fn main() -> ExitCode {
    // initialize logger with "best guess" defaults
    // updating the filter is cheap, so we reinitialize once the flags are parsed
    init_logger(None);

    // Pass through Stdout failure; This represents `--help` and `--version`
    let args = match commands::reelscout_cli().run_inner(Args::current_args()) {
        Ok(ReelscoutCli(args)) => args,
        Err(bpaf::ParseFailure::Stdout(m, _)) => {
            print!("{m:80}");
            return ExitCode::from(0);
        },
        Err(bpaf::ParseFailure::Stderr(m)) => {
            message::error(format!("{m:80}"));
            return ExitCode::from(1);
        },
        Err(bpaf::ParseFailure::Completion(c)) => {
            print!("{c}");
            return ExitCode::from(0);
        },
    };

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            message::error(format!("could not start async runtime: {e}"));
            return ExitCode::from(1);
        },
    };

    // Run reelscout. Print errors and exit with status 1 on failure
    match runtime.block_on(run(args)) {
        Ok(()) => ExitCode::from(0),
        Err(e) => {
            debug!("{:#}", e);

            let err_str = e
                .chain()
                .skip(1)
                .fold(e.to_string(), |acc, cause| format!("{}: {}", acc, cause));

            message::error(err_str);

            ExitCode::from(1)
        },
    }
}
