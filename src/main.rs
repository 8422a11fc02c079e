//! `rust-release-action` entrypoint.
//!
//! Parses the command line and `INPUT_*` environment, runs the build, pack,
//! and upload pipeline, and maps the outcome onto the process exit code.

use clap::Parser;
use rust_release_action::cli::Cli;
use rust_release_action::deps::SystemCommandExecutor;
use rust_release_action::error::Result;
use rust_release_action::{logging, pipeline};
use std::io::Write;

fn main() {
    let cli = Cli::parse();
    let debug = cli.debug || std::env::var_os("debug").is_some();
    if let Err(err) = logging::init(debug) {
        write_stderr_line(format_args!("cannot install logger: {err}"));
    }

    let exit_code = exit_code_for_run_result(run(cli));
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = cli.into_config()?;
    log::debug!(
        "targets: {}",
        config
            .targets
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    );

    let archives = pipeline::run(&config, &SystemCommandExecutor)?;
    log::info!("{} archive(s) produced", archives.len());
    Ok(())
}

fn write_stderr_line(message: impl std::fmt::Display) {
    if writeln!(std::io::stderr(), "{message}").is_err() {
        // Best-effort; stderr may already be closed.
    }
}

fn exit_code_for_run_result(result: Result<()>) -> i32 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            log::error!("{err}");
            let mut source = std::error::Error::source(&err);
            while let Some(cause) = source {
                log::error!("  caused by: {cause}");
                source = cause.source();
            }
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_release_action::error::ReleaseError;

    #[test]
    fn exit_code_for_run_result_returns_zero_on_success() {
        assert_eq!(exit_code_for_run_result(Ok(())), 0);
    }

    #[test]
    fn exit_code_for_run_result_returns_one_on_error() {
        let err = ReleaseError::UploadFailed {
            attempts: 5,
            source: Box::new(ReleaseError::NoTargets),
        };
        assert_eq!(exit_code_for_run_result(Err(err)), 1);
    }
}
