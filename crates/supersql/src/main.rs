use std::io::Write;
use std::process::ExitCode;

use clap::Parser;
use supersql::args::Cli;
use tracing::info;

fn main() -> ExitCode {
    let cli = Cli::parse();
    logutil::configure_global_logger(cli.log_level, cli.log_format);
    info!(version = env!("CARGO_PKG_VERSION"), "starting...");

    let mut stdout = std::io::stdout().lock();
    match supersql::run(&cli, &mut std::io::stdin().lock(), &mut stdout) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let _ = writeln!(stdout, "ERROR: {e}");
            ExitCode::FAILURE
        }
    }
}
