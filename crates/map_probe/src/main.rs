use std::env;
use std::io;
use std::process::ExitCode;

use map_probe::{parse_args, run, usage_text, CliCommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let args = env::args().skip(1).collect::<Vec<_>>();
    let options = match parse_args(&args) {
        Ok(CliCommand::Help) => {
            println!("{}", usage_text());
            return ExitCode::SUCCESS;
        }
        Ok(CliCommand::Run(options)) => options,
        Err(message) => {
            eprintln!("{message}");
            return ExitCode::from(2);
        }
    };

    init_tracing();
    info!(scenario = %options.scenario.display(), "=== map probe startup ===");

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match run(&options, &mut out) {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "probe_failed");
            ExitCode::from(1)
        }
    }
}

// Logs go to stderr so stdout only carries answer lines.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .compact()
        .init();
}
