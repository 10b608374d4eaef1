use clap::Parser;
use std::process::ExitCode;

use scope_guard_cli::{init_subscriber, run, Cli, TracingConfig};

fn main() -> ExitCode {
    let cli = Cli::parse();

    let tracing = TracingConfig {
        format: cli.log_format,
        ..Default::default()
    }
    .with_verbosity(cli.verbose);
    if let Err(e) = init_subscriber(&tracing) {
        eprintln!("warning: logging disabled: {}", e);
    }

    match run(&cli, &mut std::io::stdout().lock()) {
        Ok(outcome) => ExitCode::from(outcome.exit_code()),
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::from(2)
        }
    }
}
