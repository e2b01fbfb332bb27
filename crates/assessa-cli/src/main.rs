//! The `assessa` binary.

use std::process::ExitCode;

use clap::Parser;

use assessa_cli::{AssessaCli, CliArgs};

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();
    AssessaCli::init_logging(args.verbose, args.quiet);

    let result = match AssessaCli::from_args(&args) {
        Ok(app) => app.run(args).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
