use std::process::ExitCode;

use clap::Parser;
use reelgrab_lib::cli::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    reelgrab_lib::init_tracing();
    let cli = Cli::parse();

    match reelgrab_lib::run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
