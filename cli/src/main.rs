use std::process::ExitCode;

use agenda_cli::AgendaCli;
use clap::Parser;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = AgendaCli::parse();
    agenda_cli::init_tracing(cli.verbose);

    match cli.run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::debug!("command failed: {err:?}");
            agenda_cli::report(&err);
            ExitCode::from(agenda_cli::exit_code(&err))
        }
    }
}
