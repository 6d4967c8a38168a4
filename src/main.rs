use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;

use mbbs::cli::Cli;
use mbbs::utils::error::{AppError, report_error};
use mbbs::utils::logging::init_logging;
use mbbs::utils::output::OutputStyle;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_logging(cli.debug);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            // bare AppErrors get the categorised report, anything with context keeps its chain
            match err.downcast_ref::<AppError>() {
                Some(app_err) if err.chain().count() == 1 => report_error(app_err),
                _ => eprintln!("❌ {}", OutputStyle::error(&format!("{:#}", err))),
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    // Commands load the configuration themselves when they need it
    cli.command.execute(cli.config.as_deref()).await
}
