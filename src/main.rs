use clap::Parser;
use fintrack::args::{Args, Command};
use fintrack::{commands, Config, Finance, Mode, Result};
use std::process::ExitCode;
use tracing::{debug, error, trace};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env file is normal; the variables may come from the environment.
    dotenvy::dotenv().ok();
    let args = Args::parse();
    let log_level = args.common().log_level();
    init_logger(log_level);
    debug!("Log level set to {}", log_level.to_string().to_lowercase());

    match main_inner(args).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Exiting with error: {e}");
            ExitCode::FAILURE
        }
    }
}

pub async fn main_inner(args: Args) -> Result<()> {
    trace!("{args:?}");
    let config = Config::from_common(args.common())?;

    // This allows for running the program without hitting the Google APIs. When
    // FINTRACK_IN_TEST_MODE is set and non-zero in length, then the mode will be Mode::Testing,
    // otherwise it will be Mode::Google.
    let mode = Mode::from_env();

    if let Command::Serve = args.command() {
        commands::serve(config, mode).await?.print();
        return Ok(());
    }

    let finance = Finance::connect(&config, mode).await?;
    let _: () = match args.command() {
        Command::Transactions => commands::transactions(&finance).await?.print(),
        Command::Dashboard => commands::dashboard(&finance).await?.print(),
        Command::ByCategory(args) => {
            commands::transactions_by_category(&finance, args.clone())
                .await?
                .print()
        }
        Command::Categories => commands::user_categories(&finance).await?.print(),
        Command::Search(args) => commands::search_transactions(&finance, args.clone())
            .await?
            .print(),
        Command::Add(args) => commands::add_transaction(&finance, args.clone())
            .await?
            .print(),
        Command::Update(args) => commands::update_transaction(&finance, args.clone())
            .await?
            .print(),
        Command::Delete(args) => commands::delete_transaction(&finance, args.clone())
            .await?
            .print(),
        Command::Serve => {}
    };
    Ok(())
}

/// Initializes the tracing subscriber.
pub fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => {
            // RUST_LOG exists; use it.
            EnvFilter::from_default_env()
        }
        None => {
            // RUST_LOG does not exist; use default log level for this crate only.
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), level))
        }
    };

    // stdout carries the JSON output of commands and, for `serve`, the MCP protocol.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
