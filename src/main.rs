use std::io;

use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info, LevelFilter};

use crate::cli::{Cli, Commands};
use crate::config::models::Settings;
use crate::getterer_client::client::{GettererClient, GettererUrls};
use crate::report::builder::{build_report, render_table};

mod cli;
mod config;
mod getterer_client;
mod report;

fn main() {
    let cli = Cli::parse();
    let dotenv_path = config::loading::load_dotenv();

    let settings = match config::loading::load_config(cli.config.as_deref(), &cli.overrides()) {
        Ok(settings) => settings,
        Err(e) => {
            // Logging is configured by the settings, so this one goes straight to stderr.
            eprintln!("Error: {}", snafu::Report::from_error(e));
            std::process::exit(1);
        }
    };

    init_logging(&settings);
    if let Some(path) = dotenv_path {
        info!("Loaded dotenv file: {:?}", path);
    }

    if cli.displayconfig {
        config::loading::display_config(&settings);
        return;
    }

    let _sentry = init_sentry(&settings);

    if let Err(e) = run(&cli, &settings) {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

fn init_logging(settings: &Settings) {
    // Validated while loading the settings.
    let level = settings.log_level_filter().unwrap_or(LevelFilter::Warn);
    colog::default_builder()
        .filter_level(level)
        .parse_env("RUST_LOG")
        .init();
}

fn init_sentry(settings: &Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref().filter(|dsn| !dsn.is_empty())?;
    Some(sentry::init((dsn, sentry::ClientOptions {
        release: sentry::release_name!(),
        ..Default::default()
    })))
}

fn run(cli: &Cli, settings: &Settings) -> Result<()> {
    let urls = GettererUrls::new(&settings.getterer_url)
        .with_context(|| format!("Invalid Getterer URL {}", settings.getterer_url))?;
    let client = GettererClient::new(settings).context("Could not set up the Getterer client")?;

    // Nothing is printed until every row is in.
    let rows = build_report(&client, &urls)?;

    match cli.command {
        Some(Commands::Dump) => println!("{}", serde_json::to_string_pretty(&rows)?),
        None => render_table(&rows, settings.padding)
            .write_to(&mut io::stdout().lock())
            .context("Could not write report")?,
    }

    Ok(())
}
