// Command table and the glue between parsed arguments, configuration,
// the API client and the terminal.

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::api::{ApiClient, Consumption};
use crate::config::{self, Config};
use crate::error::ApiError;
use crate::logging;
use crate::token::configure_hint;
use crate::ui;

#[derive(Parser, Debug)]
#[command(
    name = "flight-cu",
    version,
    about = "Charges compute units for work done",
    arg_required_else_help = true
)]
pub struct Cli {
    /// Configuration file (default: $FLIGHT_CU_CONFIG or <config dir>/flight-cu/config.yaml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log requests and responses to stderr
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// View the available compute units
    Balance,
    /// Debit compute units from the balance
    Spend {
        /// Number of compute units to debit
        amount: u64,
        /// Why the units are being spent
        reason: String,
        /// Reason recorded for administrators only
        #[arg(long)]
        private_reason: Option<String>,
    },
    /// Set the API token used to authenticate
    Configure {
        /// The new token; prompted for when omitted on a terminal
        token: Option<String>,
    },
}

pub fn run(cli: Cli) -> Result<()> {
    let path = config::resolve_path(cli.config.as_deref())?;
    let config = Config::load(&path)?;
    logging::init(cli.debug || config.debug);
    tracing::debug!(path = %path.display(), "loaded configuration");

    match cli.command {
        Commands::Balance => {
            let api = build_client(&config, &path, cli.debug)?;
            let balance = ui::with_spinner("Fetching balance...", || api.balance())?;
            ui::print_balance(&balance.compute_unit_balance);
        }
        Commands::Spend {
            amount,
            reason,
            private_reason,
        } => {
            let api = build_client(&config, &path, cli.debug)?;
            let consumption = Consumption {
                amount,
                reason,
                private_reason,
            };
            let outcome = ui::with_spinner("Spending compute units...", || api.spend(&consumption))?;
            if let Some(warning) = outcome.warning() {
                ui::warn(warning.message());
            }
            ui::print_balance(&outcome.balance);
        }
        Commands::Configure { token } => configure(&path, &config, token)?,
    }
    Ok(())
}

fn build_client(config: &Config, path: &Path, debug: bool) -> Result<ApiClient> {
    let mut settings = config.client_config(path)?;
    settings.debug |= debug;
    ApiClient::new(&settings)
}

fn configure(path: &Path, config: &Config, token: Option<String>) -> Result<()> {
    let new_token = match token {
        Some(token) => Some(token.trim().to_string()).filter(|t| !t.is_empty()),
        None if ui::is_interactive() => ui::prompt_for_token(&config.jwt_token)?,
        None => {
            return Err(ApiError::client(format!(
                "No token given. Please run '{} <TOKEN>'.",
                configure_hint()
            ))
            .into())
        }
    };

    match new_token {
        Some(token) => config::save_token(path, &token)?,
        None => tracing::info!("keeping the existing token"),
    }
    Ok(())
}
