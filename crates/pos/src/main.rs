//! `kasir`: cashier terminal for the chocolate drink stall.
//!
//! ```bash
//! # Ring up two Original and one Matcha, customer pays 50.000
//! kasir -e kasir@kasir.local -p kasir123 sell -i Original:2 -i Matcha --paid 50000
//!
//! # Today's figures
//! kasir -e kasir@kasir.local -p kasir123 dashboard
//!
//! # Hide a product from the menu (admin only)
//! kasir -e admin@kasir.local -p admin123 products toggle <PRODUCT_ID>
//! ```
//!
//! Without `KASIR_GATEWAY_URL` every run starts from a fresh in-memory demo
//! backend.

use std::path::PathBuf;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use kasir_core::{ProductId, TransactionId};
use kasir_pos::PosConfig;

mod commands;

#[derive(Parser, Debug)]
#[command(name = "kasir")]
#[command(author, version, about = "Cashier terminal")]
struct Cli {
    /// Staff email
    #[arg(short, long, global = true, env = "KASIR_EMAIL")]
    email: Option<String>,

    /// Staff password
    #[arg(short, long, global = true, env = "KASIR_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Print history and dashboard data as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show the active menu
    Catalog {
        #[arg(short, long)]
        search: Option<String>,

        /// Only this variant
        #[arg(long)]
        variant: Option<String>,
    },
    /// Ring up a sale and print the receipt
    Sell {
        /// `VARIANT[:QTY]`, repeatable
        #[arg(short, long = "item", required = true)]
        items: Vec<String>,

        /// Amount handed over by the customer
        #[arg(long)]
        paid: String,

        /// Write the receipt into this directory
        #[arg(long)]
        save_receipt: Option<PathBuf>,
    },
    /// List past transactions
    History {
        /// Receipt number or cashier name
        #[arg(short, long)]
        search: Option<String>,

        #[arg(long)]
        from: Option<NaiveDate>,

        #[arg(long)]
        to: Option<NaiveDate>,
    },
    /// Reprint the receipt of a transaction
    Receipt {
        id: TransactionId,

        /// Write the receipt into this directory
        #[arg(long)]
        save: Option<PathBuf>,
    },
    /// Today's figures, best sellers and the last seven days
    Dashboard,
    /// Manage the menu (admin only)
    Products {
        #[command(subcommand)]
        action: ProductAction,
    },
}

#[derive(Subcommand, Debug)]
enum ProductAction {
    /// List every product, inactive ones included
    List {
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Add a product
    Add {
        #[arg(long)]
        variant: String,

        #[arg(long)]
        price: String,

        #[arg(long, default_value = kasir_products::DEFAULT_PRODUCT_NAME)]
        name: String,

        /// Create it hidden from the cashier menu
        #[arg(long)]
        inactive: bool,
    },
    /// Switch a product between active and inactive
    Toggle { id: ProductId },
    /// Delete a product that has never been sold
    Delete { id: ProductId },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match PosConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("configuration error: {e}");
            std::process::exit(2);
        }
    };
    kasir_observability::init(config.log_format);

    if let Err(e) = run(cli, config).await {
        tracing::error!("Command failed: {e:#}");
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: PosConfig) -> anyhow::Result<()> {
    let mut terminal = kasir_pos::open_terminal(&config)
        .await
        .context("failed to reach the backend")?;
    commands::sign_in(&mut terminal, cli.email, cli.password).await?;

    match cli.command {
        Commands::Catalog { search, variant } => {
            commands::catalog(&mut terminal, search, variant).await
        }
        Commands::Sell {
            items,
            paid,
            save_receipt,
        } => commands::sell(&mut terminal, &items, &paid, save_receipt).await,
        Commands::History { search, from, to } => {
            commands::history(&terminal, search, from, to, cli.json).await
        }
        Commands::Receipt { id, save } => commands::receipt(&terminal, id, save).await,
        Commands::Dashboard => commands::dashboard(&terminal, cli.json).await,
        Commands::Products { action } => match action {
            ProductAction::List { search } => commands::products::list(&terminal, search).await,
            ProductAction::Add {
                variant,
                price,
                name,
                inactive,
            } => commands::products::add(&mut terminal, name, variant, price, !inactive).await,
            ProductAction::Toggle { id } => commands::products::toggle(&mut terminal, id).await,
            ProductAction::Delete { id } => commands::products::delete(&mut terminal, id).await,
        },
    }
}
