use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use cartkit::cart_config::CartConfig;
use cartkit::logging::init_logging;

mod cmd;

#[derive(Parser)]
#[command(name = "cart")]
#[command(version, about = "Shopping cart with optimistic updates and undo")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true)]
    pub project_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the .cart directory with a default cart.toml
    Init,
    /// List the products that can be added
    Catalog,
    /// Add a catalog product to the cart
    Add {
        product_id: String,
        #[arg(short, long, default_value = "1")]
        quantity: u32,
    },
    /// Remove an item from the cart
    Remove { id: String },
    /// Change the quantity of an item
    Quantity { id: String, quantity: u32 },
    /// Apply a discount code
    Discount { code: String },
    /// Undo the last change to items or discount
    Undo,
    /// Dismiss error messages
    ClearErrors,
    /// Show items, errors and the order summary
    Show,
    /// Place the order and empty the cart
    Checkout,
    /// Delete the saved cart
    Reset,
    /// View or validate configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Validate configuration and show any warnings
    Validate,
    /// Initialize a default cart.toml file
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let project_dir = match cli.project_dir.clone() {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to get current directory")?,
    };

    let config = CartConfig::with_cli_args(project_dir, cli.verbose)?;
    let log_dir = config.toml.logging.file.then(|| config.log_dir());
    init_logging(
        &config.log_level(),
        config.toml.logging.json,
        log_dir.as_deref(),
    )?;

    match &cli.command {
        Commands::Init => cmd::cmd_init(&config)?,
        Commands::Catalog => cmd::cmd_catalog(),
        Commands::Add {
            product_id,
            quantity,
        } => cmd::cmd_add(&config, product_id, *quantity).await?,
        Commands::Remove { id } => cmd::cmd_remove(&config, id).await?,
        Commands::Quantity { id, quantity } => cmd::cmd_quantity(&config, id, *quantity).await?,
        Commands::Discount { code } => cmd::cmd_discount(&config, code).await?,
        Commands::Undo => cmd::cmd_undo(&config)?,
        Commands::ClearErrors => cmd::cmd_clear_errors(&config)?,
        Commands::Show => cmd::cmd_show(&config)?,
        Commands::Checkout => cmd::cmd_checkout(&config)?,
        Commands::Reset => cmd::cmd_reset(&config)?,
        Commands::Config { command } => cmd::cmd_config(&config, command.clone())?,
    }

    Ok(())
}
