//! Configuration view and validation commands (`cart config`).

use anyhow::Result;

use super::super::ConfigCommands;
use cartkit::cart_config::{CartConfig, CartToml};

fn print_toml(toml: &CartToml) {
    println!("[pricing]");
    println!("  tax_rate = \"{}\"", toml.pricing.tax_rate);
    println!("  shipping_flat = \"{}\"", toml.pricing.shipping_flat);
    println!();
    println!("[history]");
    println!("  undo_limit = {}", toml.history.undo_limit);
    println!();
    println!("[storage]");
    println!("  key = \"{}\"", toml.storage.key);
    if let Some(dir) = &toml.storage.dir {
        println!("  dir = \"{}\"", dir.display());
    }
    println!();
    println!("[confirmation]");
    println!("  min_latency_ms = {}", toml.confirmation.min_latency_ms);
    println!("  max_latency_ms = {}", toml.confirmation.max_latency_ms);
    println!("  failure_rate = {}", toml.confirmation.failure_rate);
    println!();
    println!("[logging]");
    println!("  level = \"{}\"", toml.logging.level);
    println!("  json = {}", toml.logging.json);
    println!("  file = {}", toml.logging.file);
    println!();
    for rule in &toml.discounts {
        println!("[[discounts]]");
        println!("  code = \"{}\"", rule.code);
        println!("  kind = \"{}\"", format!("{:?}", rule.kind).to_lowercase());
        println!("  value = \"{}\"", rule.value);
    }
    println!();
}

pub fn cmd_config(config: &CartConfig, command: Option<ConfigCommands>) -> Result<()> {
    let config_path = config.config_file();

    match command {
        None | Some(ConfigCommands::Show) => {
            println!();
            println!("Cart Configuration");
            println!("==================");
            println!();

            if config_path.exists() {
                println!("Config file: {}", config_path.display());
            } else {
                println!("No cart.toml found at {}", config_path.display());
                println!("Using default configuration:");
            }
            println!();
            print_toml(&config.toml);

            println!("Effective values (with env/CLI overrides):");
            let server = config.confirmer();
            println!(
                "  latency_ms = {}..={}",
                server.latency_ms().start(),
                server.latency_ms().end()
            );
            println!("  failure_rate = {}", server.failure_rate());
            println!("  log_level = \"{}\"", config.log_level());
            println!("  store = {}", config.store().path().display());
            println!();

            if !config_path.exists() {
                println!("Run 'cart config init' to create a cart.toml file.");
                println!();
            }
        }
        Some(ConfigCommands::Validate) => {
            println!();
            println!("Validating configuration...");
            println!();

            if !config_path.exists() {
                println!("No cart.toml found. Using defaults (valid).");
                return Ok(());
            }

            let warnings = CartToml::load(&config_path)?.validate();
            if warnings.is_empty() {
                println!("Configuration is valid.");
            } else {
                println!("Configuration warnings:");
                for warning in warnings {
                    println!("  - {}", warning);
                }
            }
            println!();
        }
        Some(ConfigCommands::Init) => {
            if config_path.exists() {
                println!("cart.toml already exists at {}", config_path.display());
                println!("Delete it first if you want to recreate it.");
                return Ok(());
            }

            std::fs::create_dir_all(&config.cart_dir)?;
            CartToml::default().save(&config_path)?;

            println!("Created cart.toml at {}", config_path.display());
            println!();
            println!("You can now customize:");
            println!("  - [pricing] tax_rate, shipping_flat");
            println!("  - [confirmation] latency and failure_rate");
            println!("  - [[discounts]] codes and amounts");
            println!();
        }
    }

    Ok(())
}
