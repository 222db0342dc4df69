//! Project initialization command.

use anyhow::Result;

use cartkit::cart_config::CartConfig;

pub fn cmd_init(config: &CartConfig) -> Result<()> {
    use cartkit::init::{init_project, is_initialized};

    let was_initialized = is_initialized(&config.project_dir);
    let result = init_project(&config.project_dir)?;

    if result.created {
        println!("Initialized cart at {}", result.cart_dir.display());
        println!();
        println!("Created directory structure:");
        println!("  .cart/");
        println!("  ├── cart.toml     # Pricing, discounts and server settings");
        println!("  └── logs/         # Log files (enable with [logging] file = true)");
        println!();
        println!("Next steps:");
        println!("  1. Run `cart catalog` to see the products");
        println!("  2. Run `cart add p1` to add one");
        println!("  3. Run `cart show` to see the order summary");
    } else if was_initialized {
        println!("Cart already initialized at {}", result.cart_dir.display());
        println!("Directory structure verified.");
    }

    Ok(())
}
