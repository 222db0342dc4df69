//! Initialization of the `.cart/` directory.
//!
//! ```text
//! .cart/
//! ├── cart.toml        # Pricing, discounts, history and server settings
//! ├── cartState.json   # Saved cart (written on first mutation)
//! └── logs/            # Daily log files when logging.file = true
//! ```

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::cart_config::{CONFIG_FILE, CartToml};

/// The name of the cart directory.
pub const CART_DIR: &str = ".cart";

/// Result of initializing a cart project.
#[derive(Debug)]
pub struct InitResult {
    /// Path to the .cart directory
    pub cart_dir: PathBuf,
    /// Whether the directory was newly created (false if it already existed)
    pub created: bool,
}

/// Initialize a cart project in the given directory.
///
/// Creates `.cart/` with a default `cart.toml`. An existing directory is
/// completed, and an existing `cart.toml` is left untouched.
pub fn init_project(project_dir: &Path) -> Result<InitResult> {
    let cart_dir = get_cart_dir(project_dir);
    let created = !cart_dir.exists();

    std::fs::create_dir_all(&cart_dir)
        .with_context(|| format!("Failed to create directory: {}", cart_dir.display()))?;

    let logs_dir = cart_dir.join("logs");
    std::fs::create_dir_all(&logs_dir)
        .with_context(|| format!("Failed to create logs directory: {}", logs_dir.display()))?;

    let config_path = cart_dir.join(CONFIG_FILE);
    if !config_path.exists() {
        CartToml::default().save(&config_path)?;
    }

    Ok(InitResult { cart_dir, created })
}

/// Check if a project already has a `.cart` directory.
pub fn is_initialized(project_dir: &Path) -> bool {
    get_cart_dir(project_dir).exists()
}

pub fn get_cart_dir(project_dir: &Path) -> PathBuf {
    project_dir.join(CART_DIR)
}
