//! Configuration for cartkit.
//!
//! Settings live in `.cart/cart.toml` and are layered file → environment → CLI.
//!
//! # Configuration File Format
//!
//! ```toml
//! [pricing]
//! tax_rate = "0.10"
//! shipping_flat = "5.00"
//!
//! [history]
//! undo_limit = 50
//!
//! [storage]
//! key = "cartState"
//!
//! [confirmation]
//! min_latency_ms = 300
//! max_latency_ms = 800
//! failure_rate = 0.15
//!
//! [logging]
//! level = "warn"
//! json = false
//! file = false
//!
//! [[discounts]]
//! code = "SAVE10"
//! kind = "fixed"
//! value = "10"
//!
//! [[discounts]]
//! code = "HALFOFF"
//! kind = "percent"
//! value = "50"
//! ```
//!
//! | Variable              | Overrides                       |
//! |-----------------------|---------------------------------|
//! | `CART_FAILURE_RATE`   | `confirmation.failure_rate`     |
//! | `CART_MIN_LATENCY_MS` | `confirmation.min_latency_ms`   |
//! | `CART_MAX_LATENCY_MS` | `confirmation.max_latency_ms`   |
//! | `CART_LOG`            | `logging.level`                 |

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use crate::cart::{CartMachine, DEFAULT_UNDO_LIMIT, DiscountRule, PricingRules, pricing};
use crate::init::get_cart_dir;
use crate::orchestrator::confirm::{DEFAULT_FAILURE_RATE, DEFAULT_LATENCY_MS};
use crate::orchestrator::{CartOrchestrator, DEFAULT_STORE_KEY, FileStore, SimulatedServer};

pub const CONFIG_FILE: &str = "cart.toml";

/// Tax and shipping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingSection {
    #[serde(default = "default_tax_rate")]
    pub tax_rate: Decimal,
    #[serde(default = "default_shipping_flat")]
    pub shipping_flat: Decimal,
}

fn default_tax_rate() -> Decimal {
    PricingRules::default().tax_rate
}

fn default_shipping_flat() -> Decimal {
    PricingRules::default().shipping_flat
}

impl Default for PricingSection {
    fn default() -> Self {
        Self {
            tax_rate: default_tax_rate(),
            shipping_flat: default_shipping_flat(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistorySection {
    /// Maximum undo depth
    #[serde(default = "default_undo_limit")]
    pub undo_limit: usize,
}

fn default_undo_limit() -> usize {
    DEFAULT_UNDO_LIMIT
}

impl Default for HistorySection {
    fn default() -> Self {
        Self {
            undo_limit: default_undo_limit(),
        }
    }
}

/// Where the cart slot lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageSection {
    /// Slot name
    #[serde(default = "default_store_key")]
    pub key: String,
    /// Directory holding the slot (defaults to the `.cart` directory)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

fn default_store_key() -> String {
    DEFAULT_STORE_KEY.to_string()
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            key: default_store_key(),
            dir: None,
        }
    }
}

/// Simulated server behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmationSection {
    #[serde(default = "default_min_latency_ms")]
    pub min_latency_ms: u64,
    #[serde(default = "default_max_latency_ms")]
    pub max_latency_ms: u64,
    /// Fraction of confirmations that fail, 0.0 to 1.0
    #[serde(default = "default_failure_rate")]
    pub failure_rate: f64,
}

fn default_min_latency_ms() -> u64 {
    *DEFAULT_LATENCY_MS.start()
}

fn default_max_latency_ms() -> u64 {
    *DEFAULT_LATENCY_MS.end()
}

fn default_failure_rate() -> f64 {
    DEFAULT_FAILURE_RATE
}

impl Default for ConfirmationSection {
    fn default() -> Self {
        Self {
            min_latency_ms: default_min_latency_ms(),
            max_latency_ms: default_max_latency_ms(),
            failure_rate: default_failure_rate(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSection {
    /// Filter directive, e.g. "warn" or "cartkit=debug"
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Emit JSON lines instead of text
    #[serde(default)]
    pub json: bool,
    /// Also write a daily log file under `.cart/logs`
    #[serde(default)]
    pub file: bool,
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
            file: false,
        }
    }
}

fn default_discount_rules() -> Vec<DiscountRule> {
    pricing::default_discounts()
}

/// The complete cart.toml structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartToml {
    #[serde(default)]
    pub pricing: PricingSection,
    #[serde(default)]
    pub history: HistorySection,
    #[serde(default)]
    pub storage: StorageSection,
    #[serde(default)]
    pub confirmation: ConfirmationSection,
    #[serde(default)]
    pub logging: LoggingSection,
    #[serde(default = "default_discount_rules")]
    pub discounts: Vec<DiscountRule>,
}

impl Default for CartToml {
    fn default() -> Self {
        Self {
            pricing: PricingSection::default(),
            history: HistorySection::default(),
            storage: StorageSection::default(),
            confirmation: ConfirmationSection::default(),
            logging: LoggingSection::default(),
            discounts: default_discount_rules(),
        }
    }
}

/// Parse an environment override, ignoring values that don't parse.
fn env_override<T: FromStr>(name: &str) -> Option<T> {
    parse_override(std::env::var(name).ok())
}

fn parse_override<T: FromStr>(raw: Option<String>) -> Option<T> {
    raw.and_then(|v| v.trim().parse().ok())
}

impl CartToml {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse cart.toml")
    }

    /// Load `cart.toml` from `cart_dir`, or defaults if it doesn't exist.
    pub fn load_or_default(cart_dir: &Path) -> Result<Self> {
        let config_path = cart_dir.join(CONFIG_FILE);
        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize cart.toml")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    pub fn pricing_rules(&self) -> PricingRules {
        PricingRules {
            tax_rate: self.pricing.tax_rate,
            shipping_flat: self.pricing.shipping_flat,
            discounts: self.discounts.clone(),
        }
    }

    /// Failure rate (env → file).
    pub fn failure_rate(&self) -> f64 {
        env_override("CART_FAILURE_RATE").unwrap_or(self.confirmation.failure_rate)
    }

    /// Latency window in ms (env → file).
    pub fn latency_ms(&self) -> std::ops::RangeInclusive<u64> {
        let min = env_override("CART_MIN_LATENCY_MS").unwrap_or(self.confirmation.min_latency_ms);
        let max = env_override("CART_MAX_LATENCY_MS").unwrap_or(self.confirmation.max_latency_ms);
        min..=max
    }

    /// Log filter (env → file).
    pub fn log_level(&self) -> String {
        std::env::var("CART_LOG").unwrap_or_else(|_| self.logging.level.clone())
    }

    /// Validate the configuration and return any warnings.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        let rate = self.confirmation.failure_rate;
        if !(0.0..=1.0).contains(&rate) {
            warnings.push(format!(
                "Invalid failure_rate {}: should be between 0.0 and 1.0",
                rate
            ));
        }

        if self.confirmation.min_latency_ms > self.confirmation.max_latency_ms {
            warnings.push(format!(
                "min_latency_ms ({}) is greater than max_latency_ms ({})",
                self.confirmation.min_latency_ms, self.confirmation.max_latency_ms
            ));
        }

        if self.pricing.tax_rate < Decimal::ZERO {
            warnings.push(format!("Negative tax_rate {}", self.pricing.tax_rate));
        }
        if self.pricing.shipping_flat < Decimal::ZERO {
            warnings.push(format!(
                "Negative shipping_flat {}",
                self.pricing.shipping_flat
            ));
        }

        if self.history.undo_limit == 0 {
            warnings.push("undo_limit of 0 is treated as 1".to_string());
        }

        if self.storage.key.trim().is_empty() {
            warnings.push("storage.key must not be empty".to_string());
        }

        let mut seen = HashSet::new();
        for rule in &self.discounts {
            let code = rule.code.trim().to_uppercase();
            if code.is_empty() {
                warnings.push("Discount with an empty code will never match".to_string());
            } else if !seen.insert(code.clone()) {
                warnings.push(format!(
                    "Duplicate discount code '{}': only the first is used",
                    code
                ));
            }
            if rule.value < Decimal::ZERO {
                warnings.push(format!("Discount '{}' has a negative value", rule.code));
            }
        }

        warnings
    }
}

/// Unified runtime configuration.
///
/// It merges settings from:
/// 1. cart.toml file
/// 2. Environment variables
/// 3. CLI arguments
#[derive(Debug, Clone)]
pub struct CartConfig {
    pub project_dir: PathBuf,
    pub cart_dir: PathBuf,
    pub toml: CartToml,
    /// CLI override: verbose logging
    pub verbose: bool,
}

impl CartConfig {
    pub fn new(project_dir: PathBuf) -> Result<Self> {
        let project_dir = project_dir
            .canonicalize()
            .context("Failed to resolve project directory")?;
        let cart_dir = get_cart_dir(&project_dir);
        let toml = CartToml::load_or_default(&cart_dir)?;

        Ok(Self {
            project_dir,
            cart_dir,
            toml,
            verbose: false,
        })
    }

    pub fn with_cli_args(project_dir: PathBuf, verbose: bool) -> Result<Self> {
        let mut config = Self::new(project_dir)?;
        config.verbose = verbose;
        Ok(config)
    }

    pub fn config_file(&self) -> PathBuf {
        self.cart_dir.join(CONFIG_FILE)
    }

    pub fn log_dir(&self) -> PathBuf {
        self.cart_dir.join("logs")
    }

    /// Directory holding the cart slot. Relative paths resolve against the project.
    pub fn store_dir(&self) -> PathBuf {
        match &self.toml.storage.dir {
            Some(dir) if dir.is_absolute() => dir.clone(),
            Some(dir) => self.project_dir.join(dir),
            None => self.cart_dir.clone(),
        }
    }

    /// Log filter (CLI verbose → env → file).
    pub fn log_level(&self) -> String {
        if self.verbose {
            "debug".to_string()
        } else {
            self.toml.log_level()
        }
    }

    pub fn machine(&self) -> CartMachine {
        CartMachine::new(self.toml.pricing_rules(), self.toml.history.undo_limit)
    }

    pub fn confirmer(&self) -> SimulatedServer {
        SimulatedServer::new(self.toml.latency_ms(), self.toml.failure_rate())
    }

    pub fn store(&self) -> FileStore {
        FileStore::new(&self.store_dir(), &self.toml.storage.key)
    }

    /// Build an orchestrator wired to the simulated server and the file slot.
    pub fn open_orchestrator(&self) -> CartOrchestrator {
        CartOrchestrator::open(
            self.machine(),
            Arc::new(self.confirmer()),
            Arc::new(self.store()),
        )
    }

    pub fn validate(&self) -> Vec<String> {
        self.toml.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::DiscountKind;
    use tempfile::tempdir;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_cart_toml_parse_empty() {
        let toml = CartToml::parse("").unwrap();
        assert_eq!(toml.pricing.tax_rate, dec("0.10"));
        assert_eq!(toml.pricing.shipping_flat, dec("5.00"));
        assert_eq!(toml.history.undo_limit, 50);
        assert_eq!(toml.storage.key, "cartState");
        assert_eq!(toml.confirmation.min_latency_ms, 300);
        assert_eq!(toml.confirmation.max_latency_ms, 800);
        assert_eq!(toml.discounts.len(), 2);
        assert!(toml.validate().is_empty());
    }

    #[test]
    fn test_cart_toml_parse_sections() {
        let content = r#"
[pricing]
tax_rate = "0.2"
shipping_flat = "0"

[history]
undo_limit = 5

[confirmation]
failure_rate = 0.0
min_latency_ms = 0
max_latency_ms = 10

[[discounts]]
code = "TAKE3"
kind = "fixed"
value = "3"
"#;
        let toml = CartToml::parse(content).unwrap();
        assert_eq!(toml.pricing.tax_rate, dec("0.2"));
        assert_eq!(toml.history.undo_limit, 5);
        assert_eq!(toml.confirmation.max_latency_ms, 10);
        assert_eq!(toml.discounts.len(), 1);
        assert_eq!(toml.discounts[0].kind, DiscountKind::Fixed);

        let rules = toml.pricing_rules();
        assert_eq!(rules.shipping_flat, Decimal::ZERO);
        assert_eq!(rules.discounts[0].code, "TAKE3");
    }

    #[test]
    fn test_cart_toml_parse_invalid() {
        let result = CartToml::parse("[pricing\ntax_rate = ");
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Failed to parse cart.toml")
        );
    }

    #[test]
    fn test_validate_reports_problems() {
        let mut toml = CartToml::default();
        toml.confirmation.failure_rate = 1.5;
        toml.confirmation.min_latency_ms = 900;
        toml.pricing.tax_rate = dec("-0.1");
        toml.history.undo_limit = 0;
        toml.discounts.push(DiscountRule::fixed("save10", dec("1")));
        toml.discounts.push(DiscountRule::fixed(" ", dec("-1")));

        let warnings = toml.validate();
        assert!(warnings.iter().any(|w| w.contains("failure_rate")));
        assert!(warnings.iter().any(|w| w.contains("min_latency_ms")));
        assert!(warnings.iter().any(|w| w.contains("tax_rate")));
        assert!(warnings.iter().any(|w| w.contains("undo_limit")));
        assert!(warnings.iter().any(|w| w.contains("Duplicate discount code 'SAVE10'")));
        assert!(warnings.iter().any(|w| w.contains("empty code")));
        assert!(warnings.iter().any(|w| w.contains("negative value")));
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        let mut toml = CartToml::default();
        toml.history.undo_limit = 7;
        toml.save(&path).unwrap();

        let loaded = CartToml::load(&path).unwrap();
        assert_eq!(loaded.history.undo_limit, 7);
        assert_eq!(loaded.discounts, toml.discounts);
    }

    #[test]
    fn test_load_or_default_without_file() {
        let dir = tempdir().unwrap();
        let toml = CartToml::load_or_default(dir.path()).unwrap();
        assert_eq!(toml.history.undo_limit, DEFAULT_UNDO_LIMIT);
    }

    #[test]
    fn test_parse_override() {
        assert_eq!(parse_override::<f64>(Some(" 0.5 ".into())), Some(0.5));
        assert_eq!(parse_override::<u64>(Some("abc".into())), None);
        assert_eq!(parse_override::<u64>(None), None);
    }

    #[test]
    fn test_config_paths() {
        let dir = tempdir().unwrap();
        let config = CartConfig::new(dir.path().to_path_buf()).unwrap();
        let root = dir.path().canonicalize().unwrap();
        assert_eq!(config.cart_dir, root.join(".cart"));
        assert_eq!(config.config_file(), root.join(".cart/cart.toml"));
        assert_eq!(config.store_dir(), root.join(".cart"));
        assert_eq!(config.store().path(), root.join(".cart/cartState.json"));
    }

    #[test]
    fn test_config_relative_store_dir() {
        let dir = tempdir().unwrap();
        let cart_dir = dir.path().join(".cart");
        std::fs::create_dir_all(&cart_dir).unwrap();
        std::fs::write(cart_dir.join(CONFIG_FILE), "[storage]\ndir = \"data\"\nkey = \"c\"\n")
            .unwrap();

        let config = CartConfig::new(dir.path().to_path_buf()).unwrap();
        let root = dir.path().canonicalize().unwrap();
        assert_eq!(config.store().path(), root.join("data/c.json"));
    }

    #[test]
    fn test_verbose_forces_debug() {
        let dir = tempdir().unwrap();
        let config = CartConfig::with_cli_args(dir.path().to_path_buf(), true).unwrap();
        assert_eq!(config.log_level(), "debug");
    }
}
