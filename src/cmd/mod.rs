//! CLI command implementations.
//!
//! Each submodule owns one or more related `Commands` variants:
//!
//! | Module    | Commands handled                                               |
//! |-----------|----------------------------------------------------------------|
//! | `project` | `Init`                                                         |
//! | `cart`    | `Catalog`, `Add`, `Remove`, `Quantity`, `Discount`, `Undo`,    |
//! |           | `ClearErrors`, `Show`, `Checkout`, `Reset`                     |
//! | `config`  | `Config`                                                       |

pub mod cart;
pub mod config;
pub mod project;

pub use cart::{
    cmd_add, cmd_catalog, cmd_checkout, cmd_clear_errors, cmd_discount, cmd_quantity, cmd_remove,
    cmd_reset, cmd_show, cmd_undo,
};
pub use config::cmd_config;
pub use project::cmd_init;
