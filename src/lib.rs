pub mod cart;
pub mod cart_config;
pub mod errors;
pub mod init;
pub mod logging;
pub mod orchestrator;
