pub mod chain;
pub mod config;

pub use chain::*;
pub use config::*;
