//! Interactive ticket pool simulation.
//!
//! Asks for (or loads) a configuration, then serves a menu that starts and
//! stops vendor/customer runs and exports each run's transactions to JSON.

pub mod config;
pub mod error;
pub mod menu;
pub mod prompt;

pub use config::{AppConfig, ConfigStore};
pub use error::AppError;
pub use menu::{MenuChoice, run_menu};
pub use prompt::{Prompter, configure};
