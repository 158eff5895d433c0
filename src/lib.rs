//! fintrack keeps personal income and expense transactions in a Google Sheet and computes a
//! dashboard over them. It is used from the command line or, through `fintrack serve`, by AI
//! agents speaking MCP.

pub mod aggregate;
mod api;
pub mod args;
pub mod cache;
pub mod clock;
pub mod commands;
mod config;
mod error;
mod finance;
mod mcp;
pub mod model;
pub mod store;
mod utils;


pub use api::{Mode, TEST_MODE_ENV};
pub use config::{Config, Credentials, DEFAULT_SHEET_NAME};
pub use error::{Error, ErrorType, Result};
pub use finance::Finance;
