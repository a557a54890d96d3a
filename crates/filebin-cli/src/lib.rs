//! Client for a filebin server

pub mod client;
pub mod error;
pub mod types;

pub use client::FilebinClient;
pub use error::{CliError, Result};
pub use types::{EventOutcome, ListedFile};
