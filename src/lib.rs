pub mod cli;
pub mod command;
pub mod config;
pub mod conflict;
pub mod error;
pub mod index;
pub mod installer;
pub mod manifest;
pub mod registry;
pub mod repo;
pub mod resolver;
pub mod ui;
pub mod workspace;

pub use cli::{Args, Command};
pub use command::types::Outcome;
pub use error::{AlignerError, Result};

#[cfg(test)]
pub mod test_helpers;
