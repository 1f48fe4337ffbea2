//! CLI argument types and parsing helpers.
mod cli;
mod defaults;
pub(crate) mod parsers;
mod types;


pub use cli::TesterArgs;
pub use defaults::{DEFAULT_CLIENTS, default_run_id};
pub use types::{HttpMethod, OutputFormat, PositiveUsize};

pub(crate) use parsers::parse_header;
