//! Run configuration: the validated load description, config-file loading,
//! and CLI/config merging.
mod apply;
mod load;
mod loader;
mod parse;
pub mod types;


pub use apply::{RunOptions, apply_config};
pub use load::{LoadConfig, RequestPlan};
pub use loader::{DEFAULT_JSON_CONFIG, DEFAULT_TOML_CONFIG, load_config};

#[cfg(test)]
pub(crate) use loader::load_config_file;
pub(crate) use parse::parse_duration_value;
