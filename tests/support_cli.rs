use std::ffi::OsStr;
use std::process::{Command, Output};

/// Run the `loadtester` binary and capture output.
///
/// # Errors
///
/// Returns an error if the binary cannot be executed.
pub fn run_loadtester<I, S>(args: I) -> Result<Output, String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let bin = loadtester_bin()?;
    Command::new(bin)
        .args(args)
        .env("RUST_LOG", "error")
        .env_remove("LOADTESTER_LOG")
        .output()
        .map_err(|err| format!("run loadtester failed: {}", err))
}

fn loadtester_bin() -> Result<String, String> {
    option_env!("CARGO_BIN_EXE_loadtester").map_or_else(
        || Err("CARGO_BIN_EXE_loadtester missing at compile time.".to_owned()),
        |path| Ok(path.to_owned()),
    )
}
