//! Host platform utility functions

use std::env;
use std::path::PathBuf;

/// Name of the environment variable pointing at the software root directory.
pub const SW_ROOT_ENV_VAR: &str = "ROVER_TWIN_ROOT";

/// Get the software root directory, which contains the `params` and
/// `sessions` directories.
pub fn get_sw_root() -> Result<PathBuf, env::VarError> {
    env::var(SW_ROOT_ENV_VAR).map(PathBuf::from)
}

/// Get a short description of the host this execution is running on.
pub fn get_host_info() -> String {
    format!("{} ({})", env::consts::OS, env::consts::ARCH)
}
