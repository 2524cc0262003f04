//! Host platform utility functions

use std::env::{self, VarError};
use std::path::PathBuf;

/// Name of the environment variable pointing at the software root directory.
pub const SW_ROOT_ENV_VAR: &str = "RC_DRONE_SW_ROOT";

/// Get the software root directory, which contains the `params` and `sessions` directories.
pub fn get_sw_root() -> Result<PathBuf, VarError> {
    env::var(SW_ROOT_ENV_VAR).map(PathBuf::from)
}
