pub mod files;
pub mod sandbox;
pub mod todo;

use std::path::PathBuf;

/// Current user's home directory: `$HOME` on Unix, `%USERPROFILE%` on
/// Windows.
pub fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
}
