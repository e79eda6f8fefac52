//! Process-wide locations: the persistent tool cache and the runner directories.

pub mod cache;
pub mod dirs;
