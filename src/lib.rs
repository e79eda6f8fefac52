//! # setup-steamcmd Core Library
//!
//! This crate provisions `steamcmd` inside a CI runner. It looks for a cached copy in the
//! runner's tool cache and, on a miss, downloads the platform archive, extracts and normalizes
//! it, asks the binary for its version and caches it under that version so later runs skip the
//! download entirely.
//!
//! The `setup-steamcmd` binary wraps this library as a two-phase step: the main phase provisions
//! and exports `STEAM_CMD`, `STEAM_DIR` and `STEAM_TEMP`, the post phase prints the logs steamcmd
//! left behind.
//!
//! ## Modules Overview
//! - [`platform`] – Per-OS download coordinates, data-home defaults and normalization rules
//! - [`version`] – Cache version keys and the steamcmd version probe
//! - [`provision`] – The find-or-download-and-cache orchestrator
//! - [`global`] – The on-disk tool cache and runner directory defaults
//! - [`download`], [`extract`], [`process`] – Downloader, archive and subprocess collaborators
//! - [`shims`] – Making extracted trees executable and writing the indirection script
//! - [`workflow`] – Runner output, exported variables, PATH and step state
//! - [`logs`] – Printing (and clearing) steamcmd log files
//! - [`lifecycle`] – Main and post phases of the step
//! - [`util`] – Directory helpers

pub mod error;
pub mod platform;
pub mod version;
pub mod process;
pub mod download;
pub mod extract;
pub mod global;
pub mod shims;
pub mod util;
pub mod workflow;
pub mod provision;
pub mod logs;
pub mod lifecycle;
pub mod logging;

pub use error::ProvisionError;
pub use platform::*;
pub use version::*;
pub use process::*;
pub use download::*;
pub use extract::*;
pub use global::cache::*;
pub use global::dirs::*;
pub use shims::*;
pub use workflow::*;
pub use provision::*;
pub use logs::*;
pub use lifecycle::*;
pub use logging::init_tracing;
