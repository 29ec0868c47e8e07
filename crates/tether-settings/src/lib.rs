//! # tether-settings
//!
//! Layered configuration for the tether relay.
//!
//! Settings are resolved from (lowest to highest priority):
//! 1. **Compiled defaults**: [`TetherSettings::default()`]
//! 2. **Settings file**: `~/.tether/settings.json`, deep-merged over defaults
//! 3. **Environment variables**: `TETHER_*` overrides
//!
//! The binary applies its command-line flags last and hands the result to
//! the server as an immutable value.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{
    apply_overrides, deep_merge, load_settings_from_path, load_settings_with, settings_path,
};
pub use types::*;
