//! Configuration persistence.
//!
//! Parameters are stored as plain `key=value` lines so they stay readable and
//! hand-editable. The generator never consults this module.

mod kv;

pub use kv::{
    apply_kv, load_params, load_params_into, save_params, to_kv_string, ConfigError, LoadReport,
    CONFIG_VERSION,
};

/// File name used when no config path is given.
pub const DEFAULT_CONFIG_FILE: &str = "dunegen.cfg";
