//! Configuration system
//!
//! Sections are declared once in `schemas` with embedded defaults and loaded
//! from `data/config.toml`; `utils` owns the global instance.

pub mod macros;
pub mod schemas;
pub mod utils;

pub use schemas::*;
pub use utils::{
    apply_env_overrides, get_config_clone, is_config_initialized, load_config,
    load_config_from_path, read_config_file, reload_config, reload_config_from_path, save_config,
    with_config,
};
