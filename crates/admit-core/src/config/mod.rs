//! Configuration loading and management
//!
//! # Hierarchy
//!
//! Configuration is loaded in this order (later overrides earlier):
//! 1. Built-in defaults
//! 2. Global config: ~/.config/admit/config.toml
//! 3. Project config: .admit/config.toml (or an explicit path)
//! 4. Environment variables: ADMIT_*
//! 5. CLI flags (applied by the caller)
//!
//! # Example Config
//!
//! ```toml
//! lock_group = "public.lock"
//! exempt_isolation_levels = [0, 1]
//! lock_service = "command"
//!
//! [hold]
//! min_units = 1
//! max_units = 5
//! unit_ms = 1000
//!
//! [command]
//! program = "../../../build/bin/run-query"
//! pool = "tpchdata"
//! ```

mod defaults;
mod load;
mod merge;
mod types;
mod validate;

#[cfg(test)]
mod tests_loading;
#[cfg(test)]
mod tests_validation;

pub use load::{
    global_config_path, load_config, load_config_layers, load_toml_file, project_config_path,
};
pub use types::{CommandConfig, HoldConfig, LockServiceKind, RetryConfig, SchedulerConfig};
