//! CLI configuration -- thin wrapper around `refetch_config`.
//!
//! Loads the file + environment layers, then applies `GlobalOpts` flag
//! overrides (--base-url, --timeout, --output, --color).

use std::path::PathBuf;

use clap::ValueEnum;

pub use refetch_config::{Config, config_path, load_config_from, save_config_to};

use crate::cli::{ColorMode, GlobalOpts, OutputFormat};
use crate::error::CliError;

/// The file this invocation reads configuration from.
pub fn active_path(global: &GlobalOpts) -> PathBuf {
    global.config.clone().unwrap_or_else(config_path)
}

/// Load configuration and fold in flag overrides.
///
/// Flags win over the file; output and color flags that were not given
/// are filled from the file so handlers only consult `GlobalOpts`.
pub fn resolve(global: &mut GlobalOpts) -> Result<Config, CliError> {
    let mut cfg = load_config_from(&active_path(global))?;

    if let Some(ref url) = global.base_url {
        cfg.base_url = Some(url.clone());
    }
    if let Some(timeout) = global.timeout {
        cfg.timeout = timeout;
    }

    if global.output.is_none() {
        global.output = Some(parse_choice::<OutputFormat>("output", &cfg.output)?);
    }
    if global.color.is_none() {
        global.color = Some(parse_choice::<ColorMode>("color", &cfg.color)?);
    }

    Ok(cfg)
}

fn parse_choice<T: ValueEnum>(field: &str, raw: &str) -> Result<T, CliError> {
    T::from_str(raw, true).map_err(|reason| CliError::Validation {
        field: field.into(),
        reason,
    })
}
