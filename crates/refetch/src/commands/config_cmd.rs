//! `refetch config` -- configuration file location and contents.

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config};
use crate::error::CliError;
use crate::output;

pub fn handle(args: &ConfigArgs, cfg: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Path => {
            let path = config::active_path(global);
            output::print_output(&path.display().to_string(), global.quiet);
            Ok(())
        }

        ConfigCommand::Show => {
            let out = output::render_single(&global.output_format(), cfg, format_config)?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Save => {
            let path = config::active_path(global);
            config::save_config_to(cfg, &path)?;
            if !global.quiet {
                eprintln!("Configuration written to {}", path.display());
            }
            Ok(())
        }
    }
}

/// `plain` rendering: the TOML the file would contain.
fn format_config(cfg: &Config) -> String {
    cfg.to_toml_string().map_or_else(
        |e| format!("# unrenderable configuration: {e}"),
        |text| text.trim_end().to_owned(),
    )
}
