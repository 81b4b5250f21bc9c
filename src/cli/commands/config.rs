//! Config command - show effective configuration

use crate::cli::args::{ConfigAction, ConfigArgs};
use crate::config::{Config, ConfigManager};
use crate::error::PrecacheResult;

/// Execute the config command
pub async fn execute(args: ConfigArgs, manager: &ConfigManager, config: &Config) -> PrecacheResult<()> {
    match args.action {
        None | Some(ConfigAction::Show) => show_config(config)?,
        Some(ConfigAction::Path) => show_path(manager),
    }
    Ok(())
}

fn show_config(config: &Config) -> PrecacheResult<()> {
    let toml = toml::to_string_pretty(config)?;
    println!("{}", toml);
    Ok(())
}

fn show_path(manager: &ConfigManager) {
    let path = manager.path();
    if path.exists() {
        println!("{}", path.display());
    } else {
        println!("{} (not present, using defaults)", path.display());
    }
}
