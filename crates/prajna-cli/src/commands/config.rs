use clap::Subcommand;
use prajna_core::{Config, ConfigError};

use super::print_json;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print one value by dot path (e.g. "timer.default_duration_min")
    Get { key: String },
    /// Change one value and write config.toml
    Set { key: String, value: String },
    /// Print the whole config as it is stored in config.toml
    List {
        /// Output as JSON instead of TOML
        #[arg(long)]
        json: bool,
    },
    /// Print where config.toml lives
    Path,
    /// Overwrite config.toml with defaults
    Reset,
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Get { key } => {
            let value = Config::load()?
                .get(&key)
                .ok_or(ConfigError::UnknownKey(key))?;
            println!("{value}");
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            config.save()?;
            println!("{key} = {}", config.get(&key).unwrap_or(value));
        }
        ConfigAction::List { json } => {
            let config = Config::load()?;
            if json {
                print_json(&config)?;
            } else {
                print!("{}", config.to_toml()?);
            }
        }
        ConfigAction::Path => {
            println!("{}", Config::path()?.display());
        }
        ConfigAction::Reset => {
            Config::default().save()?;
            println!("config reset to defaults");
        }
    }
    Ok(())
}
