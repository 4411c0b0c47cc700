use clap::Subcommand;
use tracker_core::{Config, ConfigError};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a config value
    Get {
        /// Config key (e.g. "reminders.hour", "user.id")
        key: String,
    },
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// New value
        value: String,
    },
    /// List all config values
    List,
    /// Reset config to defaults
    Reset,
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            let value = config.get(&key).ok_or(ConfigError::UnknownKey(key))?;
            println!("{value}");
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            let old = config.get(&key);
            config.set(&key, &value)?;
            config.save()?;
            let new = config.get(&key).unwrap_or(value);
            tracing::info!(%key, old = ?old, new = %new, "config updated");
            println!("{key} = {new}");
            if key.starts_with("engine.") {
                println!("day boundary is now UTC{}", config.engine.time_zone());
            }
        }
        ConfigAction::List => {
            let config = Config::load()?;
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        ConfigAction::Reset => {
            let defaults = Config::default();
            defaults.save()?;
            println!(
                "config reset to defaults (reminder {:02}:{:02}, user '{}')",
                defaults.reminders.hour, defaults.reminders.minute, defaults.user.id
            );
        }
    }
    Ok(())
}
