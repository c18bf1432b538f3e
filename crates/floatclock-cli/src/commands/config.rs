use clap::Subcommand;
use floatclock_core::settings::KEYS;
use floatclock_core::StorageError;

use super::{open_gateway, CmdResult};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a setting
    Get {
        /// Setting key (e.g. "mode", "pomodoro.work_secs")
        key: String,
    },
    /// Set a setting; out-of-range numbers are repaired before saving
    Set {
        /// Setting key
        key: String,
        /// New value
        value: String,
    },
    /// List every setting
    List {
        /// Print as JSON instead of `key = value` lines
        #[arg(long)]
        json: bool,
    },
    /// Reset settings to defaults
    Reset,
}

pub fn run(action: ConfigAction) -> CmdResult {
    match action {
        ConfigAction::Get { key } => {
            let settings = open_gateway().load();
            let value = settings
                .get(&key)
                .ok_or_else(|| StorageError::UnknownKey(key.clone()))?;
            println!("{value}");
        }
        ConfigAction::Set { key, value } => {
            let mut gateway = open_gateway();
            let mut settings = gateway.load();
            settings.apply(&key, &value)?;
            gateway.try_save(&settings)?;
            let stored = settings.get(&key).unwrap_or_default();
            if stored != value.trim() {
                tracing::info!(%key, given = %value, %stored, "value repaired");
            }
            println!("{key} = {stored}");
        }
        ConfigAction::List { json } => {
            let settings = open_gateway().load();
            if json {
                println!("{}", serde_json::to_string_pretty(&settings)?);
            } else {
                for (key, value) in settings.pairs() {
                    println!("{key} = {value}");
                }
            }
        }
        ConfigAction::Reset => {
            let mut gateway = open_gateway();
            gateway.clear()?;
            println!("{} settings reset to defaults", KEYS.len());
        }
    }
    Ok(())
}
