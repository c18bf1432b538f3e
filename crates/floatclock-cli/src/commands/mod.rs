pub mod config;
pub mod run;
pub mod status;

use floatclock_core::{SettingsGateway, TomlFileStore};

pub type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// Gateway over `settings.toml` in the data directory. An unreadable file
/// yields defaults; write failures show up on save.
pub fn open_gateway() -> SettingsGateway {
    let store = TomlFileStore::open_default();
    tracing::debug!(path = %store.path().display(), "opening settings");
    SettingsGateway::new(store)
}
