pub mod doctor;
pub mod init;
pub mod serve;

use std::path::PathBuf;
use threadrelay_config::AppConfig;

pub fn default_config_path() -> PathBuf {
    AppConfig::config_dir().join("config.toml")
}
