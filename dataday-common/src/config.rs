//! Configuration loading and root folder resolution
//!
//! The root folder holds the SQLite database and any future on-disk state.
//! Resolution priority order:
//! 1. Command-line argument (highest priority)
//! 2. `DATADAY_ROOT` environment variable
//! 3. TOML config file (`root_folder` key)
//! 4. OS-dependent compiled default (fallback)

use crate::{Error, Result};
use std::path::{Path, PathBuf};

/// Environment variable naming the root folder
pub const ROOT_ENV_VAR: &str = "DATADAY_ROOT";

/// Resolve the root folder from CLI argument, environment, config file, or default
pub fn resolve_root_folder(cli_arg: Option<&str>) -> PathBuf {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return PathBuf::from(path);
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(ROOT_ENV_VAR) {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }

    // Priority 3: TOML config file
    if let Ok(config_path) = find_config_file() {
        if let Ok(toml_content) = std::fs::read_to_string(&config_path) {
            if let Ok(config) = toml::from_str::<toml::Value>(&toml_content) {
                if let Some(root_folder) = config.get("root_folder").and_then(|v| v.as_str()) {
                    return PathBuf::from(root_folder);
                }
            }
        }
    }

    // Priority 4: OS-dependent compiled default
    default_root_folder()
}

/// Create the root folder if it does not exist
pub fn ensure_root_folder(root: &Path) -> Result<()> {
    if !root.exists() {
        std::fs::create_dir_all(root)?;
    }
    Ok(())
}

/// Path of the SQLite database within the root folder
pub fn database_path(root: &Path) -> PathBuf {
    root.join("dataday.db")
}

/// Get default configuration file path for the platform
fn find_config_file() -> Result<PathBuf> {
    if cfg!(target_os = "linux") {
        // Try ~/.config/dataday/config.toml first, then /etc/dataday/config.toml
        if let Some(path) = dirs::config_dir().map(|d| d.join("dataday").join("config.toml")) {
            if path.exists() {
                return Ok(path);
            }
        }
        let system_config = PathBuf::from("/etc/dataday/config.toml");
        if system_config.exists() {
            return Ok(system_config);
        }
        Err(Error::Config("No config file found".to_string()))
    } else {
        let path = dirs::config_dir()
            .map(|d| d.join("dataday").join("config.toml"))
            .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))?;
        if path.exists() {
            Ok(path)
        } else {
            Err(Error::Config(format!("Config file not found: {:?}", path)))
        }
    }
}

/// Get OS-dependent default root folder path
fn default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        dirs::data_local_dir()
            .map(|d| d.join("dataday"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/dataday"))
    } else if cfg!(target_os = "macos") {
        dirs::data_dir()
            .map(|d| d.join("dataday"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/dataday"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
            .map(|d| d.join("dataday"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\dataday"))
    } else {
        PathBuf::from("./dataday_data")
    }
}

/// HTTP bind configuration, loaded from the settings table
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    /// Load bind host and port from settings, falling back to defaults
    pub async fn load(db: &sqlx::SqlitePool) -> Result<Self> {
        let host: Option<String> =
            sqlx::query_scalar("SELECT value FROM settings WHERE key = 'http_bind_host'")
                .fetch_optional(db)
                .await?;
        let port: Option<String> =
            sqlx::query_scalar("SELECT value FROM settings WHERE key = 'http_bind_port'")
                .fetch_optional(db)
                .await?;

        let host = host.unwrap_or_else(|| "127.0.0.1".to_string());
        let port = port
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(crate::db::init::DEFAULT_HTTP_PORT);

        Ok(ServerConfig { host, port })
    }

    /// Bind address in `host:port` form
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_arg_takes_priority() {
        let root = resolve_root_folder(Some("/tmp/dataday-cli-test"));
        assert_eq!(root, PathBuf::from("/tmp/dataday-cli-test"));
    }

    #[test]
    fn test_default_root_is_nonempty() {
        let root = default_root_folder();
        assert!(!root.as_os_str().is_empty());
    }

    #[test]
    fn test_database_path_under_root() {
        let db = database_path(Path::new("/tmp/dd"));
        assert_eq!(db, PathBuf::from("/tmp/dd/dataday.db"));
    }
}
