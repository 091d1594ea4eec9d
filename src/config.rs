use std::path::PathBuf;

use anyhow::{Result, anyhow};
use chrono_tz::Tz;
use config::{Config, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub campus: CampusConfig,
    pub directory: DirectoryConfig,
    pub network: NetworkConfig,
    pub storage: StorageConfig,
    pub favorites: FavoritesConfig,
    pub comments: CommentsConfig,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct CampusConfig {
    /// IANA zone the posted hours are written in (e.g. "America/New_York").
    /// Falls back to the host's local zone when unset.
    pub timezone: Option<String>,
}

impl CampusConfig {
    pub fn tz(&self) -> Result<Option<Tz>> {
        self.timezone
            .as_deref()
            .map(|name| {
                name.parse::<Tz>()
                    .map_err(|e| anyhow!("Invalid campus timezone {name:?}: {e}"))
            })
            .transpose()
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct DirectoryConfig {
    /// Remote endpoint serving the buildings as a JSON array. When unset the
    /// local document store is used.
    pub api_url: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct NetworkConfig {
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 30,
            connect_timeout_secs: 10,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct FavoritesConfig {
    pub storage_key: String,
}

impl Default for FavoritesConfig {
    fn default() -> Self {
        Self {
            storage_key: "UVA_FAVORITE_BUILDINGS".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct CommentsConfig {
    pub default_user: String,
    pub max_length: usize,
}

impl Default for CommentsConfig {
    fn default() -> Self {
        Self {
            default_user: "Anonymous".to_string(),
            max_length: 500,
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("hoos-open")
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        // Load .env file (silently ignore if not present)
        let _ = dotenvy::dotenv();

        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("hoos-open");

        let builder = Config::builder()
            // 1. Load default values
            // Campus
            .set_default("campus.timezone", None::<String>)?
            // Directory
            .set_default("directory.api_url", None::<String>)?
            // Network
            .set_default("network.request_timeout_secs", 30)?
            .set_default("network.connect_timeout_secs", 10)?
            // Storage
            .set_default(
                "storage.data_dir",
                default_data_dir().to_string_lossy().into_owned(),
            )?
            // Favorites
            .set_default("favorites.storage_key", "UVA_FAVORITE_BUILDINGS")?
            // Comments
            .set_default("comments.default_user", "Anonymous")?
            .set_default("comments.max_length", 500)?

            // 2. Load from local config file (optional, lowest priority)
            .add_source(File::from(PathBuf::from("config.toml")).required(false))

            // 3. Load from user config directory (optional, overrides local)
            .add_source(File::from(config_dir.join("config.toml")).required(false))

            // 4. Load from Environment variables (HOOS__CAMPUS__TIMEZONE=...)
            .add_source(Environment::with_prefix("HOOS").separator("__"));

        let s = builder.build()?;
        Ok(s.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== Default Value Tests ====================

    #[test]
    fn test_network_config_defaults() {
        let config = NetworkConfig::default();
        assert_eq!(config.request_timeout_secs, 30);
        assert_eq!(config.connect_timeout_secs, 10);
    }

    #[test]
    fn test_favorites_config_defaults() {
        let config = FavoritesConfig::default();
        assert_eq!(config.storage_key, "UVA_FAVORITE_BUILDINGS");
    }

    #[test]
    fn test_comments_config_defaults() {
        let config = CommentsConfig::default();
        assert_eq!(config.default_user, "Anonymous");
        assert_eq!(config.max_length, 500);
    }

    #[test]
    fn test_storage_config_default_dir() {
        let config = StorageConfig::default();
        assert!(config.data_dir.ends_with("hoos-open"));
    }

    // ==================== Timezone Tests ====================

    #[test]
    fn test_campus_tz_unset() {
        let campus = CampusConfig::default();
        assert!(campus.tz().unwrap().is_none());
    }

    #[test]
    fn test_campus_tz_valid() {
        let campus = CampusConfig {
            timezone: Some("America/New_York".to_string()),
        };
        assert_eq!(campus.tz().unwrap(), Some(chrono_tz::America::New_York));
    }

    #[test]
    fn test_campus_tz_invalid() {
        let campus = CampusConfig {
            timezone: Some("Mars/Olympus_Mons".to_string()),
        };
        let err = campus.tz().unwrap_err();
        assert!(err.to_string().contains("Mars/Olympus_Mons"));
    }

    // ==================== Config Loading Tests ====================

    #[test]
    fn test_config_load_with_defaults() {
        let result = AppConfig::load();
        assert!(result.is_ok(), "{:?}", result.err());
    }

    #[test]
    fn test_loaded_config_has_expected_structure() {
        let config = AppConfig::load().expect("Config should load");

        assert!(config.network.request_timeout_secs > 0);
        assert!(!config.favorites.storage_key.is_empty());
        assert!(config.comments.max_length > 0);
        assert!(!config.storage.data_dir.as_os_str().is_empty());
    }

    // ==================== Environment Variable Override Tests ====================

    /// Helper to safely set and remove environment variables in tests.
    fn with_env_vars<F, R>(vars: &[(&str, &str)], f: F) -> R
    where
        F: FnOnce() -> R,
    {
        // SAFETY: Test environment, each test uses its own keys
        for (key, value) in vars {
            unsafe {
                std::env::set_var(key, value);
            }
        }
        let result = f();
        for (key, _) in vars {
            unsafe {
                std::env::remove_var(key);
            }
        }
        result
    }

    #[test]
    fn test_env_var_overrides_timezone() {
        let config = with_env_vars(&[("HOOS__CAMPUS__TIMEZONE", "America/Chicago")], || {
            AppConfig::load().expect("Config should load")
        });

        assert_eq!(config.campus.timezone.as_deref(), Some("America/Chicago"));
    }

    #[test]
    fn test_env_var_overrides_comments() {
        let vars = [
            ("HOOS__COMMENTS__DEFAULT_USER", "Wahoo"),
            ("HOOS__COMMENTS__MAX_LENGTH", "42"),
        ];

        let config = with_env_vars(&vars, || AppConfig::load().expect("Config should load"));

        assert_eq!(config.comments.default_user, "Wahoo");
        assert_eq!(config.comments.max_length, 42);
    }
}
