use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub mod migrate;

pub const DEFAULT_WORK_MINUTES: i64 = 25;
pub const DEFAULT_BREAK_MINUTES: i64 = 5;
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 1000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: String,
    /// Identity used when neither `--user` nor `POMODASH_USER` is set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default = "default_work_minutes")]
    pub default_work_minutes: i64,
    #[serde(default = "default_break_minutes")]
    pub default_break_minutes: i64,
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    #[serde(default = "default_separator_char")]
    pub separator_char: String,
}

fn default_work_minutes() -> i64 {
    DEFAULT_WORK_MINUTES
}
fn default_break_minutes() -> i64 {
    DEFAULT_BREAK_MINUTES
}
fn default_tick_interval_ms() -> u64 {
    DEFAULT_TICK_INTERVAL_MS
}
fn default_separator_char() -> String {
    "-".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: Self::database_file().to_string_lossy().to_string(),
            user: None,
            default_work_minutes: default_work_minutes(),
            default_break_minutes: default_break_minutes(),
            tick_interval_ms: default_tick_interval_ms(),
            separator_char: default_separator_char(),
        }
    }
}

impl Config {
    /// Return the standard configuration directory depending on the platform
    pub fn config_dir() -> PathBuf {
        if cfg!(target_os = "windows") {
            let appdata = env::var("APPDATA").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(appdata).join("pomodash")
        } else {
            let home = dirs::home_dir()
                .or_else(|| env::var("HOME").ok().map(PathBuf::from))
                .unwrap_or_else(|| PathBuf::from("."));
            home.join(".pomodash")
        }
    }

    pub fn config_file() -> PathBuf {
        Self::config_dir().join("pomodash.conf")
    }

    pub fn database_file() -> PathBuf {
        Self::config_dir().join("pomodash.sqlite")
    }

    /// Load configuration from file, or return defaults if not found
    pub fn load() -> AppResult<Self> {
        Self::load_from(&Self::config_file())
    }

    pub fn load_from(path: &Path) -> AppResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).map_err(|_| AppError::ConfigLoad)?;
        let cfg = serde_yaml::from_str(&content)?;
        Ok(cfg)
    }

    pub fn save(&self) -> AppResult<()> {
        self.save_to(&Self::config_file())
    }

    pub fn save_to(&self, path: &Path) -> AppResult<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(|_| AppError::ConfigSave)?;
        }
        let yaml = serde_yaml::to_string(self)?;
        fs::write(path, yaml).map_err(|_| AppError::ConfigSave)?;
        Ok(())
    }

    /// Persist `user` (or remove it with `None`) in the config file, keeping
    /// every other value that is already on disk.
    pub fn set_user(user: Option<&str>) -> AppResult<()> {
        let path = Self::config_file();
        let mut on_disk = Self::load_from(&path)?;
        on_disk.user = user.map(str::to_string);
        on_disk.save_to(&path)
    }

    /// Create the config directory, write the config file (unless testing)
    /// and make sure the database file exists. Returns the database path.
    pub fn init_all(custom_db: Option<&str>, is_test: bool) -> AppResult<PathBuf> {
        let dir = Self::config_dir();
        fs::create_dir_all(&dir)?;

        let db_path = match custom_db {
            Some(name) => {
                let p = Path::new(name);
                if p.is_absolute() {
                    p.to_path_buf()
                } else {
                    dir.join(p)
                }
            }
            None => Self::database_file(),
        };

        if !is_test {
            let config = Config {
                database: db_path.to_string_lossy().to_string(),
                ..Config::default()
            };
            config.save()?;
        }

        if let Some(parent) = db_path.parent() {
            fs::create_dir_all(parent)?;
        }
        if !db_path.exists() {
            fs::File::create(&db_path)?;
        }

        Ok(db_path)
    }
}
