use crate::config::migrate::{missing_keys, migrate_config_file};
use crate::errors::{AppError, AppResult};
use crate::ui::messages::{info, success, warning};
use std::fs;
use std::path::Path;
use std::process::Command;

pub struct ConfigLogic;

impl ConfigLogic {
    pub fn print(path: &Path) -> AppResult<()> {
        let content = fs::read_to_string(path).map_err(|_| AppError::ConfigLoad)?;
        println!("{}", content);
        Ok(())
    }

    pub fn edit(path: &Path, editor: &Option<String>) -> AppResult<()> {
        let ed = editor
            .clone()
            .or_else(|| std::env::var("EDITOR").ok())
            .unwrap_or_else(|| {
                if cfg!(target_os = "windows") {
                    "notepad".into()
                } else {
                    "nano".into()
                }
            });

        let status = Command::new(&ed)
            .arg(path)
            .status()
            .map_err(|e| AppError::Config(format!("cannot launch '{}': {}", ed, e)))?;

        if !status.success() {
            return Err(AppError::Config(format!("editor '{}' exited with {}", ed, status)));
        }
        Ok(())
    }

    /// Report keys that the file lacks compared to the current defaults.
    pub fn check(path: &Path) -> AppResult<()> {
        if !path.exists() {
            warning(format!("No configuration file at {}", path.display()));
            return Ok(());
        }

        let missing = missing_keys(path)?;
        if missing.is_empty() {
            success("Configuration is complete.");
        } else {
            warning(format!("Missing keys: {}", missing.join(", ")));
            info("Run `pomodash config --migrate` to add them with default values.");
        }
        Ok(())
    }

    pub fn migrate(path: &Path) -> AppResult<()> {
        if !path.exists() {
            warning(format!("No configuration file at {}", path.display()));
            return Ok(());
        }

        let added = migrate_config_file(path)?;
        if added.is_empty() {
            info("Configuration already up to date.");
        } else {
            success(format!("Added keys: {}", added.join(", ")));
        }
        Ok(())
    }
}
