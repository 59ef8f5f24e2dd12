//! Configuration management for the agenda application.
//!
//! Settings live in `config.json` inside the per-user data directory (see
//! [`DataStorage`]). A missing file means defaults. Two environment
//! variables take precedence over the file, which makes the tool easy to
//! point at a scratch database:
//!
//! - `AGENDA_DB`: SQLite database path
//! - `AGENDA_FILE`: Markdown agenda path
//!
//! `.env` files are loaded at startup, so either variable may also come
//! from there.
//!
//! ```rust,no_run
//! use agenda::libs::config::Config;
//!
//! let config = Config::read()?;
//! let db_path = config.database_file()?;
//! # Ok::<(), anyhow::Error>(())
//! ```

use super::data_storage::DataStorage;
use crate::libs::messages::Message;
use crate::msg_print;
use anyhow::Result;
use dialoguer::{theme::ColorfulTheme, Input};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "config.json";
pub const DB_FILE_NAME: &str = "agenda.db";
pub const AGENDA_FILE_NAME: &str = "agenda.md";

pub const DB_ENV: &str = "AGENDA_DB";
pub const AGENDA_FILE_ENV: &str = "AGENDA_FILE";

/// Date window used by `agenda render`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct RenderConfig {
    /// Days before today that are still rendered (overdue items).
    pub days_back: u32,
    /// Days after today that are rendered.
    pub days_ahead: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            days_back: 7,
            days_ahead: 30,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Config {
    /// Overrides the database location; defaults to the data directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_path: Option<PathBuf>,

    /// Agenda file used when `render` and `sync` get no path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agenda_path: Option<PathBuf>,

    #[serde(default)]
    pub render: RenderConfig,
}

fn env_path(name: &str) -> Option<PathBuf> {
    env::var(name).ok().filter(|v| !v.trim().is_empty()).map(PathBuf::from)
}

impl Config {
    pub fn path() -> Result<PathBuf> {
        DataStorage::new().get_path(CONFIG_FILE_NAME)
    }

    /// Reads `config.json` from the data directory, or defaults if absent.
    pub fn read() -> Result<Config> {
        Self::read_from(&Self::path()?)
    }

    pub fn read_from(path: &Path) -> Result<Config> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let config_str = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&config_str)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let config_file = File::create(path)?;
        serde_json::to_writer_pretty(&config_file, &self)?;
        Ok(())
    }

    /// Removes `config.json`. Returns whether there was one.
    pub fn delete() -> Result<bool> {
        let path = Self::path()?;
        if path.exists() {
            fs::remove_file(path)?;
            return Ok(true);
        }
        Ok(false)
    }

    /// Database path: `AGENDA_DB`, then `database_path`, then the data directory.
    pub fn database_file(&self) -> Result<PathBuf> {
        if let Some(path) = env_path(DB_ENV) {
            return Ok(path);
        }
        match &self.database_path {
            Some(path) => Ok(path.clone()),
            None => DataStorage::new().get_path(DB_FILE_NAME),
        }
    }

    /// Agenda path: `AGENDA_FILE`, then `agenda_path`, then the data directory.
    pub fn agenda_file(&self) -> Result<PathBuf> {
        if let Some(path) = env_path(AGENDA_FILE_ENV) {
            return Ok(path);
        }
        match &self.agenda_path {
            Some(path) => Ok(path.clone()),
            None => DataStorage::new().get_path(AGENDA_FILE_NAME),
        }
    }

    /// Interactive setup wizard, pre-filled with the current values.
    pub fn init() -> Result<Self> {
        let current = Self::read().unwrap_or_default();
        let theme = ColorfulTheme::default();

        msg_print!(Message::ConfigWizardHeader, true);

        let default_agenda = current.agenda_file()?.display().to_string();
        let agenda_path: String = Input::with_theme(&theme)
            .with_prompt(Message::PromptAgendaPath.to_string())
            .default(default_agenda)
            .interact_text()?;

        let default_db = current.database_file()?.display().to_string();
        let database_path: String = Input::with_theme(&theme)
            .with_prompt(Message::PromptDatabasePath.to_string())
            .default(default_db)
            .interact_text()?;

        let days_back: u32 = Input::with_theme(&theme)
            .with_prompt(Message::PromptDaysBack.to_string())
            .default(current.render.days_back)
            .interact_text()?;

        let days_ahead: u32 = Input::with_theme(&theme)
            .with_prompt(Message::PromptDaysAhead.to_string())
            .default(current.render.days_ahead)
            .interact_text()?;

        Ok(Config {
            database_path: Some(PathBuf::from(database_path)),
            agenda_path: Some(PathBuf::from(agenda_path)),
            render: RenderConfig { days_back, days_ahead },
        })
    }
}
