//! Process-wide configuration: `.env` files and the persisted config file
//!
//! A [`ConfigLoader`] is built once per process and handed to whatever needs
//! credentials. Each source is read at most once, behind a [`OnceLock`], so
//! concurrent first calls from several workers are safe. `.env` files are
//! parsed into a map and never written into the process environment.

use super::keys::KeySources;
use crate::error::ConfigError;
use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, warn};

/// `.env` files looked up in the working directory, in priority order
pub const DOTENV_CANDIDATES: [&str; 3] = [".env", ".env.local", ".env.development"];

/// File name of the persisted config in the home directory
pub const CONFIG_FILE_NAME: &str = ".banana-l10n.toml";

#[derive(Debug)]
pub struct ConfigLoader {
    working_dir: PathBuf,
    config_path: Option<PathBuf>,
    /// Injected process environment; `None` reads the real one
    process_env: Option<HashMap<String, String>>,
    dotenv: OnceLock<HashMap<String, String>>,
    config: OnceLock<toml::Table>,
}

impl ConfigLoader {
    /// Loader for `working_dir` using `~/.banana-l10n.toml`
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        ConfigLoader {
            working_dir: working_dir.into(),
            config_path: dirs::home_dir().map(|home| home.join(CONFIG_FILE_NAME)),
            process_env: None,
            dotenv: OnceLock::new(),
            config: OnceLock::new(),
        }
    }

    pub fn with_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self.config = OnceLock::new();
        self
    }

    /// Use `env` instead of the real process environment
    pub fn with_process_env(mut self, env: HashMap<String, String>) -> Self {
        self.process_env = Some(env);
        self
    }

    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// Variables from the `.env` candidates; the first file defining a name wins
    pub fn dotenv(&self) -> &HashMap<String, String> {
        self.dotenv.get_or_init(|| load_dotenv_files(&self.working_dir))
    }

    /// The persisted config, or an empty table when there is no file
    pub fn config(&self) -> Result<&toml::Table, ConfigError> {
        if let Some(table) = self.config.get() {
            return Ok(table);
        }
        let table = match &self.config_path {
            Some(path) => read_config_file(path)?,
            None => toml::Table::new(),
        };
        Ok(self.config.get_or_init(|| table))
    }

    /// Environment with `.env` values filled in underneath the process ones
    pub fn environment(&self) -> HashMap<String, String> {
        let mut env = self.dotenv().clone();
        match &self.process_env {
            Some(process) => env.extend(process.clone()),
            None => env.extend(utf8_vars(std::env::vars_os())),
        }
        env
    }

    /// Sources for [`resolve_provider_api_key`](super::resolve_provider_api_key)
    pub fn key_sources(&self) -> Result<KeySources, ConfigError> {
        Ok(KeySources {
            overrides: HashMap::new(),
            env: self.environment(),
            config: self.config()?.clone(),
        })
    }

    /// Write one dotted key into the persisted config file
    ///
    /// Other keys in the file are kept. The in-memory copy is dropped so the
    /// next read sees the new value.
    pub fn save_value(&mut self, key_path: &str, value: &str) -> Result<(), ConfigError> {
        let Some(path) = self.config_path.clone() else {
            return Err(ConfigError::Io {
                path: CONFIG_FILE_NAME.to_string(),
                source: std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "no home directory for the config file",
                ),
            });
        };

        let mut table = read_config_file(&path)?;
        set_dotted(&mut table, key_path, toml::Value::String(value.to_string()))?;
        let text = toml::to_string_pretty(&table)?;

        let io_error = |source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_error)?;
        }
        std::fs::write(&path, text).map_err(io_error)?;

        debug!(path = %path.display(), key = key_path, "Saved config value");
        self.config = OnceLock::new();
        Ok(())
    }
}

/// Variables whose name and value are both valid UTF-8; the rest are skipped
fn utf8_vars(
    vars: impl IntoIterator<Item = (OsString, OsString)>,
) -> impl Iterator<Item = (String, String)> {
    vars.into_iter().filter_map(|(name, value)| {
        match (name.into_string(), value.into_string()) {
            (Ok(name), Ok(value)) => Some((name, value)),
            (Err(name), _) => {
                debug!(name = ?name, "Skipping non UTF-8 environment variable");
                None
            }
            (Ok(name), Err(_)) => {
                debug!(name = %name, "Skipping environment variable with non UTF-8 value");
                None
            }
        }
    })
}

fn load_dotenv_files(working_dir: &Path) -> HashMap<String, String> {
    let mut values = HashMap::new();

    for candidate in DOTENV_CANDIDATES {
        let path = working_dir.join(candidate);
        if !path.is_file() {
            continue;
        }
        match dotenvy::from_path_iter(&path) {
            Ok(iter) => {
                for item in iter {
                    match item {
                        Ok((name, value)) => {
                            values.entry(name).or_insert(value);
                        }
                        Err(error) => {
                            warn!(path = %path.display(), error = %error, "Skipping bad .env line")
                        }
                    }
                }
                debug!(path = %path.display(), "Loaded .env file");
            }
            Err(error) => warn!(path = %path.display(), error = %error, "Failed to read .env file"),
        }
    }

    values
}

fn read_config_file(path: &Path) -> Result<toml::Table, ConfigError> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
            return Ok(toml::Table::new());
        }
        Err(source) => {
            return Err(ConfigError::Io {
                path: path.display().to_string(),
                source,
            });
        }
    };

    text.parse::<toml::Table>().map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })
}

/// Value at a dotted key path (`llm.groqApiKey`)
pub fn lookup_dotted<'a>(table: &'a toml::Table, key_path: &str) -> Option<&'a toml::Value> {
    let mut segments = key_path.split('.');
    let first = segments.next()?;
    let mut current = table.get(first)?;
    for segment in segments {
        current = current.as_table()?.get(segment)?;
    }
    Some(current)
}

/// Set a dotted key path, creating intermediate tables
pub fn set_dotted(
    table: &mut toml::Table,
    key_path: &str,
    value: toml::Value,
) -> Result<(), ConfigError> {
    let segments: Vec<&str> = key_path.split('.').collect();
    let Some((last, parents)) = segments.split_last() else {
        return Err(ConfigError::KeyConflict(key_path.to_string()));
    };

    let mut current = table;
    for segment in parents {
        let entry = current
            .entry(segment.to_string())
            .or_insert_with(|| toml::Value::Table(toml::Table::new()));
        current = entry
            .as_table_mut()
            .ok_or_else(|| ConfigError::KeyConflict(key_path.to_string()))?;
    }
    current.insert(last.to_string(), value);
    Ok(())
}
