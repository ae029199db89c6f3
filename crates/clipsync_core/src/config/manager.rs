//! Config manager for loading, saving, and section-level updates.
//!
//! Writes go to a sibling temp file that is then renamed over the config, so
//! a crash mid-write never leaves a truncated file behind. Section updates go
//! through `toml_edit` so tables the user annotated by hand keep their
//! comments.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use toml_edit::{DocumentMut, Item};

use super::settings::{ConfigSection, Settings};

/// Errors that can occur during config operations.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("Failed to parse config for editing: {0}")]
    EditParseError(#[from] toml_edit::TomlError),

    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

impl ConfigError {
    /// Create an invalid value error.
    pub fn invalid(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.into(),
            message: message.into(),
        }
    }
}

/// Result type for config operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Owns the settings file and its in-memory copy.
pub struct ConfigManager {
    config_path: PathBuf,
    settings: Settings,
}

impl ConfigManager {
    /// Create a manager for `config_path`. Nothing is read until `load()` or
    /// `load_or_create()`.
    pub fn new(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
            settings: Settings::default(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// In-memory only until `save()` or `update_section()`.
    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    /// Load and validate an existing config file.
    pub fn load(&mut self) -> ConfigResult<()> {
        if !self.config_path.exists() {
            return Err(ConfigError::NotFound(self.config_path.clone()));
        }

        let content = fs::read_to_string(&self.config_path)?;
        let settings: Settings = toml::from_str(&content)?;
        settings.validate()?;
        self.settings = settings;
        Ok(())
    }

    /// Load the config, writing defaults first if the file is missing.
    ///
    /// A file missing some keys is rewritten with those keys filled in.
    pub fn load_or_create(&mut self) -> ConfigResult<()> {
        if !self.config_path.exists() {
            tracing::info!("Creating default config at {}", self.config_path.display());
            self.settings = Settings::default();
            return self.save();
        }

        let content = fs::read_to_string(&self.config_path)?;
        let settings: Settings = toml::from_str(&content)?;
        settings.validate()?;

        let complete = toml::to_string_pretty(&settings)?;
        let needs_rewrite = !content.contains("[alignment]")
            || !content.contains("[logging]")
            || key_count(&content)? != key_count(&complete)?;

        self.settings = settings;
        if needs_rewrite {
            tracing::debug!("Filling in missing config keys");
            self.save()?;
        }
        Ok(())
    }

    /// Write the whole config.
    pub fn save(&self) -> ConfigResult<()> {
        self.settings.validate()?;
        let content = self.render()?;
        self.atomic_write(&content)?;
        Ok(())
    }

    /// Rewrite one table on disk from memory, leaving the rest of the file
    /// as it currently is on disk.
    pub fn update_section(&mut self, section: ConfigSection) -> ConfigResult<()> {
        let current = if self.config_path.exists() {
            fs::read_to_string(&self.config_path)?
        } else {
            String::new()
        };

        let mut doc: DocumentMut = current.parse()?;
        let table: DocumentMut = self.section_toml(section)?.parse()?;
        doc[section.table_name()] = Item::Table(table.as_table().clone());

        self.atomic_write(&doc.to_string())?;
        Ok(())
    }

    fn section_toml(&self, section: ConfigSection) -> ConfigResult<String> {
        Ok(match section {
            ConfigSection::Alignment => toml::to_string_pretty(&self.settings.alignment)?,
            ConfigSection::Logging => toml::to_string_pretty(&self.settings.logging)?,
        })
    }

    fn render(&self) -> ConfigResult<String> {
        let mut output = String::from("# clipsync configuration\n\n");

        for section in ConfigSection::all() {
            let comment = match section {
                ConfigSection::Alignment => "# Offset estimation between recordings",
                ConfigSection::Logging => "# Log output (RUST_LOG overrides level)",
            };
            output.push_str(comment);
            output.push('\n');
            output.push_str(&format!("[{}]\n", section.table_name()));
            output.push_str(&self.section_toml(section)?);
            output.push('\n');
        }

        Ok(output)
    }

    fn atomic_write(&self, content: &str) -> io::Result<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let temp_path = self.config_path.with_extension("toml.tmp");
        {
            let mut file = fs::File::create(&temp_path)?;
            file.write_all(content.as_bytes())?;
            file.sync_all()?;
        }

        fs::rename(&temp_path, &self.config_path)
    }
}

/// Number of leaf keys across all tables.
fn key_count(content: &str) -> ConfigResult<usize> {
    let doc: DocumentMut = content.parse()?;
    Ok(doc
        .iter()
        .map(|(_, item)| item.as_table().map(|t| t.len()).unwrap_or(1))
        .sum())
}
