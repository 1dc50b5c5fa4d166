// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use crate::{BusyReadPolicy, Keymap};
use dirs::config_dir;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use std::{fmt::{Display, Formatter, Result as FmtResult},
          fs,
          io,
          path::{Path, PathBuf}};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigPaths {
    TopLevelFolderName,
    ConfigFile,
}

impl Display for ConfigPaths {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let path = match self {
            ConfigPaths::TopLevelFolderName => "r3bl-line-reader",
            ConfigPaths::ConfigFile => "config.json",
        };
        write!(f, "{path}")
    }
}

/// Everything about the line reader that can be changed without recompiling. Every field
/// has a default, so a config file only needs to list what it overrides.
///
/// ```json
/// {
///   "prompt": "stream-shell> ",
///   "busy_read_policy": "supersede",
///   "keymap": { "clear_screen": ["ctrl+l"] }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineReaderConfig {
    /// Used when [`crate::LineReader::begin_read()`] is called without a prompt.
    pub prompt: String,
    /// Written once, when the [`crate::TerminalSession`] starts.
    pub welcome_message: Option<String>,
    pub busy_read_policy: BusyReadPolicy,
    /// Write a bare `\n` as `\r\n`. See [`crate::EolConvertingWriter`].
    pub convert_eol: bool,
    pub keymap: Keymap,
}

impl Default for LineReaderConfig {
    fn default() -> Self {
        Self {
            prompt: "> ".to_string(),
            welcome_message: None,
            busy_read_policy: BusyReadPolicy::default(),
            convert_eol: true,
            keymap: Keymap::default(),
        }
    }
}

#[derive(Debug, thiserror::Error, Diagnostic)]
pub enum ConfigError {
    #[error("📂 Could not read config file: {path}")]
    #[diagnostic(
        code(line_reader::config::read),
        help("Make sure the file exists, and that you have permission to read it.")
    )]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("📝 Could not parse config file: {path}")]
    #[diagnostic(
        code(line_reader::config::parse),
        help("The file must be a JSON object. Any field that is left out gets its default.")
    )]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("⌨️ Invalid key chord {chord:?}: {reason}")]
    #[diagnostic(
        code(line_reader::config::key_chord),
        help("Use modifiers (ctrl, alt, shift, meta) and a key joined by `+`, eg: `ctrl+c`, `meta+backspace`.")
    )]
    InvalidKeyChord { chord: String, reason: String },
}

/// This is where the config folder is.
#[must_use]
pub fn try_get_config_folder_path() -> Option<PathBuf> {
    let home_config_folder_path = config_dir()?;
    Some(home_config_folder_path.join(ConfigPaths::TopLevelFolderName.to_string()))
}

/// This is where the config file is.
#[must_use]
pub fn try_get_config_file_path() -> Option<PathBuf> {
    try_get_config_folder_path().map(|it| it.join(ConfigPaths::ConfigFile.to_string()))
}

impl LineReaderConfig {
    /// # Errors
    ///
    /// If the file can't be read or isn't valid JSON for this struct.
    pub fn try_load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Loads the config file from the user's config folder. A missing file (or config
    /// folder) isn't an error, the defaults are used instead.
    ///
    /// # Errors
    ///
    /// If the file exists, but can't be read or parsed.
    pub fn load_or_default() -> Result<Self, ConfigError> {
        let Some(config_file_path) = try_get_config_file_path() else {
            tracing::debug!(message = "No config folder, using defaults.");
            return Ok(Self::default());
        };

        if !config_file_path.exists() {
            // % is Display, ? is Debug.
            tracing::debug!(
                message = "No config file, using defaults.",
                config_file = ?config_file_path
            );
            return Ok(Self::default());
        }

        let it = Self::try_load_from(&config_file_path)?;
        tracing::debug!(
            message = "Loaded config file.",
            config_file = ?config_file_path,
            config = ?it
        );
        Ok(it)
    }

    /// # Errors
    ///
    /// If the parent folder can't be created, or the file can't be written.
    pub fn try_save_to(&self, path: &Path) -> miette::Result<()> {
        use miette::IntoDiagnostic;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).into_diagnostic()?;
        }
        let content = serde_json::to_string_pretty(self).into_diagnostic()?;
        fs::write(path, content).into_diagnostic()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::KeyChord;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_object_is_default() {
        let it: LineReaderConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(it, LineReaderConfig::default());
    }

    #[test]
    fn test_partial_override() {
        let json = r#"{
            "prompt": "stream-shell> ",
            "busy_read_policy": "supersede",
            "keymap": { "clear_screen": ["ctrl+l"] }
        }"#;
        let it: LineReaderConfig = serde_json::from_str(json).unwrap();

        assert_eq!(it.prompt, "stream-shell> ");
        assert_eq!(it.busy_read_policy, BusyReadPolicy::Supersede);
        assert_eq!(it.keymap.clear_screen, vec![KeyChord::ctrl('l')]);
        assert_eq!(it.keymap.interrupt, Keymap::default().interrupt);
        assert!(it.convert_eol);
    }

    #[test]
    fn test_invalid_chord_is_a_parse_error() {
        let json = r#"{ "keymap": { "interrupt": ["hyper+c"] } }"#;
        let result = serde_json::from_str::<LineReaderConfig>(json);
        assert!(result.is_err());
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("nested").join("config.json");

        let config = LineReaderConfig {
            welcome_message: Some("Welcome 🚀".to_string()),
            ..Default::default()
        };
        config.try_save_to(&path).unwrap();

        assert_eq!(LineReaderConfig::try_load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_load_errors() {
        let temp_dir = tempfile::tempdir().unwrap();

        let missing = temp_dir.path().join("missing.json");
        assert!(matches!(
            LineReaderConfig::try_load_from(&missing),
            Err(ConfigError::Read { .. })
        ));

        let garbage = temp_dir.path().join("garbage.json");
        fs::write(&garbage, "not json").unwrap();
        assert!(matches!(
            LineReaderConfig::try_load_from(&garbage),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_config_file_path() {
        if let Some(path) = try_get_config_file_path() {
            assert!(path.ends_with("r3bl-line-reader/config.json"));
        }
    }
}
