// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use crate::{CLIArg, ReplEngine};
use r3bl_line_reader::{InputDevice, LineReaderConfig, TerminalSession, TracingConfig,
                       tracing_setup};

pub const WELCOME_MESSAGE: &str = "🐑 stream-shell: try `echo hi`, `iota 5`, `iota`, or \
                                   `exit`. Ctrl+C interrupts, Ctrl+L clears the screen.";

/// Loads the config (the `--config` file, or the one in the user's config folder), and
/// applies the command line overrides on top of it.
///
/// # Errors
///
/// If the config file can't be read or parsed.
pub fn load_config(cli_arg: &CLIArg) -> miette::Result<LineReaderConfig> {
    let mut config = match &cli_arg.config {
        Some(path) => LineReaderConfig::try_load_from(path)?,
        None => LineReaderConfig::load_or_default()?,
    };

    if let Some(prompt) = &cli_arg.prompt {
        config.prompt.clone_from(prompt);
    }
    if config.welcome_message.is_none() {
        config.welcome_message = Some(WELCOME_MESSAGE.to_string());
    }

    Ok(config)
}

/// # Errors
///
/// - If logging or the config can't be set up.
/// - If stdin or stdout is not an interactive terminal.
/// - Whatever the engine returns.
pub async fn run_app(cli_arg: CLIArg) -> miette::Result<()> {
    if let Some(log_file) = &cli_arg.log_file {
        tracing_setup::init(TracingConfig::new_file_only(log_file.display().to_string()))?;
    }

    let config = load_config(&cli_arg)?;
    // % is Display, ? is Debug.
    tracing::debug!(message = "starting stream-shell", config = ?config);

    let Some(session) = TerminalSession::try_new_interactive(config)? else {
        return Err(miette::miette!(
            help = "Run stream-shell directly in a terminal, without piping its input or output.",
            "stream-shell needs an interactive terminal"
        ));
    };

    let result = session
        .run_engine(ReplEngine::default(), InputDevice::new_event_stream())
        .await;

    // Restore the terminal before miette prints any error.
    drop(session);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use r3bl_line_reader::BusyReadPolicy;
    use std::path::PathBuf;

    fn cli_arg(config: Option<PathBuf>, prompt: Option<&str>) -> CLIArg {
        CLIArg {
            prompt: prompt.map(ToString::to_string),
            config,
            log_file: None,
        }
    }

    #[test]
    fn test_load_config_with_overrides() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.json");
        std::fs::write(&path, r#"{ "prompt": "% ", "busy_read_policy": "supersede" }"#)
            .unwrap();

        let config = load_config(&cli_arg(Some(path.clone()), None)).unwrap();
        assert_eq!(config.prompt, "% ");
        assert_eq!(config.busy_read_policy, BusyReadPolicy::Supersede);
        assert_eq!(config.welcome_message.as_deref(), Some(WELCOME_MESSAGE));

        let config = load_config(&cli_arg(Some(path), Some("$ "))).unwrap();
        assert_eq!(config.prompt, "$ ");
    }

    #[test]
    fn test_load_config_missing_file_is_an_error() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("missing.json");
        assert!(load_config(&cli_arg(Some(path), None)).is_err());
    }
}
