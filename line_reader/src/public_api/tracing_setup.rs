// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! The line reader owns the display while it runs (the terminal is in raw mode, and a
//! prompt is usually on screen). So logs normally go to a file. To log to the display
//! anyway, use [`DisplayPreference::OutputDevice`], so log lines are written through the
//! same lock as the prompt and the engine's output.

use crate::OutputDevice;
use std::{io::{self, Write},
          path::PathBuf,
          str::FromStr};
use tracing_core::LevelFilter;
use tracing_subscriber::{Layer, layer::SubscriberExt, registry::LookupSpan,
                         util::SubscriberInitExt};

/// Fields:
/// - `writers`: Vec<[`WriterArg`]> - Zero or more writers to use for tracing.
/// - `level`: [`tracing::Level`] - The log level to use for tracing.
/// - `tracing_log_file_path_and_prefix`: [String] - The file path to use for the log
///   file. Eg: `/tmp/stream_shell.log` or `stream_shell.log`.
/// - `preferred_display`: where [`WriterArg::Display`] writes to.
#[derive(Clone)]
#[allow(missing_debug_implementations)]
pub struct TracingConfig {
    pub writers: Vec<WriterArg>,
    pub level: tracing::Level,
    pub tracing_log_file_path_and_prefix: String,
    pub preferred_display: DisplayPreference,
}

impl TracingConfig {
    /// Log to a file only, at the debug level.
    #[must_use]
    pub fn new_file_only(tracing_log_file_path_and_prefix: impl Into<String>) -> Self {
        Self {
            writers: vec![WriterArg::File],
            level: tracing::Level::DEBUG,
            tracing_log_file_path_and_prefix: tracing_log_file_path_and_prefix.into(),
            preferred_display: DisplayPreference::Stderr,
        }
    }

    #[must_use]
    pub fn get_level_filter(&self) -> LevelFilter { LevelFilter::from_level(self.level) }
}

/// Use to parse the command line arguments (provided by `clap` crate).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WriterArg {
    Display,
    File,
    None,
}

/// The `clap` crate parses this into a string. This converts it into a [`WriterArg`].
impl FromStr for WriterArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "display" | "stdout" | "stderr" => Ok(WriterArg::Display),
            "file" => Ok(WriterArg::File),
            "none" | "" => Ok(WriterArg::None),
            _ => Err(format!("{s} is not a valid tracing writer")),
        }
    }
}

#[derive(Clone)]
#[allow(missing_debug_implementations)]
pub enum DisplayPreference {
    Stdout,
    Stderr,
    OutputDevice(OutputDevice),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WriterConfig {
    Display,
    File,
    DisplayAndFile,
}

type DynLayer<S> = dyn Layer<S> + Send + Sync + 'static;

impl WriterConfig {
    #[must_use]
    pub fn from_writers(writers: &[WriterArg]) -> Option<WriterConfig> {
        let contains_file_writer = writers.contains(&WriterArg::File);
        let contains_display_writer = writers.contains(&WriterArg::Display);
        match (contains_file_writer, contains_display_writer) {
            (true, true) => Some(WriterConfig::DisplayAndFile),
            (true, false) => Some(WriterConfig::File),
            (false, true) => Some(WriterConfig::Display),
            (false, false) => None,
        }
    }
}

/// Avoid gnarly type annotations by using a macro to create the `fmt` layer.
#[macro_export]
macro_rules! create_fmt {
    () => {
        tracing_subscriber::fmt::layer()
            .compact()
            .without_time()
            .with_thread_ids(true)
            .with_thread_names(false)
            .with_target(false)
            .with_file(false)
            .with_line_number(false)
            .with_ansi(true)
    };
}

/// Lets the `fmt` layer write through the [`OutputDevice`] lock.
struct OutputDeviceTracingWriter(OutputDevice);

impl Write for OutputDeviceTracingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> { self.0.lock().write(buf) }

    fn flush(&mut self) -> io::Result<()> { self.0.lock().flush() }
}

impl WriterConfig {
    /// This erases the concrete type of the writer, and returns a boxed layer. There's
    /// more info in the docs
    /// [here](https://docs.rs/tracing-subscriber/latest/tracing_subscriber/layer/index.html#runtime-configuration-with-layers).
    fn create_display_layer<S>(
        self,
        level_filter: LevelFilter,
        preferred_display: DisplayPreference,
    ) -> Option<Box<DynLayer<S>>>
    where
        S: tracing_core::Subscriber,
        for<'a> S: LookupSpan<'a>,
    {
        if self == WriterConfig::File {
            return None;
        }

        let fmt_layer = create_fmt!();
        match preferred_display {
            DisplayPreference::Stdout => Some(Box::new(
                fmt_layer.with_writer(io::stdout).with_filter(level_filter),
            )),
            DisplayPreference::Stderr => Some(Box::new(
                fmt_layer.with_writer(io::stderr).with_filter(level_filter),
            )),
            DisplayPreference::OutputDevice(output_device) => {
                let tracing_writer = move || -> Box<dyn Write> {
                    Box::new(OutputDeviceTracingWriter(output_device.clone()))
                };
                Some(Box::new(
                    fmt_layer
                        .with_ansi(false)
                        .with_writer(tracing_writer)
                        .with_filter(level_filter),
                ))
            }
        }
    }

    fn try_create_file_layer<S>(
        self,
        level_filter: LevelFilter,
        tracing_log_file_path_and_prefix: &str,
    ) -> miette::Result<Option<Box<DynLayer<S>>>>
    where
        S: tracing_core::Subscriber,
        for<'a> S: LookupSpan<'a>,
    {
        if self == WriterConfig::Display {
            return Ok(None);
        }

        let file = rolling_file_appender_impl::try_create(tracing_log_file_path_and_prefix)?;
        Ok(Some(Box::new(
            create_fmt!()
                .with_ansi(false)
                .with_writer(file)
                .with_filter(level_filter),
        )))
    }
}

/// Creates the layers, and installs them as the global default subscriber.
///
/// # Errors
///
/// If the log file can't be created.
pub fn init(tracing_config: TracingConfig) -> miette::Result<()> {
    if let Some(layers) = try_create_layers(&tracing_config)? {
        tracing_subscriber::registry().with(layers).init();
    }
    Ok(())
}

/// Returns the layers. Once you have the layers, you can run the following:
/// `tracing_subscriber::registry().with(layers).init()`. Returns `None` if no writers
/// are configured.
///
/// # Errors
///
/// If the log file can't be created.
pub fn try_create_layers(
    tracing_config: &TracingConfig,
) -> miette::Result<Option<Vec<Box<DynLayer<tracing_subscriber::Registry>>>>> {
    let Some(writer_config) = WriterConfig::from_writers(&tracing_config.writers) else {
        return Ok(None);
    };

    let level_filter = tracing_config.get_level_filter();

    let mut return_it: Vec<Box<DynLayer<tracing_subscriber::Registry>>> = vec![];

    // Needed if more layers are added that don't have a level filter of their own.
    return_it.push(Box::new(level_filter));

    if let Some(layer) = writer_config
        .create_display_layer(level_filter, tracing_config.preferred_display.clone())
    {
        return_it.push(layer);
    }

    if let Some(layer) = writer_config.try_create_file_layer(
        level_filter,
        &tracing_config.tracing_log_file_path_and_prefix,
    )? {
        return_it.push(layer);
    }

    Ok(Some(return_it))
}

mod rolling_file_appender_impl {
    use super::*;

    /// Note that if you wrap this up in a non blocking writer, as shown below, it doesn't
    /// work:
    ///
    /// ```ignore
    /// tracing_appender::non_blocking(try_create("foo")?);
    /// ```
    pub fn try_create(
        path_str: &str,
    ) -> miette::Result<tracing_appender::rolling::RollingFileAppender> {
        let path = PathBuf::from(&path_str);

        let parent = path.parent().ok_or_else(|| {
            miette::miette!(
                "Can't access current folder {}. It might not exist, or don't have required permissions.",
                path.display()
            )
        })?;

        let file_name = path.file_name().ok_or_else(|| {
            miette::miette!(
                "Can't access file name {}. It might not exist, or don't have required permissions.",
                path.display()
            )
        })?;

        Ok(tracing_appender::rolling::never(parent, file_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::OutputDeviceExt;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    #[test_case("stdout", WriterArg::Display)]
    #[test_case("display", WriterArg::Display)]
    #[test_case("file", WriterArg::File)]
    #[test_case("none", WriterArg::None)]
    #[test_case("", WriterArg::None)]
    fn test_writer_arg_from_str(input: &str, expected: WriterArg) {
        assert_eq!(WriterArg::from_str(input).unwrap(), expected);
    }

    #[test]
    fn test_invalid_writer_arg() {
        assert!(WriterArg::from_str("syslog").is_err());
    }

    #[test]
    fn test_writer_config_from_writers() {
        assert_eq!(WriterConfig::from_writers(&[]), None);
        assert_eq!(WriterConfig::from_writers(&[WriterArg::None]), None);
        assert_eq!(
            WriterConfig::from_writers(&[WriterArg::File]),
            Some(WriterConfig::File)
        );
        assert_eq!(
            WriterConfig::from_writers(&[WriterArg::Display, WriterArg::File]),
            Some(WriterConfig::DisplayAndFile)
        );
    }

    #[test]
    fn test_no_writers_no_layers() {
        let tracing_config = TracingConfig {
            writers: vec![],
            ..TracingConfig::new_file_only("unused.log")
        };
        assert!(try_create_layers(&tracing_config).unwrap().is_none());
    }

    #[test]
    fn test_display_and_file_layers() {
        let temp_dir = tempfile::tempdir().unwrap();
        let log_file = temp_dir.path().join("line_reader.log");
        let (output_device, _stdout_mock) = OutputDevice::new_mock();

        let tracing_config = TracingConfig {
            writers: vec![WriterArg::Display, WriterArg::File],
            level: tracing::Level::INFO,
            tracing_log_file_path_and_prefix: log_file.display().to_string(),
            preferred_display: DisplayPreference::OutputDevice(output_device),
        };

        let layers = try_create_layers(&tracing_config).unwrap().unwrap();
        // Level filter, display, and file.
        assert_eq!(layers.len(), 3);
    }

    #[test]
    fn test_log_file_without_name_is_an_error() {
        let tracing_config = TracingConfig::new_file_only("/");
        assert!(try_create_layers(&tracing_config).is_err());
    }
}
