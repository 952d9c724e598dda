//! One run of the tool: expand every list, then write the results.
//!
//! The write phase is refused outright when expansion reported any error, so
//! an incomplete membership set never replaces a correct one.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use clap::ValueEnum;
use strum_macros::Display;
use tracing::{error, info};

use crate::command::CommandRunner;
use crate::config::{Config, DEFAULT_CONFIG_PATH};
use crate::converge::Writer;
use crate::error::AclError;
use crate::expand::Expander;
use crate::sources::SourceRegistry;
use crate::types::{AeuList, ExpandedList};

/// How `--show-lists` renders expanded lists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Display)]
#[strum(serialize_all = "lowercase")]
pub enum OutputFormat {
    /// `name: a,b,c`, one list per line
    #[default]
    Text,
    /// A JSON array of `{name, description, members}`
    Json,
}

/// Options for a single run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    pub config_path: PathBuf,
    /// Expand only; never touch destinations.
    pub no_targets: bool,
    /// Log the configured lists and print the expanded ones.
    pub show_lists: bool,
    pub format: OutputFormat,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
            no_targets: false,
            show_lists: false,
            format: OutputFormat::default(),
        }
    }
}

/// The outcome of a run that got past configuration loading.
#[derive(Debug, Default)]
pub struct RunReport {
    pub lists: Vec<ExpandedList>,
    pub expand_errors: Vec<AclError>,
    pub write_errors: Vec<AclError>,
    /// False when the write phase was skipped or refused.
    pub wrote: bool,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.expand_errors.is_empty() && self.write_errors.is_empty()
    }

    pub fn errors(&self) -> impl Iterator<Item = &AclError> {
        self.expand_errors.iter().chain(self.write_errors.iter())
    }
}

/// Expansion and writing wired to a fixed set of adapters.
#[derive(Clone)]
pub struct Driver {
    expander: Expander,
    writer: Writer,
}

impl Driver {
    pub fn new(registry: SourceRegistry, writer: Writer) -> Self {
        Self {
            expander: Expander::new(registry),
            writer,
        }
    }

    pub fn from_config(config: &Config, runner: Arc<dyn CommandRunner>) -> Self {
        Self::new(config.source_registry(runner.clone()), config.writer(runner))
    }

    /// Expand `lists`, print them if asked, and write them unless told not
    /// to or expansion failed. Only a failure to print is returned as `Err`.
    pub fn run(
        &self,
        lists: &[AeuList],
        options: &RunOptions,
        out: &mut dyn Write,
    ) -> Result<RunReport, AclError> {
        if options.show_lists {
            for list in lists {
                info!(
                    event = "Run",
                    phase = "Configured",
                    list = %list.name,
                    description = %list.description
                );
            }
        }

        let (expanded, expand_errors) = self.expander.expand_all(lists);
        for e in &expand_errors {
            error!(event = "Run", phase = "Expand", error = %e);
        }
        info!(
            event = "Run",
            phase = "Expand",
            lists = expanded.len(),
            errors = expand_errors.len()
        );

        if options.show_lists {
            print_lists(&expanded, options.format, out)?;
        }

        let mut report = RunReport {
            lists: expanded,
            expand_errors,
            ..Default::default()
        };

        if options.no_targets {
            info!(event = "Run", phase = "Write", "skipping destinations (--no-targets)");
            return Ok(report);
        }
        if !report.expand_errors.is_empty() {
            error!(
                event = "Run",
                phase = "Write",
                errors = report.expand_errors.len(),
                "refusing to write destinations after expansion errors"
            );
            return Ok(report);
        }

        report.write_errors = self.writer.write_all(&report.lists);
        report.wrote = true;
        for e in &report.write_errors {
            error!(event = "Run", phase = "Write", error = %e);
        }
        info!(
            event = "Run",
            phase = "Write",
            errors = report.write_errors.len()
        );
        Ok(report)
    }
}

/// Load the configuration named by `options` and run against real commands.
pub fn run(
    options: &RunOptions,
    runner: Arc<dyn CommandRunner>,
    out: &mut dyn Write,
) -> Result<RunReport, AclError> {
    let config = Config::load(&options.config_path)?;
    Driver::from_config(&config, runner).run(&config.lists, options, out)
}

/// Render expanded lists. Members are always sorted.
pub fn print_lists(
    lists: &[ExpandedList],
    format: OutputFormat,
    out: &mut dyn Write,
) -> Result<(), AclError> {
    let stdout_error = |e: std::io::Error| AclError::io("<stdout>", e);
    match format {
        OutputFormat::Text => {
            for list in lists {
                writeln!(out, "{}: {}", list.name, list.built_list().join(","))
                    .map_err(stdout_error)?;
            }
        }
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, lists)
                .map_err(|e| stdout_error(e.into()))?;
            writeln!(out).map_err(stdout_error)?;
        }
    }
    Ok(())
}
