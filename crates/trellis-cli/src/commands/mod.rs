// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! CLI command implementations.
//!
//! This module contains the implementations for all trellis CLI commands:
//!
//! - `routes`: List discovered routes, middleware, pages and problems
//! - `validate`: Scan the app directory and report problems
//! - `generate`: Write `handlers.rs` and `routes.rs`
//! - `build`: Generate, then compile the project
//! - `dev`: Generate, run, and regenerate on changes

/// Production build command.
pub mod build;
/// Development loop command.
pub mod dev;
/// Code generation command.
pub mod generate;
/// Route listing command.
pub mod routes;
/// Validation command.
pub mod validate;

use std::path::Path;

use console::style;
use trellis::{GenerateResult, ScanResult};

use crate::config::Config;

/// Failures of a command that are not plain I/O or parse errors.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// `validate --strict` found duplicate routes.
    #[error("{0} route conflict(s) found")]
    Conflicts(usize),

    /// A cargo subprocess failed.
    #[error("`cargo {command}` failed with {status}")]
    Cargo {
        /// The cargo subcommand.
        command: String,
        /// Exit status description.
        status: String,
    },
}

/// Scans the configured app directory of `project_dir`.
pub fn scan_app(project_dir: &Path, config: &Config) -> anyhow::Result<ScanResult> {
    let app_dir = config.app_dir(project_dir);
    Ok(trellis::scan(&app_dir)?)
}

/// Scans the app directory and writes the generated files.
pub fn regenerate(project_dir: &Path, config: &Config) -> anyhow::Result<(ScanResult, GenerateResult)> {
    let result = scan_app(project_dir, config)?;
    let output_dir = config.output_dir(project_dir);
    let module_path = trellis::resolve_module_path(project_dir, &output_dir)?;
    let generated = trellis::generate(&result, &module_path, &output_dir)?;
    Ok((result, generated))
}

/// Prints scan warnings and conflicts, relative to `base`.
pub fn print_diagnostics(result: &ScanResult, base: &Path) {
    for warning in &result.warnings {
        let path = warning.path.strip_prefix(base).unwrap_or(&warning.path);
        let location = match warning.line {
            Some(line) => format!("{}:{}", path.display(), line),
            None => path.display().to_string(),
        };
        eprintln!(
            "  {} {} {}",
            style("warning").yellow().bold(),
            style(location).dim(),
            warning.message
        );
    }

    for conflict in &result.conflicts {
        let first = conflict.first.strip_prefix(base).unwrap_or(&conflict.first);
        let second = conflict.second.strip_prefix(base).unwrap_or(&conflict.second);
        eprintln!(
            "  {} {} {} defined in both {} and {} (keeping the first)",
            style("conflict").red().bold(),
            style(conflict.method).cyan(),
            conflict.pattern,
            first.display(),
            second.display()
        );
    }
}

/// One-line scan summary.
pub fn summary(result: &ScanResult) -> String {
    format!(
        "{} routes, {} pages, {} middleware, {} warnings, {} conflicts",
        result.handler_count(),
        result.pages.len(),
        result.middlewares.len(),
        result.warnings.len(),
        result.conflicts.len()
    )
}
