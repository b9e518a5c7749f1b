// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Validation command: scan and report without writing anything.

use std::path::Path;

use console::style;

use super::{print_diagnostics, scan_app, summary, CommandError};
use crate::config::Config;

/// Validates the project in `project_dir`.
///
/// Warnings never fail validation, and neither does an output directory
/// that cannot be imported. Conflicts fail it only when `strict`.
pub fn check(project_dir: &Path, config: &Config, strict: bool) -> anyhow::Result<()> {
    let result = scan_app(project_dir, config)?;
    print_diagnostics(&result, project_dir);

    // A bad module root only breaks generation.
    let output_dir = config.output_dir(project_dir);
    if let Err(err) = trellis::resolve_module_path(project_dir, &output_dir) {
        eprintln!("  {} {} (generation will fail)", style("warning").yellow().bold(), err);
    }

    if strict && !result.conflicts.is_empty() {
        return Err(CommandError::Conflicts(result.conflicts.len()).into());
    }

    println!("{} {}", style("✓").green(), summary(&result));
    Ok(())
}

/// Runs the validate command in the current directory.
pub fn run(strict: bool) -> anyhow::Result<()> {
    let project_dir = std::env::current_dir()?;
    let config = Config::load_from(&project_dir)?;
    check(&project_dir, &config, strict)
}
