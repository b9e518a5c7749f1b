// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Code generation command.

use std::time::Instant;

use console::style;

use super::{print_diagnostics, regenerate, summary};
use crate::config::Config;

/// Runs the generate command in the current directory.
pub fn run(quiet: bool) -> anyhow::Result<()> {
    let project_dir = std::env::current_dir()?;
    let config = Config::load_from(&project_dir)?;

    let start = Instant::now();
    let (result, generated) = regenerate(&project_dir, &config)?;
    print_diagnostics(&result, &project_dir);

    if quiet {
        return Ok(());
    }

    if generated.written.is_empty() {
        println!("  {} {}", style("·").dim(), style("generated files are up to date").dim());
    }
    for path in &generated.written {
        let path = path.strip_prefix(&project_dir).unwrap_or(path);
        println!("  {} {}", style("✓").green(), path.display());
    }
    println!(
        "{} {}",
        style(summary(&result)).dim(),
        style(format!("{}ms", start.elapsed().as_millis())).dim()
    );
    Ok(())
}
