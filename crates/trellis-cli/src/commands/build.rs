// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Build command: regenerate, then compile with cargo.

use std::process::Stdio;
use std::time::{Duration, Instant};

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::process::Command;

use super::{print_diagnostics, regenerate, CommandError};
use crate::config::Config;

/// Runs the build command.
pub async fn run(release: Option<bool>, quiet: bool) -> anyhow::Result<()> {
    let project_dir = std::env::current_dir()?;
    let config = Config::load_from(&project_dir)?;
    let release = release.unwrap_or(config.build.release);

    let (result, generated) = regenerate(&project_dir, &config)?;
    print_diagnostics(&result, &project_dir);
    if !quiet {
        println!(
            "{} {}: {} routes, {} file(s) written",
            style("Generated:").cyan(),
            style(&config.project.name).bold(),
            generated.route_count,
            generated.written.len()
        );
    }

    let mut args = vec!["build"];
    if release {
        args.push("--release");
    }

    let spinner = (!quiet).then(|| {
        let pb = ProgressBar::new_spinner();
        if let Ok(spinner_style) = ProgressStyle::default_spinner().template("  {spinner:.cyan} cargo {msg}") {
            pb.set_style(spinner_style);
        }
        pb.set_message(args.join(" "));
        pb.enable_steady_tick(Duration::from_millis(80));
        pb
    });

    let start = Instant::now();
    let output = Command::new("cargo")
        .args(&args)
        .current_dir(&project_dir)
        .stdout(Stdio::inherit())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    if !output.status.success() {
        eprint!("{}", String::from_utf8_lossy(&output.stderr));
        return Err(CommandError::Cargo {
            command: args.join(" "),
            status: output.status.to_string(),
        }
        .into());
    }

    if !quiet {
        println!(
            "  {} {} {}",
            style("✓").green(),
            style(format!("cargo {}", args.join(" "))).dim(),
            style(format!("{}ms", start.elapsed().as_millis())).dim()
        );
    }
    Ok(())
}
