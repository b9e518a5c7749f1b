// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Development loop: generate, run the app, regenerate and restart on
//! changes.
//!
//! Change notifications from the watcher go through a channel to a single
//! rebuild loop. Notifications that pile up while a rebuild runs are
//! drained and merged into the next one, so at most one
//! regenerate-and-restart cycle is in flight.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use trellis::serve::{ADDR_ENV, STATIC_DIR_ENV};

use super::{print_diagnostics, regenerate};
use crate::config::Config;
use crate::watcher::FileWatcher;

/// Runs the development loop until interrupted.
pub async fn run(host: Option<String>, port: Option<u16>, quiet: bool) -> anyhow::Result<()> {
    let project_dir = std::env::current_dir()?;
    let mut config = Config::load_from(&project_dir)?;
    if let Some(host) = host {
        config.dev.host = host;
    }
    if let Some(port) = port {
        config.dev.port = port;
    }
    let app_dir = config.app_dir(&project_dir);
    let addr = config.dev_addr();

    let (result, _) = regenerate(&project_dir, &config)?;
    print_diagnostics(&result, &project_dir);

    let static_dir = config.static_dir(&project_dir);
    let mut child = Some(spawn_app(&project_dir, &addr, &static_dir)?);

    let (tx, mut rx) = mpsc::unbounded_channel::<Vec<PathBuf>>();
    let _watcher = FileWatcher::new(&app_dir, project_dir.clone(), config.ignore_set()?, move |paths| {
        let _ = tx.send(paths);
    })?;

    if !quiet {
        println!("{} {}", style("Project:").cyan(), style(&config.project.name).bold());
        println!(
            "{} {}",
            style("Server:").cyan(),
            style(format!("http://{}", addr)).green().bold()
        );
        println!(
            "{} {}",
            style("Status:").cyan(),
            style(format!("Watching {} for changes...", config.routing.app_dir)).dim()
        );
        println!();
    }

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            received = rx.recv() => {
                let Some(mut paths) = received else { break };
                while let Ok(more) = rx.try_recv() {
                    paths.extend(more);
                }
                paths.sort();
                paths.dedup();
                rebuild(&project_dir, &config, &addr, &static_dir, &mut child, &paths, quiet).await;
            }
        }
    }

    if let Some(mut child) = child {
        let _ = child.kill().await;
    }
    Ok(())
}

async fn rebuild(
    project_dir: &Path,
    config: &Config,
    addr: &str,
    static_dir: &Path,
    child: &mut Option<Child>,
    paths: &[PathBuf],
    quiet: bool,
) {
    let start = Instant::now();
    let display = paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ");

    let pb = if quiet {
        ProgressBar::hidden()
    } else {
        ProgressBar::new_spinner()
    };
    if let Ok(spinner_style) = ProgressStyle::default_spinner().template("  {spinner:.cyan} trellis {msg}") {
        pb.set_style(spinner_style);
    }
    pb.set_message(display.clone());
    pb.enable_steady_tick(Duration::from_millis(80));

    let generated = match regenerate(project_dir, config) {
        Ok((result, generated)) => {
            print_diagnostics(&result, project_dir);
            generated
        }
        Err(err) => {
            pb.finish_with_message(format!("{} {}", style("✗").red(), style(err).red()));
            return;
        }
    };

    if generated.written.is_empty() {
        pb.finish_with_message(format!(
            "{} {} {}",
            style("·").dim(),
            style(&display).dim(),
            style("unchanged").dim()
        ));
        return;
    }

    if let Some(mut old) = child.take() {
        if let Err(err) = old.kill().await {
            tracing::warn!("failed to stop app: {}", err);
        }
    }
    match spawn_app(project_dir, addr, static_dir) {
        Ok(new_child) => *child = Some(new_child),
        Err(err) => {
            pb.finish_with_message(format!("{} {}", style("✗").red(), style(err).red()));
            return;
        }
    }

    pb.finish_with_message(format!(
        "{} {} {}",
        style("✓").green(),
        style(&display).dim(),
        style(format!("{}ms", start.elapsed().as_millis())).dim()
    ));
}

fn spawn_app(project_dir: &Path, addr: &str, static_dir: &Path) -> anyhow::Result<Child> {
    tracing::debug!(addr, static_dir = %static_dir.display(), "starting cargo run");
    let child = Command::new("cargo")
        .arg("run")
        .current_dir(project_dir)
        .env(ADDR_ENV, addr)
        .env(STATIC_DIR_ENV, static_dir)
        .kill_on_drop(true)
        .spawn()?;
    Ok(child)
}
