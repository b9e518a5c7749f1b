// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Route listing command.

use std::path::Path;

use console::style;
use serde::Serialize;
use trellis::scanner::{Conflict, Warning};
use trellis::tree::route_order;
use trellis::{priority, Method, ScanResult};

use super::{print_diagnostics, scan_app, summary};
use crate::config::Config;

/// One row of the route listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteRow {
    /// HTTP method.
    pub method: Method,
    /// URL pattern.
    pub pattern: String,
    /// Precedence.
    pub priority: u8,
    /// `route` or `page`.
    pub kind: &'static str,
    /// File relative to the app directory.
    pub file: String,
}

/// Flattens a scan into rows, in mount order.
pub fn rows(result: &ScanResult) -> Vec<RouteRow> {
    let mut rows: Vec<RouteRow> = result
        .routes
        .iter()
        .flat_map(|file| {
            file.handlers.iter().map(move |handler| RouteRow {
                method: handler.method,
                pattern: file.file.pattern.clone(),
                priority: priority(&file.file.pattern),
                kind: "route",
                file: file.file.display_path(),
            })
        })
        .chain(result.pages.iter().map(|page| RouteRow {
            method: Method::Get,
            pattern: page.file.pattern.clone(),
            priority: priority(&page.file.pattern),
            kind: "page",
            file: page.file.display_path(),
        }))
        .collect();
    rows.sort_by(|a, b| {
        route_order(
            (a.priority, a.pattern.as_str(), a.method),
            (b.priority, b.pattern.as_str(), b.method),
        )
    });
    rows
}

/// Machine-readable listing printed by `routes --json`.
#[derive(Debug, Serialize)]
pub struct Listing<'a> {
    /// Routes in mount order.
    pub routes: Vec<RouteRow>,
    /// Scan warnings.
    pub warnings: &'a [Warning],
    /// Duplicate routes.
    pub conflicts: &'a [Conflict],
}

impl<'a> Listing<'a> {
    /// Builds the listing for a scan.
    pub fn new(result: &'a ScanResult) -> Self {
        Self {
            routes: rows(result),
            warnings: &result.warnings,
            conflicts: &result.conflicts,
        }
    }
}

/// Runs the routes command.
pub fn run(json: bool) -> anyhow::Result<()> {
    let project_dir = std::env::current_dir()?;
    let config = Config::load_from(&project_dir)?;
    let result = scan_app(&project_dir, &config)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&Listing::new(&result))?);
        return Ok(());
    }

    print_listing(&result, &project_dir);
    Ok(())
}

fn print_listing(result: &ScanResult, project_dir: &Path) {
    println!("{}", style("Routes").cyan().bold());
    for row in rows(result) {
        println!(
            "  {:<8} {:<40} {:>3}  {:<5} {}",
            style(row.method).green(),
            row.pattern,
            row.priority,
            row.kind,
            style(row.file).dim()
        );
    }

    if !result.middlewares.is_empty() {
        println!();
        println!("{}", style("Middleware").cyan().bold());
        let mut middlewares: Vec<_> = result.middlewares.iter().collect();
        middlewares.sort_by(|a, b| (&a.file.pattern, &a.file.scope).cmp(&(&b.file.pattern, &b.file.scope)));
        for mw in middlewares {
            let scope = if mw.file.scope.is_empty() { "(root)" } else { mw.file.scope.as_str() };
            println!(
                "  {:<40} {:<30} {}",
                mw.file.pattern,
                scope,
                style(mw.file.display_path()).dim()
            );
        }
    }

    if !result.layouts.is_empty() || !result.loaders.is_empty() {
        println!();
        println!("{}", style("Layouts & loaders").cyan().bold());
        for file in result.layouts.iter().chain(result.loaders.iter()) {
            println!(
                "  {:<40} {}",
                file.function.name,
                style(file.file.display_path()).dim()
            );
        }
    }

    if let Some(proxy) = &result.proxy {
        println!();
        println!("{} {}", style("Proxy").cyan().bold(), style(proxy.file.display_path()).dim());
    }

    if !result.is_clean() {
        println!();
        print_diagnostics(result, project_dir);
    }

    println!();
    println!("{}", style(summary(result)).dim());
}
