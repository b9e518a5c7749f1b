// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! File system watching for the dev loop.
//!
//! This module provides `FileWatcher` for monitoring the app directory and
//! triggering regeneration.
//!
//! # Features
//!
//! - Debounced file change events (750ms)
//! - Filters for Rust sources (`.rs`)
//! - Ignore globs from `[dev] ignore`
//! - Recursive directory watching

use std::path::{Path, PathBuf};
use std::time::Duration;

use globset::GlobSet;
use notify::{RecommendedWatcher, RecursiveMode};
use notify_debouncer_full::{new_debouncer, DebounceEventResult, Debouncer, RecommendedCache};

/// Debounce window for change events.
pub const DEBOUNCE: Duration = Duration::from_millis(750);

/// Watches a directory for changes to Rust source files.
///
/// Uses debouncing to prevent multiple rapid rebuilds and filters events
/// to only trigger on relevant files. Dropping the watcher stops it.
pub struct FileWatcher {
    _debouncer: Debouncer<RecommendedWatcher, RecommendedCache>,
}

impl FileWatcher {
    /// Creates a watcher for `path`, recursively.
    ///
    /// # Arguments
    ///
    /// * `path` - Directory to watch
    /// * `base_path` - Base path for computing relative paths
    /// * `ignore` - Paths (relative to `base_path`) to drop
    /// * `on_change` - Callback invoked with the relative paths of changed
    ///   `.rs` files
    pub fn new<F>(path: &Path, base_path: PathBuf, ignore: GlobSet, on_change: F) -> anyhow::Result<Self>
    where
        F: Fn(Vec<PathBuf>) + Send + 'static,
    {
        let mut debouncer = new_debouncer(DEBOUNCE, None, move |result: DebounceEventResult| {
            match result {
                Ok(events) => {
                    let mut changed: Vec<PathBuf> = events
                        .iter()
                        .flat_map(|e| e.paths.iter())
                        .map(|p| p.strip_prefix(&base_path).unwrap_or(p).to_path_buf())
                        .filter(|p| is_relevant(p, &ignore))
                        .collect();
                    changed.sort();
                    changed.dedup();

                    if !changed.is_empty() {
                        on_change(changed);
                    }
                }
                Err(errors) => {
                    for error in errors {
                        tracing::warn!("watch error: {}", error);
                    }
                }
            }
        })?;

        debouncer.watch(path, RecursiveMode::Recursive)?;
        tracing::debug!(path = %path.display(), "watching for changes");

        Ok(Self {
            _debouncer: debouncer,
        })
    }
}

/// Only `.rs` files outside the ignore set trigger a rebuild.
pub fn is_relevant(path: &Path, ignore: &GlobSet) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("rs") && !ignore.is_match(path)
}
