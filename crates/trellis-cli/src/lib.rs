// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

// Warn on missing documentation for public items
#![warn(missing_docs)]

//! Trellis CLI library.
//!
//! This crate provides the command-line interface for trellis. It scans
//! the `app/` directory of a project, reports routes and problems, writes
//! the generated routing code and drives the dev loop.
//!
//! # Usage
//!
//! This crate is primarily used through the `trellis` binary:
//!
//! ```bash
//! trellis routes            # List routes in mount order
//! trellis validate --strict # Fail on duplicate routes
//! trellis generate          # Write handlers.rs and routes.rs
//! trellis build             # Generate, then cargo build
//! trellis dev               # Generate, run, regenerate on change
//! ```
//!
//! # Configuration
//!
//! Projects are configured via `trellis.toml` at the project root.

/// CLI commands (routes, validate, generate, build, dev).
pub mod commands;
/// Project configuration from `trellis.toml`.
pub mod config;
/// File system watching for the dev loop.
pub mod watcher;
