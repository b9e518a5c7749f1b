// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

// Warn on missing documentation for public items
#![warn(missing_docs)]

//! # Trellis
//!
//! File-system routing for Rust web applications.
//!
//! An `app/` directory laid out with bracket (`[id]`, `[...slug]`, `(group)`)
//! or legacy underscore (`_id`, `__slug`, `_group_admin`) conventions is
//! compiled into a routing table and into generated Rust source.
//!
//! ## Pipeline
//!
//! - [`segment`] classifies directory names into typed segments
//! - [`scanner`] walks the tree and statically extracts handlers from
//!   `route.rs`, `middleware.rs`, `page.rs`, `layout.rs`, `loader.rs` and
//!   `proxy.rs` without executing them
//! - [`codegen`] renders the scan into `handlers.rs` and `routes.rs`
//! - [`tree::RouteTree`] holds the registered routes, orders them by
//!   priority, resolves scope-aware middleware chains and mounts them onto
//!   the [`mux::Mux`]
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use trellis::{Mux, RouteTree};
//!
//! mod generated {
//!     pub mod handlers;
//!     pub mod routes;
//! }
//!
//! let mut tree = RouteTree::new();
//! generated::routes::register(&mut tree);
//!
//! let mut mux = Mux::new();
//! tree.mount(&mut mux, &[]);
//! trellis::serve::serve("127.0.0.1:3000", mux).await?;
//! ```

/// Generated source for handlers and route registration.
pub mod codegen;
/// Per-request context and response types.
pub mod context;
/// Handler error type.
pub mod error;
/// Handler, middleware and proxy function types.
pub mod handler;
/// HTTP methods recognised by the router.
pub mod method;
/// matchit-backed path router and request dispatch.
pub mod mux;
/// Directory scanning and static handler extraction.
pub mod scanner;
/// Directory-name segment classification.
pub mod segment;
/// Route table with priority ordering and scoped middleware.
pub mod tree;

/// axum adapter for serving a mounted [`Mux`].
#[cfg(feature = "server")]
pub mod serve;

pub use codegen::{generate, resolve_module_path, GenerateError, GenerateResult};
pub use context::{Context, Html, ProxyAction, Request, Response};
pub use error::{Error, Result};
pub use handler::{compose, handler, middleware, Handler, Middleware, Next, Proxy};
pub use method::Method;
pub use mux::{MountError, MountReport, Mux, PathRouter};
pub use scanner::{scan, ScanError, ScanResult, Scanner};
pub use segment::{Segment, SegmentKind};
pub use tree::{priority, Page, Route, RouteConflict, RouteTree};

/// Everything a handler file in `app/` usually needs.
///
/// ```rust,ignore
/// use trellis::prelude::*;
///
/// pub fn get(ctx: &mut Context) -> Result<()> {
///     let id = ctx.param("id").unwrap_or_default().to_string();
///     ctx.text(200, format!("user {id}"));
///     Ok(())
/// }
/// ```
pub mod prelude {
    pub use crate::context::{Context, Html, ProxyAction, Response};
    pub use crate::error::{Error, Result};
    pub use crate::handler::Next;
    pub use crate::method::Method;
}
