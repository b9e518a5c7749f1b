// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Types produced by a directory scan.

use std::fmt;
use std::ops::Range;
use std::path::{Path, PathBuf};

use serde::Serialize;

use super::analyze::splice;
use crate::method::Method;
use crate::segment::{catch_all, scope_contains, Segment, SegmentKind};

/// The marker files the scanner recognises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MarkerKind {
    /// `route.rs`: one exported function per HTTP method.
    Route,
    /// `middleware.rs`: `pub fn middleware`.
    Middleware,
    /// `page.rs`: `pub fn page` or `pub fn <name>_page`.
    Page,
    /// `layout.rs`: `pub fn layout` or `pub fn <name>_layout`.
    Layout,
    /// `loader.rs`: `pub fn load`, run before the page in the same directory.
    Loader,
    /// `proxy.rs`: `pub fn proxy`, honoured at the app root only.
    Proxy,
}

impl MarkerKind {
    /// Every marker kind.
    pub const ALL: [MarkerKind; 6] = [
        MarkerKind::Route,
        MarkerKind::Middleware,
        MarkerKind::Page,
        MarkerKind::Layout,
        MarkerKind::Loader,
        MarkerKind::Proxy,
    ];

    /// The file name that marks this kind.
    pub fn file_name(&self) -> &'static str {
        match self {
            MarkerKind::Route => "route.rs",
            MarkerKind::Middleware => "middleware.rs",
            MarkerKind::Page => "page.rs",
            MarkerKind::Layout => "layout.rs",
            MarkerKind::Loader => "loader.rs",
            MarkerKind::Proxy => "proxy.rs",
        }
    }

    /// Looks up a marker kind by exact file name.
    pub fn from_file_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.file_name() == name)
    }
}

/// Where a marker file lives and what it maps to.
#[derive(Debug, Clone, Serialize)]
pub struct FileInfo {
    /// Absolute path of the file.
    pub path: PathBuf,
    /// Path relative to the app root.
    pub relative_path: PathBuf,
    /// Classified directory chain from the app root to the file.
    pub segments: Vec<Segment>,
    /// Public URL pattern (groups omitted).
    pub pattern: String,
    /// Raw segment chain, groups included.
    pub scope: String,
    /// Verbatim `use` items of the file.
    pub imports: Vec<String>,
}

impl FileInfo {
    /// Relative path with `/` separators, stable across platforms.
    pub fn display_path(&self) -> String {
        self.relative_path
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Name of the catch-all parameter and whether it is optional.
    pub fn catch_all_param(&self) -> Option<(&str, bool)> {
        catch_all(&self.segments)
            .map(|s| (s.name.as_str(), s.kind == SegmentKind::OptionalCatchAll))
    }
}

/// A function cut out of a marker file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Function {
    /// Function name as declared.
    pub name: String,
    /// Line of the function name (1-indexed).
    pub line: usize,
    /// Verbatim source of the whole item, attributes included.
    pub source: String,
    /// Byte range of the function name inside `source`.
    #[serde(skip)]
    pub name_range: Range<usize>,
}

impl Function {
    /// The source with the function renamed.
    pub fn renamed(&self, new_name: &str) -> String {
        splice(&self.source, &self.name_range, new_name)
    }
}

/// One HTTP method handler of a `route.rs` file.
#[derive(Debug, Clone, Serialize)]
pub struct Handler {
    /// Method the handler answers.
    pub method: Method,
    /// The extracted function.
    #[serde(flatten)]
    pub function: Function,
}

impl Handler {
    /// Function name as declared.
    pub fn name(&self) -> &str {
        &self.function.name
    }

    /// Verbatim function source.
    pub fn source(&self) -> &str {
        &self.function.source
    }
}

/// A `route.rs` file and the handlers it contributes.
#[derive(Debug, Clone, Serialize)]
pub struct RouteFile {
    /// Location and URL mapping.
    #[serde(flatten)]
    pub file: FileInfo,
    /// Accepted handlers, in method order. Handlers that lost a conflict are
    /// not listed.
    pub handlers: Vec<Handler>,
}

/// A marker file contributing a single function.
#[derive(Debug, Clone, Serialize)]
pub struct FunctionFile {
    /// Location and URL mapping.
    #[serde(flatten)]
    pub file: FileInfo,
    /// The extracted function.
    pub function: Function,
}

/// A `middleware.rs` file.
pub type MiddlewareFile = FunctionFile;
/// A `page.rs` file.
pub type PageFile = FunctionFile;
/// A `layout.rs` file.
pub type LayoutFile = FunctionFile;
/// A `loader.rs` file.
pub type LoaderFile = FunctionFile;
/// The root `proxy.rs` file.
pub type ProxyFile = FunctionFile;

/// A non-fatal problem found while scanning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Warning {
    /// File or directory the warning is about.
    pub path: PathBuf,
    /// Line, when the warning points into a file.
    pub line: Option<usize>,
    /// Description.
    pub message: String,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "{}:{}: {}", self.path.display(), line, self.message),
            None => write!(f, "{}: {}", self.path.display(), self.message),
        }
    }
}

/// Two files claiming the same pattern and method.
///
/// The first file in scan order keeps the route; the second is reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Conflict {
    /// The contested URL pattern.
    pub pattern: String,
    /// The contested method.
    pub method: Method,
    /// File that was discovered first and keeps the route.
    pub first: PathBuf,
    /// File whose handler was not registered.
    pub second: PathBuf,
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} is defined in both {} and {} (keeping the first)",
            self.method,
            self.pattern,
            self.first.display(),
            self.second.display()
        )
    }
}

/// Aggregate output of one directory walk.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanResult {
    /// The scanned app directory.
    pub app_root: PathBuf,
    /// `route.rs` files with at least one accepted handler.
    pub routes: Vec<RouteFile>,
    /// `middleware.rs` files.
    pub middlewares: Vec<MiddlewareFile>,
    /// `page.rs` files.
    pub pages: Vec<PageFile>,
    /// `layout.rs` files.
    pub layouts: Vec<LayoutFile>,
    /// `loader.rs` files.
    pub loaders: Vec<LoaderFile>,
    /// The root `proxy.rs`, if present.
    pub proxy: Option<ProxyFile>,
    /// Non-fatal parse and signature problems.
    pub warnings: Vec<Warning>,
    /// Duplicate pattern and method claims.
    pub conflicts: Vec<Conflict>,
}

impl ScanResult {
    /// Creates an empty result for an app root.
    pub fn new(app_root: impl AsRef<Path>) -> Self {
        Self {
            app_root: app_root.as_ref().to_path_buf(),
            ..Self::default()
        }
    }

    /// Number of accepted route handlers across all files.
    pub fn handler_count(&self) -> usize {
        self.routes.iter().map(|r| r.handlers.len()).sum()
    }

    /// True when the scan produced no warnings and no conflicts.
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty() && self.conflicts.is_empty()
    }

    /// Layouts wrapping a page, outermost first.
    ///
    /// A layout applies when its scope contains the page's scope, so a
    /// layout inside `(admin)` never wraps pages of another group.
    pub fn layouts_for(&self, page: &FileInfo) -> Vec<&LayoutFile> {
        let mut layouts: Vec<&LayoutFile> = self
            .layouts
            .iter()
            .filter(|l| scope_contains(&l.file.scope, &page.scope))
            .collect();
        layouts.sort_by_key(|l| l.file.segments.len());
        layouts
    }

    /// The loader in the same directory as a page.
    pub fn loader_for(&self, page: &FileInfo) -> Option<&LoaderFile> {
        self.loaders.iter().find(|l| l.file.scope == page.scope)
    }
}
