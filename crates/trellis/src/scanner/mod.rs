// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Directory scanning for file-based routing.
//!
//! This module provides:
//! - A depth-first walk of the app directory with private-folder pruning
//! - Marker file discovery (`route.rs`, `middleware.rs`, `page.rs`,
//!   `layout.rs`, `loader.rs`, root `proxy.rs`)
//! - Static extraction of the exported functions each marker must provide
//! - Conflict detection on (pattern, method) pairs
//!
//! Directory entries are visited in file-name order, so discovery order is
//! the same on every run and on every platform. That order decides
//! conflicts: the first file to claim a pattern and method keeps it.

pub mod analyze;
pub mod types;

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use lazy_static::lazy_static;
use regex::Regex;
use walkdir::WalkDir;

use crate::method::Method;
use crate::segment::{build_scope, build_url_pattern, Segment};
use analyze::{check_signature, is_exported, Contract, SourceFile};
pub use types::{
    Conflict, FileInfo, Function, FunctionFile, Handler, LayoutFile, LoaderFile, MarkerKind,
    MiddlewareFile, PageFile, ProxyFile, RouteFile, ScanResult, Warning,
};

lazy_static! {
    static ref PAGE_FN: Regex = Regex::new(r"^(?:[a-z0-9_]+_)?page$").unwrap();
    static ref LAYOUT_FN: Regex = Regex::new(r"^(?:[a-z0-9_]+_)?layout$").unwrap();
}

/// Errors that stop a scan. Problems inside individual files are
/// [`Warning`]s instead.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// The app directory does not exist or is not a directory.
    #[error("App directory not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The app directory itself could not be read.
    #[error("Failed to read {}: {source}", path.display())]
    Walk {
        /// The directory that failed.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: walkdir::Error,
    },
}

/// Scans an app directory. Shorthand for `Scanner::new(root).scan()`.
pub fn scan(app_root: impl AsRef<Path>) -> Result<ScanResult, ScanError> {
    Scanner::new(app_root.as_ref()).scan()
}

/// Walks an app directory and extracts routable artifacts.
pub struct Scanner {
    root: PathBuf,
}

/// Mutable state of one walk.
struct ScanState {
    result: ScanResult,
    claims: HashMap<(String, Method), PathBuf>,
}

impl ScanState {
    fn warn(&mut self, path: &Path, line: Option<usize>, message: impl Into<String>) {
        let warning = Warning {
            path: path.to_path_buf(),
            line,
            message: message.into(),
        };
        tracing::warn!("{}", warning);
        self.result.warnings.push(warning);
    }

    /// Claims a pattern and method for `path`. Returns false, and records a
    /// conflict, when another file claimed it first.
    fn claim(&mut self, pattern: &str, method: Method, path: &Path) -> bool {
        let key = (pattern.to_string(), method);
        if let Some(first) = self.claims.get(&key) {
            let conflict = Conflict {
                pattern: pattern.to_string(),
                method,
                first: first.clone(),
                second: path.to_path_buf(),
            };
            tracing::warn!("{}", conflict);
            self.result.conflicts.push(conflict);
            return false;
        }
        self.claims.insert(key, path.to_path_buf());
        true
    }
}

impl Scanner {
    /// Creates a scanner for the given app directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The app directory being scanned.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Walks the app directory.
    ///
    /// # Errors
    ///
    /// Fails only when the app directory itself is missing or unreadable.
    /// Unparseable files, wrong signatures and duplicate routes are
    /// reported in the returned [`ScanResult`].
    pub fn scan(&self) -> Result<ScanResult, ScanError> {
        if !self.root.is_dir() {
            return Err(ScanError::NotFound(self.root.clone()));
        }

        let mut state = ScanState {
            result: ScanResult::new(&self.root),
            claims: HashMap::new(),
        };

        let mut walker = WalkDir::new(&self.root).sort_by_file_name().into_iter();
        while let Some(entry) = walker.next() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) if err.depth() == 0 => {
                    return Err(ScanError::Walk {
                        path: self.root.clone(),
                        source: err,
                    });
                }
                Err(err) => {
                    let path = err.path().unwrap_or(&self.root).to_path_buf();
                    state.warn(&path, None, format!("cannot read entry: {err}"));
                    continue;
                }
            };
            if entry.depth() == 0 {
                continue;
            }

            let name = entry.file_name().to_string_lossy().to_string();
            if entry.file_type().is_dir() {
                if Segment::is_private(&name) {
                    tracing::debug!(path = %entry.path().display(), "skipping private folder");
                    walker.skip_current_dir();
                } else if Segment::classify(&name).is_unroutable() {
                    state.warn(
                        entry.path(),
                        None,
                        "a directory named `*` cannot be matched literally, use `[...name]` for a catch-all; skipping",
                    );
                    walker.skip_current_dir();
                }
                continue;
            }

            if let Some(kind) = MarkerKind::from_file_name(&name) {
                self.scan_marker(kind, entry.path(), entry.depth(), &mut state);
            }
        }

        self.check_orphan_loaders(&mut state);

        // Every parse registers its text in proc-macro2's per-thread source
        // map. Nothing keeps a span past this point, so release the map
        // instead of letting it grow across rescans.
        proc_macro2::extra::invalidate_current_thread_spans();

        let result = state.result;
        tracing::info!(
            routes = result.handler_count(),
            middlewares = result.middlewares.len(),
            pages = result.pages.len(),
            warnings = result.warnings.len(),
            conflicts = result.conflicts.len(),
            "scanned {}",
            self.root.display()
        );
        Ok(result)
    }

    fn scan_marker(&self, kind: MarkerKind, path: &Path, depth: usize, state: &mut ScanState) {
        // Files directly inside the root have depth 1.
        if kind == MarkerKind::Proxy && depth > 1 {
            state.warn(path, None, "proxy.rs is only honoured at the app root, ignoring");
            return;
        }

        let relative_path = path.strip_prefix(&self.root).unwrap_or(path).to_path_buf();
        let segments: Vec<Segment> = relative_path
            .parent()
            .map(|dir| {
                dir.components()
                    .map(|c| Segment::classify(&c.as_os_str().to_string_lossy()))
                    .collect()
            })
            .unwrap_or_default();

        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) => {
                state.warn(path, None, format!("cannot read file: {err}"));
                return;
            }
        };
        let source = match SourceFile::parse(text) {
            Ok(source) => source,
            Err(failure) => {
                state.warn(
                    path,
                    Some(failure.line),
                    format!("parse error: {}", failure.message),
                );
                return;
            }
        };

        let file = FileInfo {
            path: path.to_path_buf(),
            pattern: build_url_pattern(&segments),
            scope: build_scope(&segments),
            imports: source.imports(),
            relative_path,
            segments,
        };
        tracing::debug!(
            kind = kind.file_name(),
            pattern = %file.pattern,
            scope = %file.scope,
            "found marker file"
        );

        match kind {
            MarkerKind::Route => self.collect_handlers(file, &source, state),
            MarkerKind::Middleware => {
                if let Some(found) = single(file, &source, "middleware", Contract::Middleware, state) {
                    state.result.middlewares.push(found);
                }
            }
            MarkerKind::Loader => {
                if let Some(found) = single(file, &source, "load", Contract::Loader, state) {
                    state.result.loaders.push(found);
                }
            }
            MarkerKind::Proxy => {
                if let Some(found) = single(file, &source, "proxy", Contract::Proxy, state) {
                    state.result.proxy = Some(found);
                }
            }
            MarkerKind::Page => {
                if let Some(found) = matching(file, &source, &PAGE_FN, Contract::Page, state) {
                    if state.claim(&found.file.pattern, Method::Get, &found.file.path) {
                        state.result.pages.push(found);
                    }
                }
            }
            MarkerKind::Layout => {
                if let Some(found) = matching(file, &source, &LAYOUT_FN, Contract::Layout, state) {
                    state.result.layouts.push(found);
                }
            }
        }
    }

    fn collect_handlers(&self, file: FileInfo, source: &SourceFile, state: &mut ScanState) {
        let mut handlers = Vec::new();
        let mut candidates = 0;

        for method in Method::ALL {
            let Some(item) = source.function(method.handler_name()) else {
                continue;
            };
            candidates += 1;
            let Some(function) = accept(&file.path, source, item, Contract::Handler, state) else {
                continue;
            };
            if state.claim(&file.pattern, method, &file.path) {
                handlers.push(Handler { method, function });
            }
        }

        if candidates == 0 {
            state.warn(
                &file.path,
                None,
                "route.rs defines no handler (expected `pub fn get`, `pub fn post`, ...)",
            );
        }
        if !handlers.is_empty() {
            state.result.routes.push(RouteFile { file, handlers });
        }
    }

    fn check_orphan_loaders(&self, state: &mut ScanState) {
        let orphans: Vec<PathBuf> = state
            .result
            .loaders
            .iter()
            .filter(|l| !state.result.pages.iter().any(|p| p.file.scope == l.file.scope))
            .map(|l| l.file.path.clone())
            .collect();
        for path in orphans {
            state.warn(&path, None, "loader.rs has no page.rs in the same directory");
        }
    }
}

/// Accepts an exported function that satisfies its contract.
fn accept(
    path: &Path,
    source: &SourceFile,
    item: &syn::ItemFn,
    contract: Contract,
    state: &mut ScanState,
) -> Option<Function> {
    let name = item.sig.ident.to_string();
    let line = item.sig.ident.span().start().line;
    if !is_exported(item) {
        state.warn(path, Some(line), format!("`{name}` is not exported (declare it `pub`), skipping"));
        return None;
    }
    if let Err(reason) = check_signature(item, contract) {
        state.warn(
            path,
            Some(line),
            format!("`{name}` skipped: {reason}; expected `{}`", contract.expected()),
        );
        return None;
    }
    Some(source.extract(item))
}

/// Extracts the one function a marker file must export under a fixed name.
fn single(
    file: FileInfo,
    source: &SourceFile,
    name: &str,
    contract: Contract,
    state: &mut ScanState,
) -> Option<FunctionFile> {
    let Some(item) = source.function(name) else {
        state.warn(&file.path, None, format!("expected `pub fn {name}`"));
        return None;
    };
    let function = accept(&file.path, source, item, contract, state)?;
    Some(FunctionFile { file, function })
}

/// Extracts the first conforming function whose name matches `pattern`.
fn matching(
    file: FileInfo,
    source: &SourceFile,
    pattern: &Regex,
    contract: Contract,
    state: &mut ScanState,
) -> Option<FunctionFile> {
    let mut found: Option<Function> = None;
    let mut matched_any = false;

    for item in source.functions() {
        let name = item.sig.ident.to_string();
        if !pattern.is_match(&name) {
            continue;
        }
        matched_any = true;
        let Some(function) = accept(&file.path, source, item, contract, state) else {
            continue;
        };
        match &found {
            None => found = Some(function),
            Some(first) => {
                let message = format!("`{}` ignored, `{}` already renders this file", function.name, first.name);
                state.warn(&file.path, Some(function.line), message);
            }
        }
    }

    if !matched_any {
        state.warn(&file.path, None, format!("no function matching `{}`", pattern.as_str()));
    }
    found.map(|function| FunctionFile { file, function })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const GET: &str = "use trellis::prelude::*;\n\npub fn get(ctx: &mut Context) -> Result<()> {\n    ctx.text(200, \"ok\");\n    Ok(())\n}\n";

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_missing_root_is_fatal() {
        let dir = tempdir().unwrap();
        let err = scan(dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, ScanError::NotFound(_)));
    }

    #[test]
    fn test_private_subtree_is_skipped() {
        let dir = tempdir().unwrap();
        write(dir.path(), "_components/route.rs", GET);
        write(dir.path(), "_components/nested/route.rs", GET);
        write(dir.path(), ".hidden/route.rs", GET);
        write(dir.path(), "about/route.rs", GET);

        let result = scan(dir.path()).unwrap();
        let patterns: Vec<_> = result.routes.iter().map(|r| r.file.pattern.as_str()).collect();
        assert_eq!(patterns, ["/about"]);
    }

    #[test]
    fn test_unexported_and_misshapen_handlers_warn() {
        let dir = tempdir().unwrap();
        write(
            dir.path(),
            "users/route.rs",
            "fn get(ctx: &mut Context) -> Result<()> { Ok(()) }\npub fn post(ctx: &mut Context) -> String { String::new() }\npub fn put(ctx: &mut Context) -> Result<()> { Ok(()) }\n",
        );

        let result = scan(dir.path()).unwrap();
        assert_eq!(result.handler_count(), 1);
        assert_eq!(result.routes[0].handlers[0].method, Method::Put);
        assert_eq!(result.warnings.len(), 2);
        assert!(result.warnings[0].message.contains("not exported"));
        assert!(result.warnings[1].message.contains("`post` skipped"));
    }

    #[test]
    fn test_parse_failure_is_a_warning() {
        let dir = tempdir().unwrap();
        write(dir.path(), "broken/route.rs", "pub fn get( {");
        write(dir.path(), "fine/route.rs", GET);

        let result = scan(dir.path()).unwrap();
        assert_eq!(result.routes.len(), 1);
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].message.starts_with("parse error"));
    }

    #[test]
    fn test_byte_order_mark_does_not_shift_extraction() {
        let dir = tempdir().unwrap();
        write(
            dir.path(),
            "bom/route.rs",
            "\u{feff}use trellis::prelude::*; pub fn get(ctx: &mut Context) -> Result<()> { Ok(()) }\n",
        );

        let result = scan(dir.path()).unwrap();
        assert!(result.warnings.is_empty());
        let route = &result.routes[0];
        assert_eq!(route.file.imports, vec!["use trellis::prelude::*;"]);
        assert_eq!(
            route.handlers[0].function.source,
            "pub fn get(ctx: &mut Context) -> Result<()> { Ok(()) }"
        );
    }

    #[test]
    fn test_placeholder_shaped_directories_stay_static() {
        let dir = tempdir().unwrap();
        write(dir.path(), "{id}/route.rs", GET);
        write(dir.path(), "*/route.rs", GET);

        let result = scan(dir.path()).unwrap();
        assert_eq!(result.routes.len(), 1);
        let file = &result.routes[0].file;
        assert_eq!(file.pattern, "/{{id}}");
        assert_eq!(crate::priority(&file.pattern), 100);
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].message.contains("`*`"));
    }

    #[test]
    fn test_repeated_scans_on_one_thread() {
        let dir = tempdir().unwrap();
        write(dir.path(), "about/route.rs", GET);

        let first = scan(dir.path()).unwrap();
        let second = scan(dir.path()).unwrap();
        assert_eq!(
            first.routes[0].handlers[0].function.source,
            second.routes[0].handlers[0].function.source
        );
        assert_eq!(second.routes[0].handlers[0].function.line, 3);
    }

    #[test]
    fn test_nested_proxy_is_ignored() {
        let dir = tempdir().unwrap();
        let proxy = "pub fn proxy(ctx: &mut Context) -> Result<ProxyAction> { Ok(ProxyAction::Continue) }\n";
        write(dir.path(), "proxy.rs", proxy);
        write(dir.path(), "nested/proxy.rs", proxy);

        let result = scan(dir.path()).unwrap();
        assert!(result.proxy.is_some());
        assert_eq!(result.proxy.as_ref().unwrap().file.relative_path, PathBuf::from("proxy.rs"));
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_page_layout_and_loader_discovery() {
        let dir = tempdir().unwrap();
        write(
            dir.path(),
            "layout.rs",
            "pub fn root_layout(ctx: &mut Context, children: Html) -> Result<Html> { Ok(children) }\n",
        );
        write(
            dir.path(),
            "blog/page.rs",
            "pub fn blog_page(ctx: &mut Context) -> Result<Html> { Ok(Html::new(\"blog\")) }\npub fn page(ctx: &mut Context) -> Result<Html> { Ok(Html::default()) }\n",
        );
        write(dir.path(), "blog/loader.rs", "pub fn load(ctx: &mut Context) -> Result<()> { Ok(()) }\n");
        write(dir.path(), "orphan/loader.rs", "pub fn load(ctx: &mut Context) -> Result<()> { Ok(()) }\n");

        let result = scan(dir.path()).unwrap();
        assert_eq!(result.pages.len(), 1);
        assert_eq!(result.pages[0].function.name, "blog_page");
        assert_eq!(result.layouts.len(), 1);
        assert_eq!(result.loaders.len(), 2);

        let page = &result.pages[0].file;
        assert_eq!(result.layouts_for(page).len(), 1);
        assert!(result.loader_for(page).is_some());

        let messages: Vec<_> = result.warnings.iter().map(|w| w.message.as_str()).collect();
        assert!(messages.iter().any(|m| m.contains("`page` ignored")));
        assert!(messages.iter().any(|m| m.contains("no page.rs")));
    }
}
