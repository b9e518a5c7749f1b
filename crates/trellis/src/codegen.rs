// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Rust code generation from a [`ScanResult`].
//!
//! Two files are written into the output directory:
//!
//! ```rust,ignore
//! // handlers.rs
//! // Code generated by trellis. DO NOT EDIT.
//! #![allow(unused_imports, dead_code)]
//!
//! use trellis::prelude::*;
//!
//! // app/users/[id]/route.rs:4
//! pub fn users_id_get(ctx: &mut Context) -> Result<()> { ... }
//!
//! // routes.rs
//! pub fn register(tree: &mut RouteTree) {
//!     tree.add_route(
//!         Route::new(Method::Get, "/users/{id}", handlers::users_id_get)
//!             .file("app/users/[id]/route.rs")
//!             .scope("users/[id]")
//!             .priority(50),
//!     );
//! }
//! ```
//!
//! Every function is copied verbatim from its marker file with only its
//! name replaced. The output depends on nothing but the scan, so an
//! unchanged app tree produces byte-identical files, and files whose
//! content did not change are not touched.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use crate::method::Method;
use crate::scanner::{FileInfo, Function, FunctionFile, Handler, RouteFile, ScanResult};
use crate::segment::{Segment, SegmentKind};
use crate::tree::{priority, route_order};

/// First line of every generated file.
pub const HEADER: &str = "// Code generated by trellis. DO NOT EDIT.";

/// Name of the generated handler file.
pub const HANDLERS_FILE: &str = "handlers.rs";

/// Name of the generated registration file.
pub const ROUTES_FILE: &str = "routes.rs";

/// Errors that stop generation.
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    /// The output directory cannot be mapped to a module of the crate.
    #[error("cannot resolve module root: {0}")]
    ModuleRoot(String),

    /// The module path is not a valid Rust path.
    #[error("invalid module path `{0}`")]
    InvalidModulePath(String),

    /// Reading or writing a file failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// The file or directory involved.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },
}

/// What a [`generate`] call produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateResult {
    /// Path of `handlers.rs`.
    pub handlers_path: PathBuf,
    /// Path of `routes.rs`.
    pub routes_path: PathBuf,
    /// Files whose content changed and were rewritten.
    pub written: Vec<PathBuf>,
    /// Number of route and page registrations emitted.
    pub route_count: usize,
}

/// Rendered content of both generated files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generated {
    /// Content of `handlers.rs`.
    pub handlers: String,
    /// Content of `routes.rs`.
    pub routes: String,
    /// Number of route and page registrations.
    pub route_count: usize,
}

/// Renders a scan and writes `handlers.rs` and `routes.rs` into
/// `output_dir`. `module_path` is the Rust path of `output_dir` inside the
/// crate, e.g. `crate::generated`.
pub fn generate(
    scan: &ScanResult,
    module_path: &str,
    output_dir: &Path,
) -> Result<GenerateResult, GenerateError> {
    let generated = render(scan, module_path)?;

    fs::create_dir_all(output_dir).map_err(|source| GenerateError::Io {
        path: output_dir.to_path_buf(),
        source,
    })?;

    let handlers_path = output_dir.join(HANDLERS_FILE);
    let routes_path = output_dir.join(ROUTES_FILE);

    let mut written = Vec::new();
    for (path, content) in [
        (&handlers_path, &generated.handlers),
        (&routes_path, &generated.routes),
    ] {
        if write_if_changed(path, content)? {
            tracing::debug!(path = %path.display(), "wrote generated file");
            written.push(path.clone());
        }
    }

    tracing::info!(
        routes = generated.route_count,
        written = written.len(),
        "generated {}",
        output_dir.display()
    );

    Ok(GenerateResult {
        handlers_path,
        routes_path,
        written,
        route_count: generated.route_count,
    })
}

/// Renders both files without touching the file system.
pub fn render(scan: &ScanResult, module_path: &str) -> Result<Generated, GenerateError> {
    validate_module_path(module_path)?;

    let plan = Plan::build(scan);
    let app_dir = scan
        .app_root
        .file_name()
        .map(|name| name.to_string_lossy().to_string());
    let display = |file: &FileInfo| match &app_dir {
        Some(dir) => format!("{}/{}", dir, file.display_path()),
        None => file.display_path(),
    };

    Ok(Generated {
        handlers: render_handlers(&plan, &display),
        routes: render_routes(&plan, module_path, &display),
        route_count: plan.routes.len(),
    })
}

/// Maps an output directory to the module path that names it.
///
/// `project_dir` must hold a `Cargo.toml` with a `[package]` table, and
/// `output_dir` (relative paths are taken from `project_dir`) must lie
/// under its `src/`. `src/generated/routes` maps to
/// `crate::generated::routes`.
pub fn resolve_module_path(project_dir: &Path, output_dir: &Path) -> Result<String, GenerateError> {
    let manifest_path = project_dir.join("Cargo.toml");
    let manifest = fs::read_to_string(&manifest_path).map_err(|e| {
        GenerateError::ModuleRoot(format!("cannot read {}: {}", manifest_path.display(), e))
    })?;
    let manifest: toml::Value = toml::from_str(&manifest).map_err(|e| {
        GenerateError::ModuleRoot(format!("cannot parse {}: {}", manifest_path.display(), e))
    })?;
    let has_package = manifest
        .get("package")
        .and_then(|package| package.get("name"))
        .and_then(|name| name.as_str())
        .is_some();
    if !has_package {
        return Err(GenerateError::ModuleRoot(format!(
            "{} has no [package] name",
            manifest_path.display()
        )));
    }

    let output_dir = if output_dir.is_absolute() {
        output_dir.to_path_buf()
    } else {
        project_dir.join(output_dir)
    };
    let src_dir = project_dir.join("src");
    let relative = output_dir.strip_prefix(&src_dir).map_err(|_| {
        GenerateError::ModuleRoot(format!(
            "{} is not inside {}",
            output_dir.display(),
            src_dir.display()
        ))
    })?;

    let mut module_path = String::from("crate");
    for component in relative.components() {
        let name = component.as_os_str().to_string_lossy();
        module_path.push_str("::");
        module_path.push_str(&name);
    }
    validate_module_path(&module_path)?;
    Ok(module_path)
}

fn validate_module_path(module_path: &str) -> Result<(), GenerateError> {
    let valid = !module_path.is_empty()
        && module_path.split("::").all(|part| {
            let mut chars = part.chars();
            chars
                .next()
                .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
                && part != "_"
        });
    if valid {
        Ok(())
    } else {
        Err(GenerateError::InvalidModulePath(module_path.to_string()))
    }
}

fn write_if_changed(path: &Path, content: &str) -> Result<bool, GenerateError> {
    if fs::read_to_string(path).is_ok_and(|existing| existing == content) {
        return Ok(false);
    }
    fs::write(path, content).map_err(|source| GenerateError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(true)
}

// ============================================================================
// Planning
// ============================================================================

/// One registration in `routes.rs`.
enum PlannedRoute<'a> {
    Handler {
        file: &'a RouteFile,
        handler: &'a Handler,
        name: String,
    },
    Page {
        page: &'a FunctionFile,
        name: String,
        loader: Option<(&'a FunctionFile, String)>,
        layouts: Vec<&'a FunctionFile>,
    },
}

impl PlannedRoute<'_> {
    fn file(&self) -> &FileInfo {
        match self {
            PlannedRoute::Handler { file, .. } => &file.file,
            PlannedRoute::Page { page, .. } => &page.file,
        }
    }

    fn method(&self) -> Method {
        match self {
            PlannedRoute::Handler { handler, .. } => handler.method,
            PlannedRoute::Page { .. } => Method::Get,
        }
    }
}

/// Every emitted function with its synthesized name, in emission order.
struct Plan<'a> {
    routes: Vec<PlannedRoute<'a>>,
    middlewares: Vec<(&'a FunctionFile, String)>,
    layouts: Vec<(&'a FunctionFile, String)>,
    proxy: Option<(&'a FunctionFile, String)>,
    imports: BTreeSet<String>,
}

impl<'a> Plan<'a> {
    fn build(scan: &'a ScanResult) -> Self {
        let mut names = NameAllocator::default();
        let mut imports = BTreeSet::new();

        let mut entries: Vec<(Method, &'a FileInfo, Option<&'a RouteFile>, Option<&'a Handler>)> =
            Vec::new();
        for file in &scan.routes {
            for handler in &file.handlers {
                entries.push((handler.method, &file.file, Some(file), Some(handler)));
            }
        }
        for page in &scan.pages {
            entries.push((Method::Get, &page.file, None, None));
        }
        entries.sort_by(|a, b| {
            route_order(
                (priority(&a.1.pattern), a.1.pattern.as_str(), a.0),
                (priority(&b.1.pattern), b.1.pattern.as_str(), b.0),
            )
        });

        let pages: HashMap<&Path, &'a FunctionFile> =
            scan.pages.iter().map(|p| (p.file.path.as_path(), p)).collect();

        let mut routes = Vec::new();
        for (method, info, route_file, handler) in entries {
            imports.extend(info.imports.iter().cloned());
            let stem = pattern_stem(&info.pattern);
            match (route_file, handler) {
                (Some(file), Some(handler)) => routes.push(PlannedRoute::Handler {
                    file,
                    handler,
                    name: names.allocate(&format!("{}_{}", stem, method.handler_name())),
                }),
                _ => {
                    let Some(&page) = pages.get(info.path.as_path()) else {
                        continue;
                    };
                    let name = names.allocate(&format!("{stem}_page"));
                    let loader = scan.loader_for(&page.file).map(|loader| {
                        imports.extend(loader.file.imports.iter().cloned());
                        (loader, names.allocate(&format!("{stem}_load")))
                    });
                    routes.push(PlannedRoute::Page {
                        page,
                        name,
                        loader,
                        layouts: scan.layouts_for(&page.file),
                    });
                }
            }
        }

        let mut middlewares: Vec<&'a FunctionFile> = scan.middlewares.iter().collect();
        middlewares.sort_by(|a, b| {
            (&a.file.pattern, &a.file.scope).cmp(&(&b.file.pattern, &b.file.scope))
        });
        let middlewares = middlewares
            .into_iter()
            .map(|mw| {
                imports.extend(mw.file.imports.iter().cloned());
                let name = names.allocate(&format!("{}_middleware", scope_stem(&mw.file.segments)));
                (mw, name)
            })
            .collect();

        let mut layouts: Vec<&'a FunctionFile> = scan.layouts.iter().collect();
        layouts.sort_by(|a, b| {
            (&a.file.pattern, &a.file.scope).cmp(&(&b.file.pattern, &b.file.scope))
        });
        let layouts = layouts
            .into_iter()
            .map(|layout| {
                imports.extend(layout.file.imports.iter().cloned());
                let name = names.allocate(&format!("{}_layout", scope_stem(&layout.file.segments)));
                (layout, name)
            })
            .collect();

        let proxy = scan.proxy.as_ref().map(|proxy| {
            imports.extend(proxy.file.imports.iter().cloned());
            (proxy, names.allocate("proxy"))
        });

        Self {
            routes,
            middlewares,
            layouts,
            proxy,
            imports,
        }
    }

    fn layout_name(&self, layout: &FunctionFile) -> Option<&str> {
        self.layouts
            .iter()
            .find(|(l, _)| l.file.path == layout.file.path)
            .map(|(_, name)| name.as_str())
    }
}

/// Hands out unique function names; collisions get `_2`, `_3`, ...
#[derive(Default)]
struct NameAllocator {
    used: HashSet<String>,
}

impl NameAllocator {
    fn allocate(&mut self, base: &str) -> String {
        let base = if base.starts_with(|c: char| c.is_ascii_digit()) {
            format!("_{base}")
        } else {
            base.to_string()
        };
        let mut candidate = base.clone();
        let mut n = 2;
        while self.used.contains(&candidate) {
            candidate = format!("{base}_{n}");
            n += 1;
        }
        self.used.insert(candidate.clone());
        candidate
    }
}

/// Lower snake case: ASCII alphanumerics kept, every other run becomes `_`.
fn snake_case(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.is_empty() && !out.ends_with('_') {
            out.push('_');
        }
    }
    while out.ends_with('_') {
        out.pop();
    }
    out
}

/// Name stem of a URL pattern: `/users/{id}` is `users_id`, `/` is `index`.
fn pattern_stem(pattern: &str) -> String {
    let parts: Vec<String> = pattern
        .split('/')
        .filter(|s| !s.is_empty())
        .map(|segment| {
            if segment == "*" {
                "catchall".to_string()
            } else if let Some(param) = segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                snake_case(param)
            } else {
                snake_case(segment)
            }
        })
        .filter(|s| !s.is_empty())
        .collect();
    if parts.is_empty() {
        "index".to_string()
    } else {
        parts.join("_")
    }
}

/// Name stem of a scope: groups contribute `group_<name>`, the empty scope
/// is `root`.
fn scope_stem(segments: &[Segment]) -> String {
    let parts: Vec<String> = segments
        .iter()
        .map(|segment| match segment.kind {
            SegmentKind::Group => format!("group_{}", snake_case(&segment.name)),
            SegmentKind::CatchAll | SegmentKind::OptionalCatchAll => "catchall".to_string(),
            SegmentKind::Dynamic => snake_case(&segment.name),
            SegmentKind::Static => snake_case(&segment.raw),
        })
        .filter(|s| !s.is_empty())
        .collect();
    if parts.is_empty() {
        "root".to_string()
    } else {
        parts.join("_")
    }
}

// ============================================================================
// Rendering
// ============================================================================

fn render_handlers(plan: &Plan<'_>, display: &dyn Fn(&FileInfo) -> String) -> String {
    let mut out = String::new();
    out.push_str(HEADER);
    out.push('\n');
    out.push_str("#![allow(unused_imports, dead_code)]\n");

    if !plan.imports.is_empty() {
        out.push('\n');
        for import in &plan.imports {
            out.push_str(import);
            out.push('\n');
        }
    }

    let mut emit = |file: &FileInfo, function: &Function, name: &str| {
        out.push_str(&format!("\n// {}:{}\n", display(file), function.line));
        out.push_str(&function.renamed(name));
        out.push('\n');
    };

    for route in &plan.routes {
        match route {
            PlannedRoute::Handler { file, handler, name } => {
                emit(&file.file, &handler.function, name);
            }
            PlannedRoute::Page {
                page, name, loader, ..
            } => {
                if let Some((loader, loader_name)) = loader {
                    emit(&loader.file, &loader.function, loader_name);
                }
                emit(&page.file, &page.function, name);
            }
        }
    }
    for (mw, name) in &plan.middlewares {
        emit(&mw.file, &mw.function, name);
    }
    for (layout, name) in &plan.layouts {
        emit(&layout.file, &layout.function, name);
    }
    if let Some((proxy, name)) = &plan.proxy {
        emit(&proxy.file, &proxy.function, name);
    }

    out
}

fn render_routes(plan: &Plan<'_>, module_path: &str, display: &dyn Fn(&FileInfo) -> String) -> String {
    let mut body = String::new();

    for route in &plan.routes {
        let file = route.file();
        let mut chain = String::new();
        chain.push_str(&format!("            .file({:?})\n", display(file)));
        chain.push_str(&format!("            .scope({:?})\n", file.scope));
        if let Some((param, optional)) = file.catch_all_param() {
            chain.push_str(&format!("            .catch_all_param({param:?})\n"));
            if optional {
                chain.push_str("            .optional_catch_all(true)\n");
            }
        }

        match route {
            PlannedRoute::Handler { name, .. } => {
                chain.push_str(&format!("            .priority({}),\n", priority(&file.pattern)));
                body.push_str(&format!(
                    "    tree.add_route(\n        Route::new({}, {:?}, handlers::{})\n{}    );\n",
                    route.method().variant_path(),
                    file.pattern,
                    name,
                    chain
                ));
            }
            PlannedRoute::Page {
                name,
                loader,
                layouts,
                ..
            } => {
                if let Some((_, loader_name)) = loader {
                    chain.push_str(&format!("            .loader(handlers::{loader_name})\n"));
                }
                for layout in layouts {
                    if let Some(layout_name) = plan.layout_name(layout) {
                        chain.push_str(&format!("            .layout(handlers::{layout_name})\n"));
                    }
                }
                // Turn the final newline into the closing comma.
                chain.pop();
                chain.push_str(",\n");
                body.push_str(&format!(
                    "    tree.add_page(\n        Page::new({:?}, handlers::{})\n{}    );\n",
                    file.pattern, name, chain
                ));
            }
        }
    }

    for (mw, name) in &plan.middlewares {
        body.push_str(&format!(
            "    tree.add_middleware({:?}, {:?}, handlers::{});\n",
            mw.file.pattern, mw.file.scope, name
        ));
    }

    if let Some((_, name)) = &plan.proxy {
        body.push_str(&format!("    tree.set_proxy(handlers::{name});\n"));
    }

    if body.is_empty() {
        body.push_str("    let _ = tree;\n");
    }

    let mut out = String::new();
    out.push_str(HEADER);
    out.push('\n');
    out.push_str("#![allow(unused_imports)]\n\n");
    out.push_str("use trellis::{Method, Page, Route, RouteTree};\n\n");
    out.push_str(&format!("use {module_path}::handlers;\n\n"));
    out.push_str("/// Registers every discovered route, page, middleware and proxy.\n");
    out.push_str("pub fn register(tree: &mut RouteTree) {\n");
    out.push_str(&body);
    out.push_str("}\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::scan;
    use tempfile::tempdir;

    const PRELUDE: &str = "use trellis::prelude::*;\n\n";

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn get(body: &str) -> String {
        format!("{PRELUDE}pub fn get(ctx: &mut Context) -> Result<()> {{\n    {body}\n}}\n")
    }

    #[test]
    fn test_names() {
        assert_eq!(pattern_stem("/"), "index");
        assert_eq!(pattern_stem("/users/{id}"), "users_id");
        assert_eq!(pattern_stem("/docs/*"), "docs_catchall");
        assert_eq!(pattern_stem("/About-Us"), "about_us");

        let segments: Vec<_> = ["(admin)", "settings"].into_iter().map(Segment::classify).collect();
        assert_eq!(scope_stem(&segments), "group_admin_settings");
        assert_eq!(scope_stem(&[]), "root");
    }

    #[test]
    fn test_name_allocator_suffixes() {
        let mut names = NameAllocator::default();
        assert_eq!(names.allocate("a_b_get"), "a_b_get");
        assert_eq!(names.allocate("a_b_get"), "a_b_get_2");
        assert_eq!(names.allocate("a_b_get"), "a_b_get_3");
        assert_eq!(names.allocate("404_get"), "_404_get");
    }

    #[test]
    fn test_module_path_validation() {
        assert!(validate_module_path("crate::generated").is_ok());
        assert!(validate_module_path("crate::my-gen").is_err());
        assert!(validate_module_path("crate::1st").is_err());
        assert!(validate_module_path("").is_err());
    }

    #[test]
    fn test_render_renames_and_registers() {
        let dir = tempdir().unwrap();
        let app = dir.path().join("app");
        write(&app, "users/[id]/route.rs", &get("ctx.text(200, \"user\");\n    Ok(())"));
        write(&app, "a-b/route.rs", &get("Ok(())"));
        write(&app, "a_b/route.rs", &get("Ok(())"));
        write(
            &app,
            "(admin)/middleware.rs",
            "pub fn middleware(ctx: &mut Context, next: &Next) -> Result<()> { next.run(ctx) }\n",
        );

        let result = scan(&app).unwrap();
        let generated = render(&result, "crate::generated").unwrap();

        assert!(generated.handlers.starts_with(HEADER));
        assert!(generated.handlers.contains("use trellis::prelude::*;\n"));
        assert_eq!(generated.handlers.matches("use trellis::prelude::*;").count(), 1);
        assert!(generated.handlers.contains("// app/users/[id]/route.rs:3\npub fn users_id_get(ctx: &mut Context)"));
        assert!(generated.handlers.contains("pub fn a_b_get("));
        assert!(generated.handlers.contains("pub fn a_b_get_2("));
        assert!(generated.handlers.contains("pub fn group_admin_middleware("));

        assert!(generated.routes.contains("use crate::generated::handlers;"));
        assert!(generated.routes.contains(
            "Route::new(Method::Get, \"/users/{id}\", handlers::users_id_get)\n            .file(\"app/users/[id]/route.rs\")\n            .scope(\"users/[id]\")\n            .priority(50),"
        ));
        assert!(generated
            .routes
            .contains("tree.add_middleware(\"/\", \"(admin)\", handlers::group_admin_middleware);"));
        assert_eq!(generated.route_count, 3);
    }

    #[test]
    fn test_pages_reference_loader_and_layouts() {
        let dir = tempdir().unwrap();
        let app = dir.path().join("app");
        write(
            &app,
            "layout.rs",
            "pub fn layout(ctx: &mut Context, children: Html) -> Result<Html> { Ok(children) }\n",
        );
        write(
            &app,
            "docs/[[...slug]]/page.rs",
            "pub fn page(ctx: &mut Context) -> Result<Html> { Ok(Html::new(\"docs\")) }\n",
        );
        write(&app, "docs/[[...slug]]/loader.rs", "pub fn load(ctx: &mut Context) -> Result<()> { Ok(()) }\n");

        let generated = render(&scan(&app).unwrap(), "crate::generated").unwrap();
        assert!(generated.routes.contains(
            "Page::new(\"/docs/*\", handlers::docs_catchall_page)\n            .file(\"app/docs/[[...slug]]/page.rs\")\n            .scope(\"docs/[[...slug]]\")\n            .catch_all_param(\"slug\")\n            .optional_catch_all(true)\n            .loader(handlers::docs_catchall_load)\n            .layout(handlers::root_layout),\n    );"
        ));
        assert!(generated.handlers.contains("pub fn root_layout(ctx: &mut Context, children: Html)"));
        assert!(generated.handlers.contains("pub fn docs_catchall_load(ctx: &mut Context)"));
    }

    #[test]
    fn test_generated_files_parse_as_rust() {
        let dir = tempdir().unwrap();
        let app = dir.path().join("app");
        write(&app, "route.rs", &format!("{}{}", '\u{feff}', get("Ok(())")));
        write(&app, "users/[id]/route.rs", &get("ctx.text(200, \"user\");\n    Ok(())"));
        write(&app, "{raw}/route.rs", &get("Ok(())"));
        write(
            &app,
            "(admin)/middleware.rs",
            "use trellis::prelude::*;\npub fn middleware(ctx: &mut Context, next: &Next) -> Result<()> { next.run(ctx) }\n",
        );
        write(
            &app,
            "layout.rs",
            "#[inline]\npub fn layout(ctx: &mut Context, children: Html) -> Result<Html> { Ok(children) }\n",
        );
        write(
            &app,
            "blog/page.rs",
            "pub fn blog_page(ctx: &mut Context) -> Result<Html> { Ok(Html::new(\"blog\")) }\n",
        );
        write(&app, "blog/loader.rs", "pub fn load(ctx: &mut Context) -> Result<()> { Ok(()) }\n");
        write(
            &app,
            "proxy.rs",
            "pub fn proxy(ctx: &mut Context) -> Result<ProxyAction> { Ok(ProxyAction::Continue) }\n",
        );

        let result = scan(&app).unwrap();
        assert!(result.warnings.is_empty(), "{:?}", result.warnings);
        let generated = render(&result, "crate::generated").unwrap();

        if let Err(err) = syn::parse_file(&generated.handlers) {
            panic!("handlers.rs does not parse: {err}\n{}", generated.handlers);
        }
        if let Err(err) = syn::parse_file(&generated.routes) {
            panic!("routes.rs does not parse: {err}\n{}", generated.routes);
        }
        assert!(generated.routes.contains("Route::new(Method::Get, \"/{{raw}}\", handlers::raw_get)"));
        assert!(generated.routes.contains("tree.set_proxy(handlers::proxy);"));
        assert_eq!(generated.route_count, 4);
    }

    #[test]
    fn test_empty_scan_still_compiles() {
        let dir = tempdir().unwrap();
        let generated = render(&ScanResult::new(dir.path()), "crate::generated").unwrap();
        assert!(generated.routes.contains("pub fn register(tree: &mut RouteTree) {\n    let _ = tree;\n}"));
        assert_eq!(generated.route_count, 0);
    }

    #[test]
    fn test_generate_is_idempotent() {
        let dir = tempdir().unwrap();
        let app = dir.path().join("app");
        let out = dir.path().join("src/generated");
        write(&app, "route.rs", &get("Ok(())"));
        write(&app, "users/[id]/route.rs", &get("Ok(())"));

        let first = generate(&scan(&app).unwrap(), "crate::generated", &out).unwrap();
        assert_eq!(first.written.len(), 2);
        let handlers = fs::read_to_string(&first.handlers_path).unwrap();

        let second = generate(&scan(&app).unwrap(), "crate::generated", &out).unwrap();
        assert!(second.written.is_empty());
        assert_eq!(fs::read_to_string(&second.handlers_path).unwrap(), handlers);
    }

    #[test]
    fn test_resolve_module_path() {
        let dir = tempdir().unwrap();
        write(dir.path(), "Cargo.toml", "[package]\nname = \"site\"\nversion = \"0.1.0\"\n");

        assert_eq!(
            resolve_module_path(dir.path(), Path::new("src/generated")).unwrap(),
            "crate::generated"
        );
        assert_eq!(
            resolve_module_path(dir.path(), &dir.path().join("src/app/routes")).unwrap(),
            "crate::app::routes"
        );
        assert!(matches!(
            resolve_module_path(dir.path(), Path::new("generated")),
            Err(GenerateError::ModuleRoot(_))
        ));
    }

    #[test]
    fn test_resolve_module_path_needs_package() {
        let dir = tempdir().unwrap();
        write(dir.path(), "Cargo.toml", "[workspace]\nmembers = []\n");
        assert!(matches!(
            resolve_module_path(dir.path(), Path::new("src/generated")),
            Err(GenerateError::ModuleRoot(_))
        ));
    }
}
