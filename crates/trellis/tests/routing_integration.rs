// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Integration tests for the file-system routing pipeline.
//!
//! App trees are written into temp directories, scanned, generated, and the
//! equivalent registrations are mounted and dispatched.

use std::fs;
use std::path::Path;

use serde_json::json;
use tempfile::tempdir;

use trellis::prelude::*;
use trellis::{generate, scan, Mux, Request, Route, RouteTree, SegmentKind};

const GET: &str = r#"use trellis::prelude::*;

pub fn get(ctx: &mut Context) -> Result<()> {
    ctx.text(200, "ok");
    Ok(())
}
"#;

const MIDDLEWARE: &str = r#"use trellis::prelude::*;

pub fn middleware(ctx: &mut Context, next: &Next) -> Result<()> {
    next.run(ctx)
}
"#;

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// Create an app tree exercising both grammars.
fn setup_app(app: &Path) {
    write(app, "route.rs", GET);
    write(app, "users/[id]/route.rs", GET);
    write(app, "docs/[...slug]/route.rs", GET);
    write(app, "legacy/_id/route.rs", GET);
    write(app, "(admin)/dashboard/route.rs", GET);
    write(app, "(admin)/middleware.rs", MIDDLEWARE);
    write(app, "(auth)/settings/route.rs", GET);
    write(app, "_components/route.rs", GET);
}

#[test]
fn test_bracket_dynamic_segment() {
    let dir = tempdir().unwrap();
    setup_app(dir.path());
    let result = scan(dir.path()).unwrap();

    let route = result
        .routes
        .iter()
        .find(|r| r.file.pattern == "/users/{id}")
        .expect("users route");
    let last = route.file.segments.last().unwrap();
    assert_eq!(last.kind, SegmentKind::Dynamic);
    assert_eq!(last.name, "id");
    assert_eq!(route.handlers[0].method, Method::Get);
}

#[test]
fn test_catch_all_segment() {
    let dir = tempdir().unwrap();
    setup_app(dir.path());
    let result = scan(dir.path()).unwrap();

    let route = result
        .routes
        .iter()
        .find(|r| r.file.pattern == "/docs/*")
        .expect("docs route");
    assert_eq!(route.file.catch_all_param(), Some(("slug", false)));
}

#[test]
fn test_legacy_dynamic_segment() {
    let dir = tempdir().unwrap();
    setup_app(dir.path());
    let result = scan(dir.path()).unwrap();

    let route = result
        .routes
        .iter()
        .find(|r| r.file.pattern == "/legacy/{id}")
        .expect("legacy route");
    assert_eq!(route.file.segments[1].kind, SegmentKind::Dynamic);
    assert_eq!(route.file.segments[1].name, "id");
}

#[test]
fn test_group_is_omitted_from_pattern_but_kept_in_scope() {
    let dir = tempdir().unwrap();
    setup_app(dir.path());
    let result = scan(dir.path()).unwrap();

    let route = result
        .routes
        .iter()
        .find(|r| r.file.pattern == "/dashboard")
        .expect("dashboard route");
    assert_eq!(route.file.scope, "(admin)/dashboard");
    assert!(result.is_clean(), "{:?}", result.warnings);
    assert_eq!(result.handler_count(), 6);
}

#[test]
fn test_duplicate_route_reports_one_conflict() {
    let dir = tempdir().unwrap();
    write(dir.path(), "(admin)/dashboard/route.rs", GET);
    write(dir.path(), "(auth)/dashboard/route.rs", GET);

    let result = scan(dir.path()).unwrap();
    assert_eq!(result.conflicts.len(), 1);
    assert_eq!(result.handler_count(), 1);

    let conflict = &result.conflicts[0];
    assert_eq!(conflict.pattern, "/dashboard");
    assert!(conflict.first.ends_with("(admin)/dashboard/route.rs"));
    assert!(conflict.second.ends_with("(auth)/dashboard/route.rs"));
}

#[test]
fn test_page_beats_route_get_in_same_directory() {
    let dir = tempdir().unwrap();
    write(
        dir.path(),
        "about/page.rs",
        "pub fn page(ctx: &mut Context) -> Result<Html> { Ok(Html::new(\"about\")) }\n",
    );
    write(
        dir.path(),
        "about/route.rs",
        "pub fn get(ctx: &mut Context) -> Result<()> { Ok(()) }\npub fn post(ctx: &mut Context) -> Result<()> { Ok(()) }\n",
    );

    let result = scan(dir.path()).unwrap();
    assert_eq!(result.pages.len(), 1);
    assert_eq!(result.conflicts.len(), 1);
    assert_eq!(result.conflicts[0].method, Method::Get);
    assert_eq!(result.routes[0].handlers.len(), 1);
    assert_eq!(result.routes[0].handlers[0].method, Method::Post);
}

fn tag(label: &'static str) -> impl Fn(&mut Context, &Next) -> Result<()> + Send + Sync {
    move |ctx: &mut Context, next: &Next| {
        let mut seen = ctx
            .local("seen")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        seen.push_str(label);
        seen.push(';');
        ctx.set_local("seen", json!(seen));
        next.run(ctx)
    }
}

fn report(ctx: &mut Context) -> Result<()> {
    let seen = ctx
        .local("seen")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();
    ctx.text(200, seen);
    Ok(())
}

#[test]
fn test_group_middleware_does_not_leak_into_sibling_group() {
    let mut tree = RouteTree::new();
    tree.add_route(Route::new(Method::Get, "/dashboard", report).scope("(admin)/dashboard"));
    tree.add_route(Route::new(Method::Get, "/settings", report).scope("(auth)/settings"));
    tree.add_middleware("/", "", tag("root"));
    tree.add_middleware("/", "(admin)", tag("admin"));

    let mut mux = Mux::new();
    let report = tree.mount(&mut mux, &[]);
    assert!(report.is_complete());

    let settings = mux.dispatch(Request::new(Method::Get, "/settings"));
    assert_eq!(settings.body_str(), Some("root;"));

    let dashboard = mux.dispatch(Request::new(Method::Get, "/dashboard"));
    assert_eq!(dashboard.body_str(), Some("root;admin;"));
}

#[test]
fn test_static_route_wins_over_dynamic() {
    let mut tree = RouteTree::new();
    tree.add_route(Route::new(Method::Get, "/users/{id}", |ctx: &mut Context| {
        let id = ctx.param("id").unwrap_or_default().to_string();
        ctx.text(200, format!("user {id}"));
        Ok(())
    }));
    tree.add_route(Route::new(Method::Get, "/users/me", |ctx: &mut Context| {
        ctx.text(200, "me");
        Ok(())
    }));

    let mut mux = Mux::new();
    tree.mount(&mut mux, &[]);

    let me = mux.dispatch(Request::new(Method::Get, "/users/me"));
    assert_eq!(me.body_str(), Some("me"));
    let other = mux.dispatch(Request::new(Method::Get, "/users/7"));
    assert_eq!(other.body_str(), Some("user 7"));
}

#[test]
fn test_optional_catch_all_matches_base_and_rest() {
    let mut tree = RouteTree::new();
    tree.add_route(
        Route::new(Method::Get, "/docs/*", |ctx: &mut Context| {
            let slug = ctx.param("slug").unwrap_or_default().to_string();
            ctx.text(200, format!("[{slug}]"));
            Ok(())
        })
        .catch_all_param("slug")
        .optional_catch_all(true),
    );

    let mut mux = Mux::new();
    let report = tree.mount(&mut mux, &[]);
    assert_eq!(report.mounted, 2);

    let base = mux.dispatch(Request::new(Method::Get, "/docs"));
    assert_eq!(base.body_str(), Some("[]"));
    let nested = mux.dispatch(Request::new(Method::Get, "/docs/guide/intro"));
    assert_eq!(nested.body_str(), Some("[guide/intro]"));
}

#[test]
fn test_global_middleware_is_outermost() {
    let mut tree = RouteTree::new();
    tree.add_route(
        Route::new(Method::Get, "/admin", report)
            .scope("admin")
            .middleware(tag("route")),
    );
    tree.add_middleware("/admin", "admin", tag("scoped"));

    let mut mux = Mux::new();
    let global: Vec<trellis::Middleware> = vec![trellis::middleware(tag("global"))];
    tree.mount(&mut mux, &global);

    let response = mux.dispatch(Request::new(Method::Get, "/admin"));
    assert_eq!(response.body_str(), Some("global;scoped;route;"));
}

#[test]
fn test_generated_files_are_stable() {
    let dir = tempdir().unwrap();
    let app = dir.path().join("app");
    let out = dir.path().join("src/generated");
    setup_app(&app);

    let first = generate(&scan(&app).unwrap(), "crate::generated", &out).unwrap();
    let routes = fs::read_to_string(&first.routes_path).unwrap();
    let handlers = fs::read_to_string(&first.handlers_path).unwrap();
    assert_eq!(first.route_count, 6);
    assert!(syn::parse_file(&routes).is_ok(), "{routes}");
    assert!(syn::parse_file(&handlers).is_ok(), "{handlers}");

    // Rescanning an unchanged tree must not touch either file.
    let second = generate(&scan(&app).unwrap(), "crate::generated", &out).unwrap();
    assert!(second.written.is_empty());
    assert_eq!(fs::read_to_string(&second.routes_path).unwrap(), routes);
    assert_eq!(fs::read_to_string(&second.handlers_path).unwrap(), handlers);

    // Private folders never reach the output.
    assert!(!handlers.contains("_components"));
    assert!(routes.contains("tree.add_middleware(\"/\", \"(admin)\", handlers::group_admin_middleware);"));
}
