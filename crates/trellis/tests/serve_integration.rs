// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Tests for the axum serving adapter.

#![cfg(feature = "server")]

use std::sync::Arc;

use axum_test::TestServer;
use serde_json::{json, Value};

use trellis::prelude::*;
use trellis::{Mux, Page, Route, RouteTree};

fn app() -> TestServer {
    let mut tree = RouteTree::new();
    tree.add_route(Route::new(Method::Get, "/users/{id}", |ctx: &mut Context| {
        let id = ctx.param("id").unwrap_or_default().to_string();
        let page = ctx.query("page").unwrap_or("1").to_string();
        ctx.json(200, &json!({ "id": id, "page": page }))
    }));
    tree.add_route(Route::new(Method::Post, "/echo", |ctx: &mut Context| {
        let body: Value = ctx.body_json()?;
        ctx.json(201, &body)
    }));
    tree.add_page(
        Page::new("/", |_ctx: &mut Context| Ok(Html::new("<h1>Home</h1>")))
            .layout(|_ctx: &mut Context, children: Html| {
                Ok(Html::new(format!("<html>{}</html>", children.as_str())))
            }),
    );

    let mut mux = Mux::new();
    tree.mount(&mut mux, &[]);
    TestServer::new(trellis::serve::router(Arc::new(mux))).unwrap()
}

#[tokio::test]
async fn test_dynamic_route_with_query() {
    let server = app();
    let response = server.get("/users/42").add_query_param("page", "3").await;
    response.assert_status_ok();
    response.assert_json(&json!({ "id": "42", "page": "3" }));
}

#[tokio::test]
async fn test_json_body_round_trip() {
    let server = app();
    let response = server.post("/echo").json(&json!({ "name": "ada" })).await;
    assert_eq!(response.status_code().as_u16(), 201);
    response.assert_json(&json!({ "name": "ada" }));
}

#[tokio::test]
async fn test_invalid_json_is_bad_request() {
    let server = app();
    let response = server.post("/echo").text("not json").await;
    assert_eq!(response.status_code().as_u16(), 400);
}

#[tokio::test]
async fn test_page_renders_inside_layout() {
    let server = app();
    let response = server.get("/").await;
    response.assert_status_ok();
    assert_eq!(response.text(), "<html><h1>Home</h1></html>");
    assert_eq!(
        response.header("content-type").to_str().unwrap(),
        "text/html; charset=utf-8"
    );
}

#[tokio::test]
async fn test_unknown_path_and_wrong_method() {
    let server = app();
    let missing = server.get("/nowhere").expect_failure().await;
    assert_eq!(missing.status_code().as_u16(), 404);

    let wrong = server.delete("/echo").expect_failure().await;
    assert_eq!(wrong.status_code().as_u16(), 405);
    assert_eq!(wrong.header("allow").to_str().unwrap(), "POST");
}

#[tokio::test]
async fn test_static_dir_is_served_beside_routes() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("app.css"), "body { margin: 0 }").unwrap();

    let mut tree = RouteTree::new();
    tree.add_route(Route::new(Method::Get, "/health", |ctx: &mut Context| {
        ctx.text(200, "ok");
        Ok(())
    }));
    let mut mux = Mux::new();
    tree.mount(&mut mux, &[]);
    let server = TestServer::new(trellis::serve::router_with_static(Arc::new(mux), dir.path())).unwrap();

    let css = server.get("/static/app.css").await;
    css.assert_status_ok();
    assert_eq!(css.text(), "body { margin: 0 }");
    assert_eq!(server.get("/health").await.text(), "ok");
}
