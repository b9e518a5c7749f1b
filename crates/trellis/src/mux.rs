// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Path routing and request dispatch.
//!
//! [`PathRouter`] is the seam between the [`RouteTree`](crate::RouteTree)
//! and whatever matches URLs. [`Mux`] is the built-in implementation: one
//! `matchit` router per method, the root proxy, and [`Mux::dispatch`].

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use matchit::{InsertError, Router as MatchitRouter};

use crate::context::{Context, ProxyAction, Request, Response, WILDCARD_PARAM};
use crate::error::Error;
use crate::handler::{Handler, Proxy};
use crate::method::Method;

/// Name of the wildcard capture inside matchit patterns.
const WILDCARD_KEY: &str = "__wildcard";

/// A route the path router refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MountError {
    /// The pattern overlaps an already mounted one.
    #[error("{method} {pattern} conflicts with {existing}")]
    Conflict {
        /// Method of the rejected route.
        method: Method,
        /// Pattern of the rejected route.
        pattern: String,
        /// The pattern already holding the slot.
        existing: String,
    },

    /// The pattern is not valid for the router.
    #[error("{method} {pattern} is not a valid pattern: {reason}")]
    InvalidPattern {
        /// Method of the rejected route.
        method: Method,
        /// The rejected pattern.
        pattern: String,
        /// Router message.
        reason: String,
    },
}

/// Outcome of [`RouteTree::mount`](crate::RouteTree::mount).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MountReport {
    /// Number of (method, pattern) registrations accepted.
    pub mounted: usize,
    /// Registrations the router refused.
    pub rejected: Vec<MountError>,
}

impl MountReport {
    /// True when every registration was accepted.
    pub fn is_complete(&self) -> bool {
        self.rejected.is_empty()
    }
}

/// Something routes can be mounted onto.
pub trait PathRouter {
    /// Registers a handler for a method and a pattern.
    ///
    /// Patterns use `{name}` for single segments and a final `*` for the
    /// rest of the path.
    fn handle(&mut self, method: Method, pattern: &str, handler: Handler) -> Result<(), MountError>;

    /// Installs the root proxy, run before matching.
    fn set_proxy(&mut self, proxy: Proxy);
}

/// The built-in path router.
#[derive(Default)]
pub struct Mux {
    routers: BTreeMap<Method, MatchitRouter<Handler>>,
    proxy: Option<Proxy>,
}

impl Mux {
    /// Creates an empty mux.
    pub fn new() -> Self {
        Self::default()
    }

    /// Handles one request.
    ///
    /// The proxy runs first and may continue, rewrite the path or redirect.
    /// The path is then matched with its trailing slash ignored; a HEAD
    /// request falls back to the GET route. Unmatched paths yield 404, or
    /// 405 with an `Allow` header when another method matches.
    pub fn dispatch(&self, request: Request) -> Response {
        let head = request.method == Method::Head;
        let mut ctx = Context::new(request);

        if let Some(proxy) = &self.proxy {
            match proxy(&mut ctx) {
                Ok(ProxyAction::Continue) => {}
                Ok(ProxyAction::Rewrite(path)) => {
                    tracing::debug!(from = %ctx.path(), to = %path, "proxy rewrite");
                    ctx.rewrite(path);
                }
                Ok(ProxyAction::Redirect { location, status }) => {
                    ctx.redirect(status, location);
                }
                Err(err) => ctx.fail(err),
            }
            if ctx.is_written() {
                return ctx.into_response();
            }
        }

        let path = normalize(ctx.path()).to_string();
        let method = ctx.method();
        let found = self
            .lookup(method, &path)
            .or_else(|| head.then(|| self.lookup(Method::Get, &path)).flatten());

        match found {
            Some((handler, params)) => {
                ctx.set_params(params);
                if let Err(err) = handler(&mut ctx) {
                    tracing::debug!(path = %path, status = err.status(), "handler returned an error");
                    ctx.fail(err);
                }
            }
            None => {
                let allowed = self.allowed(&path);
                if allowed.is_empty() {
                    ctx.fail(Error::not_found(format!("no route for {path}")));
                } else {
                    ctx.set_header("allow", allowed.join(", "));
                    ctx.fail(Error::new(405, format!("{method} is not allowed for {path}")));
                }
            }
        }

        let mut response = ctx.into_response();
        if head {
            response.body.clear();
        }
        response
    }

    /// Methods with a route matching `path`.
    pub fn allowed(&self, path: &str) -> Vec<&'static str> {
        let path = normalize(path);
        self.routers
            .iter()
            .filter(|(_, router)| router.at(path).is_ok())
            .map(|(method, _)| method.as_str())
            .collect()
    }

    fn lookup(&self, method: Method, path: &str) -> Option<(Handler, HashMap<String, String>)> {
        let matched = self.routers.get(&method)?.at(path).ok()?;
        let params = matched
            .params
            .iter()
            .map(|(key, value)| {
                let key = if key == WILDCARD_KEY { WILDCARD_PARAM } else { key };
                (key.to_string(), value.to_string())
            })
            .collect();
        Some((Arc::clone(matched.value), params))
    }
}

impl PathRouter for Mux {
    fn handle(&mut self, method: Method, pattern: &str, handler: Handler) -> Result<(), MountError> {
        let translated = translate(pattern);
        self.routers
            .entry(method)
            .or_default()
            .insert(translated, handler)
            .map_err(|err| match err {
                InsertError::Conflict { with } => MountError::Conflict {
                    method,
                    pattern: pattern.to_string(),
                    existing: with,
                },
                other => MountError::InvalidPattern {
                    method,
                    pattern: pattern.to_string(),
                    reason: other.to_string(),
                },
            })
    }

    fn set_proxy(&mut self, proxy: Proxy) {
        self.proxy = Some(proxy);
    }
}

/// Rewrites a route pattern into matchit syntax: `*` becomes a named
/// catch-all. Placeholders and doubled braces already match matchit.
fn translate(pattern: &str) -> String {
    pattern
        .split('/')
        .map(|segment| {
            if segment == "*" {
                format!("{{*{WILDCARD_KEY}}}")
            } else {
                segment.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn normalize(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/"
    } else {
        trimmed
    }
}
