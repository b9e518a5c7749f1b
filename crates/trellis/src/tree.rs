// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! The in-memory route table.
//!
//! Generated `register` functions fill a [`RouteTree`]; the tree then
//! orders routes by precedence, resolves which middleware wrap each route
//! and mounts everything onto a [`PathRouter`].
//!
//! ## Precedence
//!
//! | Pattern contains       | Priority |
//! |------------------------|----------|
//! | only static segments   | 100      |
//! | a `{param}` segment    | 50       |
//! | a `*` or `{*rest}`     | 5        |
//!
//! Routes are mounted by priority, then longer patterns first, then
//! lexically, so the order is total and does not depend on registration
//! order.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use crate::context::{Context, Html, ProxyAction};
use crate::error::Result;
use crate::handler::{compose, Handler, LayoutFn, LoaderFn, Middleware, Next, PageFn, Proxy};
use crate::method::Method;
use crate::mux::{MountReport, PathRouter};
use crate::segment::{is_placeholder_part, is_wildcard_part, scope_contains};

/// Priority of an all-static pattern.
pub const STATIC_PRIORITY: u8 = 100;
/// Priority of a pattern with a `{param}` segment.
pub const DYNAMIC_PRIORITY: u8 = 50;
/// Priority of a pattern with a wildcard segment.
pub const CATCH_ALL_PRIORITY: u8 = 5;

/// Computes the precedence of a URL pattern.
///
/// ```rust
/// assert_eq!(trellis::priority("/users/me"), 100);
/// assert_eq!(trellis::priority("/users/{id}"), 50);
/// assert_eq!(trellis::priority("/docs/*"), 5);
/// assert_eq!(trellis::priority("/{{id}}"), 100);
/// ```
pub fn priority(pattern: &str) -> u8 {
    let mut current = STATIC_PRIORITY;
    for segment in pattern.split('/') {
        if is_wildcard_part(segment) {
            return CATCH_ALL_PRIORITY;
        }
        if is_placeholder_part(segment) {
            current = current.min(DYNAMIC_PRIORITY);
        }
    }
    current
}

/// Mount order: priority descending, longer patterns first, then pattern
/// and method ascending.
pub fn route_order(
    (a_priority, a_pattern, a_method): (u8, &str, Method),
    (b_priority, b_pattern, b_method): (u8, &str, Method),
) -> Ordering {
    b_priority
        .cmp(&a_priority)
        .then_with(|| b_pattern.len().cmp(&a_pattern.len()))
        .then_with(|| a_pattern.cmp(b_pattern))
        .then_with(|| a_method.cmp(&b_method))
}

/// A registered endpoint.
#[derive(Clone)]
pub struct Route {
    /// URL pattern, e.g. `/users/{id}` or `/docs/*`.
    pub pattern: String,
    /// HTTP method.
    pub method: Method,
    /// The endpoint.
    pub handler: Handler,
    /// Source file the handler came from, relative to the project.
    pub file_path: Option<String>,
    /// Raw segment chain of the route, groups included.
    pub scope: String,
    /// Precedence, see [`priority`].
    pub priority: u8,
    /// Name the wildcard capture is exposed under.
    pub catch_all_param: Option<String>,
    /// Whether the wildcard also matches the empty rest.
    pub optional_catch_all: bool,
    /// Route-local middleware, run after the scoped chain.
    pub middlewares: Vec<Middleware>,
}

impl Route {
    /// Creates a route; the priority is derived from the pattern.
    pub fn new<F>(method: Method, pattern: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&mut Context) -> Result<()> + Send + Sync + 'static,
    {
        let pattern = pattern.into();
        Self {
            priority: priority(&pattern),
            pattern,
            method,
            handler: Arc::new(handler),
            file_path: None,
            scope: String::new(),
            catch_all_param: None,
            optional_catch_all: false,
            middlewares: Vec::new(),
        }
    }

    /// Records the source file.
    pub fn file(mut self, path: impl Into<String>) -> Self {
        self.file_path = Some(path.into());
        self
    }

    /// Sets the scope used for middleware resolution.
    pub fn scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    /// Overrides the derived priority.
    pub fn priority(mut self, priority: u8) -> Self {
        self.priority = priority;
        self
    }

    /// Exposes the wildcard capture under `name`.
    pub fn catch_all_param(mut self, name: impl Into<String>) -> Self {
        self.catch_all_param = Some(name.into());
        self
    }

    /// Marks the wildcard as optional, so the base path matches too.
    pub fn optional_catch_all(mut self, optional: bool) -> Self {
        self.optional_catch_all = optional;
        self
    }

    /// Appends a route-local middleware.
    pub fn middleware<F>(mut self, mw: F) -> Self
    where
        F: Fn(&mut Context, &Next) -> Result<()> + Send + Sync + 'static,
    {
        self.middlewares.push(Arc::new(mw));
        self
    }

    /// Pattern the router needs for the empty rest of an optional
    /// catch-all, e.g. `/docs` for `/docs/*`.
    pub fn base_pattern(&self) -> Option<String> {
        if !self.optional_catch_all {
            return None;
        }
        let base = self.pattern.strip_suffix("/*")?;
        Some(if base.is_empty() { "/".to_string() } else { base.to_string() })
    }

    fn key(&self) -> (u8, &str, Method) {
        (self.priority, &self.pattern, self.method)
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("pattern", &self.pattern)
            .field("method", &self.method)
            .field("file_path", &self.file_path)
            .field("scope", &self.scope)
            .field("priority", &self.priority)
            .field("catch_all_param", &self.catch_all_param)
            .field("optional_catch_all", &self.optional_catch_all)
            .field("middlewares", &self.middlewares.len())
            .finish_non_exhaustive()
    }
}

/// A page: an optional loader, a renderer and the layouts around it.
///
/// A page becomes a GET route. The loader runs first and may store values
/// with [`Context::set_local`]; then the page renders, and the layouts wrap
/// the markup from the innermost to the outermost. If nothing wrote a
/// response by then, the markup is sent as `200 text/html`.
#[derive(Clone)]
pub struct Page {
    pattern: String,
    render: PageFn,
    loader: Option<LoaderFn>,
    layouts: Vec<LayoutFn>,
    file_path: Option<String>,
    scope: String,
    catch_all_param: Option<String>,
    optional_catch_all: bool,
}

impl Page {
    /// Creates a page for a pattern.
    pub fn new<F>(pattern: impl Into<String>, render: F) -> Self
    where
        F: Fn(&mut Context) -> Result<Html> + Send + Sync + 'static,
    {
        Self {
            pattern: pattern.into(),
            render: Arc::new(render),
            loader: None,
            layouts: Vec::new(),
            file_path: None,
            scope: String::new(),
            catch_all_param: None,
            optional_catch_all: false,
        }
    }

    /// Records the source file.
    pub fn file(mut self, path: impl Into<String>) -> Self {
        self.file_path = Some(path.into());
        self
    }

    /// Sets the scope used for middleware resolution.
    pub fn scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    /// Sets the loader.
    pub fn loader<F>(mut self, load: F) -> Self
    where
        F: Fn(&mut Context) -> Result<()> + Send + Sync + 'static,
    {
        self.loader = Some(Arc::new(load));
        self
    }

    /// Adds a layout. Call outermost first.
    pub fn layout<F>(mut self, layout: F) -> Self
    where
        F: Fn(&mut Context, Html) -> Result<Html> + Send + Sync + 'static,
    {
        self.layouts.push(Arc::new(layout));
        self
    }

    /// Exposes the wildcard capture under `name`.
    pub fn catch_all_param(mut self, name: impl Into<String>) -> Self {
        self.catch_all_param = Some(name.into());
        self
    }

    /// Marks the wildcard as optional.
    pub fn optional_catch_all(mut self, optional: bool) -> Self {
        self.optional_catch_all = optional;
        self
    }

    /// Converts the page into its GET route.
    pub fn into_route(self) -> Route {
        let Page {
            pattern,
            render,
            loader,
            layouts,
            file_path,
            scope,
            catch_all_param,
            optional_catch_all,
        } = self;

        let endpoint = move |ctx: &mut Context| -> Result<()> {
            if let Some(load) = &loader {
                load(ctx)?;
                if ctx.is_written() {
                    return Ok(());
                }
            }
            let mut markup = render(ctx)?;
            for layout in layouts.iter().rev() {
                markup = layout(ctx, markup)?;
            }
            if !ctx.is_written() {
                ctx.html(200, markup);
            }
            Ok(())
        };

        let mut route = Route::new(Method::Get, pattern, endpoint)
            .scope(scope)
            .optional_catch_all(optional_catch_all);
        route.file_path = file_path;
        route.catch_all_param = catch_all_param;
        route
    }
}

impl fmt::Debug for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Page")
            .field("pattern", &self.pattern)
            .field("file_path", &self.file_path)
            .field("scope", &self.scope)
            .field("loader", &self.loader.is_some())
            .field("layouts", &self.layouts.len())
            .finish_non_exhaustive()
    }
}

/// A middleware together with the scope of the file that declared it.
#[derive(Clone)]
pub struct ScopedMiddleware {
    /// Raw segment chain of the declaring directory.
    pub scope: String,
    /// The middleware.
    pub middleware: Middleware,
}

/// A (pattern, method) pair registered twice. The first registration is
/// kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteConflict {
    /// The contested pattern.
    pub pattern: String,
    /// The contested method.
    pub method: Method,
    /// File of the kept route.
    pub first: Option<String>,
    /// File of the dropped route.
    pub second: Option<String>,
}

impl fmt::Display for RouteConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unknown = "<unknown>";
        write!(
            f,
            "{} {} registered by {} and {}",
            self.method,
            self.pattern,
            self.first.as_deref().unwrap_or(unknown),
            self.second.as_deref().unwrap_or(unknown)
        )
    }
}

/// Routes, scoped middleware and the optional root proxy of an app.
#[derive(Default)]
pub struct RouteTree {
    routes: Vec<Route>,
    index: HashMap<(String, Method), usize>,
    middlewares: BTreeMap<String, Vec<ScopedMiddleware>>,
    proxy: Option<Proxy>,
    conflicts: Vec<RouteConflict>,
}

impl RouteTree {
    /// Creates an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a route. A second route for the same pattern and method
    /// is recorded as a conflict and not added.
    pub fn add_route(&mut self, route: Route) {
        let key = (route.pattern.clone(), route.method);
        if let Some(&existing) = self.index.get(&key) {
            let conflict = RouteConflict {
                pattern: route.pattern.clone(),
                method: route.method,
                first: self.routes[existing].file_path.clone(),
                second: route.file_path.clone(),
            };
            tracing::warn!("duplicate route: {}", conflict);
            self.conflicts.push(conflict);
            return;
        }
        tracing::debug!(method = %route.method, pattern = %route.pattern, "registered route");
        self.index.insert(key, self.routes.len());
        self.routes.push(route);
    }

    /// Registers a page as a GET route.
    pub fn add_page(&mut self, page: Page) {
        self.add_route(page.into_route());
    }

    /// Registers a middleware for a URL prefix, limited to routes whose
    /// scope lies inside `scope`.
    pub fn add_middleware<F>(&mut self, prefix: impl Into<String>, scope: impl Into<String>, mw: F)
    where
        F: Fn(&mut Context, &Next) -> Result<()> + Send + Sync + 'static,
    {
        self.middlewares
            .entry(prefix.into())
            .or_default()
            .push(ScopedMiddleware {
                scope: scope.into(),
                middleware: Arc::new(mw),
            });
    }

    /// Sets the root proxy.
    pub fn set_proxy<F>(&mut self, proxy: F)
    where
        F: Fn(&mut Context) -> Result<ProxyAction> + Send + Sync + 'static,
    {
        self.proxy = Some(Arc::new(proxy));
    }

    /// The root proxy, if set.
    pub fn proxy(&self) -> Option<&Proxy> {
        self.proxy.as_ref()
    }

    /// Routes in mount order.
    pub fn routes(&self) -> Vec<&Route> {
        let mut routes: Vec<&Route> = self.routes.iter().collect();
        routes.sort_by(|a, b| route_order(a.key(), b.key()));
        routes
    }

    /// Number of registered routes.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// True when no route is registered.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Duplicate registrations, in the order they happened.
    pub fn conflicts(&self) -> &[RouteConflict] {
        &self.conflicts
    }

    /// Middleware applying to a route, outermost first.
    ///
    /// Root middleware comes first, then the middleware of every pattern
    /// prefix from the shortest to the full pattern. An entry applies only
    /// when its scope contains `route_scope`, which keeps group middleware
    /// out of sibling groups that share a URL prefix.
    pub fn middleware_chain(&self, pattern: &str, route_scope: &str) -> Vec<Middleware> {
        let mut prefixes = vec!["/".to_string()];
        let mut current = String::new();
        for segment in pattern.split('/').filter(|s| !s.is_empty()) {
            current.push('/');
            current.push_str(segment);
            prefixes.push(current.clone());
        }

        prefixes
            .iter()
            .filter_map(|prefix| self.middlewares.get(prefix))
            .flatten()
            .filter(|entry| scope_contains(&entry.scope, route_scope))
            .map(|entry| Arc::clone(&entry.middleware))
            .collect()
    }

    /// Registered middleware grouped by prefix and scope, with counts.
    pub fn middleware_prefixes(&self) -> Vec<(&str, &str, usize)> {
        let mut listing: Vec<(&str, &str, usize)> = Vec::new();
        for (prefix, entries) in &self.middlewares {
            for entry in entries {
                match listing
                    .iter_mut()
                    .find(|(p, s, _)| *p == prefix.as_str() && *s == entry.scope.as_str())
                {
                    Some((_, _, count)) => *count += 1,
                    None => listing.push((prefix.as_str(), entry.scope.as_str(), 1)),
                }
            }
        }
        listing
    }

    /// Mounts every route onto `router` in mount order.
    ///
    /// Each route is wrapped in `global`, then its scoped chain, then its
    /// own middleware. Rejections by the router are logged and reported;
    /// they do not stop the mount.
    pub fn mount<R: PathRouter>(&self, router: &mut R, global: &[Middleware]) -> MountReport {
        let mut report = MountReport::default();

        if let Some(proxy) = &self.proxy {
            router.set_proxy(Arc::clone(proxy));
        }

        for route in self.routes() {
            let mut chain: Vec<Middleware> = global.to_vec();
            chain.extend(self.middleware_chain(&route.pattern, &route.scope));
            chain.extend(route.middlewares.iter().cloned());

            let endpoint = adapt(route);
            let composed = compose(&chain, endpoint);

            let mut patterns = vec![route.pattern.clone()];
            patterns.extend(route.base_pattern());
            for pattern in patterns {
                match router.handle(route.method, &pattern, Arc::clone(&composed)) {
                    Ok(()) => report.mounted += 1,
                    Err(err) => {
                        tracing::warn!("failed to mount route: {}", err);
                        report.rejected.push(err);
                    }
                }
            }
        }

        tracing::info!(
            mounted = report.mounted,
            rejected = report.rejected.len(),
            "route tree mounted"
        );
        report
    }
}

/// Wraps a route's handler so it sees its catch-all under its own name.
fn adapt(route: &Route) -> Handler {
    let handler = Arc::clone(&route.handler);
    match route.catch_all_param.clone() {
        Some(name) => Arc::new(move |ctx: &mut Context| {
            ctx.expose_wildcard(&name);
            handler(ctx)
        }),
        None => handler,
    }
}

impl fmt::Debug for RouteTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteTree")
            .field("routes", &self.routes)
            .field("middlewares", &self.middleware_prefixes())
            .field("proxy", &self.proxy.is_some())
            .field("conflicts", &self.conflicts)
            .finish()
    }
}
