// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Function types for handlers, middleware, pages and the root proxy.

use std::fmt;
use std::sync::Arc;

use crate::context::{Context, Html, ProxyAction};
use crate::error::Result;

/// A route endpoint: `pub fn get(ctx: &mut Context) -> Result<()>`.
pub type Handler = Arc<dyn Fn(&mut Context) -> Result<()> + Send + Sync>;

/// A middleware: `pub fn middleware(ctx: &mut Context, next: &Next) -> Result<()>`.
pub type Middleware = Arc<dyn Fn(&mut Context, &Next) -> Result<()> + Send + Sync>;

/// The root proxy: `pub fn proxy(ctx: &mut Context) -> Result<ProxyAction>`.
pub type Proxy = Arc<dyn Fn(&mut Context) -> Result<ProxyAction> + Send + Sync>;

/// A page renderer: `pub fn page(ctx: &mut Context) -> Result<Html>`.
pub type PageFn = Arc<dyn Fn(&mut Context) -> Result<Html> + Send + Sync>;

/// A layout: `pub fn layout(ctx: &mut Context, children: Html) -> Result<Html>`.
pub type LayoutFn = Arc<dyn Fn(&mut Context, Html) -> Result<Html> + Send + Sync>;

/// A page loader: `pub fn load(ctx: &mut Context) -> Result<()>`.
pub type LoaderFn = Arc<dyn Fn(&mut Context) -> Result<()> + Send + Sync>;

/// The rest of the chain, as seen from inside a middleware.
#[derive(Clone)]
pub struct Next {
    inner: Handler,
}

impl Next {
    /// Runs the remaining middleware and the endpoint.
    pub fn run(&self, ctx: &mut Context) -> Result<()> {
        (self.inner)(ctx)
    }
}

impl fmt::Debug for Next {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Next").finish_non_exhaustive()
    }
}

/// Wraps a function or closure as a [`Handler`].
pub fn handler<F>(f: F) -> Handler
where
    F: Fn(&mut Context) -> Result<()> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Wraps a function or closure as a [`Middleware`].
pub fn middleware<F>(f: F) -> Middleware
where
    F: Fn(&mut Context, &Next) -> Result<()> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Composes `chain` around `endpoint`. The first middleware is outermost.
pub fn compose(chain: &[Middleware], endpoint: Handler) -> Handler {
    chain.iter().rev().fold(endpoint, |inner, mw| {
        let mw = Arc::clone(mw);
        let next = Next { inner };
        let wrapped: Handler = Arc::new(move |ctx: &mut Context| mw(ctx, &next));
        wrapped
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Request;
    use crate::method::Method;
    use serde_json::json;

    fn tracing_mw(label: &'static str) -> Middleware {
        middleware(move |ctx, next| {
            let mut trail = ctx
                .local("trail")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string();
            trail.push_str(label);
            ctx.set_local("trail", json!(trail));
            next.run(ctx)
        })
    }

    #[test]
    fn test_first_middleware_is_outermost() {
        let endpoint = handler(|ctx| {
            let trail = ctx.local("trail").and_then(|v| v.as_str()).unwrap_or_default();
            let body = format!("{trail}!");
            ctx.text(200, body);
            Ok(())
        });
        let composed = compose(&[tracing_mw("a"), tracing_mw("b"), tracing_mw("c")], endpoint);

        let mut ctx = Context::new(Request::new(Method::Get, "/"));
        composed(&mut ctx).unwrap();
        assert_eq!(ctx.into_response().body_str(), Some("abc!"));
    }

    #[test]
    fn test_middleware_can_short_circuit() {
        let deny = middleware(|ctx, _next| {
            ctx.status(401);
            Ok(())
        });
        let endpoint = handler(|ctx| {
            ctx.text(200, "secret");
            Ok(())
        });
        let composed = compose(&[deny], endpoint);

        let mut ctx = Context::new(Request::new(Method::Get, "/"));
        composed(&mut ctx).unwrap();
        assert_eq!(ctx.into_response().status, 401);
    }

    #[test]
    fn test_empty_chain_is_endpoint() {
        let endpoint = handler(|ctx| {
            ctx.status(204);
            Ok(())
        });
        let composed = compose(&[], endpoint);
        let mut ctx = Context::new(Request::new(Method::Get, "/"));
        composed(&mut ctx).unwrap();
        assert_eq!(ctx.into_response().status, 204);
    }
}
