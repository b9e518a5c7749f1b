// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Static analysis of marker files.
//!
//! A [`SourceFile`] is parsed with `syn` and never compiled or executed. It
//! answers three questions: which top-level functions carry a given name,
//! whether a function has the shape its marker kind requires, and what the
//! exact source text of that function is, so the generator can inline it.

use std::ops::Range;

use proc_macro2::{LineColumn, Span};
use syn::{FnArg, GenericArgument, Item, ItemFn, PathArguments, ReturnType, Type, Visibility};

use super::types::Function;

const BOM: char = '\u{feff}';

/// A marker file that failed to parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFailure {
    /// Line of the error (1-indexed).
    pub line: usize,
    /// Column of the error (1-indexed).
    pub column: usize,
    /// Parser message.
    pub message: String,
}

/// A parsed marker file together with its original text.
pub struct SourceFile {
    text: String,
    ast: syn::File,
    line_starts: Vec<usize>,
}

impl SourceFile {
    /// Parses Rust source text.
    ///
    /// A leading byte order mark is dropped before parsing, since `syn`
    /// computes columns without it.
    pub fn parse(text: impl Into<String>) -> Result<Self, ParseFailure> {
        let mut text = text.into();
        if text.starts_with(BOM) {
            text.drain(..BOM.len_utf8());
        }
        let ast = syn::parse_file(&text).map_err(|err| {
            let start = err.span().start();
            ParseFailure {
                line: start.line,
                column: start.column + 1,
                message: err.to_string(),
            }
        })?;
        let line_starts = std::iter::once(0)
            .chain(text.match_indices('\n').map(|(i, _)| i + 1))
            .collect();

        Ok(Self {
            text,
            ast,
            line_starts,
        })
    }

    /// Top-level function items, in source order.
    pub fn functions(&self) -> impl Iterator<Item = &ItemFn> {
        self.ast.items.iter().filter_map(|item| match item {
            Item::Fn(f) => Some(f),
            _ => None,
        })
    }

    /// The top-level function with the given name, exported or not.
    pub fn function(&self, name: &str) -> Option<&ItemFn> {
        self.functions().find(|f| f.sig.ident == name)
    }

    /// Verbatim text of every top-level `use` item.
    pub fn imports(&self) -> Vec<String> {
        self.ast
            .items
            .iter()
            .filter_map(|item| match item {
                Item::Use(u) => {
                    let start = u
                        .attrs
                        .first()
                        .map(|a| a.pound_token.span)
                        .or_else(|| visibility_span(&u.vis))
                        .unwrap_or(u.use_token.span);
                    Some(self.slice(start.start(), u.semi_token.span.end()).to_string())
                }
                _ => None,
            })
            .collect()
    }

    /// Cuts the function's exact source text out of the file.
    pub fn extract(&self, item: &ItemFn) -> Function {
        let start = item
            .attrs
            .first()
            .map(|a| a.pound_token.span)
            .or_else(|| visibility_span(&item.vis))
            .unwrap_or(item.sig.fn_token.span)
            .start();
        let end = item.block.brace_token.span.close().end();

        let base = self.offset(start);
        let ident = item.sig.ident.span();
        let name_range = (self.offset(ident.start()) - base)..(self.offset(ident.end()) - base);

        Function {
            name: item.sig.ident.to_string(),
            line: ident.start().line,
            source: self.slice(start, end).to_string(),
            name_range,
        }
    }

    fn slice(&self, start: LineColumn, end: LineColumn) -> &str {
        &self.text[self.offset(start)..self.offset(end)]
    }

    /// Byte offset of a line/column position. Columns count characters.
    fn offset(&self, at: LineColumn) -> usize {
        let Some(&line_start) = self.line_starts.get(at.line.saturating_sub(1)) else {
            return self.text.len();
        };
        self.text[line_start..]
            .char_indices()
            .nth(at.column)
            .map(|(i, _)| line_start + i)
            .unwrap_or(self.text.len())
    }
}

/// Byte range helper used by tests and the generator.
pub(crate) fn splice(source: &str, range: &Range<usize>, replacement: &str) -> String {
    let mut out = String::with_capacity(source.len() + replacement.len());
    out.push_str(&source[..range.start]);
    out.push_str(replacement);
    out.push_str(&source[range.end..]);
    out
}

fn visibility_span(vis: &Visibility) -> Option<Span> {
    match vis {
        Visibility::Public(token) => Some(token.span),
        Visibility::Restricted(r) => Some(r.pub_token.span),
        Visibility::Inherited => None,
    }
}

/// Returns true for plain `pub` items.
pub fn is_exported(item: &ItemFn) -> bool {
    matches!(item.vis, Visibility::Public(_))
}

/// The shape a marker function must have.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Contract {
    /// `fn(ctx: &mut Context) -> Result<()>` in `route.rs`.
    Handler,
    /// `fn(ctx: &mut Context, next: &Next) -> Result<()>`.
    Middleware,
    /// `fn(ctx: &mut Context) -> Result<()>` in `loader.rs`.
    Loader,
    /// `fn(ctx: &mut Context) -> Result<ProxyAction>`.
    Proxy,
    /// `fn(ctx: &mut Context) -> Result<Html>`.
    Page,
    /// `fn(ctx: &mut Context, children: Html) -> Result<Html>`.
    Layout,
}

impl Contract {
    /// The expected signature, for warnings.
    pub fn expected(&self) -> &'static str {
        match self {
            Contract::Handler | Contract::Loader => "fn(ctx: &mut Context) -> Result<()>",
            Contract::Middleware => "fn(ctx: &mut Context, next: &Next) -> Result<()>",
            Contract::Proxy => "fn(ctx: &mut Context) -> Result<ProxyAction>",
            Contract::Page => "fn(ctx: &mut Context) -> Result<Html>",
            Contract::Layout => "fn(ctx: &mut Context, children: Html) -> Result<Html>",
        }
    }

    fn arity(&self) -> usize {
        match self {
            Contract::Middleware | Contract::Layout => 2,
            _ => 1,
        }
    }

    /// `None` means the success type must be `()`.
    fn success_type(&self) -> Option<&'static str> {
        match self {
            Contract::Proxy => Some("ProxyAction"),
            Contract::Page | Contract::Layout => Some("Html"),
            _ => None,
        }
    }
}

/// Structurally checks a function against a contract.
///
/// Types are matched by their last path segment, so `Context`,
/// `trellis::Context` and `crate::Context` are all accepted.
pub fn check_signature(item: &ItemFn, contract: Contract) -> Result<(), String> {
    let sig = &item.sig;
    if sig.asyncness.is_some() {
        return Err("async functions are not supported".to_string());
    }
    if !sig.generics.params.is_empty() {
        return Err("generic functions are not supported".to_string());
    }
    if sig.inputs.iter().any(|arg| matches!(arg, FnArg::Receiver(_))) {
        return Err("functions taking `self` are not supported".to_string());
    }

    let args: Vec<&FnArg> = sig.inputs.iter().collect();
    if args.len() != contract.arity() {
        return Err(format!(
            "expected {} parameter(s), found {}",
            contract.arity(),
            args.len()
        ));
    }
    if !is_reference_to(args[0], "Context", true) {
        return Err("first parameter must be `&mut Context`".to_string());
    }
    match contract {
        Contract::Middleware if !is_reference_to(args[1], "Next", false) => {
            return Err("second parameter must be `&Next`".to_string());
        }
        Contract::Layout if !arg_type(args[1]).is_some_and(|ty| is_named(ty, "Html")) => {
            return Err("second parameter must be `Html`".to_string());
        }
        _ => {}
    }

    let ReturnType::Type(_, output) = &sig.output else {
        return Err("missing return type, expected `Result<..>`".to_string());
    };
    let Some(ok) = result_ok_type(output) else {
        return Err("return type must be `Result<..>`".to_string());
    };
    let ok_matches = match contract.success_type() {
        Some(name) => is_named(ok, name),
        None => matches!(ok, Type::Tuple(t) if t.elems.is_empty()),
    };
    if !ok_matches {
        return Err(format!(
            "return type must be `Result<{}>`",
            contract.success_type().unwrap_or("()")
        ));
    }
    Ok(())
}

fn arg_type(arg: &FnArg) -> Option<&Type> {
    match arg {
        FnArg::Typed(pat) => Some(&pat.ty),
        FnArg::Receiver(_) => None,
    }
}

fn is_reference_to(arg: &FnArg, name: &str, mutable: bool) -> bool {
    match arg_type(arg) {
        Some(Type::Reference(r)) => r.mutability.is_some() == mutable && is_named(&r.elem, name),
        _ => false,
    }
}

fn is_named(ty: &Type, name: &str) -> bool {
    match ty {
        Type::Path(p) => {
            p.qself.is_none() && p.path.segments.last().is_some_and(|s| s.ident == name)
        }
        Type::Paren(p) => is_named(&p.elem, name),
        _ => false,
    }
}

/// The first generic argument of a `Result<..>` return type.
fn result_ok_type(ty: &Type) -> Option<&Type> {
    let Type::Path(p) = ty else { return None };
    let last = p.path.segments.last()?;
    if last.ident != "Result" {
        return None;
    }
    let PathArguments::AngleBracketed(args) = &last.arguments else {
        return None;
    };
    args.args.iter().find_map(|arg| match arg {
        GenericArgument::Type(t) => Some(t),
        _ => None,
    })
}
