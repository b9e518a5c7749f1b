// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Directory-name classification for file-system routing.
//!
//! Two grammars are understood at the same time. The bracket grammar is
//! tried first, the legacy underscore grammar second, and anything else is
//! a static segment:
//!
//! | Directory      | Legacy          | Kind             | URL      |
//! |----------------|-----------------|------------------|----------|
//! | `[[...slug]]`  | `___slug`       | OptionalCatchAll | `*`      |
//! | `[...slug]`    | `__slug`        | CatchAll         | `*`      |
//! | `[id]`         | `_id`           | Dynamic          | `{id}`   |
//! | `(admin)`      | `_group_admin`, `_admin_` | Group  | omitted  |
//! | `users`        |                 | Static           | `users`  |
//!
//! Dot-prefixed directories and the reserved private folders
//! (`_components`, `_lib`, `_utils`, `_private`) are never routable.
//!
//! In URL patterns `{name}` is a placeholder and `*` (or `{*name}`) a
//! wildcard. Braces in static segments are doubled (`{{`, `}}`) so a
//! directory literally named `{id}` stays a literal. A static directory
//! named `*` cannot be expressed and is skipped by the scanner.

use serde::Serialize;

/// Folders that look like legacy dynamic segments but hold shared code.
const PRIVATE_FOLDERS: &[&str] = &["_components", "_lib", "_utils", "_private"];

/// Kind of a classified directory segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SegmentKind {
    /// Literal path component (e.g. "blog").
    Static,
    /// Single-component parameter (e.g. "[id]" -> "{id}").
    Dynamic,
    /// Rest-of-path parameter (e.g. "[...slug]" -> "*").
    CatchAll,
    /// Rest-of-path parameter that also matches the empty rest.
    OptionalCatchAll,
    /// Route group: scopes middleware and layouts, never part of the URL.
    Group,
}

/// One classified directory component.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Segment {
    /// The directory name as written on disk.
    pub raw: String,
    /// Parameter or group name; the raw name for static segments.
    pub name: String,
    /// Classification result.
    pub kind: SegmentKind,
}

impl Segment {
    /// Classifies one directory name. Total: every input yields a segment,
    /// with [`SegmentKind::Static`] as the fallback.
    pub fn classify(raw: &str) -> Self {
        let (kind, name) = classify_bracket(raw)
            .or_else(|| classify_legacy(raw))
            .unwrap_or((SegmentKind::Static, raw));

        Self {
            raw: raw.to_string(),
            name: name.to_string(),
            kind,
        }
    }

    /// Returns true for directories whose whole subtree is excluded from
    /// scanning.
    pub fn is_private(raw: &str) -> bool {
        raw.starts_with('.') || PRIVATE_FOLDERS.contains(&raw)
    }

    /// Returns true for catch-all and optional catch-all segments.
    pub fn is_wildcard(&self) -> bool {
        matches!(
            self.kind,
            SegmentKind::CatchAll | SegmentKind::OptionalCatchAll
        )
    }

    /// Returns true for route group segments.
    pub fn is_group(&self) -> bool {
        self.kind == SegmentKind::Group
    }

    /// Returns true for a static segment that would read back as a
    /// wildcard in a pattern.
    pub fn is_unroutable(&self) -> bool {
        self.kind == SegmentKind::Static && self.raw == "*"
    }

    /// Renders the segment as a URL pattern component; `None` for groups.
    pub fn to_pattern(&self) -> Option<String> {
        match self.kind {
            SegmentKind::Static => Some(escape_literal(&self.raw)),
            SegmentKind::Dynamic => Some(format!("{{{}}}", self.name)),
            SegmentKind::CatchAll | SegmentKind::OptionalCatchAll => Some("*".to_string()),
            SegmentKind::Group => None,
        }
    }
}

fn classify_bracket(raw: &str) -> Option<(SegmentKind, &str)> {
    if let Some(name) = strip(raw, "[[...", "]]").and_then(valid_name) {
        return Some((SegmentKind::OptionalCatchAll, name));
    }
    if let Some(name) = strip(raw, "[...", "]").and_then(valid_name) {
        return Some((SegmentKind::CatchAll, name));
    }
    if let Some(name) = strip(raw, "[", "]").and_then(valid_name) {
        return Some((SegmentKind::Dynamic, name));
    }
    if let Some(name) = strip(raw, "(", ")").and_then(valid_name) {
        return Some((SegmentKind::Group, name));
    }
    None
}

fn classify_legacy(raw: &str) -> Option<(SegmentKind, &str)> {
    if Segment::is_private(raw) {
        return None;
    }
    if let Some(name) = raw.strip_prefix("___").and_then(valid_name) {
        return Some((SegmentKind::OptionalCatchAll, name));
    }
    if let Some(name) = raw.strip_prefix("__").and_then(valid_name) {
        return Some((SegmentKind::CatchAll, name));
    }
    if let Some(name) = raw.strip_prefix("_group_").and_then(valid_name) {
        return Some((SegmentKind::Group, name));
    }
    if let Some(name) = strip(raw, "_", "_").and_then(valid_name) {
        return Some((SegmentKind::Group, name));
    }
    if let Some(name) = raw.strip_prefix('_').and_then(valid_name) {
        return Some((SegmentKind::Dynamic, name));
    }
    None
}

fn strip<'a>(raw: &'a str, prefix: &str, suffix: &str) -> Option<&'a str> {
    raw.strip_prefix(prefix)?.strip_suffix(suffix)
}

/// Parameter and group names: ASCII alphanumerics, `_` and `-`, with at
/// least one alphanumeric.
fn valid_name(name: &str) -> Option<&str> {
    let allowed = name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    let has_alnum = name.chars().any(|c| c.is_ascii_alphanumeric());
    (allowed && has_alnum).then_some(name)
}

/// Doubles braces so a literal never reads as a placeholder.
fn escape_literal(raw: &str) -> String {
    raw.replace('{', "{{").replace('}', "}}")
}

/// Returns true when a pattern component is a wildcard: `*` or `{*name}`.
pub fn is_wildcard_part(part: &str) -> bool {
    part == "*" || part.starts_with("{*")
}

/// Returns true when a pattern component is a `{name}` placeholder.
/// Escaped literals (`{{id}}`) are not.
pub fn is_placeholder_part(part: &str) -> bool {
    part.len() > 2 && part.starts_with('{') && !part.starts_with("{{") && part.ends_with('}')
}

/// Builds the public URL pattern for a segment chain.
///
/// Groups are omitted, dynamic segments render as `{name}`, and the first
/// wildcard renders as `*` and ends the pattern.
pub fn build_url_pattern(segments: &[Segment]) -> String {
    let mut parts = Vec::new();
    for segment in segments {
        if let Some(part) = segment.to_pattern() {
            parts.push(part);
        }
        if segment.is_wildcard() {
            break;
        }
    }
    format!("/{}", parts.join("/"))
}

/// Builds the scope string: every raw segment, groups included.
pub fn build_scope(segments: &[Segment]) -> String {
    segments
        .iter()
        .map(|s| s.raw.as_str())
        .collect::<Vec<_>>()
        .join("/")
}

/// Returns the first wildcard segment of the chain, if any.
pub fn catch_all(segments: &[Segment]) -> Option<&Segment> {
    segments.iter().find(|s| s.is_wildcard())
}

/// Returns true when `scope` covers `route_scope`: `scope` is empty, equal,
/// or a whole-segment prefix of it.
pub fn scope_contains(scope: &str, route_scope: &str) -> bool {
    scope.is_empty()
        || route_scope == scope
        || route_scope
            .strip_prefix(scope)
            .is_some_and(|rest| rest.starts_with('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kind_and_name(raw: &str) -> (SegmentKind, String) {
        let segment = Segment::classify(raw);
        (segment.kind, segment.name)
    }

    fn chain(path: &str) -> Vec<Segment> {
        path.split('/')
            .filter(|s| !s.is_empty())
            .map(Segment::classify)
            .collect()
    }

    #[test]
    fn test_bracket_grammar() {
        assert_eq!(kind_and_name("[id]"), (SegmentKind::Dynamic, "id".into()));
        assert_eq!(kind_and_name("[...slug]"), (SegmentKind::CatchAll, "slug".into()));
        assert_eq!(
            kind_and_name("[[...slug]]"),
            (SegmentKind::OptionalCatchAll, "slug".into())
        );
        assert_eq!(kind_and_name("(admin)"), (SegmentKind::Group, "admin".into()));
    }

    #[test]
    fn test_legacy_grammar() {
        assert_eq!(kind_and_name("_id"), (SegmentKind::Dynamic, "id".into()));
        assert_eq!(kind_and_name("__slug"), (SegmentKind::CatchAll, "slug".into()));
        assert_eq!(
            kind_and_name("___slug"),
            (SegmentKind::OptionalCatchAll, "slug".into())
        );
        assert_eq!(kind_and_name("_group_admin"), (SegmentKind::Group, "admin".into()));
        assert_eq!(kind_and_name("_admin_"), (SegmentKind::Group, "admin".into()));
    }

    #[test]
    fn test_static_fallback() {
        for raw in ["users", "about-us", "_", "__", "___", "[]", "[...]", "()", "[a/b]", "x]"] {
            assert_eq!(Segment::classify(raw).kind, SegmentKind::Static, "{raw}");
        }
    }

    #[test]
    fn test_bracket_grammar_wins_over_legacy() {
        // "[_id]" is a bracket dynamic whose parameter happens to start with "_".
        assert_eq!(kind_and_name("[_id]"), (SegmentKind::Dynamic, "_id".into()));
    }

    #[test]
    fn test_private_folders_are_static() {
        for raw in ["_components", "_lib", ".git", ".cache"] {
            assert!(Segment::is_private(raw));
            assert_eq!(Segment::classify(raw).kind, SegmentKind::Static);
        }
        assert!(!Segment::is_private("_id"));
    }

    #[test]
    fn test_build_url_pattern() {
        assert_eq!(build_url_pattern(&[]), "/");
        assert_eq!(build_url_pattern(&chain("users/[id]")), "/users/{id}");
        assert_eq!(build_url_pattern(&chain("users/_id")), "/users/{id}");
        assert_eq!(build_url_pattern(&chain("docs/[...slug]")), "/docs/*");
        assert_eq!(build_url_pattern(&chain("(admin)/dashboard")), "/dashboard");
        assert_eq!(build_url_pattern(&chain("(admin)")), "/");
    }

    #[test]
    fn test_placeholder_shaped_static_is_escaped() {
        for raw in ["{id}", "{*rest}", "a{b}"] {
            assert_eq!(Segment::classify(raw).kind, SegmentKind::Static, "{raw}");
        }
        assert_eq!(build_url_pattern(&chain("{id}")), "/{{id}}");
        assert_eq!(build_url_pattern(&chain("files/{*rest}")), "/files/{{*rest}}");
        assert!(!is_placeholder_part("{{id}}"));
        assert!(!is_wildcard_part("{{*rest}}"));
        assert!(is_placeholder_part("{id}"));
        assert!(is_wildcard_part("{*rest}"));
        assert!(Segment::classify("*").is_unroutable());
        assert!(!Segment::classify("[...rest]").is_unroutable());
    }

    #[test]
    fn test_wildcard_terminates_pattern() {
        assert_eq!(build_url_pattern(&chain("docs/[...slug]/edit")), "/docs/*");
        assert_eq!(build_url_pattern(&chain("docs/___rest/[id]")), "/docs/*");
    }

    #[test]
    fn test_build_scope_keeps_groups() {
        assert_eq!(build_scope(&chain("(admin)/dashboard")), "(admin)/dashboard");
        assert_eq!(build_scope(&chain("_group_auth/settings")), "_group_auth/settings");
        assert_eq!(build_scope(&[]), "");
    }

    #[test]
    fn test_scope_contains_is_segment_aware() {
        assert!(scope_contains("", "(auth)/settings"));
        assert!(scope_contains("(admin)", "(admin)/dashboard"));
        assert!(scope_contains("(admin)", "(admin)"));
        assert!(!scope_contains("(admin)", "(auth)/settings"));
        assert!(!scope_contains("users", "users-archive/[id]"));
    }

    #[test]
    fn test_catch_all_lookup() {
        let segments = chain("docs/[...slug]");
        let wildcard = catch_all(&segments).unwrap();
        assert_eq!(wildcard.name, "slug");
        assert!(catch_all(&chain("users/[id]")).is_none());
    }
}
