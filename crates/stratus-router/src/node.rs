//! Radix tree nodes and template parsing.
//!
//! Each node owns one path segment. Static children are kept sorted so a
//! lookup is a binary search; a node has at most one parameter child and
//! at most one wildcard child.

use crate::error::RouteError;
use crate::method_router::MethodRouter;
use crate::params::Params;

/// Kind of a template segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SegmentKind {
    /// Literal text, e.g. `books`.
    Static,
    /// Named parameter, e.g. `{id}`. Matches one non-empty segment.
    Param(String),
    /// Trailing wildcard, `*path` or `{path+}`. Matches one or more segments.
    Wildcard(String),
}

/// Characters that may not appear in a literal segment or parameter name.
const RESERVED: &[char] = &['{', '}', '*', '+'];

/// A parsed template segment: the raw text plus its kind.
pub(crate) type Segment = (String, SegmentKind);

/// Splits a template into segments, validating the grammar.
///
/// Empty segments are ignored, so `/books/` and `/books` parse the same.
pub(crate) fn parse_template(template: &str) -> Result<Vec<Segment>, RouteError> {
    let raw: Vec<&str> = template.split('/').filter(|s| !s.is_empty()).collect();
    let mut segments = Vec::with_capacity(raw.len());
    let mut names: Vec<String> = Vec::new();

    for (index, text) in raw.iter().enumerate() {
        let kind = if let Some(inner) = text.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
            match inner.strip_suffix('+') {
                Some(name) => SegmentKind::Wildcard(name.to_string()),
                None => SegmentKind::Param(inner.to_string()),
            }
        } else if let Some(name) = text.strip_prefix('*') {
            SegmentKind::Wildcard(name.to_string())
        } else if text.contains(RESERVED) {
            return Err(RouteError::invalid(
                template,
                format!("unbalanced braces in segment '{text}'"),
            ));
        } else {
            SegmentKind::Static
        };

        if let SegmentKind::Param(name) | SegmentKind::Wildcard(name) = &kind {
            if name.is_empty() || name.contains(RESERVED) {
                return Err(RouteError::invalid(
                    template,
                    format!("invalid parameter name in segment '{text}'"),
                ));
            }
            if names.contains(name) {
                return Err(RouteError::invalid(
                    template,
                    format!("parameter '{name}' is captured twice"),
                ));
            }
            names.push(name.clone());
        }
        if matches!(kind, SegmentKind::Wildcard(_)) && index + 1 != raw.len() {
            return Err(RouteError::invalid(
                template,
                "a wildcard must be the last segment",
            ));
        }

        segments.push(((*text).to_string(), kind));
    }

    Ok(segments)
}

/// Renders parsed segments in canonical form (`/a/{b}/*c`).
pub(crate) fn normalize(segments: &[Segment]) -> String {
    if segments.is_empty() {
        return "/".to_string();
    }
    let mut out = String::new();
    for (text, kind) in segments {
        out.push('/');
        match kind {
            SegmentKind::Static => out.push_str(text),
            SegmentKind::Param(name) => {
                out.push('{');
                out.push_str(name);
                out.push('}');
            }
            SegmentKind::Wildcard(name) => {
                out.push('*');
                out.push_str(name);
            }
        }
    }
    out
}

/// A node in the radix tree.
#[derive(Debug, Clone)]
pub(crate) struct Node<T> {
    segment: String,
    kind: SegmentKind,
    methods: Option<MethodRouter<T>>,
    static_children: Vec<Node<T>>,
    param_child: Option<Box<Node<T>>>,
    wildcard_child: Option<Box<Node<T>>>,
}

impl<T> Node<T> {
    fn new(segment: impl Into<String>, kind: SegmentKind) -> Self {
        Self {
            segment: segment.into(),
            kind,
            methods: None,
            static_children: Vec::new(),
            param_child: None,
            wildcard_child: None,
        }
    }

    /// The unnamed root of a tree.
    pub(crate) fn root() -> Self {
        Self::new("", SegmentKind::Static)
    }

    /// Walks (and grows) the tree along `segments`, returning the method
    /// table at the end of the path.
    ///
    /// Two templates that put differently named parameters at the same
    /// position are rejected, since one capture slot cannot carry two names.
    pub(crate) fn endpoint_mut(
        &mut self,
        segments: &[Segment],
        template: &str,
    ) -> Result<&mut MethodRouter<T>, RouteError> {
        let Some(((text, kind), rest)) = segments.split_first() else {
            return Ok(self.methods.get_or_insert_with(MethodRouter::new));
        };

        match kind {
            SegmentKind::Static => {
                let index = match self
                    .static_children
                    .binary_search_by(|c| c.segment.as_str().cmp(text))
                {
                    Ok(index) => index,
                    Err(index) => {
                        self.static_children
                            .insert(index, Node::new(text.clone(), SegmentKind::Static));
                        index
                    }
                };
                self.static_children[index].endpoint_mut(rest, template)
            }
            SegmentKind::Param(name) => {
                let child = self
                    .param_child
                    .get_or_insert_with(|| Box::new(Node::new(text.clone(), kind.clone())));
                Self::check_name(&child.kind, name, template)?;
                child.endpoint_mut(rest, template)
            }
            SegmentKind::Wildcard(name) => {
                let child = self
                    .wildcard_child
                    .get_or_insert_with(|| Box::new(Node::new(text.clone(), kind.clone())));
                Self::check_name(&child.kind, name, template)?;
                Ok(child.methods.get_or_insert_with(MethodRouter::new))
            }
        }
    }

    fn check_name(existing: &SegmentKind, name: &str, template: &str) -> Result<(), RouteError> {
        match existing {
            SegmentKind::Param(current) | SegmentKind::Wildcard(current) if current != name => {
                Err(RouteError::invalid(
                    template,
                    format!("parameter '{name}' conflicts with '{current}' registered at the same position"),
                ))
            }
            _ => Ok(()),
        }
    }

    /// Matches a concrete path, returning the method table and captures.
    pub(crate) fn match_path(&self, path: &str) -> Option<(&MethodRouter<T>, Params)> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let mut params = Params::new();
        let methods = self.match_segments(&segments, &mut params)?;
        Some((methods, params))
    }

    fn match_segments<'a>(
        &'a self,
        segments: &[&str],
        params: &mut Params,
    ) -> Option<&'a MethodRouter<T>> {
        let Some((segment, rest)) = segments.split_first() else {
            return self.methods.as_ref();
        };

        if let Some(child) = self.find_static_child(segment) {
            if let Some(found) = child.match_segments(rest, params) {
                return Some(found);
            }
        }

        if let Some(child) = &self.param_child {
            if let SegmentKind::Param(name) = &child.kind {
                let mark = params.len();
                params.push(name.clone(), *segment);
                if let Some(found) = child.match_segments(rest, params) {
                    return Some(found);
                }
                params.truncate(mark);
            }
        }

        if let Some(child) = &self.wildcard_child {
            if let (SegmentKind::Wildcard(name), Some(methods)) = (&child.kind, &child.methods) {
                params.push(name.clone(), segments.join("/"));
                return Some(methods);
            }
        }

        None
    }

    fn find_static_child(&self, segment: &str) -> Option<&Node<T>> {
        self.static_children
            .binary_search_by(|c| c.segment.as_str().cmp(segment))
            .ok()
            .map(|i| &self.static_children[i])
    }
}
