//! Route table.
//!
//! [`Router`] is the public face of the radix tree: it validates templates
//! on insert, rejects duplicate bindings, and tells "no such path" apart
//! from "path exists under another method" when matching.

use http::Method;

use crate::error::{MatchError, RouteError};
use crate::method_router::MethodRouter;
use crate::node::{normalize, parse_template, Node};
use crate::params::Params;
use crate::RouteMatch;

/// A radix tree router mapping `(method, path template)` to values of `T`.
///
/// # Example
///
/// ```rust
/// use stratus_router::{MatchError, Router};
/// use http::Method;
///
/// let mut router = Router::new();
/// router.insert(Method::GET, "/books", "listBooks").unwrap();
/// router.insert(Method::GET, "/books/{id}", "getBook").unwrap();
///
/// let found = router.at(&Method::GET, "/books/42").unwrap();
/// assert_eq!(*found.value, "getBook");
/// assert_eq!(found.params.get("id"), Some("42"));
///
/// assert_eq!(router.at(&Method::GET, "/authors").unwrap_err(), MatchError::NotFound);
/// ```
///
/// # Route priority
///
/// At every position the matcher prefers, in order:
///
/// 1. **Literal segments** (`/books/latest`)
/// 2. **Parameter segments** (`/books/{id}`)
/// 3. **Wildcards** (`/books/*rest`)
///
/// If a more specific branch dead-ends deeper in the path, the matcher backs
/// up and tries the next candidate.
#[derive(Debug, Clone)]
pub struct Router<T> {
    root: Node<T>,
    route_count: usize,
}

impl<T> Default for Router<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Router<T> {
    /// Creates an empty router.
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: Node::root(),
            route_count: 0,
        }
    }

    /// Binds `value` to `method` on `template`.
    ///
    /// Returns the normalized template on success.
    ///
    /// # Errors
    ///
    /// - [`RouteError::Conflict`] if the method is already bound to the same
    ///   normalized template (`/books/` and `/books` are the same template).
    /// - [`RouteError::InvalidTemplate`] if the template breaks the segment
    ///   grammar or names a parameter differently from an existing template
    ///   at the same position.
    pub fn insert(&mut self, method: Method, template: &str, value: T) -> Result<String, RouteError> {
        let segments = parse_template(template)?;
        let normalized = normalize(&segments);
        let methods = self.root.endpoint_mut(&segments, template)?;

        if methods.insert(method.clone(), value).is_err() {
            return Err(RouteError::Conflict {
                method,
                template: normalized,
            });
        }

        self.route_count += 1;
        Ok(normalized)
    }

    /// Matches a method and concrete path.
    ///
    /// # Errors
    ///
    /// - [`MatchError::NotFound`] if no template matches the path.
    /// - [`MatchError::MethodNotAllowed`] if a template matches but `method`
    ///   is not bound on it.
    pub fn at(&self, method: &Method, path: &str) -> Result<RouteMatch<'_, T>, MatchError> {
        let (methods, params) = self.root.match_path(path).ok_or(MatchError::NotFound)?;
        match methods.get(method) {
            Some(value) => Ok(RouteMatch::new(value, params)),
            None => Err(MatchError::MethodNotAllowed {
                allowed: methods.allowed(),
            }),
        }
    }

    /// Matches a path regardless of method.
    #[must_use]
    pub fn match_path(&self, path: &str) -> Option<(&MethodRouter<T>, Params)> {
        self.root.match_path(path)
    }

    /// Number of `(method, template)` bindings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.route_count
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.route_count == 0
    }
}
