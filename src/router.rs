//! Exact-match route table.
//!
//! Routes are kept in registration order. A path is matched byte for byte:
//! no parameters, no wildcards, no trailing-slash folding. Registration never
//! fails and never rejects duplicates; when two bindings share a path and
//! method, the one registered first wins.

use std::collections::HashMap;

use http::Method;

use crate::handler::{BoxedHandler, Handler};
use crate::middleware::{BoxedMiddleware, Middleware};

/// One (path, method) → handler binding.
pub struct Route {
    index: usize,
    path: String,
    method: Method,
    pub(crate) handler: BoxedHandler,
    pub(crate) middleware: Vec<BoxedMiddleware>,
}

impl Route {
    /// Attaches an observer to this route. Returns `self` for chaining.
    ///
    /// Observers run before the handler, most recently attached first.
    pub fn with(&mut self, middleware: impl Middleware) -> &mut Self {
        self.middleware.push(std::sync::Arc::new(middleware));
        self
    }

    /// Registration position; unique within its router.
    pub fn index(&self) -> usize { self.index }
    pub fn path(&self) -> &str { &self.path }
    pub fn method(&self) -> &Method { &self.method }
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route")
            .field("index", &self.index)
            .field("path", &self.path)
            .field("method", &self.method)
            .field("middleware", &self.middleware.len())
            .finish()
    }
}

/// Result of [`Router::lookup`].
#[derive(Debug)]
pub enum Lookup<'r> {
    Found(&'r Route),
    /// No binding has this path.
    RouteNotFound,
    /// The path is bound, but not for this method.
    MethodNotAllowed,
}

/// The application's route table.
///
/// Build it at startup, then hand it to [`Server::serve`](crate::Server::serve)
/// or a [`Dispatcher`](crate::Dispatcher). Both take it by value, so no route
/// can be added once requests are being served.
#[derive(Debug, Default)]
pub struct Router {
    routes: Vec<Route>,
    // path → indices into `routes`, ascending
    by_path: HashMap<String, Vec<usize>>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for a method + path pair.
    ///
    /// Returns the new binding so middleware can be attached:
    ///
    /// ```rust
    /// # use waypost::{Context, Router, middleware};
    /// # use http::Method;
    /// # fn list(_: &mut Context) {}
    /// let mut app = Router::new();
    /// app.on(Method::GET, "/tracks", list).with(middleware::trace);
    /// ```
    pub fn on(&mut self, method: Method, path: &str, handler: impl Handler) -> &mut Route {
        let index = self.routes.len();
        self.by_path.entry(path.to_owned()).or_default().push(index);
        self.routes.push(Route {
            index,
            path: path.to_owned(),
            method,
            handler: handler.into_boxed_handler(),
            middleware: Vec::new(),
        });
        &mut self.routes[index]
    }

    pub fn get(&mut self, path: &str, handler: impl Handler) -> &mut Route {
        self.on(Method::GET, path, handler)
    }

    pub fn post(&mut self, path: &str, handler: impl Handler) -> &mut Route {
        self.on(Method::POST, path, handler)
    }

    pub fn put(&mut self, path: &str, handler: impl Handler) -> &mut Route {
        self.on(Method::PUT, path, handler)
    }

    pub fn delete(&mut self, path: &str, handler: impl Handler) -> &mut Route {
        self.on(Method::DELETE, path, handler)
    }

    pub fn patch(&mut self, path: &str, handler: impl Handler) -> &mut Route {
        self.on(Method::PATCH, path, handler)
    }

    pub fn head(&mut self, path: &str, handler: impl Handler) -> &mut Route {
        self.on(Method::HEAD, path, handler)
    }

    pub fn options(&mut self, path: &str, handler: impl Handler) -> &mut Route {
        self.on(Method::OPTIONS, path, handler)
    }

    /// Resolves `path` and `method` to a binding.
    ///
    /// Bindings for `path` are checked in registration order and the first
    /// whose method equals `method` (case-sensitive) is returned. A path with
    /// bindings but none for `method` is [`Lookup::MethodNotAllowed`], which
    /// the dispatcher answers with 405 rather than 404.
    pub fn lookup(&self, path: &str, method: &str) -> Lookup<'_> {
        let Some(candidates) = self.by_path.get(path) else {
            return Lookup::RouteNotFound;
        };
        candidates
            .iter()
            .map(|&i| &self.routes[i])
            .find(|route| route.method.as_str() == method)
            .map_or(Lookup::MethodNotAllowed, Lookup::Found)
    }

    /// All bindings, in registration order.
    pub fn routes(&self) -> impl Iterator<Item = &Route> {
        self.routes.iter()
    }

    pub fn len(&self) -> usize { self.routes.len() }
    pub fn is_empty(&self) -> bool { self.routes.is_empty() }
}
