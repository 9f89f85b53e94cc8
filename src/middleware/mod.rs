//! Middleware layer.
//!
//! Middleware in waypost is an *observer*: it sees every request routed to
//! the binding it is attached to, before the handler runs, and cannot stop
//! or alter dispatch. It is the place for cross-cutting concerns like
//! access logging or counting requests.
//!
//! Observers attached to one route run in reverse order of attachment: the
//! last one added runs first.
//!
//! ```rust
//! use waypost::{Context, Request, Router, middleware};
//!
//! fn tag(req: &Request) {
//!     tracing::debug!(path = req.path(), "tagged");
//! }
//!
//! let mut app = Router::new();
//! app.get("/", |_: &mut Context| {})
//!     .with(tag)
//!     .with(middleware::trace); // runs before `tag`
//! ```
//!
//! Built-in middleware:
//! - [`trace`] logs method, peer address and URL of each request

mod trace;

use std::sync::Arc;

use crate::request::Request;

pub use trace::trace;

/// A side-effecting observer run before a route's handler.
///
/// Implemented for every `Fn(&Request)`.
pub trait Middleware: Send + Sync + 'static {
    fn observe(&self, req: &Request);
}

impl<F> Middleware for F
where
    F: Fn(&Request) + Send + Sync + 'static,
{
    fn observe(&self, req: &Request) {
        self(req)
    }
}

pub(crate) type BoxedMiddleware = Arc<dyn Middleware>;
