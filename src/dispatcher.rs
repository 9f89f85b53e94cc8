//! Request dispatch.
//!
//! [`Dispatcher::dispatch`] is the whole life of one request inside
//! waypost:
//!
//! ```text
//! lookup(path, method)
//!   ├─ RouteNotFound    → 404 "Router <path> does not exist."
//!   ├─ MethodNotAllowed → 405 "Method <method> for router <path> is not allowed."
//!   └─ Found(route)
//!        ├─ middleware, last attached first
//!        ├─ handler(&mut Context)
//!        └─ flush Context → Response
//! ```
//!
//! Dispatch is synchronous and touches no shared mutable state; the server
//! runs each call on its own blocking worker.

use std::sync::Arc;

use http::StatusCode;
use tracing::{debug, error};

use crate::context::Context;
use crate::error::BoxError;
use crate::request::Request;
use crate::response::Response;
use crate::router::{Lookup, Router};

/// How a matched route's [`Context`] becomes a response.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum FlushPolicy {
    /// A non-200 status is sent with an empty body; whatever the handler
    /// wrote is dropped. Only a 200 carries the buffered body.
    #[default]
    StatusOnly,
    /// Status and body are independent; both are always sent.
    Always,
}

/// What happens to the response when a handler returns an error.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum FailurePolicy {
    /// Log the error and flush whatever the context held when it failed.
    #[default]
    BestEffort,
    /// Log the error and answer with an empty 500.
    Abort,
}

/// What dispatch did with a request.
#[derive(Debug)]
pub enum Outcome {
    RouteNotFound,
    MethodNotAllowed,
    /// A route matched and its handler ran. `error` is the handler's failure,
    /// if any.
    Handled { route: usize, error: Option<BoxError> },
}

/// The response to send, plus what produced it.
#[derive(Debug)]
pub struct Dispatched {
    pub response: Response,
    pub outcome: Outcome,
}

/// Routes requests through a frozen [`Router`].
#[derive(Debug)]
pub struct Dispatcher {
    router: Arc<Router>,
    flush: FlushPolicy,
    failure: FailurePolicy,
}

impl Dispatcher {
    pub fn new(router: Router) -> Self {
        Self { router: Arc::new(router), flush: FlushPolicy::default(), failure: FailurePolicy::default() }
    }

    pub fn flush_policy(mut self, policy: FlushPolicy) -> Self {
        self.flush = policy;
        self
    }

    pub fn failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure = policy;
        self
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn dispatch(&self, request: Request) -> Dispatched {
        let request = Arc::new(request);
        let path = request.path();
        let method = request.method().as_str();

        let route = match self.router.lookup(path, method) {
            Lookup::Found(route) => route,
            Lookup::RouteNotFound => {
                debug!(method, path, "no route for path");
                return Dispatched {
                    response: Response::error(StatusCode::NOT_FOUND, format!("Router {path} does not exist.")),
                    outcome: Outcome::RouteNotFound,
                };
            }
            Lookup::MethodNotAllowed => {
                debug!(method, path, "method not bound for path");
                return Dispatched {
                    response: Response::error(
                        StatusCode::METHOD_NOT_ALLOWED,
                        format!("Method {method} for router {path} is not allowed."),
                    ),
                    outcome: Outcome::MethodNotAllowed,
                };
            }
        };

        let mut ctx = Context::new(Arc::clone(&request));

        for middleware in route.middleware.iter().rev() {
            middleware.observe(&request);
        }

        let result = route.handler.call(&mut ctx);

        let response = match (&result, self.failure) {
            (Err(_), FailurePolicy::Abort) => Response::status(StatusCode::INTERNAL_SERVER_ERROR),
            _ => ctx.flush(self.flush),
        };

        if let Err(e) = &result {
            error!(route = route.index(), method, path, error = %e, "handler failed");
        }

        Dispatched { response, outcome: Outcome::Handled { route: route.index(), error: result.err() } }
    }
}

impl From<Router> for Dispatcher {
    fn from(router: Router) -> Self {
        Self::new(router)
    }
}
