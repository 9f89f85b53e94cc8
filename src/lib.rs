//! # waypost
//!
//! A small HTTP router. A route is an exact path plus a method; a handler
//! writes its response into a per-request [`Context`]; middleware observes
//! requests before the handler runs. That is the whole model.
//!
//! ## Routing rules
//!
//! - Paths match byte for byte. `/music` and `/music/` are different routes.
//! - A path that is not registered at all → `404`, body
//!   `Router <path> does not exist.`
//! - A registered path without a binding for the request method → `405`, body
//!   `Method <method> for router <path> is not allowed.`
//! - Duplicate bindings are allowed; the first registered wins.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::fs::File;
//!
//! use http::StatusCode;
//! use waypost::{BoxError, Context, Router, Server, middleware};
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut app = Router::new();
//!     app.get("/music", music).with(middleware::trace);
//!     app.get("/hello", |ctx: &mut Context| {
//!         let name = ctx.query_param("name").to_owned();
//!         ctx.string(format!("hello {name}"), StatusCode::OK)
//!     });
//!
//!     Server::bind("127.0.0.1:3030").serve(app).await.unwrap();
//! }
//!
//! fn music(ctx: &mut Context) -> Result<(), BoxError> {
//!     let mut f = File::open("answer.mp3")?;
//!     ctx.file(&mut f, StatusCode::OK)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Non-200 responses
//!
//! By default only a `200` carries the body the handler wrote; any other
//! status is sent with an empty body. Opt into sending both with
//! [`FlushPolicy::Always`]:
//!
//! ```rust,no_run
//! # use waypost::{Dispatcher, FlushPolicy, Router, Server};
//! # async fn run(app: Router) -> Result<(), waypost::Error> {
//! let app = Dispatcher::new(app).flush_policy(FlushPolicy::Always);
//! Server::bind("127.0.0.1:3030").serve(app).await
//! # }
//! ```

mod context;
mod dispatcher;
mod error;
mod handler;
mod request;
mod response;
mod router;
mod server;

pub mod middleware;

pub use context::Context;
pub use dispatcher::{Dispatched, Dispatcher, FailurePolicy, FlushPolicy, Outcome};
pub use error::{BoxError, Error};
pub use handler::{Handler, IntoOutcome};
pub use http::{Method, StatusCode};
pub use request::Request;
pub use response::Response;
pub use router::{Lookup, Route, Router};
pub use server::Server;
