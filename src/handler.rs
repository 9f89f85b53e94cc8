//! Handler trait and type erasure.
//!
//! # How handlers are stored
//!
//! The router keeps every binding in one `Vec<Route>`, so handlers of
//! *different* closure and fn types have to share one element type. We hide
//! the concrete type behind a trait object (`dyn ErasedHandler`).
//!
//! ```text
//! fn music(ctx: &mut Context) -> Result<(), Error> { … }   ← user writes this
//!        ↓ router.get("/music", music)
//! music.into_boxed_handler()                               ← Handler blanket impl
//!        ↓
//! Arc::new(FnHandler(music))                               ← heap-allocated wrapper
//!        ↓  stored as BoxedHandler = Arc<dyn ErasedHandler>
//! handler.call(&mut ctx)  at request time                  ← one vtable dispatch
//! ```
//!
//! A handler's return value only reports success or failure. The response
//! itself lives in the [`Context`].

use std::sync::Arc;

use crate::context::Context;
use crate::error::BoxError;

/// Internal dispatch interface.
///
/// `#[doc(hidden)] pub` rather than `pub(crate)` because it appears in the
/// return type of the public `Handler` trait's `into_boxed_handler` method.
#[doc(hidden)]
pub trait ErasedHandler {
    fn call(&self, ctx: &mut Context) -> Result<(), BoxError>;
}

/// A type-erased handler shared by every worker thread serving its route.
#[doc(hidden)]
pub type BoxedHandler = Arc<dyn ErasedHandler + Send + Sync + 'static>;

/// Implemented for every valid route handler.
///
/// You never implement this yourself. It is satisfied by any function or
/// closure of the shape:
///
/// ```text
/// fn name(ctx: &mut Context) -> impl IntoOutcome
/// ```
///
/// Closures need their argument annotated (`|ctx: &mut Context| …`) so the
/// compiler picks the higher-ranked signature.
pub trait Handler: private::Sealed + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_handler(self) -> BoxedHandler;
}

mod private {
    pub trait Sealed {}
}

impl<F, R> private::Sealed for F
where
    F: Fn(&mut Context) -> R + Send + Sync + 'static,
    R: IntoOutcome,
{
}

impl<F, R> Handler for F
where
    F: Fn(&mut Context) -> R + Send + Sync + 'static,
    R: IntoOutcome,
{
    fn into_boxed_handler(self) -> BoxedHandler {
        Arc::new(FnHandler(self))
    }
}

struct FnHandler<F>(F);

impl<F, R> ErasedHandler for FnHandler<F>
where
    F: Fn(&mut Context) -> R,
    R: IntoOutcome,
{
    fn call(&self, ctx: &mut Context) -> Result<(), BoxError> {
        (self.0)(ctx).into_outcome()
    }
}

/// What a handler may return.
///
/// `()` for handlers that cannot fail, or `Result<(), E>` for any error type
/// that boxes into [`BoxError`], including [`crate::Error`] and
/// `std::io::Error`, so `?` works on both.
pub trait IntoOutcome {
    fn into_outcome(self) -> Result<(), BoxError>;
}

impl IntoOutcome for () {
    fn into_outcome(self) -> Result<(), BoxError> { Ok(()) }
}

impl<E: Into<BoxError>> IntoOutcome for Result<(), E> {
    fn into_outcome(self) -> Result<(), BoxError> { self.map_err(Into::into) }
}
