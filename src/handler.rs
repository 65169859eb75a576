//! Action handlers, pre-process hooks and post-process hooks, type-erased.
//!
//! # How async handlers are stored
//!
//! A controller holds actions of *different* concrete types in one
//! `HashMap<String, BoxedHandler>`. Each one is wrapped so it can sit behind a
//! common trait object:
//!
//! ```text
//! async fn login(cx: Context) -> Response { … }   ← user writes this
//!        ↓ Actions::new().action("login", login)
//! login.into_boxed_handler()                       ← Handler blanket impl
//!        ↓
//! Arc::new(FnHandler(login))                       ← stored as BoxedHandler
//!        ↓
//! handler.call(cx)  at request time                ← one vtable dispatch
//! ```
//!
//! Hooks follow the same pattern with their own signatures: a pre-process
//! hook yields a [`Flow`], a post-process hook receives the response and
//! returns it (possibly changed).

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::context::Context;
use crate::error::Error;
use crate::response::{IntoResponse, Response};

// ── Internal types ────────────────────────────────────────────────────────────

/// A heap-allocated, type-erased future.
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

#[doc(hidden)]
pub trait ErasedHandler {
    fn call(&self, cx: Context) -> BoxFuture<Response>;
}

#[doc(hidden)]
pub type BoxedHandler = Arc<dyn ErasedHandler + Send + Sync + 'static>;

pub(crate) type PreHook = Arc<dyn Fn(Context) -> BoxFuture<Flow> + Send + Sync + 'static>;

pub(crate) type PostHook =
    Arc<dyn Fn(Context, Response) -> BoxFuture<Response> + Send + Sync + 'static>;

// ── Flow ──────────────────────────────────────────────────────────────────────

/// Outcome of a pre-process hook.
#[derive(Debug)]
pub enum Flow {
    /// Run the action.
    Continue,
    /// Skip the action and answer with this response. The post-process hook
    /// still runs.
    Halt(Response),
}

impl Flow {
    pub fn is_continue(&self) -> bool {
        matches!(self, Self::Continue)
    }
}

/// Conversion into a [`Flow`], implemented for everything a pre-process hook
/// may return.
pub trait IntoFlow {
    fn into_flow(self) -> Flow;
}

impl IntoFlow for Flow {
    fn into_flow(self) -> Flow { self }
}

/// `true` continues; `false` halts with an empty `200`.
impl IntoFlow for bool {
    fn into_flow(self) -> Flow {
        if self {
            Flow::Continue
        } else {
            Flow::Halt(Response::status(http::StatusCode::OK))
        }
    }
}

/// A response from a hook halts with that response (a login redirect, say).
impl IntoFlow for Response {
    fn into_flow(self) -> Flow { Flow::Halt(self) }
}

impl<T: IntoFlow> IntoFlow for Result<T, Error> {
    fn into_flow(self) -> Flow {
        match self {
            Ok(v) => v.into_flow(),
            Err(e) => Flow::Halt(e.into_response()),
        }
    }
}

// ── Public Handler trait ──────────────────────────────────────────────────────

/// Implemented for every valid action handler:
///
/// ```text
/// async fn name(cx: Context) -> impl IntoResponse
/// ```
///
/// Sealed: only the blanket impl below satisfies it.
pub trait Handler: private::Sealed + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_handler(self) -> BoxedHandler;
}

mod private {
    pub trait Sealed {}
}

impl<F, Fut, R> private::Sealed for F
where
    F: Fn(Context) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
}

impl<F, Fut, R> Handler for F
where
    F: Fn(Context) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn into_boxed_handler(self) -> BoxedHandler {
        Arc::new(FnHandler(self))
    }
}

struct FnHandler<F>(F);

impl<F, Fut, R> ErasedHandler for FnHandler<F>
where
    F: Fn(Context) -> Fut + Send + Sync,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn call(&self, cx: Context) -> BoxFuture<Response> {
        let fut = (self.0)(cx);
        Box::pin(async move { fut.await.into_response() })
    }
}

// ── Hook erasure ──────────────────────────────────────────────────────────────

pub(crate) fn boxed_pre<F, Fut, R>(hook: F) -> PreHook
where
    F: Fn(Context) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoFlow + Send + 'static,
{
    Arc::new(move |cx: Context| -> BoxFuture<Flow> {
        let fut = hook(cx);
        Box::pin(async move { fut.await.into_flow() })
    })
}

pub(crate) fn boxed_post<F, Fut>(hook: F) -> PostHook
where
    F: Fn(Context, Response) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    Arc::new(move |cx: Context, response: Response| -> BoxFuture<Response> {
        Box::pin(hook(cx, response))
    })
}
