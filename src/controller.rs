//! The controller capability interface.
//!
//! The dispatcher only ever talks to [`Controller`]: ask whether an action
//! exists, call it, and run the two hooks around it. [`Actions`] is the
//! ready-made implementation built from async functions; implement the trait
//! yourself when a controller needs its own state.

use std::collections::HashMap;
use std::future::Future;

use crate::case::ucfirst;
use crate::context::Context;
use crate::handler::{
    boxed_post, boxed_pre, BoxFuture, BoxedHandler, Flow, Handler, IntoFlow, PostHook, PreHook,
};
use crate::method::Method;
use crate::response::Response;

/// A named bundle of action handlers plus optional pre/post hooks.
pub trait Controller: Send + Sync + 'static {
    /// Whether `action` (a camel-case name such as `login` or `postLogin`)
    /// can be called.
    fn has_action(&self, action: &str) -> bool;

    /// Starts `action`. `None` if the controller does not define it.
    fn call(&self, action: &str, cx: Context) -> Option<BoxFuture<Response>>;

    /// Runs before the action; [`Flow::Halt`] skips it.
    fn pre_process(&self, _cx: Context) -> BoxFuture<Flow> {
        Box::pin(async { Flow::Continue })
    }

    /// Runs after the action (or after a halting pre-process hook).
    fn post_process(&self, _cx: Context, response: Response) -> BoxFuture<Response> {
        Box::pin(async move { response })
    }
}

/// A controller assembled from async functions.
///
/// ```rust,no_run
/// use lmvc::{Actions, Context, Error, Method, Response};
///
/// async fn login(cx: Context) -> Result<Response, Error> { cx.render(()) }
/// async fn post_login(cx: Context) -> Response { cx.redirect("Application::index", ()) }
///
/// let security = Actions::new()
///     .action("login", login)
///     .on(Method::Post, "login", post_login);
/// ```
#[derive(Default)]
pub struct Actions {
    handlers: HashMap<String, BoxedHandler>,
    pre: Option<PreHook>,
    post: Option<PostHook>,
}

impl Actions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` under the bare camel-case action name.
    pub fn action(mut self, name: &str, handler: impl Handler) -> Self {
        self.handlers.insert(name.to_owned(), handler.into_boxed_handler());
        self
    }

    /// Registers `handler` for one verb only. `on(Method::Post, "login", h)`
    /// defines `postLogin`, which wins over `login` for `POST` requests.
    pub fn on(self, method: Method, name: &str, handler: impl Handler) -> Self {
        let qualified = format!("{}{}", method.prefix(), ucfirst(name));
        self.action(&qualified, handler)
    }

    /// Sets the pre-process hook. It may return `bool`, a [`Flow`], a
    /// [`Response`] (halts with it), or a `Result` of any of those.
    pub fn pre_process<F, Fut, R>(mut self, hook: F) -> Self
    where
        F: Fn(Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoFlow + Send + 'static,
    {
        self.pre = Some(boxed_pre(hook));
        self
    }

    pub fn post_process<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(Context, Response) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        self.post = Some(boxed_post(hook));
        self
    }

    /// Registered action names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Controller for Actions {
    fn has_action(&self, action: &str) -> bool {
        self.handlers.contains_key(action)
    }

    fn call(&self, action: &str, cx: Context) -> Option<BoxFuture<Response>> {
        self.handlers.get(action).map(|h| h.call(cx))
    }

    fn pre_process(&self, cx: Context) -> BoxFuture<Flow> {
        match &self.pre {
            Some(hook) => hook(cx),
            None => Box::pin(async { Flow::Continue }),
        }
    }

    fn post_process(&self, cx: Context, response: Response) -> BoxFuture<Response> {
        match &self.post {
            Some(hook) => hook(cx, response),
            None => Box::pin(async move { response }),
        }
    }
}
