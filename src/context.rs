//! Request-scoped context handed to every action and hook.
//!
//! A `Context` is the controller's view of one request: the decoded request,
//! the resolved route, the render arguments collected so far, and the
//! helpers that turn them into a response. Cloning is cheap and every clone
//! shares the same render arguments, so values set in a pre-process hook are
//! visible to the action and to the post-process hook.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tracing::debug;

use crate::app::App;
use crate::config::Config;
use crate::error::Error;
use crate::form::Form;
use crate::render::{RenderArgs, RenderOptions, View};
use crate::request::Request;
use crate::response::Response;
use crate::router::{self, Params, Route};
use crate::views::view_name;

#[derive(Clone)]
pub struct Context {
    inner: Arc<Inner>,
}

struct Inner {
    app: Arc<App>,
    request: Request,
    route: Route,
    render_args: Mutex<RenderArgs>,
}

impl Context {
    pub(crate) fn new(app: Arc<App>, request: Request, route: Route) -> Self {
        Self {
            inner: Arc::new(Inner {
                app,
                request,
                route,
                render_args: Mutex::new(RenderArgs::new()),
            }),
        }
    }

    pub fn app(&self) -> &App { &self.inner.app }
    pub fn config(&self) -> &Config { self.inner.app.config() }
    pub fn request(&self) -> &Request { &self.inner.request }
    pub fn route(&self) -> &Route { &self.inner.route }

    /// Positional parameters left over from the slug.
    pub fn params(&self) -> &[String] { self.inner.route.params() }

    /// A request parameter (body first, then query string).
    pub fn param(&self, key: &str) -> Option<&str> {
        self.inner.request.param(key)
    }

    /// Validation over this request's parameters.
    pub fn form(&self) -> Form<'_> {
        Form::new(&self.inner.request)
    }

    // ── Render arguments ──────────────────────────────────────────────────────

    pub fn set_render_arg(&self, name: &str, value: impl Serialize) -> Result<(), Error> {
        let value = serde_json::to_value(value)?;
        self.args().insert(name.to_owned(), value);
        Ok(())
    }

    /// Merges `args` into the render arguments (new values win), or replaces
    /// them entirely when `merge` is false. `args` must serialize to an
    /// object; `()` and `None` leave the arguments untouched.
    pub fn set_render_args(&self, args: impl Serialize, merge: bool) -> Result<(), Error> {
        let Some(new) = to_args(args)? else {
            return Ok(());
        };
        let mut current = self.args();
        if merge {
            current.extend(new);
        } else {
            *current = new;
        }
        Ok(())
    }

    /// Snapshot of the current render arguments.
    pub fn render_args(&self) -> RenderArgs {
        self.args().clone()
    }

    fn args(&self) -> MutexGuard<'_, RenderArgs> {
        self.inner.render_args.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ── Rendering ─────────────────────────────────────────────────────────────

    /// Renders the default HTML view of the current action inside the master
    /// layout, after merging `args` into the render arguments.
    pub fn render(&self, args: impl Serialize) -> Result<Response, Error> {
        self.render_with(args, RenderOptions::default())
    }

    /// [`render`](Self::render) with a template, layout, or status override.
    pub fn render_with(&self, args: impl Serialize, options: RenderOptions) -> Result<Response, Error> {
        self.set_render_args(args, true)?;
        let app = self.app();
        let engine = app.engines().get("html")?;

        let name = self.view_for(&options, engine.extension());
        let template = match &options.template {
            Some(t) => app.view_paths().app_path().join(t),
            None => app
                .view_paths()
                .find(&name)
                .ok_or_else(|| Error::ViewNotFound(name.clone()))?,
        };
        let layout = match &options.layout {
            Some(l) => Some(app.view_paths().app_path().join(l)),
            None => {
                let found = app.view_paths().find(&self.config().layout);
                if found.is_none() {
                    debug!(layout = %self.config().layout, "no master template, rendering bare view");
                }
                found
            }
        };

        let args = self.render_args();
        engine.render(&View {
            args: &args,
            name: &name,
            template: Some(&template),
            layout: layout.as_deref(),
            status: options.status,
        })
    }

    /// Delegates to the engine registered as `engine`. No layout is applied;
    /// the default view uses the engine's extension and may be absent.
    pub fn render_engine(
        &self,
        engine: &str,
        args: impl Serialize,
        options: RenderOptions,
    ) -> Result<Response, Error> {
        self.set_render_args(args, true)?;
        let app = self.app();
        let engine = app.engines().get(engine)?;

        let name = self.view_for(&options, engine.extension());
        let template = match &options.template {
            Some(t) => Some(app.view_paths().app_path().join(t)),
            None => app.view_paths().find(&name),
        };

        let args = self.render_args();
        engine.render(&View {
            args: &args,
            name: &name,
            template: template.as_deref(),
            layout: None,
            status: options.status,
        })
    }

    pub fn render_json(&self, args: impl Serialize) -> Result<Response, Error> {
        self.render_engine("json", args, RenderOptions::default())
    }

    pub fn render_html(&self, args: impl Serialize) -> Result<Response, Error> {
        self.render_engine("html", args, RenderOptions::default())
    }

    /// The explicit template, or `<controller>/<action>.<extension>`.
    fn view_for(&self, options: &RenderOptions, extension: &str) -> String {
        match &options.template {
            Some(t) => t.clone(),
            None => view_name(self.route().controller(), self.route().action_name(), extension),
        }
    }

    // ── Navigation ────────────────────────────────────────────────────────────

    /// Path for a `Controller::action` reference below the base path.
    pub fn uri(&self, reference: &str, params: impl Into<Params>) -> String {
        router::uri(self.config().base(), reference, params)
    }

    /// Absolute URL: protocol and host of the current request, then
    /// [`uri`](Self::uri).
    pub fn url(&self, reference: &str, params: impl Into<Params>) -> String {
        let request = self.request();
        format!(
            "{}://{}{}",
            request.protocol(),
            request.host(),
            self.uri(reference, params)
        )
    }

    /// `302` to the URL of `reference`.
    pub fn redirect(&self, reference: &str, params: impl Into<Params>) -> Response {
        Response::redirect(&self.url(reference, params))
    }

    /// `302` back to the referer; `None` when the request carried none.
    pub fn back(&self) -> Option<Response> {
        self.request().referer().map(Response::redirect)
    }
}

fn to_args(args: impl Serialize) -> Result<Option<RenderArgs>, Error> {
    match serde_json::to_value(args)? {
        serde_json::Value::Object(map) => Ok(Some(map)),
        serde_json::Value::Null => Ok(None),
        other => Err(Error::Json(serde::ser::Error::custom(format!(
            "render arguments must be an object, got `{other}`"
        )))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use http::StatusCode;
    use serde_json::json;

    use crate::config::Config;
    use crate::controller::Actions;
    use crate::method::Method;

    async fn noop(_cx: Context) -> &'static str {
        "ok"
    }

    fn context_with(app: App, target: &str, headers: &[(&str, &str)]) -> Context {
        let app = Arc::new(
            app.namespace("app")
                .controller("app", "Application", Actions::new().action("index", noop))
                .controller(
                    "app",
                    "UserAccount",
                    Actions::new().action("show", noop).on(Method::Post, "show", noop),
                ),
        );
        let headers = headers.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect();
        let mut request = Request::new(Method::Post, target, headers, vec![]);
        let route = app.resolve(&mut request).unwrap();
        Context::new(app, request, route)
    }

    fn context(target: &str) -> Context {
        context_with(App::new(Config::default()), target, &[("host", "example.com")])
    }

    #[test]
    fn render_args_merge_or_replace() {
        let cx = context("/");
        cx.set_render_args(json!({"a": 1}), true).unwrap();
        cx.set_render_args(json!({"b": 2}), true).unwrap();
        assert_eq!(serde_json::Value::Object(cx.render_args()), json!({"a": 1, "b": 2}));

        cx.set_render_args(json!({"b": 3}), false).unwrap();
        assert_eq!(serde_json::Value::Object(cx.render_args()), json!({"b": 3}));
    }

    #[test]
    fn single_arg_overwrites_and_clones_share_state() {
        let cx = context("/");
        let other = cx.clone();
        cx.set_render_arg("user", "alice").unwrap();
        other.set_render_arg("user", "bob").unwrap();
        assert_eq!(cx.render_args()["user"], "bob");
    }

    #[test]
    fn unit_args_are_ignored_and_scalars_rejected() {
        let cx = context("/");
        cx.set_render_arg("kept", true).unwrap();
        cx.set_render_args((), false).unwrap();
        assert_eq!(cx.render_args().len(), 1);
        assert!(matches!(cx.set_render_args(42, true), Err(Error::Json(_))));
    }

    #[test]
    fn navigation_helpers() {
        let cx = context_with(
            App::new(Config::from_json(r#"{"basePath": "/shop"}"#).unwrap()),
            "/?app-slug=user-account/show/7",
            &[("host", "example.com"), ("x-forwarded-proto", "https")],
        );
        assert_eq!(cx.route().action(), "postShow");
        assert_eq!(cx.params(), ["7"]);

        assert_eq!(cx.uri("UserAccount::show", "7"), "/shop/user-account/show/7");
        assert_eq!(cx.url("Application::index", ()), "https://example.com/shop");
        assert_eq!(cx.url("/css/site.css", ()), "https://example.com/css/site.css");

        let res = cx.redirect("UserAccount::show", vec!["1", "2"]);
        assert_eq!(res.status_code(), StatusCode::FOUND);
        assert_eq!(res.header("location"), Some("https://example.com/shop/user-account/show/1/2"));

        assert!(cx.back().is_none());
    }

    #[test]
    fn back_follows_referer() {
        let cx = context_with(
            App::new(Config::default()),
            "/",
            &[("host", "h"), ("referer", "http://h/previous")],
        );
        assert_eq!(cx.back().unwrap().header("location"), Some("http://h/previous"));
    }

    #[test]
    fn render_uses_bare_action_view_and_layout() {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(root.path().join("views/user-account")).unwrap();
        std::fs::write(root.path().join("views/user-account/show.html"), "id={{ id }}").unwrap();
        std::fs::write(root.path().join("views/main.html"), "[{{ content }}]").unwrap();

        let config = Config { app_path: root.path().to_path_buf(), ..Config::default() };
        let cx = context_with(App::new(config).views("views"), "/?app-slug=user-account/show", &[]);

        let res = cx.render(json!({"id": 7})).unwrap();
        assert_eq!(res.body(), b"[id=7]");
    }

    #[test]
    fn render_with_overrides() {
        let root = tempfile::tempdir().unwrap();
        std::fs::write(root.path().join("other.html"), "other {{ n }}").unwrap();
        std::fs::write(root.path().join("bare.html"), "<{{ content }}>").unwrap();

        let config = Config { app_path: root.path().to_path_buf(), ..Config::default() };
        let cx = context_with(App::new(config), "/", &[]);

        let res = cx
            .render_with(
                json!({"n": 1}),
                RenderOptions::new()
                    .template("other.html")
                    .layout("bare.html")
                    .status(StatusCode::NOT_FOUND),
            )
            .unwrap();
        assert_eq!(res.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(res.body(), b"<other 1>");
    }

    #[test]
    fn render_without_view_fails() {
        let root = tempfile::tempdir().unwrap();
        let config = Config { app_path: root.path().to_path_buf(), ..Config::default() };
        let cx = context_with(App::new(config).views("."), "/?app-slug=user-account/show", &[]);
        match cx.render(()) {
            Err(Error::ViewNotFound(name)) => assert_eq!(name, "user-account/show.html"),
            other => panic!("expected ViewNotFound, got {other:?}"),
        }
    }

    #[test]
    fn render_json_collects_all_args() {
        let cx = context("/");
        cx.set_render_arg("a", 1).unwrap();
        let res = cx.render_json(json!({"b": "two"})).unwrap();
        let body: serde_json::Value = serde_json::from_slice(res.body()).unwrap();
        assert_eq!(body, json!({"a": 1, "b": "two"}));
    }

    #[test]
    fn html_engine_without_view_names_the_missing_view() {
        let root = tempfile::tempdir().unwrap();
        let config = Config { app_path: root.path().to_path_buf(), ..Config::default() };
        let cx = context_with(App::new(config).views("."), "/?app-slug=user-account/show", &[]);
        match cx.render_html(()) {
            Err(Error::ViewNotFound(name)) => assert_eq!(name, "user-account/show.html"),
            other => panic!("expected ViewNotFound, got {other:?}"),
        }
    }

    #[test]
    fn json_has_legacy_expiry() {
        let res = context("/").render_json(()).unwrap();
        assert_eq!(res.header("expires"), Some("Mon, 26 Jul 1964 07:00:00 GMT"));
    }

    #[test]
    fn unknown_engine_is_an_error() {
        let cx = context("/");
        assert!(matches!(
            cx.render_engine("yaml", (), RenderOptions::default()),
            Err(Error::UnknownEngine(_))
        ));
    }
}
