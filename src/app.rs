//! The application: configuration, controllers, views and engines, plus the
//! per-request lifecycle.
//!
//! # Lifecycle
//!
//! ```text
//! Request
//!   → slug (query parameter or path below the base path)
//!   → Router::resolve          controller + action + positional params
//!   → Controller::pre_process  Flow::Halt skips the action
//!   → action
//!   → Controller::post_process always runs
//!   → Response
//! ```
//!
//! An `App` is immutable once built and shared behind an `Arc`; everything
//! that changes during a request lives in that request's [`Context`].

use std::sync::Arc;

use http::StatusCode;
use percent_encoding::percent_decode_str;
use tracing::{debug, error, info};

use crate::config::{Config, SlugSource, NAMESPACE_SEPARATOR};
use crate::context::Context;
use crate::controller::Controller;
use crate::error::Error;
use crate::handler::Flow;
use crate::render::{Engine, Engines};
use crate::request::Request;
use crate::response::{ContentType, IntoResponse, Response};
use crate::router::{self, Params, Route, Router};
use crate::views::ViewPaths;

/// A configured application, ready to be served.
///
/// ```rust,no_run
/// use lmvc::{Actions, App, Config, Context, Error, Response, Server};
///
/// async fn index(cx: Context) -> Result<Response, Error> {
///     cx.render(serde_json::json!({ "title": "Home" }))
/// }
///
/// #[tokio::main]
/// async fn main() -> Result<(), Error> {
///     let app = App::new(Config::load("config.json")?)
///         .namespace("app")
///         .controller("app", "Application", Actions::new().action("index", index));
///
///     Server::bind("0.0.0.0:3000")?.serve(app).await
/// }
/// ```
pub struct App {
    config: Config,
    router: Router,
    views: ViewPaths,
    engines: Engines,
}

impl App {
    /// Builds an app from `config`, registering its controller namespaces
    /// and view directories in order; later entries take priority.
    pub fn new(config: Config) -> Self {
        let mut router = Router::new();
        for namespace in &config.controllers {
            router = router.namespace(&namespace.join(NAMESPACE_SEPARATOR));
        }

        let mut views = ViewPaths::new(&config.app_path);
        for dir in &config.views {
            views.register(dir.join("/"));
        }

        if let Some(namespace) = &config.app_namespace {
            debug!(namespace = %namespace, "application namespace");
        }
        for module in config.module_paths() {
            debug!(module = %module, "module");
        }

        Self { config, router, views, engines: Engines::default() }
    }

    /// Registers a controller namespace ahead of all earlier ones.
    pub fn namespace(mut self, namespace: &str) -> Self {
        self.router = self.router.namespace(namespace);
        self
    }

    /// Defines controller `name` in `namespace`.
    pub fn controller(mut self, namespace: &str, name: &str, controller: impl Controller) -> Self {
        self.router = self.router.controller(namespace, name, controller);
        self
    }

    /// Registers a view directory ahead of all earlier ones.
    pub fn views(mut self, dir: &str) -> Self {
        self.views.register(dir);
        self
    }

    /// Registers (or replaces) a render engine.
    pub fn engine(mut self, name: &str, engine: impl Engine) -> Self {
        self.engines.insert(name, engine);
        self
    }

    pub fn config(&self) -> &Config { &self.config }
    pub fn router(&self) -> &Router { &self.router }
    pub fn view_paths(&self) -> &ViewPaths { &self.views }
    pub(crate) fn engines(&self) -> &Engines { &self.engines }

    /// The application root: the base path, or `/` at the domain root.
    pub fn base_path(&self) -> String {
        self.uri(&format!("{}::{}", router::DEFAULT_CONTROLLER, router::DEFAULT_ACTION), ())
    }

    /// Path for a `Controller::action` reference. See [`router::uri`].
    pub fn uri(&self, reference: &str, params: impl Into<Params>) -> String {
        router::uri(self.config.base(), reference, params)
    }

    /// Extracts the slug. The slug query parameter is removed from the
    /// request so it never appears among request parameters.
    ///
    /// Segments come out decoded from either source: the query value is
    /// decoded with the rest of the query string, path segments are
    /// percent-decoded one by one after splitting, so an encoded `/` stays
    /// inside its segment.
    pub fn slug(&self, request: &mut Request) -> Vec<String> {
        match &self.config.slug {
            SlugSource::Query(param) => {
                let raw = request.take_query(param).unwrap_or_default();
                split_slug(&raw).map(str::to_owned).collect()
            }
            SlugSource::Path => split_slug(strip_base(request.path(), self.config.base()))
                .map(|segment| percent_decode_str(segment).decode_utf8_lossy().into_owned())
                .collect(),
        }
    }

    /// Slug extraction followed by route resolution.
    pub fn resolve(&self, request: &mut Request) -> Result<Route, Error> {
        let slug = self.slug(request);
        self.router.resolve(request.method(), &slug)
    }

    /// Runs one request through the whole lifecycle.
    ///
    /// A request whose controller cannot be resolved, not even to the
    /// default, never reaches controller code and is answered with a `500`
    /// carrying the diagnostic.
    pub async fn handle(self: Arc<Self>, mut request: Request) -> Response {
        let method = request.method();
        let path = request.path().to_owned();

        let route = match self.resolve(&mut request) {
            Ok(route) => route,
            Err(e) => {
                error!(%method, %path, "{e}");
                return Response::builder()
                    .status(StatusCode::INTERNAL_SERVER_ERROR)
                    .bytes(ContentType::Text, e.to_string().into_bytes());
            }
        };

        let response = run(Context::new(self, request, route)).await;
        info!(%method, %path, status = response.status_code().as_u16(), "handled");
        response
    }
}

/// PRE → ACTION (when the hook lets it) → POST.
async fn run(cx: Context) -> Response {
    let controller = Arc::clone(&cx.route().handler);

    let response = match controller.pre_process(cx.clone()).await {
        Flow::Continue => {
            let route = cx.route();
            match controller.call(route.action(), cx.clone()) {
                Some(action) => action.await,
                None => Error::ActionNotFound {
                    controller: route.qualified_name(),
                    action: route.action().to_owned(),
                }
                .into_response(),
            }
        }
        Flow::Halt(response) => {
            debug!(action = %cx.route().action(), "pre-process halted the request");
            response
        }
    };

    controller.post_process(cx, response).await
}

fn split_slug(raw: &str) -> impl Iterator<Item = &str> {
    raw.trim_start_matches('/').split('/')
}

/// `path` below `base`; `path` unchanged when it is not below `base`.
fn strip_base<'a>(path: &'a str, base: &str) -> &'a str {
    match path.strip_prefix(base) {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => rest,
        _ => path,
    }
}
