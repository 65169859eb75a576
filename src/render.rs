//! Pluggable render engines.
//!
//! An [`Engine`] turns the render arguments of a request into a response
//! body of one content type. Two ship with the crate and are registered
//! under their names on every [`App`](crate::App):
//!
//! | Name | Engine | Extension | Output |
//! |---|---|---|---|
//! | `html` | [`HtmlEngine`] | `html` | minijinja template, optionally wrapped in a layout |
//! | `json` | [`JsonEngine`] | `json` | the arguments serialized as a JSON object |

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

use http::StatusCode;
use minijinja::{Environment, Value};

use crate::error::Error;
use crate::response::{ContentType, Response};

/// Named values available to a view.
pub type RenderArgs = serde_json::Map<String, serde_json::Value>;

/// Everything an engine needs for one render.
#[derive(Debug)]
pub struct View<'a> {
    pub args: &'a RenderArgs,
    /// The view looked for, relative to the view directories or the
    /// application path (`security/login.html`).
    pub name: &'a str,
    /// The resolved template file, if one was found.
    pub template: Option<&'a Path>,
    /// Master template wrapped around the view.
    pub layout: Option<&'a Path>,
    pub status: StatusCode,
}

/// A render strategy: output format plus the view extension it looks for.
pub trait Engine: Send + Sync + 'static {
    /// Extension of the view files this engine renders, without the dot.
    fn extension(&self) -> &str;

    fn render(&self, view: &View<'_>) -> Result<Response, Error>;
}

// ── Options ───────────────────────────────────────────────────────────────────

/// Overrides for a single render call.
///
/// ```rust
/// use http::StatusCode;
/// use lmvc::RenderOptions;
///
/// let opts = RenderOptions::new()
///     .template("views/errors/missing.html")
///     .status(StatusCode::NOT_FOUND);
/// ```
#[derive(Clone, Debug)]
pub struct RenderOptions {
    pub(crate) template: Option<String>,
    pub(crate) layout: Option<String>,
    pub(crate) status: StatusCode,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self { template: None, layout: None, status: StatusCode::OK }
    }
}

impl RenderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Template file relative to the application path, replacing the
    /// controller/action default.
    pub fn template(mut self, template: impl Into<String>) -> Self {
        self.template = Some(template.into());
        self
    }

    /// Master template relative to the application path.
    pub fn layout(mut self, layout: impl Into<String>) -> Self {
        self.layout = Some(layout.into());
        self
    }

    pub fn status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }
}

// ── HTML ──────────────────────────────────────────────────────────────────────

/// Renders a minijinja view, then the layout around it.
///
/// The layout sees the same arguments plus `content` (the rendered view,
/// already marked safe) and `view` (the view file path). Templates whose
/// file name ends in `.html` are auto-escaped.
#[derive(Debug, Default)]
pub struct HtmlEngine;

impl HtmlEngine {
    pub fn new() -> Self {
        Self
    }
}

impl Engine for HtmlEngine {
    fn extension(&self) -> &str {
        "html"
    }

    fn render(&self, view: &View<'_>) -> Result<Response, Error> {
        let template = view
            .template
            .ok_or_else(|| Error::ViewNotFound(view.name.to_owned()))?;

        let mut env = Environment::new();
        let mut ctx: BTreeMap<String, Value> = view
            .args
            .iter()
            .map(|(k, v)| (k.clone(), Value::from_serialize(v)))
            .collect();

        let content = render_file(&mut env, template, &ctx)?;
        let body = match view.layout {
            Some(layout) => {
                ctx.insert("content".to_owned(), Value::from_safe_string(content));
                ctx.insert("view".to_owned(), Value::from(template.display().to_string()));
                render_file(&mut env, layout, &ctx)?
            }
            None => content,
        };

        Ok(Response::builder()
            .status(view.status)
            .bytes(ContentType::Html, body.into_bytes()))
    }
}

fn render_file(
    env: &mut Environment<'static>,
    path: &Path,
    ctx: &BTreeMap<String, Value>,
) -> Result<String, Error> {
    let source = std::fs::read_to_string(path)?;
    let name = path.display().to_string();
    env.add_template_owned(name.clone(), source)?;
    Ok(env.get_template(&name)?.render(ctx)?)
}

// ── JSON ──────────────────────────────────────────────────────────────────────

/// Serializes the render arguments. Views are not read.
#[derive(Debug, Default)]
pub struct JsonEngine;

impl JsonEngine {
    pub fn new() -> Self {
        Self
    }
}

impl Engine for JsonEngine {
    fn extension(&self) -> &str {
        "json"
    }

    fn render(&self, view: &View<'_>) -> Result<Response, Error> {
        let body = serde_json::to_vec(view.args)?;
        Ok(Response::builder()
            .status(view.status)
            .header("cache-control", "no-cache, must-revalidate")
            .header("expires", "Mon, 26 Jul 1964 07:00:00 GMT")
            .bytes(ContentType::Json, body))
    }
}

// ── Registry ──────────────────────────────────────────────────────────────────

/// Engines by name.
#[derive(Clone)]
pub(crate) struct Engines(HashMap<String, Arc<dyn Engine>>);

impl Engines {
    pub(crate) fn insert(&mut self, name: &str, engine: impl Engine) {
        self.0.insert(name.to_owned(), Arc::new(engine));
    }

    pub(crate) fn get(&self, name: &str) -> Result<&Arc<dyn Engine>, Error> {
        self.0.get(name).ok_or_else(|| Error::UnknownEngine(name.to_owned()))
    }
}

impl Default for Engines {
    fn default() -> Self {
        let mut engines = Self(HashMap::new());
        engines.insert("html", HtmlEngine::new());
        engines.insert("json", JsonEngine::new());
        engines
    }
}
