//! Application configuration.
//!
//! Loaded once at startup from a JSON document and immutable afterwards.
//! Every field has a default so an empty object is a valid config:
//!
//! ```json
//! {
//!   "appPath": "/srv/app",
//!   "basePath": "/shop",
//!   "controllers": ["app::controllers", ["modules", "security", "controllers"]],
//!   "views": ["views", ["modules", "security", "views"]],
//!   "modules": { "modules": ["security", "form"] },
//!   "slug": { "query": "app-slug" }
//! }
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::Error;

/// Separator between namespace parts (`app::controllers`).
pub const NAMESPACE_SEPARATOR: &str = "::";

/// Where the dispatcher reads the slug from.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SlugSource {
    /// A single query parameter carries the whole slug (`?app-slug=security/login`).
    Query(String),
    /// The request path below the base path is the slug.
    Path,
}

impl Default for SlugSource {
    fn default() -> Self {
        Self::Query("app-slug".to_owned())
    }
}

/// A registration entry: either a ready string or parts joined by the caller.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum PathSpec {
    One(String),
    Parts(Vec<String>),
}

impl PathSpec {
    pub fn join(&self, separator: &str) -> String {
        match self {
            Self::One(s) => s.clone(),
            Self::Parts(parts) => parts.join(separator),
        }
    }
}

/// Root configuration.
#[derive(Clone, Debug, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// Root for relative view directories and explicit template overrides.
    pub app_path: PathBuf,

    /// URI prefix the application is mounted under, e.g. `/shop`.
    pub base_path: String,

    /// Namespace of the application's own code, if any.
    pub app_namespace: Option<String>,

    /// Controller namespaces, registered in order (the last one wins).
    pub controllers: Vec<PathSpec>,

    /// View directories, registered in order (the last one wins).
    pub views: Vec<PathSpec>,

    /// Module tree. Strings, arrays, or objects whose keys prefix their children.
    pub modules: serde_json::Value,

    pub slug: SlugSource,

    /// Master template wrapped around every HTML view.
    pub layout: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_path: PathBuf::from("."),
            base_path: String::new(),
            app_namespace: None,
            controllers: Vec::new(),
            views: Vec::new(),
            modules: serde_json::Value::Null,
            slug: SlugSource::default(),
            layout: "main.html".to_owned(),
        }
    }
}

impl Config {
    /// Reads and parses a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> Result<Self, Error> {
        serde_json::from_str(json).map_err(Error::Config)
    }

    /// The base path without a trailing slash (`""` at the domain root).
    pub fn base(&self) -> &str {
        self.base_path.trim_end_matches(['/', '\\'])
    }

    /// Flattens [`Config::modules`] into `::`-joined module paths.
    ///
    /// `{"modules": ["security", {"forms": "basic"}]}` yields
    /// `modules::security` and `modules::forms::basic`.
    pub fn module_paths(&self) -> Vec<String> {
        let mut out = Vec::new();
        collect_modules(&self.modules, &mut out);
        out
    }

    pub fn has_module(&self, namespace: &str) -> bool {
        self.module_paths().iter().any(|m| m == namespace)
    }
}

fn collect_modules(value: &serde_json::Value, out: &mut Vec<String>) {
    match value {
        serde_json::Value::String(s) => out.push(s.clone()),
        serde_json::Value::Array(items) => {
            for item in items {
                collect_modules(item, out);
            }
        }
        serde_json::Value::Object(map) => {
            for (package, children) in map {
                let mut nested = Vec::new();
                collect_modules(children, &mut nested);
                out.extend(
                    nested
                        .into_iter()
                        .map(|sub| format!("{package}{NAMESPACE_SEPARATOR}{sub}")),
                );
            }
        }
        serde_json::Value::Null => {}
        other => tracing::warn!(module = %other, "couldn't register module namespace"),
    }
}
