//! Unified error type.

use thiserror::Error;

/// The error type returned by lmvc's fallible operations.
///
/// Controllers that want a specific status (404, 422, ...) return a
/// [`Response`](crate::Response). `Error` covers everything else: startup
/// failures, resolution failures, and errors raised while rendering.
#[derive(Debug, Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("config: {0}")]
    Config(#[source] serde_json::Error),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("template: {0}")]
    Template(#[from] minijinja::Error),

    /// Neither the requested controller nor the fallback exists in any
    /// registered namespace. Fatal for the request.
    #[error(
        "couldn't find either the controller `{requested}` or `{fallback}` in the namespaces {namespaces:?}"
    )]
    ControllerNotFound {
        requested: String,
        fallback: String,
        namespaces: Vec<String>,
    },

    #[error("controller `{controller}` has no action `{action}`")]
    ActionNotFound { controller: String, action: String },

    #[error("no view found for `{0}`")]
    ViewNotFound(String),

    #[error("no render engine registered as `{0}`")]
    UnknownEngine(String),

    #[error("invalid socket address `{0}`")]
    InvalidAddress(String),

    #[error("unsupported http method `{0}`")]
    UnknownMethod(String),

    #[error("sql: {0}")]
    Sql(String),
}
