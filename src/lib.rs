//! # lmvc
//!
//! A small MVC framework: a request's slug picks a controller and an
//! action, the action fills render arguments, and a view engine turns them
//! into a response.
//!
//! ## Dispatch
//!
//! The slug (`security/change-password/42`) comes from a query parameter
//! (`?app-slug=...`, the default) or from the request path below the base
//! path. Its first segment names the controller, the second the action, and
//! everything after that is handed to the action as positional parameters.
//!
//! - Controllers are looked up in every registered namespace, most recently
//!   registered first. An unknown controller falls back to `Application`,
//!   and the segment becomes the action instead.
//! - An action registered for the request verb (`postLogin` for a `POST` to
//!   `security/login`) wins over the plain one (`login`).
//! - An unknown action falls back to `index`, and the segment becomes the
//!   first positional parameter.
//!
//! [`router::uri`] is the reverse mapping: `Security::login` with `[5]`
//! becomes `/security/login/5` below the base path.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use lmvc::{Actions, App, Config, Context, Error, Method, Response, Server};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Error> {
//!     let app = App::new(Config::load("config.json")?)
//!         .namespace("app")
//!         .controller("app", "Application", Actions::new().action("index", index))
//!         .controller(
//!             "app",
//!             "Security",
//!             Actions::new()
//!                 .action("login", login)
//!                 .on(Method::Post, "login", post_login),
//!         );
//!
//!     Server::bind("0.0.0.0:3000")?.serve(app).await
//! }
//!
//! async fn index(cx: Context) -> Result<Response, Error> {
//!     cx.render(serde_json::json!({ "title": "Home" }))
//! }
//!
//! async fn login(cx: Context) -> Result<Response, Error> {
//!     cx.render(())
//! }
//!
//! async fn post_login(cx: Context) -> Response {
//!     match cx.param("username") {
//!         Some(_) => cx.redirect("Application::index", ()),
//!         None => cx.redirect("Security::login", ()),
//!     }
//! }
//! ```

mod app;
mod config;
mod context;
mod controller;
mod error;
mod form;
mod handler;
mod method;
mod render;
mod request;
mod response;
mod server;
mod views;

pub mod case;
pub mod router;
pub mod sql;

pub use app::App;
pub use config::{Config, PathSpec, SlugSource};
pub use context::Context;
pub use controller::{Actions, Controller};
pub use error::Error;
pub use form::Form;
pub use handler::{BoxFuture, Flow, Handler, IntoFlow};
pub use method::Method;
pub use render::{Engine, HtmlEngine, JsonEngine, RenderArgs, RenderOptions, View};
pub use request::Request;
pub use response::{ContentType, IntoResponse, Response, ResponseBuilder};
pub use router::{Params, Route, Router};
pub use server::Server;
pub use sql::{Field, SqlBuilder, Statement};
pub use views::ViewPaths;
