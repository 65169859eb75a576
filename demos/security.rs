//! A login flow on top of lmvc.
//!
//! ```text
//! cargo run --example security
//! curl 'localhost:3000/?app-slug=security/login'
//! curl -X POST -d 'username=admin&password=secret' 'localhost:3000/?app-slug=security/login'
//! ```
//!
//! Views are read from `demos/views` when present; without them the actions
//! answer in plain text.

use lmvc::{Actions, App, Config, Context, Error, IntoResponse, Method, Response, Server};
use serde_json::json;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt::init();

    let config = Config::from_json(r#"{"appPath": "demos", "views": ["views"]}"#)?;
    let app = App::new(config)
        .namespace("demo")
        .controller("demo", "Application", Actions::new().action("index", index))
        .controller(
            "demo",
            "Security",
            Actions::new()
                .action("login", login)
                .on(Method::Post, "login", post_login)
                .action("logout", logout)
                .pre_process(|cx: Context| async move {
                    cx.set_render_arg("site", "lmvc demo")?;
                    Ok::<_, Error>(true)
                }),
        );

    Server::bind("0.0.0.0:3000")?.serve(app).await
}

async fn index(cx: Context) -> Response {
    match cx.render(json!({ "title": "Home" })) {
        Ok(response) => response,
        Err(Error::ViewNotFound(_)) => format!("home; try {}", cx.uri("Security::login", ())).into_response(),
        Err(e) => e.into_response(),
    }
}

async fn login(cx: Context) -> Response {
    match cx.render(json!({ "title": "Sign in" })) {
        Ok(response) => response,
        Err(Error::ViewNotFound(_)) => "POST username and password to this page".into_response(),
        Err(e) => e.into_response(),
    }
}

async fn post_login(cx: Context) -> Response {
    let form = cx.form().mandatory("username").mandatory("password");
    if !form.is_valid() {
        tracing::info!(missing = ?form.errors(), "incomplete login");
        return cx.redirect("Security::login", ());
    }
    match (cx.param("username"), cx.param("password")) {
        (Some("admin"), Some("secret")) => cx.redirect("Application::index", ()),
        _ => cx.redirect("Security::login", ()),
    }
}

async fn logout(cx: Context) -> Response {
    cx.redirect("Security::login", ())
}
