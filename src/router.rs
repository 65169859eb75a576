//! Slug dispatch and its inverse.
//!
//! Forward: a slug (`["security", "change-password", "42"]`) resolves to a
//! controller found in the registered namespaces, an action on it, and the
//! leftover positional parameters. Reverse: a `Controller::action` reference
//! plus parameters maps back to the canonical path.
//!
//! Lookups go through an explicit table keyed by `namespace::Name`; nothing
//! is discovered at runtime.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::case::{camel_case_from, camel_case_to, ucfirst, DELIMITER};
use crate::config::NAMESPACE_SEPARATOR;
use crate::controller::Controller;
use crate::error::Error;
use crate::method::Method;

/// Controller used when the first slug segment names no known controller.
pub const DEFAULT_CONTROLLER: &str = "Application";

/// Action used when the next slug segment names no known action.
pub const DEFAULT_ACTION: &str = "index";

// ── Router ────────────────────────────────────────────────────────────────────

/// Registered namespaces and the controllers defined in them.
///
/// Namespaces are searched most-recently-registered first; the first one
/// defining the wanted controller name wins.
#[derive(Default)]
pub struct Router {
    namespaces: Vec<String>,
    controllers: HashMap<String, Arc<dyn Controller>>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a namespace in front of all earlier ones.
    pub fn namespace(mut self, namespace: &str) -> Self {
        self.namespaces.insert(0, namespace.to_owned());
        self
    }

    /// Defines controller `name` (PascalCase) inside `namespace`. The
    /// namespace only takes part in resolution once it is registered.
    pub fn controller(mut self, namespace: &str, name: &str, controller: impl Controller) -> Self {
        self.controllers.insert(qualify(namespace, name), Arc::new(controller));
        self
    }

    /// Registered namespaces in search order.
    pub fn namespaces(&self) -> &[String] {
        &self.namespaces
    }

    /// Resolves `slug` for a request made with `method`.
    ///
    /// The controller segment is consumed only when it names a controller;
    /// on fallback to [`DEFAULT_CONTROLLER`] it is read again as the action.
    /// The action segment is consumed only when it names an action; on
    /// fallback to [`DEFAULT_ACTION`] it stays as the first parameter.
    pub fn resolve(&self, method: Method, slug: &[String]) -> Result<Route, Error> {
        let first = slug.first().map_or("", String::as_str);
        let requested = ucfirst(&camel_case_from(first, DELIMITER));

        let (controller, (namespace, handler), rest) = match self.search(&requested) {
            Some(found) => (requested, found, tail(slug)),
            None => match self.search(DEFAULT_CONTROLLER) {
                Some(found) => (DEFAULT_CONTROLLER.to_owned(), found, slug),
                None => {
                    return Err(Error::ControllerNotFound {
                        requested,
                        fallback: DEFAULT_CONTROLLER.to_owned(),
                        namespaces: self.namespaces.clone(),
                    });
                }
            },
        };

        let candidate = camel_case_from(rest.first().map_or("", String::as_str), DELIMITER);
        let qualified = format!("{}{}", method.prefix(), ucfirst(&candidate));

        let (action, action_name, params) = if handler.has_action(&qualified) {
            (qualified, candidate, tail(rest))
        } else if handler.has_action(&candidate) {
            (candidate.clone(), candidate, tail(rest))
        } else {
            debug!(controller = %controller, requested = %candidate, "no such action, using index");
            (DEFAULT_ACTION.to_owned(), DEFAULT_ACTION.to_owned(), unpadded(rest))
        };

        let route = Route {
            controller,
            namespace: namespace.to_owned(),
            action,
            action_name,
            params: params.to_vec(),
            handler: Arc::clone(handler),
        };
        debug!(?route, "resolved");
        Ok(route)
    }

    fn search(&self, name: &str) -> Option<(&str, &Arc<dyn Controller>)> {
        self.namespaces.iter().find_map(|ns| {
            self.controllers
                .get(&qualify(ns, name))
                .map(|c| (ns.as_str(), c))
        })
    }
}

fn qualify(namespace: &str, name: &str) -> String {
    format!("{namespace}{NAMESPACE_SEPARATOR}{name}")
}

fn tail(slug: &[String]) -> &[String] {
    slug.get(1..).unwrap_or(&[])
}

/// A lone empty segment (`""`, `security/`) is no parameter at all.
fn unpadded(rest: &[String]) -> &[String] {
    match rest {
        [only] if only.is_empty() => &[],
        _ => rest,
    }
}

// ── Route ─────────────────────────────────────────────────────────────────────

/// Outcome of [`Router::resolve`].
#[derive(Clone)]
pub struct Route {
    pub(crate) controller: String,
    pub(crate) namespace: String,
    pub(crate) action: String,
    pub(crate) action_name: String,
    pub(crate) params: Vec<String>,
    pub(crate) handler: Arc<dyn Controller>,
}

impl Route {
    /// PascalCase controller name, e.g. `Security`.
    pub fn controller(&self) -> &str { &self.controller }

    /// Namespace the controller was found in.
    pub fn namespace(&self) -> &str { &self.namespace }

    /// Action that runs, verb-qualified when applicable (`postLogin`).
    pub fn action(&self) -> &str { &self.action }

    /// Action without the verb prefix (`login`); names the default view.
    pub fn action_name(&self) -> &str { &self.action_name }

    /// Positional parameters left over from the slug.
    pub fn params(&self) -> &[String] { &self.params }

    /// `namespace::Controller`.
    pub fn qualified_name(&self) -> String {
        qualify(&self.namespace, &self.controller)
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("controller", &self.controller)
            .field("namespace", &self.namespace)
            .field("action", &self.action)
            .field("action_name", &self.action_name)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

// ── Reverse mapping ───────────────────────────────────────────────────────────

/// Positional parameters appended to a generated URI.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Params(Vec<String>);

impl Params {
    pub fn is_empty(&self) -> bool { self.0.is_empty() }
    pub fn as_slice(&self) -> &[String] { &self.0 }
}

impl From<()> for Params {
    fn from(_: ()) -> Self { Self::default() }
}

impl From<&str> for Params {
    fn from(v: &str) -> Self { Self(vec![v.to_owned()]) }
}

impl From<String> for Params {
    fn from(v: String) -> Self { Self(vec![v]) }
}

impl From<&String> for Params {
    fn from(v: &String) -> Self { Self(vec![v.clone()]) }
}

impl From<Vec<String>> for Params {
    fn from(v: Vec<String>) -> Self { Self(v) }
}

impl From<Vec<&str>> for Params {
    fn from(v: Vec<&str>) -> Self { Self(v.into_iter().map(str::to_owned).collect()) }
}

impl From<&[String]> for Params {
    fn from(v: &[String]) -> Self { Self(v.to_vec()) }
}

impl<const N: usize> From<[&str; N]> for Params {
    fn from(v: [&str; N]) -> Self { Self(v.iter().map(|s| (*s).to_owned()).collect()) }
}

impl<T: Into<Params>> From<Option<T>> for Params {
    fn from(v: Option<T>) -> Self { v.map(Into::into).unwrap_or_default() }
}

macro_rules! params_from_int {
    ($($t:ty),*) => {
        $(impl From<$t> for Params {
            fn from(v: $t) -> Self { Self(vec![v.to_string()]) }
        })*
    };
}

params_from_int!(i32, i64, u32, u64, usize);

/// Builds the path for `reference` below `base`.
///
/// `reference` is `Controller::action`; a reference starting with `/` is
/// already a path and comes back unchanged. The default controller and the
/// default action are left out of the path, so `Application::index` maps to
/// `base` itself (`/` when `base` is empty).
///
/// ```rust
/// use lmvc::router::uri;
///
/// assert_eq!(uri("/shop", "Application::index", ()), "/shop");
/// assert_eq!(uri("/shop", "UserAccount::changePassword", "7"), "/shop/user-account/change-password/7");
/// assert_eq!(uri("/shop", "Application::about", ()), "/shop/about");
/// assert_eq!(uri("/shop", "/public/style.css", ()), "/public/style.css");
/// ```
pub fn uri(base: &str, reference: &str, params: impl Into<Params>) -> String {
    if reference.starts_with('/') {
        return reference.to_owned();
    }

    let (controller, action) = reference
        .split_once("::")
        .unwrap_or((reference, DEFAULT_ACTION));

    let mut out = base.trim_end_matches('/').to_owned();
    if controller != DEFAULT_CONTROLLER {
        out.push('/');
        out.push_str(&camel_case_to(controller, DELIMITER));
    }
    if action != DEFAULT_ACTION {
        out.push('/');
        out.push_str(&camel_case_to(action, DELIMITER));
    }

    let params = params.into();
    if !params.is_empty() {
        out.push('/');
        out.push_str(&params.as_slice().join("/"));
    }

    if out.is_empty() {
        out.push('/');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::Actions;
    use crate::context::Context;

    async fn noop(_cx: Context) -> &'static str {
        "ok"
    }

    fn slug(s: &str) -> Vec<String> {
        s.split('/').map(str::to_owned).collect()
    }

    fn router() -> Router {
        Router::new()
            .namespace("app")
            .controller("app", "Application", Actions::new().action("index", noop).action("about", noop))
            .controller(
                "app",
                "Security",
                Actions::new()
                    .action("login", noop)
                    .on(Method::Post, "login", noop)
                    .action("changePassword", noop),
            )
    }

    #[test]
    fn namespaces_are_prepended() {
        let r = Router::new().namespace("a").namespace("b");
        assert_eq!(r.namespaces(), ["b", "a"]);
    }

    #[test]
    fn most_recent_namespace_wins() {
        let r = Router::new()
            .namespace("base")
            .namespace("module")
            .controller("base", "Security", Actions::new().action("login", noop))
            .controller("module", "Security", Actions::new().action("login", noop));

        let route = r.resolve(Method::Get, &slug("security/login")).unwrap();
        assert_eq!(route.namespace(), "module");
        assert_eq!(route.qualified_name(), "module::Security");
    }

    #[test]
    fn lower_priority_namespace_is_used_when_only_it_defines_the_controller() {
        let r = Router::new()
            .namespace("base")
            .namespace("module")
            .controller("base", "Security", Actions::new().action("login", noop));
        assert_eq!(r.resolve(Method::Get, &slug("security")).unwrap().namespace(), "base");
    }

    #[test]
    fn unregistered_namespace_is_ignored() {
        let r = Router::new()
            .namespace("app")
            .controller("app", "Application", Actions::new().action("index", noop))
            .controller("hidden", "Security", Actions::new().action("login", noop));
        let route = r.resolve(Method::Get, &slug("security/login")).unwrap();
        assert_eq!(route.controller(), "Application");
        assert_eq!(route.params(), ["security", "login"]);
    }

    #[test]
    fn get_and_post_pick_different_actions() {
        let r = router();

        let get = r.resolve(Method::Get, &slug("security/login")).unwrap();
        assert_eq!((get.controller(), get.action()), ("Security", "login"));
        assert!(get.params().is_empty());

        let post = r.resolve(Method::Post, &slug("security/login")).unwrap();
        assert_eq!(post.action(), "postLogin");
        assert_eq!(post.action_name(), "login");
        assert!(post.params().is_empty());
    }

    #[test]
    fn post_falls_back_to_bare_action() {
        let route = router().resolve(Method::Post, &slug("security/change-password/7")).unwrap();
        assert_eq!(route.action(), "changePassword");
        assert_eq!(route.params(), ["7"]);
    }

    #[test]
    fn empty_slug_is_application_index() {
        let route = router().resolve(Method::Get, &slug("")).unwrap();
        assert_eq!(route.controller(), "Application");
        assert_eq!(route.action(), "index");
        assert!(route.params().is_empty());

        let none = router().resolve(Method::Get, &[]).unwrap();
        assert_eq!((none.controller(), none.action()), ("Application", "index"));
        assert!(none.params().is_empty());
    }

    #[test]
    fn bare_controller_and_trailing_slash_have_no_params() {
        for path in ["security", "security/"] {
            let route = router().resolve(Method::Get, &slug(path)).unwrap();
            assert_eq!((route.controller(), route.action()), ("Security", "index"), "slug {path}");
            assert!(route.params().is_empty(), "slug {path}");
        }

        let route = router().resolve(Method::Get, &slug("security//x")).unwrap();
        assert_eq!(route.params(), ["", "x"]);
    }

    #[test]
    fn unknown_controller_falls_back_without_consuming() {
        let route = router().resolve(Method::Get, &slug("about/team")).unwrap();
        assert_eq!(route.controller(), "Application");
        assert_eq!(route.action(), "about");
        assert_eq!(route.params(), ["team"]);
    }

    #[test]
    fn unknown_action_becomes_a_parameter() {
        let route = router().resolve(Method::Get, &slug("security/nope/1")).unwrap();
        assert_eq!(route.controller(), "Security");
        assert_eq!(route.action(), "index");
        assert_eq!(route.params(), ["nope", "1"]);
    }

    #[test]
    fn missing_fallback_is_fatal() {
        let r = Router::new()
            .namespace("app")
            .controller("app", "Security", Actions::new());
        match r.resolve(Method::Get, &slug("shop/cart")) {
            Err(Error::ControllerNotFound { requested, fallback, namespaces }) => {
                assert_eq!(requested, "Shop");
                assert_eq!(fallback, "Application");
                assert_eq!(namespaces, ["app"]);
            }
            other => panic!("expected ControllerNotFound, got {other:?}"),
        }
    }

    #[test]
    fn uri_special_cases() {
        assert_eq!(uri("/app", "Application::index", ()), "/app");
        assert_eq!(uri("", "Application::index", ()), "/");
        assert_eq!(uri("/app", "Application::index", "x"), "/app/x");
        assert_eq!(uri("", "Application::index", vec!["a", "b"]), "/a/b");
        assert_eq!(uri("/app", "Foo::bar", "x"), "/app/foo/bar/x");
        assert_eq!(uri("/app", "Foo::index", ()), "/app/foo");
        assert_eq!(uri("/app", "Foo::index", 3_u64), "/app/foo/3");
        assert_eq!(uri("/app", "/img/logo.png", "ignored"), "/img/logo.png");
    }

    #[test]
    fn uri_without_action_means_index() {
        assert_eq!(uri("", "Security", ()), "/security");
    }

    #[test]
    fn uri_and_resolve_are_inverse() {
        let r = router();
        for (controller, action) in [
            ("Application", "index"),
            ("Application", "about"),
            ("Security", "login"),
            ("Security", "index"),
            ("Security", "changePassword"),
        ] {
            let path = uri("", &format!("{controller}::{action}"), ());
            let segments = slug(path.trim_start_matches('/'));
            let route = r.resolve(Method::Get, &segments).unwrap();
            assert_eq!((route.controller(), route.action()), (controller, action), "path {path}");
        }
    }
}
