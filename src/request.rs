//! Incoming HTTP request type.

use std::collections::HashMap;

use url::form_urlencoded;

use crate::method::Method;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// An incoming HTTP request, decoded once and read-only for handlers.
///
/// Query and form parameters are kept apart; [`Request::param`] and
/// [`Request::params`] expose the merged view where the body wins over the
/// query string. Within one source, the last duplicate key wins.
#[derive(Clone, Debug)]
pub struct Request {
    pub(crate) method: Method,
    pub(crate) path: String,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) body: Vec<u8>,
    pub(crate) query: HashMap<String, String>,
    pub(crate) form: HashMap<String, String>,
    pub(crate) secure: bool,
}

impl Request {
    /// Builds a request from its raw parts. `target` is the request target,
    /// path plus optional query string (`/index.php?app-slug=security/login`).
    pub fn new(
        method: Method,
        target: &str,
        headers: Vec<(String, String)>,
        body: Vec<u8>,
    ) -> Self {
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path, parse_form(query.as_bytes())),
            None => (target, HashMap::new()),
        };

        let mut req = Self {
            method,
            path: path.to_owned(),
            headers,
            body,
            query,
            form: HashMap::new(),
            secure: false,
        };

        let is_form = req.header("content-type").is_some_and(is_form_content_type);
        if is_form || method.reads_raw_form() {
            req.form = parse_form(&req.body);
        }
        req.secure = req
            .header("x-forwarded-proto")
            .is_some_and(|p| p.eq_ignore_ascii_case("https"));
        req
    }

    /// Overrides the secure flag, for servers that terminate TLS themselves.
    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    pub fn method(&self) -> Method { self.method }
    pub fn path(&self) -> &str { &self.path }
    pub fn headers(&self) -> &[(String, String)] { &self.headers }
    pub fn body(&self) -> &[u8] { &self.body }
    pub fn is_secure(&self) -> bool { self.secure }

    /// `"https"` or `"http"`.
    pub fn protocol(&self) -> &'static str {
        if self.secure { "https" } else { "http" }
    }

    pub fn host(&self) -> &str {
        self.header("host").unwrap_or("localhost")
    }

    pub fn referer(&self) -> Option<&str> {
        self.header("referer")
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// A request parameter from the body or, failing that, the query string.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.form.get(key)
            .or_else(|| self.query.get(key))
            .map(String::as_str)
    }

    /// All request parameters, body values overriding query values.
    pub fn params(&self) -> HashMap<String, String> {
        let mut merged = self.query.clone();
        merged.extend(self.form.iter().map(|(k, v)| (k.clone(), v.clone())));
        merged
    }

    /// Parameters filtered by verb: the query string for `GET`, the body for
    /// everything else.
    pub fn params_for(&self, method: Method) -> &HashMap<String, String> {
        match method {
            Method::Get => &self.query,
            _ => &self.form,
        }
    }

    pub fn query(&self) -> &HashMap<String, String> { &self.query }
    pub fn form(&self) -> &HashMap<String, String> { &self.form }

    /// Removes a query parameter, returning its value. The slug parameter is
    /// taken out this way so it never shows up among request parameters.
    pub(crate) fn take_query(&mut self, key: &str) -> Option<String> {
        self.query.remove(key)
    }
}

/// Media types are case-insensitive; parameters after `;` are ignored.
fn is_form_content_type(value: &str) -> bool {
    value
        .split(';')
        .next()
        .is_some_and(|media| media.trim().eq_ignore_ascii_case(FORM_CONTENT_TYPE))
}

fn parse_form(input: &[u8]) -> HashMap<String, String> {
    form_urlencoded::parse(input).into_owned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect()
    }

    #[test]
    fn splits_path_and_query() {
        let req = Request::new(Method::Get, "/index?app-slug=security/login&x=1", vec![], vec![]);
        assert_eq!(req.path(), "/index");
        assert_eq!(req.query()["app-slug"], "security/login");
        assert_eq!(req.param("x"), Some("1"));
    }

    #[test]
    fn duplicate_query_keys_last_wins() {
        let req = Request::new(Method::Get, "/?a=1&a=2", vec![], vec![]);
        assert_eq!(req.param("a"), Some("2"));
    }

    #[test]
    fn form_body_overrides_query() {
        let req = Request::new(
            Method::Post,
            "/?user=query&page=3",
            headers(&[("Content-Type", "application/x-www-form-urlencoded; charset=utf-8")]),
            b"user=body&password=s%20cret".to_vec(),
        );
        assert_eq!(req.param("user"), Some("body"));
        assert_eq!(req.param("password"), Some("s cret"));

        let params = req.params();
        assert_eq!(params["user"], "body");
        assert_eq!(params["page"], "3");
    }

    #[test]
    fn post_without_form_content_type_leaves_body_alone() {
        let req = Request::new(Method::Post, "/", vec![], b"a=1".to_vec());
        assert!(req.form().is_empty());
        assert_eq!(req.body(), b"a=1");
    }

    #[test]
    fn form_content_type_ignores_case_and_parameters() {
        let req = Request::new(
            Method::Post,
            "/",
            headers(&[("content-type", "Application/X-WWW-Form-Urlencoded")]),
            b"user=a".to_vec(),
        );
        assert_eq!(req.param("user"), Some("a"));

        assert!(is_form_content_type(" application/x-www-form-urlencoded ; charset=UTF-8"));
        assert!(!is_form_content_type("application/x-www-form-urlencoded-extra"));
        assert!(!is_form_content_type("multipart/form-data"));
    }

    #[test]
    fn put_and_delete_parse_raw_body() {
        for method in [Method::Put, Method::Delete] {
            let req = Request::new(method, "/", vec![], b"name=alice".to_vec());
            assert_eq!(req.param("name"), Some("alice"));
        }
    }

    #[test]
    fn params_for_filters_by_verb() {
        let req = Request::new(
            Method::Put,
            "/?q=search",
            vec![],
            b"title=new".to_vec(),
        );
        assert_eq!(req.params_for(Method::Get)["q"], "search");
        assert_eq!(req.params_for(Method::Put)["title"], "new");
        assert!(!req.params_for(Method::Put).contains_key("q"));
    }

    #[test]
    fn transport_details_come_from_headers() {
        let req = Request::new(
            Method::Get,
            "/",
            headers(&[
                ("Host", "example.com"),
                ("X-Forwarded-Proto", "https"),
                ("Referer", "https://example.com/prev"),
            ]),
            vec![],
        );
        assert_eq!(req.host(), "example.com");
        assert_eq!(req.protocol(), "https");
        assert_eq!(req.referer(), Some("https://example.com/prev"));

        let plain = Request::new(Method::Get, "/", vec![], vec![]);
        assert_eq!(plain.protocol(), "http");
        assert!(plain.referer().is_none());
        assert!(plain.secure(true).is_secure());
    }

    #[test]
    fn take_query_removes_the_key() {
        let mut req = Request::new(Method::Get, "/?app-slug=a/b&k=v", vec![], vec![]);
        assert_eq!(req.take_query("app-slug").as_deref(), Some("a/b"));
        assert!(req.param("app-slug").is_none());
        assert_eq!(req.params().len(), 1);
    }
}
