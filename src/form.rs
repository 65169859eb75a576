//! Request parameter validation.
//!
//! ```rust
//! use lmvc::{Form, Method, Request};
//!
//! let request = Request::new(
//!     Method::Put,
//!     "/",
//!     vec![],
//!     b"username=alice&password=+".to_vec(),
//! );
//! let form = Form::new(&request).mandatory("username").mandatory("password");
//!
//! assert!(!form.is_valid());
//! assert_eq!(form.errors(), ["password"]);
//! ```

use crate::request::Request;

/// Checks run against one request's parameters. Every failing parameter is
/// recorded, not just the first.
#[derive(Debug)]
pub struct Form<'a> {
    request: &'a Request,
    errors: Vec<String>,
}

impl<'a> Form<'a> {
    pub fn new(request: &'a Request) -> Self {
        Self { request, errors: Vec::new() }
    }

    /// Fails `name` when the parameter is missing or blank after trimming.
    pub fn mandatory(mut self, name: &str) -> Self {
        let blank = self.request.param(name).is_none_or(|v| v.trim().is_empty());
        if blank {
            self.set_error(name);
        }
        self
    }

    /// Records a failure for `name`; recording it twice keeps one entry.
    pub fn set_error(&mut self, name: &str) {
        if !self.has_error(name) {
            self.errors.push(name.to_owned());
        }
    }

    /// Failed parameter names, in the order they were checked.
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn has_error(&self, name: &str) -> bool {
        self.errors.iter().any(|e| e == name)
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn request(&self) -> &'a Request {
        self.request
    }
}
