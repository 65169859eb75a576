//! Case conversion between URL segments and Rust-side names.
//!
//! URLs carry delimited lowercase words (`change-password`); controllers and
//! actions are registered in camel case (`ChangePassword`, `changePassword`).
//! The two directions are inverses for the default `-` delimiter as long as
//! names do not contain consecutive capitals.

/// Default word delimiter in URL segments.
pub const DELIMITER: char = '-';

/// `fooBar` -> `foo-bar`, `SecurityAdmin` -> `security-admin`.
///
/// A delimiter goes before every uppercase letter that follows a word
/// character, then the whole string is lowercased.
pub fn camel_case_to(camel: &str, delimiter: char) -> String {
    let mut out = String::with_capacity(camel.len() + 4);
    let mut prev: Option<char> = None;
    for c in camel.chars() {
        if c.is_ascii_uppercase() && prev.is_some_and(is_word_char) {
            out.push(delimiter);
        }
        out.extend(c.to_lowercase());
        prev = Some(c);
    }
    out
}

/// `foo-bar` -> `fooBar`. Every delimited word is capitalised, then the
/// first character is lowered again.
pub fn camel_case_from(delimited: &str, delimiter: char) -> String {
    let joined: String = delimited.split(delimiter).map(ucfirst).collect();
    lcfirst(&joined)
}

/// `fooBar` -> `FooBar`.
pub fn ucfirst(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `FooBar` -> `fooBar`.
pub fn lcfirst(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `UserAccount` -> `user_account`; used for SQL table and column names.
///
/// Unlike [`camel_case_to`], an underscore goes before an uppercase letter
/// following any non-uppercase character, and runs of capitals stay joined.
pub fn underscored(camel: &str) -> String {
    let mut out = String::with_capacity(camel.len() + 4);
    let mut prev: Option<char> = None;
    for c in camel.chars() {
        if c.is_ascii_uppercase() && prev.is_some_and(|p| !p.is_ascii_uppercase()) {
            out.push('_');
        }
        out.extend(c.to_lowercase());
        prev = Some(c);
    }
    out
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camel_to_delimited() {
        assert_eq!(camel_case_to("Application", '-'), "application");
        assert_eq!(camel_case_to("changePassword", '-'), "change-password");
        assert_eq!(camel_case_to("SecurityAdmin", '-'), "security-admin");
        assert_eq!(camel_case_to("fooBar", '_'), "foo_bar");
        assert_eq!(camel_case_to("", '-'), "");
    }

    #[test]
    fn consecutive_capitals_are_split() {
        assert_eq!(camel_case_to("HTMLView", '-'), "h-t-m-l-view");
    }

    #[test]
    fn delimited_to_camel() {
        assert_eq!(camel_case_from("change-password", '-'), "changePassword");
        assert_eq!(camel_case_from("security", '-'), "security");
        assert_eq!(camel_case_from("Security", '-'), "security");
        assert_eq!(camel_case_from("", '-'), "");
        assert_eq!(camel_case_from("a--b", '-'), "aB");
    }

    #[test]
    fn conversions_are_inverse_for_simple_names() {
        for name in ["index", "postLogin", "changeUserPassword", "x"] {
            assert_eq!(camel_case_from(&camel_case_to(name, DELIMITER), DELIMITER), name);
        }
    }

    #[test]
    fn first_letter_helpers() {
        assert_eq!(ucfirst("login"), "Login");
        assert_eq!(lcfirst("Login"), "login");
        assert_eq!(ucfirst(""), "");
    }

    #[test]
    fn underscored_names() {
        assert_eq!(underscored("User"), "user");
        assert_eq!(underscored("UserAccount"), "user_account");
        assert_eq!(underscored("byNameAndAge"), "by_name_and_age");
        assert_eq!(underscored("HTMLPage"), "htmlpage");
    }
}
