//! View lookup across registered directories.

use std::path::{Path, PathBuf};

use crate::case::{camel_case_to, DELIMITER};

/// Ordered view directories, most-recently-registered first.
///
/// Relative directories resolve against the application path given at
/// construction; absolute ones are used as they are.
#[derive(Clone, Debug)]
pub struct ViewPaths {
    app_path: PathBuf,
    dirs: Vec<PathBuf>,
}

impl ViewPaths {
    pub fn new(app_path: impl Into<PathBuf>) -> Self {
        Self { app_path: app_path.into(), dirs: Vec::new() }
    }

    /// Registers `dir` in front of all earlier directories.
    pub fn register(&mut self, dir: impl AsRef<Path>) {
        self.dirs.insert(0, self.app_path.join(dir));
    }

    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    pub fn app_path(&self) -> &Path {
        &self.app_path
    }

    /// First existing `<dir>/<relative>` in search order.
    pub fn find(&self, relative: &str) -> Option<PathBuf> {
        self.dirs
            .iter()
            .map(|dir| dir.join(relative))
            .find(|candidate| candidate.is_file())
    }

    /// View for a controller/action pair:
    /// `<delimited(controller)>/<delimited(action)>.<extension>`.
    pub fn find_view(&self, controller: &str, action: &str, extension: &str) -> Option<PathBuf> {
        self.find(&view_name(controller, action, extension))
    }
}

/// Relative file name of the default view for a controller/action pair.
pub fn view_name(controller: &str, action: &str, extension: &str) -> String {
    format!(
        "{}/{}.{extension}",
        camel_case_to(controller, DELIMITER),
        camel_case_to(action, DELIMITER),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::fs;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "x").unwrap();
    }

    #[test]
    fn view_names_are_delimited() {
        assert_eq!(view_name("UserAccount", "changePassword", "html"), "user-account/change-password.html");
    }

    #[test]
    fn last_registered_directory_wins() {
        let root = tempfile::tempdir().unwrap();
        touch(&root.path().join("base/security/login.html"));
        touch(&root.path().join("module/security/login.html"));
        touch(&root.path().join("base/security/logout.html"));

        let mut views = ViewPaths::new(root.path());
        views.register("base");
        views.register("module");

        assert_eq!(
            views.find_view("Security", "login", "html").unwrap(),
            root.path().join("module/security/login.html")
        );
        assert_eq!(
            views.find_view("Security", "logout", "html").unwrap(),
            root.path().join("base/security/logout.html")
        );
        assert!(views.find_view("Security", "login", "json").is_none());
    }

    #[test]
    fn absolute_directories_ignore_app_path() {
        let root = tempfile::tempdir().unwrap();
        touch(&root.path().join("main.html"));

        let mut views = ViewPaths::new("/nonexistent");
        views.register(root.path());
        assert_eq!(views.find("main.html").unwrap(), root.path().join("main.html"));
    }

    #[test]
    fn directories_are_not_views() {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir_all(root.path().join("security/login.html")).unwrap();

        let mut views = ViewPaths::new(root.path());
        views.register(".");
        assert!(views.find_view("Security", "login", "html").is_none());
    }
}
