//! Include Search Paths
//!
//! Ordered user and system include directories for a session.

use std::path::{Path, PathBuf};
use tracing::debug;

/// Include search path list
#[derive(Debug, Default, Clone)]
pub struct IncludePaths {
    /// `-I` style paths
    user: Vec<PathBuf>,
    /// `-isystem` style paths
    system: Vec<PathBuf>,
}

impl IncludePaths {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an include path.
    ///
    /// Returns false if the path is not an existing directory or is already
    /// registered in either list.
    pub fn add(&mut self, path: &Path, system: bool) -> bool {
        if !path.is_dir() {
            debug!("Rejecting include path {:?}: not a directory", path);
            return false;
        }
        if self.contains(path) {
            debug!("Rejecting include path {:?}: already registered", path);
            return false;
        }

        if system {
            self.system.push(path.to_path_buf());
        } else {
            self.user.push(path.to_path_buf());
        }
        true
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.user.iter().chain(&self.system).any(|p| p == path)
    }

    pub fn user_paths(&self) -> &[PathBuf] {
        &self.user
    }

    pub fn system_paths(&self) -> &[PathBuf] {
        &self.system
    }

    /// Resolve a header name.
    ///
    /// Quoted includes (`system == false`) look next to `from_file` first,
    /// then in user paths; both forms then search the system paths.
    pub fn resolve(
        &self,
        header: &str,
        system: bool,
        from_file: Option<&Path>,
    ) -> Option<PathBuf> {
        if !system {
            if let Some(parent) = from_file.and_then(Path::parent) {
                let relative_path = parent.join(header);
                if relative_path.is_file() {
                    debug!("Resolved {} relative to {:?}", header, parent);
                    return Some(relative_path);
                }
            }
        }

        let user: &[PathBuf] = if system { &[] } else { &self.user };
        for include_path in user.iter().chain(&self.system) {
            let full_path = include_path.join(header);
            if full_path.is_file() {
                debug!("Resolved {} in {:?}", header, include_path);
                return Some(full_path);
            }
        }

        debug!("Failed to resolve header: {}", header);
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn create_tree() -> TempDir {
        let temp = TempDir::new().unwrap();
        let root = temp.path();

        fs::create_dir_all(root.join("user/app")).unwrap();
        fs::create_dir_all(root.join("sys")).unwrap();
        fs::create_dir_all(root.join("src")).unwrap();

        fs::write(root.join("user/app/config.h"), "// user config").unwrap();
        fs::write(root.join("user/stdio.h"), "// shadowing stdio").unwrap();
        fs::write(root.join("sys/stdio.h"), "// stdio").unwrap();
        fs::write(root.join("src/local.h"), "// local").unwrap();

        temp
    }

    #[test]
    fn test_add_rejects_duplicates_and_missing() {
        let temp = create_tree();
        let mut paths = IncludePaths::new();

        assert!(paths.add(&temp.path().join("user"), false));
        assert!(!paths.add(&temp.path().join("user"), false));
        assert!(!paths.add(&temp.path().join("user"), true));
        assert!(!paths.add(&temp.path().join("missing"), false));
        assert!(!paths.add(&temp.path().join("sys/stdio.h"), true));
        assert!(paths.add(&temp.path().join("sys"), true));

        assert_eq!(paths.user_paths().len(), 1);
        assert_eq!(paths.system_paths().len(), 1);
    }

    #[test]
    fn test_resolve_search_order() {
        let temp = create_tree();
        let mut paths = IncludePaths::new();
        paths.add(&temp.path().join("user"), false);
        paths.add(&temp.path().join("sys"), true);

        let quoted = paths.resolve("stdio.h", false, None).unwrap();
        assert!(quoted.ends_with("user/stdio.h"));

        let angled = paths.resolve("stdio.h", true, None).unwrap();
        assert!(angled.ends_with("sys/stdio.h"));

        assert!(paths.resolve("app/config.h", false, None).is_some());
        assert!(paths.resolve("app/config.h", true, None).is_none());
    }

    #[test]
    fn test_resolve_relative_to_including_file() {
        let temp = create_tree();
        let paths = IncludePaths::new();
        let from = temp.path().join("src/main.c");

        let resolved = paths.resolve("local.h", false, Some(&from)).unwrap();
        assert!(resolved.ends_with("src/local.h"));
        assert!(paths.resolve("local.h", true, Some(&from)).is_none());
    }
}
