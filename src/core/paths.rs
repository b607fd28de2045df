//! Tool path resolution and on-disk layout.

use crate::constants;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct ToolPaths {
    pub root: PathBuf,
    /// Flat KEY=value credential store.
    pub store: PathBuf,
    pub store_lock: PathBuf,
    pub audit_log: PathBuf,
    pub audit_lock: PathBuf,
    /// Generated renewal wrapper script.
    pub wrapper: PathBuf,
    /// Base directory for installed certificate material.
    pub certs: PathBuf,
    /// Home directory of the external ACME client.
    pub acme_home: PathBuf,
}

impl ToolPaths {
    /// Resolve paths from CLI args, environment, or defaults.
    pub fn resolve(root_arg: Option<PathBuf>, acme_home_arg: Option<PathBuf>) -> Self {
        let root = root_arg
            .or_else(|| env::var("ACMEWRAP_ROOT").ok().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(constants::DEFAULT_ROOT));
        let acme_home = acme_home_arg
            .or_else(|| env::var("ACMEWRAP_ACME_HOME").ok().map(PathBuf::from))
            .or_else(|| env::var("LE_WORKING_DIR").ok().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(constants::DEFAULT_ACME_HOME));
        Self::from_parts(root, acme_home)
    }

    /// Build the layout under a root directory.
    pub fn from_parts(root: PathBuf, acme_home: PathBuf) -> Self {
        let store = root.join("credentials.conf");
        let store_lock = root.join("store.lock");
        let audit_log = root.join("audit.log");
        let audit_lock = root.join("audit.lock");
        let wrapper = root.join("renew-wrapper.sh");
        let certs = root.join("certs");
        Self {
            root,
            store,
            store_lock,
            audit_log,
            audit_lock,
            wrapper,
            certs,
            acme_home,
        }
    }

    /// Path of the ACME client executable inside its home.
    pub fn acme_bin(&self) -> PathBuf {
        self.acme_home.join(constants::ACME_BIN_NAME)
    }

    /// Output directory for one issued identity (domain or IP).
    pub fn cert_dir(&self, identity: &str) -> PathBuf {
        self.certs.join(identity)
    }
}

impl std::fmt::Display for ToolPaths {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "acmewrap@{}", self.root.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_parts_layout() {
        let paths = ToolPaths::from_parts(PathBuf::from("/t"), PathBuf::from("/a"));
        assert_eq!(paths.store, PathBuf::from("/t/credentials.conf"));
        assert_eq!(paths.store_lock, PathBuf::from("/t/store.lock"));
        assert_eq!(paths.audit_log, PathBuf::from("/t/audit.log"));
        assert_eq!(paths.wrapper, PathBuf::from("/t/renew-wrapper.sh"));
        assert_eq!(paths.certs, PathBuf::from("/t/certs"));
        assert_eq!(paths.acme_home, PathBuf::from("/a"));
    }

    #[test]
    fn test_acme_bin() {
        let paths = ToolPaths::from_parts(PathBuf::from("/t"), PathBuf::from("/a"));
        assert_eq!(paths.acme_bin(), PathBuf::from("/a/acme.sh"));
    }

    #[test]
    fn test_cert_dir_per_identity() {
        let paths = ToolPaths::from_parts(PathBuf::from("/t"), PathBuf::from("/a"));
        assert_eq!(paths.cert_dir("example.com"), PathBuf::from("/t/certs/example.com"));
        assert_eq!(paths.cert_dir("203.0.113.7"), PathBuf::from("/t/certs/203.0.113.7"));
    }
}
