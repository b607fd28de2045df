//! Centralized constants for permissions, paths, and the renewal schedule.

/// Default tool root directory.
pub const DEFAULT_ROOT: &str = "/etc/acmewrap";

/// Default ACME client home when no override is set.
pub const DEFAULT_ACME_HOME: &str = "/root/.acme.sh";

/// Name of the ACME client binary inside its home directory.
pub const ACME_BIN_NAME: &str = "acme.sh";

/// Certificate authority the client is pointed at before every issue.
pub const DEFAULT_CA: &str = "letsencrypt";

/// Permission mode for the credential store file.
pub const STORE_FILE_MODE: u32 = 0o600;

/// Permission mode for the certificate output base directory.
pub const CERTS_DIR_MODE: u32 = 0o755;

/// Permission mode for an issued private key file.
pub const KEY_FILE_MODE: u32 = 0o600;

/// Permission mode for issued certificate / chain files.
pub const CERT_FILE_MODE: u32 = 0o644;

/// Permission mode for the renewal wrapper script.
pub const WRAPPER_MODE: u32 = 0o755;

/// Permission mode for the audit log.
pub const AUDIT_LOG_MODE: u32 = 0o640;

/// Crontab schedule for the renewal wrapper (daily, 03:07).
pub const CRON_SCHEDULE: &str = "7 3 * * *";

/// Marker comment appended to the crontab entry this tool installs.
pub const CRON_MARKER: &str = "# acmewrap renew";

/// Flag key in the credential store gating the renewal wrapper.
pub const AUTO_RENEW_KEY: &str = "AUTO_RENEW";

/// Key length requested for DNS-01 domain certificates.
pub const DEFAULT_KEY_LENGTH: &str = "ec-256";

/// Validity window requested for short-lived IP certificates.
pub const IP_CERT_VALID_TO: &str = "+160h";

/// Default webroot served for HTTP-01 IP challenges.
pub const DEFAULT_WEBROOT: &str = "/var/www/html";

/// Valid key lengths accepted by the client.
pub const VALID_KEY_LENGTHS: &[&str] = &["ec-256", "ec-384", "2048", "3072", "4096"];
