//! Narrow interface to the external certificate client.
//!
//! Challenges, signing, and renewal all happen on the other side of this
//! trait. Core logic only ever sees exit status.

use crate::models::certificate::InstallTargets;
use anyhow::Result;
use std::path::PathBuf;

/// How domain or IP control is proven for an issue request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Challenge {
    /// DNS-01 through a named client backend.
    Dns { backend: String },
    /// HTTP-01 served from a webroot directory.
    Webroot { path: PathBuf },
}

#[derive(Debug, Clone)]
pub struct IssueRequest {
    /// Domain names, or a single IP literal.
    pub names: Vec<String>,
    pub challenge: Challenge,
    pub key_length: String,
    /// `--valid-to` window for short-lived certificates.
    pub valid_to: Option<String>,
    /// Provider credentials exported to the subprocess environment only.
    pub env: Vec<(String, String)>,
}

impl IssueRequest {
    /// The identity the client files the certificate under.
    pub fn primary(&self) -> &str {
        self.names.first().map(String::as_str).unwrap_or_default()
    }
}

pub trait CertClient {
    /// Point the client at a default certificate authority. Idempotent.
    fn set_default_ca(&self, ca: &str) -> Result<()>;
    /// Run an issuance. Hard failure surfaces the client's exit status.
    fn issue(&self, req: &IssueRequest) -> Result<()>;
    /// Copy issued material for `identity` into the four target files.
    fn install(&self, identity: &str, targets: &InstallTargets) -> Result<()>;
    /// Forget a managed certificate.
    fn remove(&self, identity: &str) -> Result<()>;
    /// Revoke, then forget, a managed certificate.
    fn revoke(&self, identity: &str) -> Result<()>;
    /// The client's own listing of managed certificates, verbatim.
    fn list_managed(&self) -> Result<String>;
    /// The client's built-in renewal sweep over everything it manages.
    fn renew_all(&self) -> Result<()>;
}

#[cfg(test)]
pub mod test_support {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashSet;

    /// In-memory stand-in recording calls; names in `fail_on` error out.
    #[derive(Default)]
    pub struct FakeClient {
        pub calls: RefCell<Vec<String>>,
        pub fail_on: HashSet<String>,
    }

    impl FakeClient {
        fn record(&self, call: String) {
            self.calls.borrow_mut().push(call);
        }

        fn check(&self, identity: &str) -> Result<()> {
            if self.fail_on.contains(identity) {
                anyhow::bail!("client exited with status 1 for {}", identity);
            }
            Ok(())
        }
    }

    impl CertClient for FakeClient {
        fn set_default_ca(&self, ca: &str) -> Result<()> {
            self.record(format!("set-default-ca {}", ca));
            Ok(())
        }

        fn issue(&self, req: &IssueRequest) -> Result<()> {
            self.record(format!("issue {}", req.names.join(",")));
            self.check(req.primary())
        }

        fn install(&self, identity: &str, _targets: &InstallTargets) -> Result<()> {
            self.record(format!("install {}", identity));
            self.check(identity)
        }

        fn remove(&self, identity: &str) -> Result<()> {
            self.record(format!("remove {}", identity));
            self.check(identity)
        }

        fn revoke(&self, identity: &str) -> Result<()> {
            self.record(format!("revoke {}", identity));
            self.check(identity)
        }

        fn list_managed(&self) -> Result<String> {
            self.record("list".to_string());
            Ok(String::new())
        }

        fn renew_all(&self) -> Result<()> {
            self.record("renew-all".to_string());
            Ok(())
        }
    }
}
