//! `acme.sh` subprocess adapter.
//!
//! The only place the external client is actually spawned. Arguments follow
//! the client's documented CLI; stdout is passed through or surfaced in
//! errors, never parsed for structure.

use crate::core::client::{CertClient, Challenge, IssueRequest};
use crate::core::paths::ToolPaths;
use crate::models::certificate::InstallTargets;
use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use std::process::Command;

pub struct AcmeSh {
    bin: PathBuf,
    home: PathBuf,
}

impl AcmeSh {
    pub fn new(paths: &ToolPaths) -> Self {
        Self {
            bin: paths.acme_bin(),
            home: paths.acme_home.clone(),
        }
    }

    /// Whether the client executable exists at its expected location.
    pub fn installed(&self) -> bool {
        self.bin.is_file()
    }

    pub fn bin(&self) -> &PathBuf {
        &self.bin
    }

    fn base(&self) -> Command {
        let mut cmd = Command::new(&self.bin);
        cmd.arg("--home").arg(&self.home);
        cmd
    }

    fn run(&self, mut cmd: Command, what: &str) -> Result<()> {
        if !self.installed() {
            bail!(
                "certificate client not found at {} (install acme.sh first)",
                self.bin.display()
            );
        }
        let output = cmd.output().with_context(|| format!("run client {}", what))?;
        if output.status.success() {
            return Ok(());
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!("client {} failed: {}{}", what, stdout, stderr);
    }
}

impl CertClient for AcmeSh {
    fn set_default_ca(&self, ca: &str) -> Result<()> {
        let mut cmd = self.base();
        cmd.arg("--set-default-ca").arg("--server").arg(ca);
        self.run(cmd, "set-default-ca")
    }

    fn issue(&self, req: &IssueRequest) -> Result<()> {
        let mut cmd = self.base();
        cmd.arg("--issue");
        for name in &req.names {
            cmd.arg("-d").arg(name);
        }
        match &req.challenge {
            Challenge::Dns { backend } => {
                cmd.arg("--dns").arg(backend);
            }
            Challenge::Webroot { path } => {
                cmd.arg("-w").arg(path);
            }
        }
        cmd.arg("--keylength").arg(&req.key_length);
        if let Some(valid_to) = &req.valid_to {
            cmd.arg("--valid-to").arg(valid_to);
        }
        // Credentials reach the client through its environment only.
        cmd.envs(req.env.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        self.run(cmd, "issue")
    }

    fn install(&self, identity: &str, targets: &InstallTargets) -> Result<()> {
        let mut cmd = self.base();
        cmd.arg("--install-cert")
            .arg("-d")
            .arg(identity)
            .arg("--key-file")
            .arg(&targets.key)
            .arg("--cert-file")
            .arg(&targets.cert)
            .arg("--ca-file")
            .arg(&targets.ca)
            .arg("--fullchain-file")
            .arg(&targets.fullchain);
        if let Some(reload) = &targets.reload_cmd {
            cmd.arg("--reloadcmd").arg(reload);
        }
        self.run(cmd, "install-cert")
    }

    fn remove(&self, identity: &str) -> Result<()> {
        let mut cmd = self.base();
        cmd.arg("--remove").arg("-d").arg(identity);
        self.run(cmd, "remove")
    }

    fn revoke(&self, identity: &str) -> Result<()> {
        let mut cmd = self.base();
        cmd.arg("--revoke").arg("-d").arg(identity);
        self.run(cmd, "revoke")
    }

    fn list_managed(&self) -> Result<String> {
        if !self.installed() {
            bail!(
                "certificate client not found at {} (install acme.sh first)",
                self.bin.display()
            );
        }
        let mut cmd = self.base();
        cmd.arg("--list");
        let output = cmd.output().context("run client list")?;
        if !output.status.success() {
            bail!(
                "client list failed: {}",
                String::from_utf8_lossy(&output.stderr)
            );
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn renew_all(&self) -> Result<()> {
        let mut cmd = self.base();
        cmd.arg("--cron");
        self.run(cmd, "renew sweep")
    }
}
