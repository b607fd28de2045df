//! Issuance orchestration: assemble credentials, drive the client, install
//! the resulting material.

use crate::constants;
use crate::core::client::{CertClient, Challenge, IssueRequest};
use crate::core::cred_manager;
use crate::core::cred_store::CredStore;
use crate::core::paths::ToolPaths;
use crate::core::registry::ProviderDescriptor;
use crate::models::certificate::InstallTargets;
use crate::util::fs as tool_fs;
use anyhow::{bail, Result};
use std::net::IpAddr;
use std::path::{Path, PathBuf};

/// Issue a domain certificate over DNS-01 and install its material.
///
/// Credential validation happens before the client is ever invoked; a
/// missing key aborts with nothing written and nothing spawned.
pub fn issue_domain(
    store: &CredStore,
    paths: &ToolPaths,
    client: &dyn CertClient,
    desc: &ProviderDescriptor,
    domains: &[String],
    key_length: &str,
    reload_cmd: Option<String>,
) -> Result<InstallTargets> {
    if domains.is_empty() {
        bail!("at least one domain is required");
    }
    for domain in domains {
        validate_domain(domain)?;
    }
    validate_key_length(key_length)?;
    let env = cred_manager::credential_env(store, desc)?;

    client.set_default_ca(constants::DEFAULT_CA)?;
    let req = IssueRequest {
        names: domains.to_vec(),
        challenge: Challenge::Dns {
            backend: desc.backend.to_string(),
        },
        key_length: key_length.to_string(),
        valid_to: None,
        env,
    };
    client.issue(&req)?;
    install_material(paths, client, req.primary(), reload_cmd)
}

/// Issue a short-lived IP certificate over HTTP-01 and install its material.
pub fn issue_ip(
    paths: &ToolPaths,
    client: &dyn CertClient,
    ip: &str,
    webroot: &Path,
    key_length: &str,
    reload_cmd: Option<String>,
) -> Result<InstallTargets> {
    if ip.parse::<IpAddr>().is_err() {
        bail!("'{}' is not a valid IP address", ip);
    }
    validate_key_length(key_length)?;

    client.set_default_ca(constants::DEFAULT_CA)?;
    let req = IssueRequest {
        names: vec![ip.to_string()],
        challenge: Challenge::Webroot {
            path: webroot.to_path_buf(),
        },
        key_length: key_length.to_string(),
        valid_to: Some(constants::IP_CERT_VALID_TO.to_string()),
        env: Vec::new(),
    };
    client.issue(&req)?;
    install_material(paths, client, ip, reload_cmd)
}

/// Install into `<certs>/<identity>/`: private key (owner-only), then
/// certificate, CA chain, and full chain (world-readable).
pub fn install_material(
    paths: &ToolPaths,
    client: &dyn CertClient,
    identity: &str,
    reload_cmd: Option<String>,
) -> Result<InstallTargets> {
    tool_fs::ensure_dir(&paths.certs, constants::CERTS_DIR_MODE)?;
    let dir = paths.cert_dir(identity);
    tool_fs::ensure_dir(&dir, constants::CERTS_DIR_MODE)?;

    let targets = InstallTargets {
        key: dir.join("key.pem"),
        cert: dir.join("cert.pem"),
        ca: dir.join("ca.pem"),
        fullchain: dir.join("fullchain.pem"),
        reload_cmd,
    };
    client.install(identity, &targets)?;

    set_mode_if_present(&targets.key, constants::KEY_FILE_MODE)?;
    for path in [&targets.cert, &targets.ca, &targets.fullchain] {
        set_mode_if_present(path, constants::CERT_FILE_MODE)?;
    }
    Ok(targets)
}

fn set_mode_if_present(path: &PathBuf, mode: u32) -> Result<()> {
    if path.exists() {
        tool_fs::set_permissions(path, mode)?;
    }
    Ok(())
}

fn validate_domain(domain: &str) -> Result<()> {
    let bare = domain.strip_prefix("*.").unwrap_or(domain);
    if bare.is_empty()
        || bare.contains(char::is_whitespace)
        || bare.contains('/')
        || bare.starts_with('.')
        || bare.ends_with('.')
        || !bare.contains('.')
    {
        bail!("'{}' is not a valid domain name", domain);
    }
    Ok(())
}

fn validate_key_length(key_length: &str) -> Result<()> {
    if !constants::VALID_KEY_LENGTHS.contains(&key_length) {
        bail!(
            "invalid key length '{}' (valid: {})",
            key_length,
            constants::VALID_KEY_LENGTHS.join(", ")
        );
    }
    Ok(())
}
