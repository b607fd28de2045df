//! Safe add/update/delete workflows over provider credentials.
//!
//! Composes the registry, the store, and the usage scanner. Writes are
//! all-or-nothing: validation happens before the first store mutation, so a
//! rejected request leaves the file untouched.

use crate::core::client::CertClient;
use crate::core::cred_store::CredStore;
use crate::core::paths::ToolPaths;
use crate::core::registry::{AuthMode, ProviderDescriptor};
use crate::core::usage_scan;
use anyhow::{bail, Result};

/// Store one provider's credentials under the chosen auth mode.
///
/// Every key of the mode must be present and non-empty before anything is
/// written. Keys belonging to the provider's other auth modes are removed
/// afterwards so a stale alternate credential can never be read later.
pub fn store_credentials(
    store: &mut CredStore,
    desc: &ProviderDescriptor,
    mode_name: &str,
    values: &[(&str, &str)],
) -> Result<()> {
    let mode = match desc.mode(mode_name) {
        Some(mode) => mode,
        None => bail!(
            "provider '{}' has no auth mode '{}' (modes: {})",
            desc.id(),
            mode_name,
            desc.modes.iter().map(|m| m.name).collect::<Vec<_>>().join(", ")
        ),
    };

    let mut missing = Vec::new();
    for &key in mode.keys {
        match lookup_value(values, key) {
            Some(v) if !v.trim().is_empty() => {}
            _ => missing.push(key),
        }
    }
    if !missing.is_empty() {
        bail!(
            "missing required credential key(s) for {}: {}",
            desc.id(),
            missing.join(", ")
        );
    }

    for &key in mode.keys {
        let value = lookup_value(values, key).unwrap_or_default();
        store.set(key, value)?;
    }
    for &(key, default) in desc.defaults {
        let value = lookup_value(values, key).unwrap_or(default);
        store.set(key, value)?;
    }

    // Drop the other modes' keys so only one auth mode ever lingers.
    for other in desc.modes {
        if other.name == mode.name {
            continue;
        }
        for &key in other.keys {
            if !mode.keys.contains(&key) {
                store.unset(key)?;
            }
        }
    }
    Ok(())
}

/// First auth mode fully satisfied by the store.
pub fn active_mode(
    store: &CredStore,
    desc: &ProviderDescriptor,
) -> Result<&'static AuthMode> {
    for mode in desc.modes {
        let satisfied = mode
            .keys
            .iter()
            .all(|&key| store.get(key).is_some_and(|v| !v.trim().is_empty()));
        if satisfied {
            return Ok(mode);
        }
    }
    let missing: Vec<&str> = desc
        .required_keys()
        .iter()
        .copied()
        .filter(|&key| store.get(key).map_or(true, |v| v.trim().is_empty()))
        .collect();
    bail!(
        "no credentials configured for {} (missing: {}); run: acmewrap provider add {}",
        desc.id(),
        missing.join(", "),
        desc.id()
    );
}

/// Environment exported to the client subprocess: the active mode's keys
/// plus the provider's optional keys (stored value wins over the default).
pub fn credential_env(
    store: &CredStore,
    desc: &ProviderDescriptor,
) -> Result<Vec<(String, String)>> {
    let mode = active_mode(store, desc)?;
    let mut env = Vec::new();
    for &key in mode.keys {
        let value = store.get(key).unwrap_or_default();
        env.push((key.to_string(), value.to_string()));
    }
    for &(key, default) in desc.defaults {
        let value = store.get(key).unwrap_or(default);
        env.push((key.to_string(), value.to_string()));
    }
    Ok(env)
}

/// Certificates whose renewal depends on this provider's credentials.
pub fn dependent_certificates(
    paths: &ToolPaths,
    desc: &ProviderDescriptor,
) -> Result<Vec<String>> {
    usage_scan::certificates_using(&paths.acme_home, desc.backend)
}

/// Remove every credential key the provider may have written.
pub fn delete_credentials(store: &mut CredStore, desc: &ProviderDescriptor) -> Result<()> {
    for key in desc.all_keys() {
        store.unset(key)?;
    }
    Ok(())
}

/// Outcome of a best-effort certificate removal batch.
#[derive(Debug, Default)]
pub struct RemovalOutcome {
    pub removed: Vec<String>,
    pub failed: Vec<(String, String)>,
}

/// Remove (optionally revoking first) each certificate through the client.
/// One failure never aborts the batch; the caller reports per identity.
pub fn remove_certificates(
    client: &dyn CertClient,
    identities: &[String],
    revoke: bool,
) -> RemovalOutcome {
    let mut outcome = RemovalOutcome::default();
    for identity in identities {
        let result = if revoke {
            client.revoke(identity).and_then(|()| client.remove(identity))
        } else {
            client.remove(identity)
        };
        match result {
            Ok(()) => outcome.removed.push(identity.clone()),
            Err(e) => outcome.failed.push((identity.clone(), e.to_string())),
        }
    }
    outcome
}

fn lookup_value<'a>(values: &[(&str, &'a str)], key: &str) -> Option<&'a str> {
    values.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
}
