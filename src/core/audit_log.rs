//! Append-only audit trail for credential and certificate operations.
//!
//! One JSON object per line, hash-chained: each entry records the previous
//! entry's hash, so truncation or edits surface in `audit verify`. Secrets
//! never enter the log, only key names and identities.

use crate::constants;
use crate::core::file_lock::FileLock;
use crate::core::paths::ToolPaths;
use crate::util::privilege;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub timestamp: DateTime<Utc>,
    pub action: String,
    pub actor: String,
    /// Provider id, identity, or other operation subject.
    pub subject: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_hash: Option<String>,
}

/// Append one entry with the auto-detected actor.
pub fn log(paths: &ToolPaths, action: &str, subject: &str, success: bool) -> Result<()> {
    log_as(paths, action, subject, success, &privilege::current_actor())
}

pub fn log_as(
    paths: &ToolPaths,
    action: &str,
    subject: &str,
    success: bool,
    actor: &str,
) -> Result<()> {
    fs::create_dir_all(&paths.root)
        .with_context(|| format!("create dir {}", paths.root.display()))?;
    let _lock = FileLock::exclusive(&paths.audit_lock)?;
    let prev_hash = last_entry_hash(paths)?;

    let mut entry = AuditEntry {
        timestamp: Utc::now(),
        action: action.to_string(),
        actor: actor.to_string(),
        subject: subject.to_string(),
        success,
        prev_hash,
        entry_hash: None,
    };
    entry.entry_hash = Some(hash_entry(&entry)?);

    let line = serde_json::to_string(&entry).context("serialize audit entry")?;
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&paths.audit_log)
        .with_context(|| format!("open audit log {}", paths.audit_log.display()))?;
    writeln!(file, "{}", line).context("write audit entry")?;

    #[cfg(unix)]
    {
        let perm = fs::Permissions::from_mode(constants::AUDIT_LOG_MODE);
        fs::set_permissions(&paths.audit_log, perm).context("set audit log permissions")?;
    }
    Ok(())
}

/// Hash of an entry with its own hash field cleared. Serialization order is
/// the struct order, so the digest is deterministic.
fn hash_entry(entry: &AuditEntry) -> Result<String> {
    let mut unhashed = entry.clone();
    unhashed.entry_hash = None;
    let json = serde_json::to_string(&unhashed).context("serialize for hash")?;
    Ok(format!("{:064x}", Sha256::digest(json.as_bytes())))
}

fn last_entry_hash(paths: &ToolPaths) -> Result<Option<String>> {
    let entries = read_log(paths, None)?;
    Ok(entries.last().and_then(|e| e.entry_hash.clone()))
}

/// Entries in file order, skipping malformed lines with a warning; `limit`
/// keeps only the newest N.
pub fn read_log(paths: &ToolPaths, limit: Option<usize>) -> Result<Vec<AuditEntry>> {
    if !paths.audit_log.exists() {
        return Ok(Vec::new());
    }
    let file = fs::File::open(&paths.audit_log)
        .with_context(|| format!("open audit log {}", paths.audit_log.display()))?;
    let reader = BufReader::new(file);
    let mut entries = Vec::new();
    let mut malformed = 0usize;

    for line in reader.lines() {
        let line = line.context("read audit log line")?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        match serde_json::from_str::<AuditEntry>(trimmed) {
            Ok(entry) => entries.push(entry),
            Err(_) => malformed += 1,
        }
    }
    if malformed > 0 {
        eprintln!("warning: {} malformed audit entries skipped", malformed);
    }
    if let Some(limit) = limit {
        if entries.len() > limit {
            entries = entries.split_off(entries.len() - limit);
        }
    }
    Ok(entries)
}

/// Walk the chain; returns the entry count and any integrity errors.
pub fn verify_chain(paths: &ToolPaths) -> Result<(usize, Vec<String>)> {
    let entries = read_log(paths, None)?;
    let mut errors = Vec::new();
    let mut prev: Option<String> = None;

    for (i, entry) in entries.iter().enumerate() {
        if i > 0 && entry.prev_hash != prev {
            errors.push(format!("entry {}: prev_hash mismatch", i + 1));
        }
        match (&entry.entry_hash, hash_entry(entry)) {
            (Some(stored), Ok(computed)) if *stored != computed => {
                errors.push(format!("entry {}: entry_hash mismatch (tampered?)", i + 1));
            }
            (None, _) => errors.push(format!("entry {}: missing entry_hash", i + 1)),
            (_, Err(e)) => errors.push(format!("entry {}: cannot hash: {}", i + 1, e)),
            _ => {}
        }
        prev = entry.entry_hash.clone();
    }
    Ok((entries.len(), errors))
}
