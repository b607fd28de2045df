//! Read-only scan of the client's per-certificate state records.
//!
//! The client keeps one directory per issued identity containing a
//! `<name>.conf` record with the challenge backend it used. This scan treats
//! those records as facts: a corrupt or unreadable record is skipped with a
//! warning so a single bad entry can never block workflows for the rest.

use crate::models::certificate::CertRecord;
use anyhow::Result;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Account-level files and directories inside the client home that are not
/// per-certificate records.
const NON_CERT_DIRS: &[&str] = &["ca", "deploy", "dnsapi", "notify"];
const ACCOUNT_RECORD: &str = "account.conf";

/// Enumerate every per-certificate record under the client home.
/// A missing home yields an empty list.
pub fn scan_records(acme_home: &Path) -> Result<Vec<CertRecord>> {
    let mut records = Vec::new();
    if !acme_home.is_dir() {
        return Ok(records);
    }

    let pattern = format!("{}/*/*.conf", acme_home.display());
    for entry in glob::glob(&pattern)? {
        let path = match entry {
            Ok(p) => p,
            Err(e) => {
                eprintln!("warning: skipping unreadable record: {}", e);
                continue;
            }
        };
        let file_name = match path.file_name().and_then(|s| s.to_str()) {
            Some(name) => name,
            None => continue,
        };
        if file_name == ACCOUNT_RECORD {
            continue;
        }
        let dir_name = path
            .parent()
            .and_then(|p| p.file_name())
            .and_then(|s| s.to_str())
            .unwrap_or("");
        if NON_CERT_DIRS.contains(&dir_name) {
            continue;
        }

        match parse_record(&path, dir_name) {
            Some(record) => records.push(record),
            None => {
                eprintln!("warning: skipping malformed record {}", path.display());
            }
        }
    }
    Ok(records)
}

/// Identities whose certificate was issued through `backend_id`.
/// Stable discovery order, duplicates suppressed.
pub fn certificates_using(acme_home: &Path, backend_id: &str) -> Result<Vec<String>> {
    let mut seen = HashSet::new();
    let identities = scan_records(acme_home)?
        .into_iter()
        .filter(|r| r.challenge == backend_id)
        .map(|r| r.identity)
        .filter(|identity| seen.insert(identity.clone()))
        .collect();
    Ok(identities)
}

/// Extract the identity and challenge backend from one record file.
/// Returns `None` when the record is unreadable or carries no challenge.
fn parse_record(path: &Path, dir_name: &str) -> Option<CertRecord> {
    let content = fs::read_to_string(path).ok()?;
    let mut domain: Option<String> = None;
    let mut challenge: Option<String> = None;

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let (key, value) = match line.split_once('=') {
            Some(pair) => pair,
            None => continue,
        };
        let value = unquote(value.trim());
        match key.trim() {
            "Le_Domain" if !value.is_empty() => domain = Some(value.to_string()),
            "Le_Webroot" if !value.is_empty() => challenge = Some(value.to_string()),
            _ => {}
        }
    }

    let identity = domain.unwrap_or_else(|| {
        dir_name.strip_suffix("_ecc").unwrap_or(dir_name).to_string()
    });
    if identity.is_empty() {
        return None;
    }
    Some(CertRecord {
        identity,
        challenge: challenge?,
        path: path.to_path_buf(),
    })
}

fn unquote(value: &str) -> &str {
    let value = value
        .strip_prefix('\'')
        .and_then(|v| v.strip_suffix('\''))
        .unwrap_or(value);
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn write_record(home: &Path, dir: &str, file: &str, content: &str) {
        let d = home.join(dir);
        fs::create_dir_all(&d).unwrap();
        fs::write(d.join(file), content).unwrap();
    }

    fn fake_home() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let home = dir.path().join(".acme.sh");
        fs::create_dir_all(&home).unwrap();
        (dir, home)
    }

    #[test]
    fn test_missing_home_is_empty() {
        let dir = TempDir::new().unwrap();
        let out = certificates_using(&dir.path().join("nope"), "dns_cf").unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_no_matching_backend_is_empty() {
        let (_dir, home) = fake_home();
        write_record(
            &home,
            "example.com",
            "example.com.conf",
            "Le_Domain='example.com'\nLe_Webroot='dns_dp'\n",
        );
        let out = certificates_using(&home, "dns_cf").unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_matches_collected_in_stable_order() {
        let (_dir, home) = fake_home();
        write_record(
            &home,
            "a.example.com",
            "a.example.com.conf",
            "Le_Domain='a.example.com'\nLe_Webroot='dns_cf'\n",
        );
        write_record(
            &home,
            "b.example.com",
            "b.example.com.conf",
            "Le_Domain='b.example.com'\nLe_Webroot='dns_cf'\n",
        );
        write_record(
            &home,
            "c.example.com",
            "c.example.com.conf",
            "Le_Domain='c.example.com'\nLe_Webroot='dns_dp'\n",
        );
        let out = certificates_using(&home, "dns_cf").unwrap();
        assert_eq!(out, vec!["a.example.com", "b.example.com"]);
    }

    #[test]
    fn test_account_record_skipped() {
        let (_dir, home) = fake_home();
        // account.conf also carries provider keys but is not a certificate
        write_record(&home, "ca", "account.conf", "Le_Webroot='dns_cf'\n");
        fs::write(home.join("account.conf"), "CF_Token='x'\n").unwrap();
        write_record(
            &home,
            "example.com",
            "example.com.conf",
            "Le_Domain='example.com'\nLe_Webroot='dns_cf'\n",
        );
        let out = certificates_using(&home, "dns_cf").unwrap();
        assert_eq!(out, vec!["example.com"]);
    }

    #[test]
    fn test_malformed_record_skipped_not_fatal() {
        let (_dir, home) = fake_home();
        write_record(&home, "broken.example.com", "broken.example.com.conf", "\0\0garbage");
        write_record(
            &home,
            "ok.example.com",
            "ok.example.com.conf",
            "Le_Domain='ok.example.com'\nLe_Webroot='dns_cf'\n",
        );
        let out = certificates_using(&home, "dns_cf").unwrap();
        assert_eq!(out, vec!["ok.example.com"]);
    }

    #[test]
    fn test_duplicates_suppressed() {
        let (_dir, home) = fake_home();
        // plain and _ecc directories for the same identity
        write_record(
            &home,
            "example.com",
            "example.com.conf",
            "Le_Domain='example.com'\nLe_Webroot='dns_cf'\n",
        );
        write_record(
            &home,
            "example.com_ecc",
            "example.com.conf",
            "Le_Domain='example.com'\nLe_Webroot='dns_cf'\n",
        );
        let out = certificates_using(&home, "dns_cf").unwrap();
        assert_eq!(out, vec!["example.com"]);
    }

    #[test]
    fn test_identity_falls_back_to_dir_name() {
        let (_dir, home) = fake_home();
        write_record(
            &home,
            "fallback.example.com_ecc",
            "fallback.example.com.conf",
            "Le_Webroot='dns_cf'\n",
        );
        let out = certificates_using(&home, "dns_cf").unwrap();
        assert_eq!(out, vec!["fallback.example.com"]);
    }

    #[test]
    fn test_webroot_records_match_http_challenge() {
        let (_dir, home) = fake_home();
        write_record(
            &home,
            "203.0.113.7",
            "203.0.113.7.conf",
            "Le_Domain='203.0.113.7'\nLe_Webroot='/var/www/html'\n",
        );
        let out = certificates_using(&home, "/var/www/html").unwrap();
        assert_eq!(out, vec!["203.0.113.7"]);
        assert!(certificates_using(&home, "dns_cf").unwrap().is_empty());
    }
}
