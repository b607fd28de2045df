//! Flat `KEY=value` credential store.
//!
//! The backing file is parsed by a strict line parser, never sourced or
//! evaluated. It holds provider secrets, so it is created 0600 and only
//! ever rewritten atomically under an exclusive lock. Point mutations leave
//! every other line byte-identical, in order.

use crate::constants;
use crate::core::file_lock::FileLock;
use crate::core::paths::ToolPaths;
use anyhow::{bail, Context, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

/// One physical line of the store file.
#[derive(Debug, Clone, PartialEq, Eq)]
enum StoreLine {
    Pair { key: String, value: String },
    /// Blank, comment, or unparseable line, preserved verbatim and never
    /// interpreted.
    Raw(String),
}

#[derive(Debug)]
pub struct CredStore {
    path: PathBuf,
    lock_path: PathBuf,
    lines: Vec<StoreLine>,
}

impl CredStore {
    /// Load a snapshot of the store. A missing file is an empty store.
    pub fn load(paths: &ToolPaths) -> Result<Self> {
        Self::open(&paths.store, &paths.store_lock)
    }

    pub fn open(path: &Path, lock_path: &Path) -> Result<Self> {
        let lines = read_lines(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            lock_path: lock_path.to_path_buf(),
            lines,
        })
    }

    /// Value for `key` from the in-memory snapshot.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.lines.iter().rev().find_map(|line| match line {
            StoreLine::Pair { key: k, value } if k == key => Some(value.as_str()),
            _ => None,
        })
    }

    /// Interpret a flag key; absent or anything but true/1/yes is off.
    pub fn is_enabled(&self, key: &str) -> bool {
        matches!(self.get(key), Some("true") | Some("1") | Some("yes"))
    }

    /// Keys currently present, in file order.
    pub fn keys(&self) -> Vec<&str> {
        self.lines
            .iter()
            .filter_map(|line| match line {
                StoreLine::Pair { key, .. } => Some(key.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Replace `key` in place, or append it. Re-reads the file under the
    /// store lock so concurrent invocations cannot lose each other's writes.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        validate_key(key)?;
        validate_value(key, value)?;
        self.ensure_parent()?;
        let _lock = FileLock::exclusive(&self.lock_path)?;
        let mut lines = read_lines(&self.path)?;
        upsert(&mut lines, key, value);
        write_lines(&self.path, &lines)?;
        self.lines = lines;
        Ok(())
    }

    /// Remove the line for `key`; no-op when absent.
    pub fn unset(&mut self, key: &str) -> Result<()> {
        self.ensure_parent()?;
        let _lock = FileLock::exclusive(&self.lock_path)?;
        let mut lines = read_lines(&self.path)?;
        let before = lines.len();
        lines.retain(|line| !matches!(line, StoreLine::Pair { key: k, .. } if k == key));
        if lines.len() != before {
            write_lines(&self.path, &lines)?;
        }
        self.lines = lines;
        Ok(())
    }

    /// Create the backing file (0600) when absent; content is untouched.
    pub fn ensure_file(&self) -> Result<()> {
        if self.path.exists() {
            return Ok(());
        }
        self.ensure_parent()?;
        let _lock = FileLock::exclusive(&self.lock_path)?;
        if !self.path.exists() {
            write_lines(&self.path, &self.lines)?;
        }
        Ok(())
    }

    fn ensure_parent(&self) -> Result<()> {
        let parent = self.path.parent().unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(parent)
            .with_context(|| format!("create dir {}", parent.display()))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn validate_key(key: &str) -> Result<()> {
    let mut chars = key.chars();
    let ok = match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };
    if !ok {
        bail!("invalid key '{}': must match [A-Za-z_][A-Za-z0-9_]*", key);
    }
    Ok(())
}

fn validate_value(key: &str, value: &str) -> Result<()> {
    if value.contains('\n') || value.contains('\r') {
        bail!("value for '{}' contains a line break", key);
    }
    Ok(())
}

/// Replace the first line for `key` and drop any stray duplicates, so the
/// store always ends up with exactly one line per key.
fn upsert(lines: &mut Vec<StoreLine>, key: &str, value: &str) {
    let mut replaced = false;
    lines.retain_mut(|line| {
        if let StoreLine::Pair { key: k, value: v } = line {
            if k == key {
                if replaced {
                    return false;
                }
                *v = value.to_string();
                replaced = true;
            }
        }
        true
    });
    if !replaced {
        lines.push(StoreLine::Pair {
            key: key.to_string(),
            value: value.to_string(),
        });
    }
}

/// Strict line-oriented parse. A line is a pair only when everything before
/// the first `=` is a valid key; anything else stays raw and inert.
fn parse_lines(content: &str) -> Vec<StoreLine> {
    content
        .lines()
        .map(|line| match line.split_once('=') {
            Some((key, value)) if validate_key(key).is_ok() => StoreLine::Pair {
                key: key.to_string(),
                value: value.to_string(),
            },
            _ => StoreLine::Raw(line.to_string()),
        })
        .collect()
}

fn read_lines(path: &Path) -> Result<Vec<StoreLine>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let content =
        fs::read_to_string(path).with_context(|| format!("read store {}", path.display()))?;
    Ok(parse_lines(&content))
}

fn render(lines: &[StoreLine]) -> String {
    let mut out = String::new();
    for line in lines {
        match line {
            StoreLine::Pair { key, value } => {
                out.push_str(key);
                out.push('=');
                out.push_str(value);
            }
            StoreLine::Raw(raw) => out.push_str(raw),
        }
        out.push('\n');
    }
    out
}

/// Atomic rewrite. The temp file carries 0600 before it is linked into
/// place, so the store is never observable with broader permissions, not
/// even at first creation.
fn write_lines(path: &Path, lines: &[StoreLine]) -> Result<()> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent).with_context(|| format!("create dir {}", parent.display()))?;
    let mut tmp = tempfile::Builder::new()
        .prefix(".store-")
        .tempfile_in(parent)
        .context("create temp store file")?;
    tmp.write_all(render(lines).as_bytes())
        .context("write temp store file")?;
    tmp.flush().context("flush temp store file")?;

    #[cfg(unix)]
    {
        let perm = fs::Permissions::from_mode(constants::STORE_FILE_MODE);
        tmp.as_file()
            .set_permissions(perm)
            .context("set permissions on temp store file")?;
    }

    tmp.persist(path)
        .map_err(|e| anyhow::anyhow!("persist store {}: {}", path.display(), e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store(dir: &TempDir) -> CredStore {
        CredStore::open(&dir.path().join("credentials.conf"), &dir.path().join("store.lock"))
            .unwrap()
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let s = store(&dir);
        assert!(s.get("ANY").is_none());
        assert!(s.keys().is_empty());
    }

    #[test]
    fn test_set_then_get() {
        let dir = TempDir::new().unwrap();
        let mut s = store(&dir);
        s.set("CF_Token", "abc123").unwrap();
        assert_eq!(s.get("CF_Token"), Some("abc123"));
    }

    #[test]
    fn test_last_write_wins_single_line() {
        let dir = TempDir::new().unwrap();
        let mut s = store(&dir);
        s.set("DP_Id", "123").unwrap();
        s.set("DP_Id", "999").unwrap();
        assert_eq!(s.get("DP_Id"), Some("999"));
        let content = fs::read_to_string(s.path()).unwrap();
        assert_eq!(content.matches("DP_Id=").count(), 1);
        assert_eq!(content, "DP_Id=999\n");
    }

    #[test]
    fn test_set_preserves_other_lines_in_order() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("credentials.conf");
        fs::write(&path, "# header\nA=1\n\nB=2\n").unwrap();
        let mut s = CredStore::open(&path, &dir.path().join("store.lock")).unwrap();
        s.set("A", "changed").unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "# header\nA=changed\n\nB=2\n");
    }

    #[test]
    fn test_unset_absent_is_noop() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("credentials.conf");
        fs::write(&path, "A=1\nB=2\n").unwrap();
        let mut s = CredStore::open(&path, &dir.path().join("store.lock")).unwrap();
        s.unset("MISSING").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "A=1\nB=2\n");
    }

    #[test]
    fn test_unset_removes_exactly_one_line() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("credentials.conf");
        fs::write(&path, "# keep\nA=1\nB=2\nC=3\n").unwrap();
        let mut s = CredStore::open(&path, &dir.path().join("store.lock")).unwrap();
        s.unset("B").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "# keep\nA=1\nC=3\n");
    }

    #[test]
    #[cfg(unix)]
    fn test_created_with_owner_only_mode() {
        let dir = TempDir::new().unwrap();
        let mut s = store(&dir);
        s.set("SECRET", "v").unwrap();
        let mode = fs::metadata(s.path()).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
    }

    #[test]
    fn test_value_with_equals_roundtrips() {
        let dir = TempDir::new().unwrap();
        let mut s = store(&dir);
        s.set("TOKEN", "a=b=c").unwrap();
        let reloaded =
            CredStore::open(s.path(), &dir.path().join("store.lock")).unwrap();
        assert_eq!(reloaded.get("TOKEN"), Some("a=b=c"));
    }

    #[test]
    fn test_value_with_newline_rejected() {
        let dir = TempDir::new().unwrap();
        let mut s = store(&dir);
        assert!(s.set("K", "a\nb").is_err());
        assert!(s.get("K").is_none());
    }

    #[test]
    fn test_invalid_key_rejected() {
        let dir = TempDir::new().unwrap();
        let mut s = store(&dir);
        assert!(s.set("1BAD", "v").is_err());
        assert!(s.set("has space", "v").is_err());
        assert!(s.set("has-dash", "v").is_err());
    }

    #[test]
    fn test_parser_never_executes_content() {
        // Shell metacharacters stay literal data under the strict parser.
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("credentials.conf");
        fs::write(&path, "CMD=$(touch /tmp/pwned); `id`\n").unwrap();
        let s = CredStore::open(&path, &dir.path().join("store.lock")).unwrap();
        assert_eq!(s.get("CMD"), Some("$(touch /tmp/pwned); `id`"));
    }

    #[test]
    fn test_malformed_lines_preserved_not_interpreted() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("credentials.conf");
        fs::write(&path, "not a pair\nA = spaced key\nB=2\n").unwrap();
        let mut s = CredStore::open(&path, &dir.path().join("store.lock")).unwrap();
        assert!(s.get("A").is_none());
        s.set("B", "3").unwrap();
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "not a pair\nA = spaced key\nB=3\n"
        );
    }

    #[test]
    fn test_set_collapses_preexisting_duplicates() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("credentials.conf");
        fs::write(&path, "A=1\nB=2\nA=9\n").unwrap();
        let mut s = CredStore::open(&path, &dir.path().join("store.lock")).unwrap();
        s.set("A", "3").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "A=3\nB=2\n");
        assert_eq!(s.get("A"), Some("3"));
    }

    #[test]
    fn test_is_enabled() {
        let dir = TempDir::new().unwrap();
        let mut s = store(&dir);
        assert!(!s.is_enabled("AUTO_RENEW"));
        s.set("AUTO_RENEW", "true").unwrap();
        assert!(s.is_enabled("AUTO_RENEW"));
        s.set("AUTO_RENEW", "false").unwrap();
        assert!(!s.is_enabled("AUTO_RENEW"));
    }
}
