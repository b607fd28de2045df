//! Crontab subprocess access.
//!
//! Best-effort facility detection: an absent `crontab` binary means the
//! scheduler feature degrades with a warning rather than failing the tool.

use anyhow::{bail, Context, Result};
use std::io::Write;
use std::process::{Command, Stdio};

/// Whether a crontab facility exists at all. A nonzero exit with "no
/// crontab for user" still counts as available.
pub fn available() -> bool {
    Command::new("crontab")
        .arg("-l")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .is_ok()
}

/// Current user's crontab text; an empty table when none is installed.
pub fn read_table() -> Result<String> {
    let output = Command::new("crontab")
        .arg("-l")
        .output()
        .context("run crontab -l")?;
    if output.status.success() {
        return Ok(String::from_utf8_lossy(&output.stdout).into_owned());
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    if stderr.to_lowercase().contains("no crontab") {
        return Ok(String::new());
    }
    bail!("crontab -l failed: {}", stderr.trim());
}

/// Replace the current user's crontab with `table` via `crontab -`.
pub fn write_table(table: &str) -> Result<()> {
    let mut child = Command::new("crontab")
        .arg("-")
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .context("spawn crontab -")?;

    child
        .stdin
        .take()
        .context("open crontab stdin")?
        .write_all(table.as_bytes())
        .context("write crontab")?;

    let output = child.wait_with_output().context("wait for crontab")?;
    if !output.status.success() {
        bail!(
            "crontab install failed: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }
    Ok(())
}
