//! Renewal wrapper script and gentle crontab reconciliation.
//!
//! The only thing ever registered with the scheduler is a small generated
//! wrapper that checks the persisted `AUTO_RENEW` flag and, when on, execs
//! the client's own renewal sweep. Reconciliation never rewrites or removes
//! schedule entries this tool did not author: a native client entry is left
//! exactly as found and only warned about, since rewriting a user's schedule
//! can silently break renewal they already depend on.

use crate::constants;
use crate::core::paths::ToolPaths;
use crate::util::{cron, fs as tool_fs};
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Result of reconciling one crontab against the wrapper entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CronPlan {
    /// Replacement table when an entry must be appended; `None` = no change.
    pub table: Option<String>,
    /// Whether the wrapper entry already existed before reconciliation.
    pub already_present: bool,
    /// Schedule lines that invoke the client's native sweep directly.
    /// `AUTO_RENEW` does not gate these; they are reported, never touched.
    pub native_entries: Vec<String>,
}

/// Observed scheduler state after an ensure pass.
#[derive(Debug, Clone)]
pub struct JobState {
    pub cron_available: bool,
    /// Wrapper entry present once the pass finished.
    pub present: bool,
    /// Whether this pass appended the entry.
    pub installed: bool,
    pub native_entries: Vec<String>,
}

/// Shell text of the renewal wrapper. Reads the flag with a line filter;
/// the store is data, not shell, and is never sourced.
pub fn wrapper_script(paths: &ToolPaths) -> String {
    format!(
        "#!/bin/sh\n\
         # Generated by acmewrap; regenerated on every toggle.\n\
         flag=$(grep '^{flag}=' '{store}' 2>/dev/null | tail -n 1 | cut -d= -f2-)\n\
         case \"$flag\" in\n\
         true|1|yes) ;;\n\
         *) exit 0 ;;\n\
         esac\n\
         exec '{bin}' --cron --home '{home}'\n",
        flag = constants::AUTO_RENEW_KEY,
        store = paths.store.display(),
        bin = paths.acme_bin().display(),
        home = paths.acme_home.display(),
    )
}

/// (Re)write the wrapper script, 0755. Idempotent.
pub fn ensure_wrapper(paths: &ToolPaths) -> Result<()> {
    if let Some(parent) = paths.wrapper.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create dir {}", parent.display()))?;
    }
    fs::write(&paths.wrapper, wrapper_script(paths))
        .with_context(|| format!("write wrapper {}", paths.wrapper.display()))?;
    tool_fs::set_permissions(&paths.wrapper, constants::WRAPPER_MODE)?;
    Ok(())
}

/// The crontab line this tool installs.
pub fn wrapper_entry(wrapper: &Path) -> String {
    format!(
        "{} {} {}",
        constants::CRON_SCHEDULE,
        wrapper.display(),
        constants::CRON_MARKER
    )
}

/// Pure reconciliation over crontab text.
///
/// Appends the wrapper entry when absent; otherwise leaves the table alone.
/// Calling it on its own output is a fixed point.
pub fn reconcile(table: &str, wrapper: &Path) -> CronPlan {
    let wrapper_str = wrapper.display().to_string();
    let mut already_present = false;
    let mut native_entries = Vec::new();

    for line in table.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        if trimmed.contains(&wrapper_str) {
            already_present = true;
        } else if trimmed.contains(constants::ACME_BIN_NAME) && trimmed.contains("--cron") {
            native_entries.push(trimmed.to_string());
        }
    }

    let table_out = if already_present {
        None
    } else {
        let mut out = table.to_string();
        if !out.is_empty() && !out.ends_with('\n') {
            out.push('\n');
        }
        out.push_str(&wrapper_entry(wrapper));
        out.push('\n');
        Some(out)
    };

    CronPlan {
        table: table_out,
        already_present,
        native_entries,
    }
}

/// Drop only the lines this tool authored (marker or wrapper path).
/// Returns `None` when nothing ours is present.
pub fn strip_wrapper_entries(table: &str, wrapper: &Path) -> Option<String> {
    let wrapper_str = wrapper.display().to_string();
    let mut out = String::new();
    let mut stripped = false;
    for line in table.lines() {
        if line.contains(&wrapper_str) || line.contains(constants::CRON_MARKER) {
            stripped = true;
            continue;
        }
        out.push_str(line);
        out.push('\n');
    }
    stripped.then_some(out)
}

/// Make sure the wrapper entry is scheduled, without disturbing anything
/// else. A missing scheduling facility degrades to a warning upstream.
pub fn ensure_scheduled_job(paths: &ToolPaths) -> Result<JobState> {
    if !cron::available() {
        return Ok(JobState {
            cron_available: false,
            present: false,
            installed: false,
            native_entries: Vec::new(),
        });
    }
    let table = cron::read_table()?;
    let plan = reconcile(&table, &paths.wrapper);
    let installed = plan.table.is_some();
    if let Some(new_table) = &plan.table {
        cron::write_table(new_table)?;
    }
    Ok(JobState {
        cron_available: true,
        present: true,
        installed,
        native_entries: plan.native_entries,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn paths() -> ToolPaths {
        ToolPaths::from_parts(PathBuf::from("/etc/acmewrap"), PathBuf::from("/root/.acme.sh"))
    }

    #[test]
    fn test_wrapper_script_gates_on_flag() {
        let script = wrapper_script(&paths());
        assert!(script.starts_with("#!/bin/sh\n"));
        assert!(script.contains("grep '^AUTO_RENEW=' '/etc/acmewrap/credentials.conf'"));
        assert!(script.contains("*) exit 0 ;;"));
        assert!(script.contains("exec '/root/.acme.sh/acme.sh' --cron --home '/root/.acme.sh'"));
        // the flag is read as data, never sourced
        assert!(!script.contains(". /etc/acmewrap"));
        assert!(!script.contains("source "));
    }

    #[test]
    fn test_reconcile_appends_to_empty_table() {
        let p = paths();
        let plan = reconcile("", &p.wrapper);
        assert!(!plan.already_present);
        let table = plan.table.unwrap();
        assert_eq!(
            table,
            "7 3 * * * /etc/acmewrap/renew-wrapper.sh # acmewrap renew\n"
        );
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let p = paths();
        let first = reconcile("", &p.wrapper).table.unwrap();
        let second = reconcile(&first, &p.wrapper);
        assert!(second.already_present);
        assert!(second.table.is_none());
        assert_eq!(first.matches("renew-wrapper.sh").count(), 1);
    }

    #[test]
    fn test_reconcile_preserves_existing_lines() {
        let p = paths();
        let existing = "0 0 * * * /usr/local/bin/backup.sh\n";
        let table = reconcile(existing, &p.wrapper).table.unwrap();
        assert!(table.starts_with(existing));
        assert!(table.ends_with("# acmewrap renew\n"));
    }

    #[test]
    fn test_reconcile_handles_missing_trailing_newline() {
        let p = paths();
        let table = reconcile("0 0 * * * /bin/true", &p.wrapper).table.unwrap();
        assert!(table.contains("/bin/true\n7 3 * * *"));
    }

    #[test]
    fn test_native_entry_left_untouched_and_reported() {
        let p = paths();
        let native = "19 2 * * * \"/root/.acme.sh\"/acme.sh --cron --home \"/root/.acme.sh\"";
        let plan = reconcile(&format!("{}\n", native), &p.wrapper);
        assert_eq!(plan.native_entries, vec![native.to_string()]);
        let table = plan.table.unwrap();
        // byte-identical native line, wrapper appended alongside
        assert!(table.contains(native));
        assert!(table.contains("renew-wrapper.sh"));
    }

    #[test]
    fn test_commented_native_entry_not_reported() {
        let p = paths();
        let plan = reconcile("# 0 0 * * * acme.sh --cron\n", &p.wrapper);
        assert!(plan.native_entries.is_empty());
    }

    #[test]
    fn test_wrapper_entry_not_counted_as_native() {
        let p = paths();
        let table = reconcile("", &p.wrapper).table.unwrap();
        let plan = reconcile(&table, &p.wrapper);
        assert!(plan.native_entries.is_empty());
        assert!(plan.already_present);
    }

    #[test]
    fn test_ensure_wrapper_writes_executable_idempotently() {
        let dir = tempfile::TempDir::new().unwrap();
        let p = ToolPaths::from_parts(dir.path().to_path_buf(), dir.path().join("acme"));
        ensure_wrapper(&p).unwrap();
        ensure_wrapper(&p).unwrap();
        let content = fs::read_to_string(&p.wrapper).unwrap();
        assert_eq!(content, wrapper_script(&p));
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(&p.wrapper).unwrap().permissions().mode() & 0o777;
            assert_eq!(mode, 0o755);
        }
    }

    #[test]
    fn test_strip_wrapper_entries_only_ours() {
        let p = paths();
        let native = "19 2 * * * acme.sh --cron --home /root/.acme.sh\n";
        let table = reconcile(native, &p.wrapper).table.unwrap();
        let stripped = strip_wrapper_entries(&table, &p.wrapper).unwrap();
        assert_eq!(stripped, native);
        assert!(strip_wrapper_entries(native, &p.wrapper).is_none());
    }
}
