use crate::cli::provider::confirm_token;
use crate::cli::CliContext;
use crate::core::renewal;
use crate::util::cron;
use anyhow::{Context, Result};
use clap::Args;
use std::fs;

#[derive(Args, Debug)]
pub struct UninstallArgs {
    /// Confirmation token (`uninstall`); required in non-interactive mode
    #[arg(long, value_name = "TOKEN")]
    pub confirm: Option<String>,
}

/// Remove everything this tool installed: its schedule entry, the wrapper,
/// the credential store, and the audit log. Issued certificate material and
/// the client's own state are left in place; certificates keep working,
/// they just stop renewing automatically.
pub fn run(ctx: &CliContext, args: UninstallArgs) -> Result<()> {
    let paths = &ctx.paths;

    println!("This removes the credential store, wrapper script, and schedule entry.");
    println!("Installed certificates under {} are kept.", paths.certs.display());
    if !confirm_token(ctx, "uninstall", args.confirm.as_deref(), "uninstall")? {
        println!("Aborted; nothing changed.");
        return Ok(());
    }

    // Only lines we authored are stripped; third-party entries stay.
    if cron::available() {
        let table = cron::read_table()?;
        if let Some(stripped) = renewal::strip_wrapper_entries(&table, &paths.wrapper) {
            cron::write_table(&stripped)?;
            println!("Removed the renewal schedule entry.");
        }
    }

    for path in [&paths.wrapper, &paths.store, &paths.store_lock, &paths.audit_log, &paths.audit_lock] {
        if path.exists() {
            fs::remove_file(path).with_context(|| format!("remove {}", path.display()))?;
            println!("Removed {}", path.display());
        }
    }

    println!("Uninstalled. Certificates under {} were kept.", paths.certs.display());
    Ok(())
}
