//! Diagnostics for the installation and renewal readiness.

use crate::cli::CliContext;
use crate::constants;
use crate::core::cred_store::CredStore;
use crate::core::renewal;
use crate::util::{cron, fs as tool_fs};
use anyhow::Result;
use clap::Args;

#[derive(Args, Debug)]
pub struct DoctorArgs {
    /// Also verify the audit hash chain
    #[arg(long)]
    pub audit: bool,
}

pub fn run(ctx: &CliContext, args: DoctorArgs) -> Result<()> {
    let paths = &ctx.paths;
    let mut ok = 0u32;
    let mut warn = 0u32;
    let mut fail = 0u32;

    println!("Doctor: {}", paths);

    if paths.root.is_dir() {
        println!("  [PASS] root exists: {}", paths.root.display());
        ok += 1;
    } else {
        println!("  [FAIL] root missing: {} (run: acmewrap init)", paths.root.display());
        fail += 1;
    }

    if paths.store.is_file() {
        println!("  [PASS] credential store exists: {}", paths.store.display());
        ok += 1;
        #[cfg(unix)]
        match tool_fs::mode_of(&paths.store) {
            Some(mode) if mode == constants::STORE_FILE_MODE => {
                println!("  [PASS] store mode ok: {:04o}", mode);
                ok += 1;
            }
            Some(mode) => {
                println!(
                    "  [FAIL] store mode {:04o} (expected {:04o}); it holds secrets",
                    mode,
                    constants::STORE_FILE_MODE
                );
                fail += 1;
            }
            None => {
                println!("  [WARN] cannot stat store");
                warn += 1;
            }
        }
    } else {
        println!("  [WARN] credential store missing (run: acmewrap init)");
        warn += 1;
    }

    let client = ctx.client();
    if client.installed() {
        println!("  [PASS] certificate client: {}", client.bin().display());
        ok += 1;
    } else {
        println!(
            "  [FAIL] certificate client missing: {} (issuance unavailable)",
            client.bin().display()
        );
        fail += 1;
    }

    if !cron::available() {
        println!("  [WARN] no crontab facility; renewal must be run manually");
        warn += 1;
    } else {
        println!("  [PASS] crontab available");
        ok += 1;
        let table = cron::read_table()?;
        let plan = renewal::reconcile(&table, &paths.wrapper);
        if plan.already_present {
            println!("  [PASS] renewal schedule entry present");
            ok += 1;
        } else {
            println!("  [WARN] renewal schedule entry missing (run: acmewrap renew enable)");
            warn += 1;
        }
        for entry in &plan.native_entries {
            println!("  [WARN] independent renewal entry (not gated by AUTO_RENEW):");
            println!("         {}", entry);
            warn += 1;
        }
    }

    if paths.wrapper.is_file() {
        println!("  [PASS] wrapper script present");
        ok += 1;
    } else {
        println!("  [WARN] wrapper script missing (run: acmewrap renew enable)");
        warn += 1;
    }

    let store = CredStore::load(paths)?;
    println!("  [INFO] stored credential keys: {}", store.keys().len());
    println!(
        "  [INFO] AUTO_RENEW: {}",
        if store.is_enabled(constants::AUTO_RENEW_KEY) { "on" } else { "off" }
    );

    if args.audit {
        let (total, errors) = crate::core::audit_log::verify_chain(paths)?;
        if errors.is_empty() {
            println!("  [PASS] audit chain intact ({} entries)", total);
            ok += 1;
        } else {
            println!("  [FAIL] audit chain has {} error(s)", errors.len());
            fail += 1;
        }
    }

    println!();
    println!("Doctor summary: {} pass, {} warn, {} fail", ok, warn, fail);
    if fail > 0 {
        std::process::exit(1);
    }
    Ok(())
}
