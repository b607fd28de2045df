use crate::cli::CliContext;
use crate::constants;
use crate::core::client::CertClient;
use crate::core::cred_store::CredStore;
use crate::core::file_lock::FileLock;
use crate::core::renewal::{self, JobState};
use crate::util::cron;
use anyhow::Result;
use clap::Subcommand;

#[derive(Subcommand, Debug)]
pub enum RenewCommand {
    /// Turn automatic renewal on and reconcile the schedule entry
    Enable,
    /// Turn automatic renewal off (the schedule entry stays installed)
    Disable,
    /// Show the flag, wrapper, and schedule state
    Status,
    /// Run the client's renewal sweep immediately
    Now,
}

pub fn run(ctx: &CliContext, cmd: RenewCommand) -> Result<()> {
    match cmd {
        RenewCommand::Enable => toggle(ctx, true),
        RenewCommand::Disable => toggle(ctx, false),
        RenewCommand::Status => run_status(ctx),
        RenewCommand::Now => run_now(ctx),
    }
}

/// Flip the persisted flag, regenerate the wrapper, reconcile the job.
/// The job itself is never removed; the flag only changes what the wrapper
/// does the next time it fires.
fn toggle(ctx: &CliContext, enable: bool) -> Result<()> {
    let paths = &ctx.paths;
    let mut store = CredStore::load(paths)?;
    store.set(constants::AUTO_RENEW_KEY, if enable { "true" } else { "false" })?;
    renewal::ensure_wrapper(paths)?;
    let state = renewal::ensure_scheduled_job(paths)?;
    report_job_state(&state);
    ctx.audit(
        if enable { "renew-enable" } else { "renew-disable" },
        constants::AUTO_RENEW_KEY,
        true,
    );

    if enable {
        println!("Automatic renewal enabled.");
    } else {
        println!("Automatic renewal disabled; the schedule entry stays and will do nothing.");
    }
    Ok(())
}

fn report_job_state(state: &JobState) {
    if !state.cron_available {
        eprintln!("warning: no crontab facility; renewal will not run automatically");
        return;
    }
    if state.installed {
        println!(
            "Installed schedule entry ({} {})",
            constants::CRON_SCHEDULE,
            constants::CRON_MARKER
        );
    } else if state.present {
        println!("Schedule entry already present; left untouched.");
    }
    for entry in &state.native_entries {
        eprintln!(
            "warning: independent renewal entry found; {} does not affect it:",
            constants::AUTO_RENEW_KEY
        );
        eprintln!("  {}", entry);
    }
}

fn run_status(ctx: &CliContext) -> Result<()> {
    let paths = &ctx.paths;
    let store = CredStore::load(paths)?;
    let flag = store.is_enabled(constants::AUTO_RENEW_KEY);
    println!("AUTO_RENEW: {}", if flag { "on" } else { "off" });
    println!(
        "wrapper script: {}",
        if paths.wrapper.is_file() { "present" } else { "missing" }
    );

    if !cron::available() {
        println!("schedule: no crontab facility");
        return Ok(());
    }
    let table = cron::read_table()?;
    let plan = renewal::reconcile(&table, &paths.wrapper);
    println!(
        "schedule entry: {}",
        if plan.already_present { "present" } else { "missing" }
    );
    for entry in &plan.native_entries {
        println!("independent renewal entry (not gated by AUTO_RENEW):");
        println!("  {}", entry);
    }
    Ok(())
}

fn run_now(ctx: &CliContext) -> Result<()> {
    // one sweep at a time; an unattended cron firing may already hold this
    let _guard = match FileLock::try_exclusive(&ctx.paths.store_lock)? {
        Some(lock) => lock,
        None => {
            eprintln!("warning: another renewal is already running; skipping");
            return Ok(());
        }
    };
    let result = ctx.client().renew_all();
    ctx.audit("renew-now", "all", result.is_ok());
    result?;
    println!("Renewal sweep finished.");
    Ok(())
}
