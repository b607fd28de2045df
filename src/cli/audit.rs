use crate::cli::CliContext;
use crate::core::audit_log;
use anyhow::Result;
use chrono::{DateTime, Local};
use clap::{Args, Subcommand};
use comfy_table::{presets::UTF8_FULL, Attribute, Cell, Table};

#[derive(Subcommand, Debug)]
pub enum AuditCommand {
    /// Show recent audit entries
    Show(ShowArgs),
    /// Verify the audit hash chain
    Verify,
}

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Show only the newest N entries
    #[arg(long, value_name = "N")]
    pub limit: Option<usize>,
}

pub fn run(ctx: &CliContext, cmd: AuditCommand) -> Result<()> {
    match cmd {
        AuditCommand::Show(args) => run_show(ctx, args),
        AuditCommand::Verify => run_verify(ctx),
    }
}

fn run_show(ctx: &CliContext, args: ShowArgs) -> Result<()> {
    let entries = audit_log::read_log(&ctx.paths, args.limit)?;
    if entries.is_empty() {
        println!("No audit entries.");
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec![
        Cell::new("Time").add_attribute(Attribute::Bold),
        Cell::new("Action").add_attribute(Attribute::Bold),
        Cell::new("Subject").add_attribute(Attribute::Bold),
        Cell::new("Actor").add_attribute(Attribute::Bold),
        Cell::new("Result").add_attribute(Attribute::Bold),
    ]);
    for entry in entries {
        let local: DateTime<Local> = entry.timestamp.into();
        table.add_row(vec![
            local.format("%Y-%m-%d %H:%M:%S").to_string(),
            entry.action,
            entry.subject,
            entry.actor,
            if entry.success { "ok" } else { "failed" }.to_string(),
        ]);
    }
    println!("{}", table);
    Ok(())
}

fn run_verify(ctx: &CliContext) -> Result<()> {
    let (total, errors) = audit_log::verify_chain(&ctx.paths)?;
    if errors.is_empty() {
        println!("Audit chain intact ({} entries).", total);
        return Ok(());
    }
    for error in &errors {
        eprintln!("  [FAIL] {}", error);
    }
    eprintln!("Audit chain: {} entries, {} errors", total, errors.len());
    std::process::exit(1);
}
