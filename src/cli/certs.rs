use crate::cli::CliContext;
use crate::core::client::CertClient;
use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};
use dialoguer::Confirm;

#[derive(Subcommand, Debug)]
pub enum CertsCommand {
    /// List certificates managed by the client
    List,
    /// Remove (and optionally revoke) a managed certificate
    Remove(RemoveArgs),
}

#[derive(Args, Debug)]
pub struct RemoveArgs {
    /// Domain or IP the certificate was issued for
    pub identity: String,

    /// Revoke before removing
    #[arg(long)]
    pub revoke: bool,

    /// Skip the confirmation prompt
    #[arg(long)]
    pub yes: bool,
}

pub fn run(ctx: &CliContext, cmd: CertsCommand) -> Result<()> {
    match cmd {
        CertsCommand::List => run_list(ctx),
        CertsCommand::Remove(args) => run_remove(ctx, args),
    }
}

fn run_list(ctx: &CliContext) -> Result<()> {
    let listing = ctx.client().list_managed()?;
    if listing.trim().is_empty() {
        println!("No certificates managed by the client.");
    } else {
        print!("{}", listing);
    }
    Ok(())
}

fn run_remove(ctx: &CliContext, args: RemoveArgs) -> Result<()> {
    let confirmed = if args.yes {
        true
    } else if ctx.non_interactive {
        bail!("--non-interactive requires --yes for certs remove");
    } else {
        Confirm::new()
            .with_prompt(format!(
                "{} the certificate for {} through the client?",
                if args.revoke { "Revoke and remove" } else { "Remove" },
                args.identity
            ))
            .default(false)
            .interact()
            .context("read confirmation")?
    };
    if !confirmed {
        println!("Aborted; nothing changed.");
        return Ok(());
    }

    let client = ctx.client();
    if args.revoke {
        // revocation failure is a warning; removal still proceeds
        if let Err(e) = client.revoke(&args.identity) {
            eprintln!("warning: revoke failed for {}: {}", args.identity, e);
        }
    }
    let result = client.remove(&args.identity);
    ctx.audit("cert-remove", &args.identity, result.is_ok());
    result?;
    println!("Removed {}", args.identity);
    Ok(())
}
