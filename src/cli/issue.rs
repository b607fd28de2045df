use crate::cli::CliContext;
use crate::constants;
use crate::core::cred_store::CredStore;
use crate::core::issuance;
use crate::core::registry;
use anyhow::{bail, Result};
use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct IssueArgs {
    /// Domain to include (repeatable; first becomes the identity)
    #[arg(short = 'd', long = "domain", value_name = "DOMAIN", required = true)]
    pub domains: Vec<String>,

    /// DNS provider id used for the challenge
    #[arg(long, value_name = "PROVIDER")]
    pub provider: String,

    /// Key length requested from the client
    #[arg(long, default_value = constants::DEFAULT_KEY_LENGTH)]
    pub key_length: String,

    /// Command the client runs after installed files change
    #[arg(long, value_name = "CMD")]
    pub reload_cmd: Option<String>,
}

#[derive(Args, Debug)]
pub struct IssueIpArgs {
    /// Public IP address to certify
    pub ip: String,

    /// Webroot directory served on port 80 for the HTTP-01 challenge
    #[arg(long, default_value = constants::DEFAULT_WEBROOT)]
    pub webroot: PathBuf,

    /// Key length requested from the client
    #[arg(long, default_value = constants::DEFAULT_KEY_LENGTH)]
    pub key_length: String,

    /// Command the client runs after installed files change
    #[arg(long, value_name = "CMD")]
    pub reload_cmd: Option<String>,
}

pub fn run_issue(ctx: &CliContext, args: IssueArgs) -> Result<()> {
    let client = ctx.client();
    if !client.installed() {
        bail!(
            "certificate client not found at {}; issuance needs it installed",
            client.bin().display()
        );
    }
    let desc = registry::lookup(&args.provider)?;
    let store = CredStore::load(&ctx.paths)?;

    let identity = args.domains[0].clone();
    let result = issuance::issue_domain(
        &store,
        &ctx.paths,
        &client,
        desc,
        &args.domains,
        &args.key_length,
        args.reload_cmd,
    );
    ctx.audit("issue", &identity, result.is_ok());
    let targets = result?;

    println!("Issued and installed {}:", identity);
    println!("  key:       {}", targets.key.display());
    println!("  cert:      {}", targets.cert.display());
    println!("  ca:        {}", targets.ca.display());
    println!("  fullchain: {}", targets.fullchain.display());
    Ok(())
}

pub fn run_issue_ip(ctx: &CliContext, args: IssueIpArgs) -> Result<()> {
    let client = ctx.client();
    if !client.installed() {
        bail!(
            "certificate client not found at {}; issuance needs it installed",
            client.bin().display()
        );
    }
    if !args.webroot.is_dir() {
        bail!(
            "webroot {} does not exist; the HTTP-01 challenge needs a served directory",
            args.webroot.display()
        );
    }

    let result = issuance::issue_ip(
        &ctx.paths,
        &client,
        &args.ip,
        &args.webroot,
        &args.key_length,
        args.reload_cmd,
    );
    ctx.audit("issue-ip", &args.ip, result.is_ok());
    let targets = result?;

    println!("Issued and installed short-lived certificate for {}:", args.ip);
    println!("  key:       {}", targets.key.display());
    println!("  cert:      {}", targets.cert.display());
    println!("  ca:        {}", targets.ca.display());
    println!("  fullchain: {}", targets.fullchain.display());
    println!("note: IP certificates are short-lived; keep the renewal job enabled");
    Ok(())
}
