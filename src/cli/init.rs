use crate::cli::CliContext;
use crate::constants;
use crate::core::cred_store::CredStore;
use crate::core::renewal;
use crate::util::{cron, fs as tool_fs};
use anyhow::Result;
use clap::Args;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Account email recorded for the certificate authority
    #[arg(long)]
    pub email: Option<String>,
}

pub fn run(ctx: &CliContext, args: InitArgs) -> Result<()> {
    let paths = &ctx.paths;
    tool_fs::ensure_dir(&paths.root, 0o755)?;
    tool_fs::ensure_dir(&paths.certs, constants::CERTS_DIR_MODE)?;

    let mut store = CredStore::load(paths)?;
    store.ensure_file()?;
    if let Some(email) = args.email {
        store.set("ACCOUNT_EMAIL", &email)?;
    }
    renewal::ensure_wrapper(paths)?;

    println!("initialized at {}", paths.root.display());

    let client = ctx.client();
    if client.installed() {
        println!("certificate client: {}", client.bin().display());
    } else {
        println!(
            "certificate client: not found at {} (install acme.sh before issuing)",
            client.bin().display()
        );
    }
    if cron::available() {
        println!("scheduler: crontab available");
    } else {
        println!("scheduler: crontab not available (renewal must be run manually)");
    }
    Ok(())
}
