//! CLI routing and command dispatch.

use crate::core::audit_log;
use crate::core::paths::ToolPaths;
use crate::util::acme_sh::AcmeSh;
use crate::util::privilege;
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod audit;
pub mod certs;
pub mod doctor;
pub mod init;
pub mod issue;
pub mod provider;
pub mod renew;
pub mod uninstall;

/// Shared context passed to all command handlers.
pub struct CliContext {
    pub paths: ToolPaths,
    pub non_interactive: bool,
}

impl CliContext {
    /// Append an audit line; failures are visible but never abort the
    /// operation being audited.
    pub fn audit(&self, action: &str, subject: &str, success: bool) {
        if let Err(e) = audit_log::log(&self.paths, action, subject, success) {
            eprintln!("warning: audit log failed: {}", e);
        }
    }

    pub fn client(&self) -> AcmeSh {
        AcmeSh::new(&self.paths)
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "acmewrap",
    version,
    about = "ACME certificate client wrapper for issuing and renewing TLS certificates"
)]
pub struct Cli {
    /// Tool root directory (store, wrapper, installed certificates)
    #[arg(long, global = true, value_name = "PATH")]
    pub root: Option<PathBuf>,

    /// Home directory of the external ACME client
    #[arg(long, global = true, value_name = "PATH")]
    pub acme_home: Option<PathBuf>,

    /// Run in non-interactive mode (no prompts, suitable for automation)
    #[arg(long, global = true, env = "ACMEWRAP_NON_INTERACTIVE")]
    pub non_interactive: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        let paths = ToolPaths::resolve(self.root, self.acme_home);
        let ctx = CliContext {
            paths,
            non_interactive: self.non_interactive,
        };

        if self.command.requires_root() {
            privilege::require_root(self.command.name())?;
        }

        match self.command {
            Commands::Init(args) => init::run(&ctx, args),
            Commands::Provider { command } => provider::run(&ctx, command),
            Commands::Issue(args) => issue::run_issue(&ctx, args),
            Commands::IssueIp(args) => issue::run_issue_ip(&ctx, args),
            Commands::Certs { command } => certs::run(&ctx, command),
            Commands::Renew { command } => renew::run(&ctx, command),
            Commands::Audit { command } => audit::run(&ctx, command),
            Commands::Doctor(args) => doctor::run(&ctx, args),
            Commands::Uninstall(args) => uninstall::run(&ctx, args),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize the tool root and credential store
    Init(init::InitArgs),
    /// Manage DNS provider credentials
    Provider {
        #[command(subcommand)]
        command: provider::ProviderCommand,
    },
    /// Issue and install a domain certificate (DNS-01)
    Issue(issue::IssueArgs),
    /// Issue and install a short-lived IP certificate (HTTP-01)
    IssueIp(issue::IssueIpArgs),
    /// Inspect or remove certificates managed by the client
    Certs {
        #[command(subcommand)]
        command: certs::CertsCommand,
    },
    /// Control the automatic renewal job
    Renew {
        #[command(subcommand)]
        command: renew::RenewCommand,
    },
    /// View the audit trail
    Audit {
        #[command(subcommand)]
        command: audit::AuditCommand,
    },
    /// Diagnose installation and configuration (safe, read-only)
    Doctor(doctor::DoctorArgs),
    /// Remove the wrapper, schedule entry, and credential store
    Uninstall(uninstall::UninstallArgs),
}

impl Commands {
    /// Whether this command requires root privileges.
    pub fn requires_root(&self) -> bool {
        matches!(
            self,
            Commands::Init(_)
                | Commands::Provider {
                    command: provider::ProviderCommand::Add(_) | provider::ProviderCommand::Delete(_)
                }
                | Commands::Issue(_)
                | Commands::IssueIp(_)
                | Commands::Certs {
                    command: certs::CertsCommand::Remove(_)
                }
                | Commands::Renew {
                    command: renew::RenewCommand::Enable
                        | renew::RenewCommand::Disable
                        | renew::RenewCommand::Now
                }
                | Commands::Uninstall(_)
        )
    }

    /// Command name for error messages.
    pub fn name(&self) -> &str {
        match self {
            Commands::Init(_) => "init",
            Commands::Provider { .. } => "provider",
            Commands::Issue(_) => "issue",
            Commands::IssueIp(_) => "issue-ip",
            Commands::Certs { .. } => "certs",
            Commands::Renew { .. } => "renew",
            Commands::Audit { .. } => "audit",
            Commands::Doctor(_) => "doctor",
            Commands::Uninstall(_) => "uninstall",
        }
    }
}
