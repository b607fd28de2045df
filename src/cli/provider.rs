use crate::cli::CliContext;
use crate::core::cred_manager::{self, RemovalOutcome};
use crate::core::cred_store::CredStore;
use crate::core::registry::{self, ProviderDescriptor};
use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};
use comfy_table::{presets::UTF8_FULL, Attribute, Cell, Table};
use dialoguer::{Confirm, Input, Password};
use serde::Serialize;
use zeroize::Zeroizing;

#[derive(Subcommand, Debug)]
pub enum ProviderCommand {
    /// Store or update credentials for a DNS provider
    Add(AddArgs),
    /// Delete a provider's credentials after a dependency check
    Delete(DeleteArgs),
    /// List supported providers and their configuration state
    List(ListArgs),
}

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Provider id (see `provider list`)
    pub provider: String,

    /// Auth mode for providers that offer more than one
    #[arg(long, value_name = "MODE")]
    pub auth_mode: Option<String>,

    /// Credential value (repeatable); required in non-interactive mode
    #[arg(long, value_name = "KEY=VALUE")]
    pub value: Vec<String>,
}

#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Provider id
    pub provider: String,

    /// Confirmation token (the provider id); required in non-interactive mode
    #[arg(long, value_name = "TOKEN")]
    pub confirm: Option<String>,

    /// Also remove dependent certificates through the client
    #[arg(long)]
    pub remove_certs: bool,

    /// Revoke dependent certificates before removing them
    #[arg(long)]
    pub revoke: bool,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Output format: table|json
    #[arg(long, default_value = "table")]
    pub format: String,
}

pub fn run(ctx: &CliContext, cmd: ProviderCommand) -> Result<()> {
    match cmd {
        ProviderCommand::Add(args) => run_add(ctx, args),
        ProviderCommand::Delete(args) => run_delete(ctx, args),
        ProviderCommand::List(args) => run_list(ctx, args),
    }
}

fn run_add(ctx: &CliContext, args: AddArgs) -> Result<()> {
    let desc = registry::lookup(&args.provider)?;
    let mode_name = resolve_mode(ctx, desc, args.auth_mode.as_deref())?;
    let mode = desc
        .mode(&mode_name)
        .with_context(|| format!("provider '{}' has no auth mode '{}'", desc.id(), mode_name))?;

    let mut given = parse_values(&args.value)?;
    if !ctx.non_interactive {
        // prompt only for keys not already supplied via --value
        for &key in mode.keys {
            if given.iter().any(|(k, _)| k == key) {
                continue;
            }
            let secret = Zeroizing::new(
                Password::new()
                    .with_prompt(format!("{} for {}", key, desc.label))
                    .allow_empty_password(false)
                    .interact()
                    .context("read credential from prompt")?,
            );
            given.push((key.to_string(), secret));
        }
    }

    let mut store = CredStore::load(&ctx.paths)?;
    let values: Vec<(&str, &str)> = given
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();
    cred_manager::store_credentials(&mut store, desc, &mode_name, &values)?;
    ctx.audit("provider-add", desc.id(), true);

    println!("Stored credentials for {} ({} mode)", desc.id(), mode_name);
    Ok(())
}

fn run_delete(ctx: &CliContext, args: DeleteArgs) -> Result<()> {
    let desc = registry::lookup(&args.provider)?;
    let dependents = cred_manager::dependent_certificates(&ctx.paths, desc)?;

    if dependents.is_empty() {
        println!("No certificates currently depend on {}.", desc.id());
    } else {
        println!(
            "{} certificate(s) depend on {} for renewal:",
            dependents.len(),
            desc.id()
        );
        for identity in &dependents {
            println!("  - {}", identity);
        }
    }

    if !confirm_token(ctx, desc.id(), args.confirm.as_deref(), "credential deletion")? {
        println!("Aborted; nothing changed.");
        return Ok(());
    }

    if !dependents.is_empty() {
        let remove = if args.remove_certs {
            true
        } else if ctx.non_interactive {
            false
        } else {
            Confirm::new()
                .with_prompt(format!(
                    "Remove the {} dependent certificate(s) through the client as well?",
                    dependents.len()
                ))
                .default(false)
                .interact()
                .context("read confirmation")?
        };

        if remove {
            let RemovalOutcome { removed, failed } =
                cred_manager::remove_certificates(&ctx.client(), &dependents, args.revoke);
            for identity in &removed {
                println!("  removed {}", identity);
                ctx.audit("cert-remove", identity, true);
            }
            for (identity, err) in &failed {
                eprintln!("  warning: could not remove {}: {}", identity, err);
                ctx.audit("cert-remove", identity, false);
            }
        } else {
            eprintln!(
                "warning: keeping the certificates; their renewal will fail once the credentials are gone"
            );
        }
    }

    let mut store = CredStore::load(&ctx.paths)?;
    cred_manager::delete_credentials(&mut store, desc)?;
    ctx.audit("provider-delete", desc.id(), true);
    println!("Deleted credentials for {}", desc.id());
    Ok(())
}

#[derive(Serialize)]
struct ProviderItem {
    id: &'static str,
    label: &'static str,
    backend: &'static str,
    modes: Vec<&'static str>,
    keys: Vec<&'static str>,
    configured: bool,
    certificates_in_use: usize,
}

fn run_list(ctx: &CliContext, args: ListArgs) -> Result<()> {
    if args.format != "table" && args.format != "json" {
        bail!("invalid format: {} (use table|json)", args.format);
    }

    let store = CredStore::load(&ctx.paths)?;
    let mut items = Vec::new();
    for desc in registry::all() {
        let in_use = cred_manager::dependent_certificates(&ctx.paths, desc)
            .map(|deps| deps.len())
            .unwrap_or(0);
        items.push(ProviderItem {
            id: desc.id(),
            label: desc.label,
            backend: desc.backend,
            modes: desc.modes.iter().map(|m| m.name).collect(),
            keys: desc.all_keys(),
            configured: cred_manager::active_mode(&store, desc).is_ok(),
            certificates_in_use: in_use,
        });
    }

    if args.format == "json" {
        println!("{}", serde_json::to_string_pretty(&items).context("serialize list")?);
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec![
        Cell::new("Id").add_attribute(Attribute::Bold),
        Cell::new("Provider").add_attribute(Attribute::Bold),
        Cell::new("Backend").add_attribute(Attribute::Bold),
        Cell::new("Keys").add_attribute(Attribute::Bold),
        Cell::new("Configured").add_attribute(Attribute::Bold),
        Cell::new("In use").add_attribute(Attribute::Bold),
    ]);
    for item in items {
        table.add_row(vec![
            item.id.to_string(),
            item.label.to_string(),
            item.backend.to_string(),
            item.keys.join(","),
            if item.configured { "yes" } else { "-" }.to_string(),
            item.certificates_in_use.to_string(),
        ]);
    }
    println!("{}", table);
    Ok(())
}

/// Pick an auth mode: explicit flag, sole mode, or prompt.
fn resolve_mode(
    ctx: &CliContext,
    desc: &ProviderDescriptor,
    explicit: Option<&str>,
) -> Result<String> {
    if let Some(mode) = explicit {
        return Ok(mode.to_string());
    }
    if desc.modes.len() == 1 {
        return Ok(desc.modes[0].name.to_string());
    }
    if ctx.non_interactive {
        bail!(
            "--non-interactive requires --auth-mode for '{}' (modes: {})",
            desc.id(),
            desc.modes.iter().map(|m| m.name).collect::<Vec<_>>().join(", ")
        );
    }
    let names: Vec<&str> = desc.modes.iter().map(|m| m.name).collect();
    let chosen: String = Input::new()
        .with_prompt(format!("Auth mode ({})", names.join("|")))
        .default(names[0].to_string())
        .validate_with(|input: &String| -> Result<(), String> {
            if names.contains(&input.as_str()) {
                Ok(())
            } else {
                Err(format!("must be one of: {}", names.join(", ")))
            }
        })
        .interact_text()
        .context("read auth mode")?;
    Ok(chosen)
}

/// Destructive operations need a typed token, not a yes/no. The token is
/// the subject itself so the operator re-states what is being destroyed.
pub fn confirm_token(
    ctx: &CliContext,
    token: &str,
    flag_value: Option<&str>,
    what: &str,
) -> Result<bool> {
    if let Some(value) = flag_value {
        return Ok(value == token);
    }
    if ctx.non_interactive {
        bail!("--non-interactive requires --confirm {} for {}", token, what);
    }
    let typed: String = Input::new()
        .with_prompt(format!("Type '{}' to confirm {}", token, what))
        .allow_empty(true)
        .interact_text()
        .context("read confirmation token")?;
    Ok(typed == token)
}

fn parse_values(pairs: &[String]) -> Result<Vec<(String, Zeroizing<String>)>> {
    let mut values = Vec::new();
    for pair in pairs {
        let (key, value) = pair
            .split_once('=')
            .with_context(|| format!("invalid --value '{}' (expected KEY=VALUE)", pair))?;
        values.push((key.to_string(), Zeroizing::new(value.to_string())));
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_values() {
        let parsed = parse_values(&["CF_Token=abc".to_string()]).unwrap();
        assert_eq!(parsed[0].0, "CF_Token");
        assert_eq!(parsed[0].1.as_str(), "abc");
    }

    #[test]
    fn test_parse_values_keeps_equals_in_value() {
        let parsed = parse_values(&["K=a=b".to_string()]).unwrap();
        assert_eq!(parsed[0].1.as_str(), "a=b");
    }

    #[test]
    fn test_parse_values_rejects_bare_key() {
        assert!(parse_values(&["CF_Token".to_string()]).is_err());
    }
}
