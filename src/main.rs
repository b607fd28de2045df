use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = acmewrap::cli::Cli::parse();
    cli.run()
}
