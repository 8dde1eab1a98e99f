use anyhow::Result;
use clap::{Parser, Subcommand};
use std::process::Command;

#[derive(Parser)]
#[command(author, version, about = "Project automation commands", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run cargo nextest for the quickpick crate
    Nextest {
        #[arg(long)]
        profile: Option<String>,
        /// Also run the doc tests, which nextest skips
        #[arg(long)]
        doc: bool,
    },
    /// Check formatting and run clippy with warnings denied
    Lint,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Nextest { profile, doc } => run_nextest(profile, doc)?,
        Commands::Lint => run_lint()?,
    }
    Ok(())
}

fn run_nextest(profile: Option<String>, doc: bool) -> Result<()> {
    let mut cmd = cargo(&["nextest", "run", "-p", "quickpick"]);
    if let Some(profile) = profile {
        cmd.arg("--profile").arg(profile);
    }
    run(cmd, "cargo nextest run")?;

    if doc {
        run(cargo(&["test", "--doc", "-p", "quickpick"]), "cargo test --doc")?;
    }
    Ok(())
}

fn run_lint() -> Result<()> {
    run(cargo(&["fmt", "--all", "--", "--check"]), "cargo fmt")?;
    run(
        cargo(&["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"]),
        "cargo clippy",
    )
}

fn cargo(args: &[&str]) -> Command {
    let mut cmd = Command::new("cargo");
    cmd.args(args);
    cmd
}

fn run(mut cmd: Command, label: &str) -> Result<()> {
    let status = cmd.status()?;
    if !status.success() {
        anyhow::bail!("{label} failed");
    }
    Ok(())
}
