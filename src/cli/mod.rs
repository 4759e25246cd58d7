pub mod script;

use crate::config::{self, FlowDefinition};
use crate::context::FlowContext;
use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Debug, Parser)]
#[command(name = "stepgate", version, about = "Guarded approval wizards")]
pub struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List built-in flows and their steps
    List,

    /// Load and compile a flow definition
    Check {
        /// Path to a flow YAML file
        path: PathBuf,
    },

    /// Replay a scripted session against a flow
    Run {
        /// Built-in flow id or path to a flow YAML file
        flow: String,

        /// Path to the action script
        #[arg(long)]
        script: PathBuf,

        /// Secret accepted by the credential check (overrides the script)
        #[arg(long)]
        secret: Option<String>,

        /// Print the full report as JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::List => list(),
        Command::Check { path } => check(&path),
        Command::Run {
            flow,
            script,
            secret,
            json,
        } => run_script(&flow, &script, secret.as_deref(), json),
    }
}

fn list() -> Result<()> {
    for def in config::all_builtin().context("built-in flows are invalid")? {
        println!("{} - {}", def.id, def.title());
        for step in &def.steps {
            let lock = if step.locked { " (locked)" } else { "" };
            println!("  {}: {}{}", step.key, step.label, lock);
        }
    }
    Ok(())
}

fn check(path: &Path) -> Result<()> {
    let def = FlowDefinition::from_path(path)
        .with_context(|| format!("failed to load {}", path.display()))?;
    let wizard = def
        .compile(FlowContext::default())
        .with_context(|| format!("flow '{}' is invalid", def.id))?;
    def.attachment_policy()
        .with_context(|| format!("flow '{}' has an invalid attachment policy", def.id))?;
    println!("{}: ok ({} steps)", wizard.id(), wizard.len());
    Ok(())
}

fn run_script(flow: &str, script_path: &Path, secret: Option<&str>, json: bool) -> Result<()> {
    let def = resolve_flow(flow)?;
    let script = script::Script::from_path(script_path)
        .with_context(|| format!("failed to load script {}", script_path.display()))?;
    let report = script::replay(&def, &script, secret)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    for outcome in &report.outcomes {
        let status = if outcome.ok { "ok" } else { "rejected" };
        match &outcome.message {
            Some(message) => println!(
                "{status:<8} {:<24} [{} {:>3.0}%] {message}",
                outcome.action, outcome.step, outcome.progress
            ),
            None => println!(
                "{status:<8} {:<24} [{} {:>3.0}%]",
                outcome.action, outcome.step, outcome.progress
            ),
        }
    }
    match &report.submission {
        Some(submission) => println!("{}", serde_json::to_string_pretty(submission)?),
        None => println!("not submitted"),
    }
    Ok(())
}

fn resolve_flow(flow: &str) -> Result<FlowDefinition> {
    let path = Path::new(flow);
    if path.is_file() {
        return FlowDefinition::from_path(path)
            .with_context(|| format!("failed to load {}", path.display()));
    }
    Ok(config::builtin(flow)?)
}

#[cfg(test)]
mod tests {
    use super::{Cli, Command};
    use clap::Parser;

    #[test]
    fn parses_run_with_flags() {
        let cli = Cli::try_parse_from([
            "stepgate",
            "-vv",
            "run",
            "cnpj_change",
            "--script",
            "s.yaml",
            "--secret",
            "k",
        ])
        .expect("args parse");
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Command::Run {
                flow, secret, json, ..
            } => {
                assert_eq!(flow, "cnpj_change");
                assert_eq!(secret.as_deref(), Some("k"));
                assert!(!json);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn run_requires_script() {
        assert!(Cli::try_parse_from(["stepgate", "run", "cnpj_change"]).is_err());
    }
}
