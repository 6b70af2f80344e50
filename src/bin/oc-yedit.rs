//! oc-yedit - YAML editing and OpenShift reconciliation modules
//!
//! Each subcommand reads its parameters from a YAML or JSON file and prints
//! the module result as JSON on stdout.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde::de::DeserializeOwned;

use openshift_yedit::cli::ProcessRunner;
use openshift_yedit::logging;
use openshift_yedit::module::{self, EditParams, ModuleResult, PolicyUserParams, RouteParams};

#[derive(Debug, Parser)]
#[command(name = "oc-yedit", version, about = "YAML editing and OpenShift reconciliation modules")]
struct Cli {
    /// Report what would change without changing anything
    #[arg(long, global = true)]
    check: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Edit a YAML/JSON file or inline document by key path
    Edit {
        /// Parameters file (YAML or JSON)
        #[arg(long = "args", value_name = "FILE")]
        args: PathBuf,
    },
    /// Manage an OpenShift route
    Route {
        #[arg(long = "args", value_name = "FILE")]
        args: PathBuf,
    },
    /// Grant or revoke a role, cluster role or SCC for a user
    PolicyUser {
        #[arg(long = "args", value_name = "FILE")]
        args: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.debug);

    match run(cli) {
        Ok(result) if !result.failed => ExitCode::SUCCESS,
        Ok(_) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ModuleResult, Box<dyn std::error::Error>> {
    let runner = ProcessRunner;

    let result = match cli.command {
        Command::Edit { args } => {
            let params: EditParams = read_params(&args)?;
            module::run_edit(&params, cli.check)
        }
        Command::Route { args } => {
            let mut params: RouteParams = read_params(&args)?;
            params.debug |= cli.debug;
            module::run_route(&params, cli.check, &runner)
        }
        Command::PolicyUser { args } => {
            let mut params: PolicyUserParams = read_params(&args)?;
            params.debug |= cli.debug;
            module::run_policy_user(&params, cli.check, &runner)
        }
    };

    println!("{}", result.to_json()?);
    Ok(result)
}

fn read_params<T: DeserializeOwned>(path: &Path) -> Result<T, Box<dyn std::error::Error>> {
    let content = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read parameters file {:?}: {}", path, e))?;
    let params = serde_yaml::from_str(&content)
        .map_err(|e| format!("Failed to parse parameters file {:?}: {}", path, e))?;
    Ok(params)
}
