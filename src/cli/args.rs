// ABOUTME: Command line argument definitions and parsing using Clap
// ABOUTME: Defines the flowbook CLI structure and its run, validate, tasks and init subcommands

use clap::{Parser, Subcommand};
use std::collections::HashMap;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "flowbook")]
#[command(about = "Run declarative YAML playbooks with sequential, parallel, conditional and repeating flows")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(short, long, global = true, help = "Path to configuration file")]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, help = "Disable colored output")]
    pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a playbook from a YAML file
    Run {
        #[arg(help = "Path to playbook YAML file")]
        file: PathBuf,

        #[arg(short, long, help = "Id of the playbook to run (defaults to the first in the file)")]
        playbook: Option<String>,

        #[arg(short = 'V', long = "var", help = "Set a context variable (key=value)")]
        vars: Vec<String>,

        #[arg(long, help = "Compile the playbook without running it")]
        dry_run: bool,

        #[arg(short, long, help = "Write a JSON run summary to this file")]
        output: Option<PathBuf>,
    },

    /// Load and compile every playbook in a file
    Validate {
        #[arg(help = "Path to playbook YAML file")]
        file: PathBuf,
    },

    /// List the registered task ids
    Tasks,

    /// Create a starter playbook file
    Init {
        #[arg(help = "Id of the playbook to create")]
        name: String,

        #[arg(short, long, help = "Output directory", default_value = ".")]
        output_dir: PathBuf,
    },
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Parse variables from key=value format
    pub fn parse_variables(vars: &[String]) -> anyhow::Result<HashMap<String, String>> {
        let mut variables = HashMap::new();

        for var in vars {
            match var.split_once('=') {
                Some((key, value)) if !key.trim().is_empty() => {
                    variables.insert(key.trim().to_string(), value.to_string());
                }
                _ => {
                    return Err(anyhow::anyhow!(
                        "Invalid variable format '{}'. Expected 'key=value'",
                        var
                    ));
                }
            }
        }

        Ok(variables)
    }
}
