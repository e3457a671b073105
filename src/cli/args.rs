//! Defines the command-line arguments and subcommands for the ASDL CLI.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// The main CLI argument structure.
#[derive(Debug, Parser)]
#[command(
    name = "asdl",
    version,
    about = "Inspect ASDL grammars and the action sequences of trees written against them."
)]
pub struct AsdlArgs {
    /// Grammar configuration file (YAML or JSON).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log transition details to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// An enumeration of all available CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Load a grammar, print its productions and any lint warnings.
    Check {
        /// The grammar description file.
        #[arg(required = true)]
        grammar: PathBuf,
    },
    /// Print the action sequence of a JSON tree.
    Actions {
        /// The grammar description file.
        #[arg(required = true)]
        grammar: PathBuf,
        /// The tree, as JSON with a `_type` key per node.
        #[arg(required = true)]
        tree: PathBuf,
    },
    /// Encode a JSON tree, replay its actions, and print the rebuilt tree.
    Replay {
        /// The grammar description file.
        #[arg(required = true)]
        grammar: PathBuf,
        /// The tree, as JSON with a `_type` key per node.
        #[arg(required = true)]
        tree: PathBuf,
    },
}
