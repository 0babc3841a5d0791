//! Salix CLI — the command-line interface for the Salix netlist toolkit.
//!
//! Provides `salix opt` for running optimization passes on a JSON netlist
//! and `salix stats` for printing netlist statistics.

#![warn(missing_docs)]

mod opt;
mod stats;

use clap::{Parser, Subcommand};
use std::process;

/// Salix — a netlist pruning toolkit for RTL designs.
#[derive(Parser, Debug)]
#[command(name = "salix", version, about = "Salix netlist toolkit")]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Show informational pass output (roots, dead ports, substitutions).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run optimization passes on a netlist.
    Opt(opt::OptArgs),
    /// Print statistics about a netlist.
    Stats(stats::StatsArgs),
}

fn main() {
    let cli = Cli::parse();
    let exit_code = match &cli.command {
        Command::Opt(args) => opt::run(&cli, args),
        Command::Stats(args) => stats::run(&cli, args),
    };
    process::exit(exit_code);
}
