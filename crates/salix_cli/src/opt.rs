//! The `salix opt` subcommand: run optimization passes on a netlist.

use crate::Cli;
use clap::Parser;
use salix_common::Interner;
use salix_config::{load_config, OptConfig};
use salix_diagnostics::{DiagnosticSink, Severity, TerminalRenderer};
use salix_io::{design_to_json, read_design, write_design};
use salix_opt::optimize;
use std::path::PathBuf;

/// Arguments for the `salix opt` subcommand.
#[derive(Parser, Debug)]
pub struct OptArgs {
    /// Input netlist JSON. May be omitted when `--config` names one.
    pub netlist: Option<PathBuf>,

    /// Output path for the optimized netlist. Defaults to stdout.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Path to a `salix.toml` configuration file.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Process only the named modules (overrides the configured list).
    #[arg(long = "module")]
    pub modules: Vec<String>,
}

/// Runs the subcommand, returning the process exit code.
pub fn run(cli: &Cli, args: &OptArgs) -> i32 {
    let mut opt_config = OptConfig::default();
    let mut netlist_path = args.netlist.clone();
    let mut top_name = None;

    if let Some(config_path) = &args.config {
        match load_config(config_path) {
            Ok(config) => {
                if netlist_path.is_none() {
                    netlist_path = Some(PathBuf::from(&config.project.netlist));
                }
                top_name = config.project.top.clone();
                opt_config = config.opt;
            }
            Err(err) => {
                eprintln!("error: {err}");
                return 1;
            }
        }
    }

    let Some(netlist_path) = netlist_path else {
        eprintln!("error: no input netlist given (pass a path or --config)");
        return 1;
    };

    if !args.modules.is_empty() {
        opt_config.modules = Some(args.modules.clone());
    }

    let interner = Interner::new();
    let mut design = match read_design(&netlist_path, &interner) {
        Ok(design) => design,
        Err(err) => {
            eprintln!("error: {err}");
            return 1;
        }
    };

    // A top module from the configuration applies when the netlist
    // itself does not designate one.
    if design.top.is_none() {
        if let Some(top_name) = &top_name {
            design.top = interner.get(top_name).and_then(|ident| {
                design
                    .modules
                    .iter()
                    .find(|(_, module)| module.name == ident)
                    .map(|(id, _)| id)
            });
        }
    }

    let sink = DiagnosticSink::new();
    let summary = optimize(&mut design, &interner, &opt_config, &sink);

    if !cli.quiet {
        let min_severity = if cli.verbose {
            Severity::Note
        } else {
            Severity::Warning
        };
        let renderer = TerminalRenderer::new(false, min_severity);
        eprint!("{}", renderer.render_all(&sink.diagnostics()));
        eprintln!(
            "removed {} multiplexer ports across {} modules ({} skipped)",
            summary.removed_ports, summary.modules_processed, summary.modules_skipped
        );
    }

    let result = match &args.output {
        Some(path) => write_design(path, &design, &interner),
        None => design_to_json(&design, &interner).map(|json| println!("{json}")),
    };
    if let Err(err) = result {
        eprintln!("error: {err}");
        return 1;
    }

    if sink.has_errors() {
        1
    } else {
        0
    }
}
