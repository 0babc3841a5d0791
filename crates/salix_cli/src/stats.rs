//! The `salix stats` subcommand: print statistics about a netlist.

use crate::Cli;
use clap::Parser;
use salix_common::Interner;
use salix_io::read_design;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Arguments for the `salix stats` subcommand.
#[derive(Parser, Debug)]
pub struct StatsArgs {
    /// Input netlist JSON.
    pub netlist: PathBuf,
}

/// Runs the subcommand, returning the process exit code.
pub fn run(cli: &Cli, args: &StatsArgs) -> i32 {
    let interner = Interner::new();
    let design = match read_design(&args.netlist, &interner) {
        Ok(design) => design,
        Err(err) => {
            eprintln!("error: {err}");
            return 1;
        }
    };

    if let Some(top) = design.top_module() {
        println!("top module: {}", interner.resolve(top.name));
    }

    for module in design.modules.values() {
        let total_bits: u64 = module.wires.values().map(|wire| wire.width as u64).sum();
        println!("module {}", interner.resolve(module.name));
        println!("  ports:       {}", module.ports.len());
        println!("  wires:       {} ({total_bits} bits)", module.wires.len());
        println!("  cells:       {}", module.live_cell_count());
        if cli.verbose {
            let mut breakdown: BTreeMap<&'static str, usize> = BTreeMap::new();
            for (_, cell) in module.live_cells() {
                *breakdown.entry(cell.kind.name()).or_default() += 1;
            }
            for (kind, count) in breakdown {
                println!("    {kind:<10} {count}");
            }
        }
        println!("  connections: {}", module.connections.len());
        if module.has_processes() {
            println!("  processes:   {}", module.processes.len());
        }
    }

    0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opt::OptArgs;
    use crate::Command;

    fn stats_cli(verbose: bool) -> Cli {
        Cli {
            quiet: false,
            verbose,
            command: Command::Opt(OptArgs {
                netlist: None,
                output: None,
                config: None,
                modules: Vec::new(),
            }),
        }
    }

    #[test]
    fn stats_on_valid_netlist() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.json");
        std::fs::write(
            &input,
            r#"{"modules": {"m": {"wires": [{"name": "a", "width": 4}]}}}"#,
        )
        .unwrap();
        let args = StatsArgs { netlist: input };
        assert_eq!(run(&stats_cli(true), &args), 0);
    }

    #[test]
    fn stats_on_missing_file() {
        let args = StatsArgs {
            netlist: PathBuf::from("/nonexistent/netlist.json"),
        };
        assert_eq!(run(&stats_cli(false), &args), 1);
    }
}
