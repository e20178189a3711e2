use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command};
use log::{error, Level};
use simple_logger::init_with_level;

use holomira::rnaup_inputs::CLI;

fn main() {
    init_with_level(Level::Info).unwrap_or_else(|e| eprintln!("Cannot start logger: {}", e));

    let matches = Command::new("hm-rnaup-inputs")
        .version("1.0")
        .author("HolomiRA developers")
        .about("Write one RNAup input per binding site")
        .arg(
            Arg::new("results")
                .short('r')
                .long("results")
                .value_name("RESULTS.TSV")
                .help("Binding-site results table")
                .required(true),
        )
        .arg(
            Arg::new("mirna_fasta")
                .short('m')
                .long("mirnas")
                .value_name("MIRNA.FA")
                .help("FASTA file of miRNA sequences")
                .required(true),
        )
        .arg(
            Arg::new("windows_fasta")
                .short('w')
                .long("windows")
                .value_name("WINDOWS.FASTA")
                .help("FASTA file of extended binding windows")
                .required(true),
        )
        .arg(
            Arg::new("out_dir")
                .short('o')
                .long("outdir")
                .value_name("OUT_DIR")
                .help("Directory for RNAup inputs")
                .required(true),
        )
        .get_matches();

    if let Err(err) = run(&matches) {
        error!("{:#}", err);
        std::process::exit(1);
    }
}

fn run(matches: &ArgMatches) -> Result<()> {
    let cli = CLI {
        results: matches.get_one::<String>("results").cloned().context("missing --results")?,
        mirna_fasta: matches.get_one::<String>("mirna_fasta").cloned().context("missing --mirnas")?,
        windows_fasta: matches.get_one::<String>("windows_fasta").cloned().context("missing --windows")?,
        out_dir: matches.get_one::<String>("out_dir").cloned().context("missing --outdir")?,
    };
    cli.run()
}
