use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command};
use log::{error, Level};
use simple_logger::init_with_level;

use holomira::env_counts::CLI;

fn main() {
    init_with_level(Level::Info).unwrap_or_else(|e| eprintln!("Cannot start logger: {}", e));

    let matches = Command::new("hm-counts")
        .version("1.0")
        .author("HolomiRA developers")
        .about("Count distinct miRNAs, genes, MAGs and taxa per environment")
        .arg(
            Arg::new("results")
                .short('r')
                .long("results")
                .value_name("RESULTS.TSV")
                .help("Final results table")
                .required(true),
        )
        .arg(
            Arg::new("out_dir")
                .short('o')
                .long("outdir")
                .value_name("OUT_DIR")
                .help("Pipeline output directory")
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
        out_dir: matches.get_one::<String>("out_dir").cloned().context("missing --outdir")?,
    };
    cli.run()
}
