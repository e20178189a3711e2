use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgMatches, Command};
use log::{error, Level};
use simple_logger::init_with_level;

use holomira::top::CLI;

fn main() {
    init_with_level(Level::Info).unwrap_or_else(|e| eprintln!("Cannot start logger: {}", e));

    let matches = Command::new("hm-top")
        .version("1.0")
        .author("HolomiRA developers")
        .about("Rank miRNAs and MAGs of each environment")
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
        .arg(
            Arg::new("top")
                .short('n')
                .long("top")
                .value_name("N")
                .help("Number of entries in each ranking")
                .value_parser(value_parser!(usize))
                .default_value("20"),
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
        top: *matches.get_one::<usize>("top").context("missing --top")?,
    };
    cli.run()
}
