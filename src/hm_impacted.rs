use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command};
use log::{error, Level};
use simple_logger::init_with_level;

use holomira::config::Settings;
use holomira::impacted::CLI;

fn main() {
    init_with_level(Level::Info).unwrap_or_else(|e| eprintln!("Cannot start logger: {}", e));

    let matches = Command::new("hm-impacted")
        .version("1.0")
        .author("HolomiRA developers")
        .about("Collect the sequences of targeted genes per MAG and per miRNA")
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
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("CONFIG.TOML")
                .help("TOML settings file"),
        )
        .arg(
            Arg::new("bedtools")
                .long("bedtools")
                .value_name("BEDTOOLS")
                .help("bedtools executable"),
        )
        .get_matches();

    if let Err(err) = run(&matches) {
        error!("{:#}", err);
        std::process::exit(1);
    }
}

fn run(matches: &ArgMatches) -> Result<()> {
    let settings = Settings::load(matches.get_one::<String>("config").map(String::as_str))?
        .with_bedtools(matches.get_one::<String>("bedtools").map(String::as_str));

    let cli = CLI {
        results: matches.get_one::<String>("results").cloned().context("missing --results")?,
        out_dir: matches.get_one::<String>("out_dir").cloned().context("missing --outdir")?,
        settings,
    };
    cli.run()
}
