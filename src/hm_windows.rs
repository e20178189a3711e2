use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgMatches, Command};
use log::{error, Level};
use simple_logger::init_with_level;

use holomira::config::Settings;
use holomira::windows::CLI;

fn main() {
    init_with_level(Level::Info).unwrap_or_else(|e| eprintln!("Cannot start logger: {}", e));

    let matches = Command::new("hm-windows")
        .version("1.0")
        .author("HolomiRA developers")
        .about("Extract extended windows around binding sites")
        .arg(
            Arg::new("results")
                .short('r')
                .long("results")
                .value_name("RESULTS.TSV")
                .help("Binding-site results table")
                .required(true),
        )
        .arg(
            Arg::new("fasta_dir")
                .short('f')
                .long("fasta-dir")
                .value_name("FASTA_DIR")
                .help("Directory searched for genome .fna files")
                .required(true),
        )
        .arg(
            Arg::new("output_prefix")
                .short('o')
                .long("outbase")
                .value_name("OUTPUT_BASE")
                .help("Base name for output files")
                .required(true),
        )
        .arg(
            Arg::new("window")
                .short('w')
                .long("window")
                .value_name("BP")
                .help("Half-width of each window")
                .value_parser(value_parser!(u64)),
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
        .with_bedtools(matches.get_one::<String>("bedtools").map(String::as_str))
        .with_window(matches.get_one::<u64>("window").copied());

    let cli = CLI {
        results: matches.get_one::<String>("results").cloned().context("missing --results")?,
        fasta_dir: matches.get_one::<String>("fasta_dir").cloned().context("missing --fasta-dir")?,
        output_prefix: matches.get_one::<String>("output_prefix").cloned().context("missing --outbase")?,
        settings,
    };
    cli.run()
}
