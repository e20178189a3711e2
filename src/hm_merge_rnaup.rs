use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgMatches, Command};
use log::{error, Level};
use simple_logger::init_with_level;

use holomira::config::Settings;
use holomira::merge_rnaup::CLI;

fn main() {
    init_with_level(Level::Info).unwrap_or_else(|e| eprintln!("Cannot start logger: {}", e));

    let matches = Command::new("hm-merge-rnaup")
        .version("1.0")
        .author("HolomiRA developers")
        .about("Attach RNAup energies to the results and filter by free energy")
        .arg(
            Arg::new("rna_dir")
                .short('i')
                .long("rnaup-dir")
                .value_name("RNAUP_DIR")
                .help("Directory searched for *_rnaup.txt files")
                .required(true),
        )
        .arg(
            Arg::new("results")
                .short('r')
                .long("results")
                .value_name("RESULTS.TSV")
                .help("Binding-site results table")
                .required(true),
        )
        .arg(
            Arg::new("out_dir")
                .short('o')
                .long("outdir")
                .value_name("OUT_DIR")
                .help("Directory for the valid and discarded tables")
                .required(true),
        )
        .arg(
            Arg::new("dg_cutoff")
                .short('g')
                .long("dg-cutoff")
                .value_name("KCAL_MOL")
                .help("Highest total free energy of a valid site")
                .value_parser(value_parser!(f64)),
        )
        .arg(
            Arg::new("window")
                .short('w')
                .long("window")
                .value_name("BP")
                .help("Half-width of the windows given to RNAup")
                .value_parser(value_parser!(u64)),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("CONFIG.TOML")
                .help("TOML settings file"),
        )
        .get_matches();

    if let Err(err) = run(&matches) {
        error!("{:#}", err);
        std::process::exit(1);
    }
}

fn run(matches: &ArgMatches) -> Result<()> {
    let settings = Settings::load(matches.get_one::<String>("config").map(String::as_str))?
        .with_window(matches.get_one::<u64>("window").copied())
        .with_dg_cutoff(matches.get_one::<f64>("dg_cutoff").copied());

    let cli = CLI {
        rna_dir: matches.get_one::<String>("rna_dir").cloned().context("missing --rnaup-dir")?,
        results: matches.get_one::<String>("results").cloned().context("missing --results")?,
        out_dir: matches.get_one::<String>("out_dir").cloned().context("missing --outdir")?,
        settings,
    };
    cli.run()
}
