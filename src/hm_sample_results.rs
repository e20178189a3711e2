use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command};
use log::{error, Level};
use simple_logger::init_with_level;

use holomira::results::SampleCLI;

fn main() {
    init_with_level(Level::Info).unwrap_or_else(|e| eprintln!("Cannot start logger: {}", e));

    let matches = Command::new("hm-sample-results")
        .version("1.0")
        .author("HolomiRA developers")
        .about("Attach taxonomy and environment to the binding sites of each sample")
        .arg(
            Arg::new("out_dir")
                .short('o')
                .long("outdir")
                .value_name("OUT_DIR")
                .help("Pipeline output directory")
                .required(true),
        )
        .arg(
            Arg::new("taxonomy")
                .short('t')
                .long("taxonomy")
                .value_name("TAXONOMY.TSV")
                .help("Headerless table of sample, taxonomy and environment")
                .required(true),
        )
        .arg(
            Arg::new("samples")
                .short('s')
                .long("samples")
                .value_name("SAMPLES.TSV")
                .help("Sample list with a SampleID column")
                .required(true),
        )
        .get_matches();

    if let Err(err) = run(&matches) {
        error!("{:#}", err);
        std::process::exit(1);
    }
}

fn run(matches: &ArgMatches) -> Result<()> {
    let cli = SampleCLI {
        out_dir: matches.get_one::<String>("out_dir").cloned().context("missing --outdir")?,
        taxonomy: matches.get_one::<String>("taxonomy").cloned().context("missing --taxonomy")?,
        sample_list: matches.get_one::<String>("samples").cloned().context("missing --samples")?,
    };
    cli.run()
}
