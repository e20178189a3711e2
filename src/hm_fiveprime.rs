use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgMatches, Command};
use log::{error, Level};
use simple_logger::init_with_level;

use holomira::config::Settings;
use holomira::fiveprime::CLI;

fn main() {
    init_with_level(Level::Info).unwrap_or_else(|e| eprintln!("Cannot start logger: {}", e));

    let matches = Command::new("hm-fiveprime")
        .version("1.0")
        .author("HolomiRA developers")
        .about("Extract five-prime windows and CDS sequences of one sample")
        .arg(
            Arg::new("sample")
                .short('s')
                .long("sample")
                .value_name("SAMPLE")
                .help("Sample (MAG) name")
                .required(true),
        )
        .arg(
            Arg::new("upstream")
                .short('u')
                .long("upstream")
                .value_name("BP")
                .help("Bases upstream of the start codon")
                .value_parser(value_parser!(u64))
                .required(true),
        )
        .arg(
            Arg::new("downstream")
                .short('d')
                .long("downstream")
                .value_name("BP")
                .help("Bases downstream of the start codon")
                .value_parser(value_parser!(u64))
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
            Arg::new("gff")
                .short('g')
                .long("gff")
                .value_name("CDS.GFF")
                .help("GFF file of CDS features")
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
        sample: matches.get_one::<String>("sample").cloned().context("missing --sample")?,
        upstream: *matches.get_one::<u64>("upstream").context("missing --upstream")?,
        downstream: *matches.get_one::<u64>("downstream").context("missing --downstream")?,
        out_dir: matches.get_one::<String>("out_dir").cloned().context("missing --outdir")?,
        gff: matches.get_one::<String>("gff").cloned().context("missing --gff")?,
        settings,
    };
    cli.run()
}
