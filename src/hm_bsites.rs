use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command};
use log::{error, Level};
use simple_logger::init_with_level;

use holomira::bsites::CLI;
use holomira::config::Settings;

fn main() {
    init_with_level(Level::Info).unwrap_or_else(|e| eprintln!("Cannot start logger: {}", e));

    let matches = Command::new("hm-bsites")
        .version("1.0")
        .author("HolomiRA developers")
        .about("Join RNAhybrid hits to the genes of one MAG")
        .arg(
            Arg::new("mag")
                .short('m')
                .long("mag")
                .value_name("MAG")
                .help("MAG name")
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
            Arg::new("rnahybrid")
                .short('r')
                .long("rnahybrid")
                .value_name("RNAHYBRID.TXT")
                .help("RNAhybrid compact output for the MAG")
                .required(true),
        )
        .arg(
            Arg::new("feature_type")
                .short('f')
                .long("feature-type")
                .value_name("FTYPE")
                .help("Annotation feature type to join on"),
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
        .with_feature_type(matches.get_one::<String>("feature_type").map(String::as_str));

    let cli = CLI {
        mag: matches.get_one::<String>("mag").cloned().context("missing --mag")?,
        out_dir: matches.get_one::<String>("out_dir").cloned().context("missing --outdir")?,
        rnahybrid: matches.get_one::<String>("rnahybrid").cloned().context("missing --rnahybrid")?,
        settings,
    };
    cli.run()
}
