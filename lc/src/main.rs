use anyhow::Result;
use clap::Parser;

use lc::{compile, Args};

fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose {
        simplelog::LevelFilter::Debug
    } else {
        simplelog::LevelFilter::Info
    };
    simplelog::CombinedLogger::init(vec![simplelog::TermLogger::new(
        level,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )])
    .unwrap();

    compile(args)
}
