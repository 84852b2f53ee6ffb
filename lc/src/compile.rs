use anyhow::{Context, Result};
use clap::Parser;
use std::fs;

#[derive(Debug, Parser)]
#[clap(name = "lc", about = "multi-tier back end for the L languages")]
pub struct Args {
    /// Dump the intermediate programs while compiling
    #[clap(short, long)]
    pub verbose: bool,

    /// Print L2 liveness for the first function and stop
    #[clap(short, long)]
    pub liveness: bool,

    /// Print the interference graph for the first function and stop
    #[clap(short, long)]
    pub interference: bool,

    /// Emit the assembly output file (0 disables it)
    #[clap(short, long, default_value_t = 1)]
    pub generate: u8,

    /// Optimization level; tree merging is always on
    #[clap(short = 'O', long, default_value_t = 0)]
    pub opt_level: u8,

    pub source: String,
}

fn parse_file(path: &str) -> Result<ir::l3::Program> {
    let src =
        fs::read_to_string(path).context(format!("failed to open file: {}", path))?;

    parser::parse(&src).map_err(|err| {
        use ariadne::{ColorGenerator, Fmt, Label, Report, ReportKind, Source};

        let mut colors = ColorGenerator::new();
        let a = colors.next();

        Report::build(ReportKind::Error, path, err.loc.0)
            .with_message(err.item.to_string())
            .with_label(
                Label::new((path, err.into()))
                    .with_message(format!("error found {}", "here".fg(a)))
                    .with_color(a),
            )
            .finish()
            .print((path, Source::from(src)))
            .unwrap();

        anyhow::Error::msg("aborting because of the error above")
    })
}

pub fn compile(args: Args) -> Result<()> {
    let parsed = parse_file(&args.source)?;
    if args.verbose {
        log::debug!("parsed L3:\n{}", parsed);
    }

    let mut l2 = lower::lower(&parsed)?;
    if args.verbose {
        log::debug!("lowered L2:\n{}", l2);
    }

    if args.liveness {
        let live = backend::analyze_liveness(&l2.functions[0]);
        print!("{}", backend::format_liveness(&live));
        return Ok(());
    }

    if args.interference {
        let f = &l2.functions[0];
        let live = backend::analyze_liveness(f);
        let graph = backend::build_interference(f, &live);
        print!("{}", graph.format());
        return Ok(());
    }

    let (l1, _allocations) = backend::emit_program(&mut l2);
    if args.verbose {
        log::debug!("emitted L1:\n{}", l1);
    }

    if args.generate != 0 {
        let mut out = fs::File::create("prog.S").context("failed to create prog.S")?;
        codegen::write_program(&mut out, &l1).context("failed to write prog.S")?;
    }

    Ok(())
}

/// The whole pipeline over a source string, returning the assembly.
pub fn compile_source(src: &str) -> Result<String> {
    let parsed = parser::parse(src).map_err(|e| anyhow::Error::msg(e.item.to_string()))?;
    let mut l2 = lower::lower(&parsed)?;
    let (l1, _) = backend::emit_program(&mut l2);
    Ok(codegen::program_string(&l1))
}
