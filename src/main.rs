use clap::Parser;
use std::{
    fs::File,
    io::{self, BufWriter, Write},
    process::ExitCode,
};
use transtrack::{
    Res,
    cli::{Args, Format},
    config::{self, Context},
    error::Error,
    track::Report,
};

pub fn main() -> ExitCode {
    let args = Args::parse();

    if let Err(e) = setup_logging(&args) {
        eprintln!("{}", e);
        return ExitCode::FAILURE;
    }

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn setup_logging(args: &Args) -> Res<()> {
    match &args.log {
        Some(path) => {
            simple_logging::log_to_file(path, args.log_level).map_err(Error::OpenLogFile)
        }
        None => {
            simple_logging::log_to_stderr(args.log_level);
            Ok(())
        }
    }
}

fn run(args: &Args) -> Res<()> {
    log::debug!("Initializing config");
    let config = config::init_config(args.config.as_deref())?;
    let ctx = Context::from_args(args, config)?;

    let report = transtrack::run(&ctx)?;

    match &args.output {
        Some(path) => {
            log::info!("Writing {:?}", path);
            let file = File::create(path).map_err(Error::WriteOutput)?;
            write_report(&report, args.format, BufWriter::new(file))
        }
        None => write_report(&report, args.format, io::stdout().lock()),
    }
}

fn write_report<W: Write>(report: &Report, format: Format, mut out: W) -> Res<()> {
    match format {
        Format::Json => report.write_json(&mut out)?,
        Format::Summary => out
            .write_all(report.summary().as_bytes())
            .map_err(Error::WriteOutput)?,
    }

    out.write_all(b"\n")
        .and_then(|()| out.flush())
        .map_err(Error::WriteOutput)
}
