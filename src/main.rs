//! mars2g4bl CLI

use std::{
    io::{self, BufRead, Write},
    process::ExitCode,
};

use camino::Utf8PathBuf;
use clap::{ArgAction, Parser};
use rand::{rngs::StdRng, SeedableRng};

use mars2g4bl::prelude::*;

#[derive(Parser)]
#[command(name = "mars2g4bl")]
#[command(about = "Convert a MARS beam file into a G4Beamline beam file")]
#[command(version)]
struct Cli {
    /// MARS beam file, rows of `i x y z px py pz w [t]`
    marsfile: Utf8PathBuf,

    /// Output G4Beamline file. Defaults to the MARS file name with a `.beam` extension.
    #[arg(short, long)]
    output: Option<Utf8PathBuf>,

    /// JSON document with the keys `p_cut`, `mult`, `duplicate`, `fraction`
    #[arg(short, long)]
    config: Option<Utf8PathBuf>,

    /// Momentum cut in MeV/c: `[p_low, p_high]`, or 0 for no cut
    #[arg(long)]
    p_cut: Option<MomentumCut>,

    /// Factor applied to the particle weights, before duplication
    #[arg(long)]
    mult: Option<f64>,

    /// Duplicate the particles according to their weight
    #[arg(long, action = ArgAction::SetTrue, conflicts_with = "no_duplicate")]
    duplicate: bool,

    /// Keep the particles weighted, overriding `duplicate` from `--config`
    #[arg(long, action = ArgAction::SetTrue)]
    no_duplicate: bool,

    /// Fraction of the beam to keep, picked at random after duplication
    #[arg(long)]
    fraction: Option<f64>,

    /// Seed of the random generator (random seed when absent)
    #[arg(long)]
    seed: Option<u64>,

    /// Ask on stdin for the parameters not given by `--config` or the flags
    #[arg(short, long)]
    interactive: bool,

    /// Log verbosity level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: tracing::Level,
}

impl Cli {
    /// `duplicate` as given on the command line, `None` when neither flag is set.
    fn duplicate_flag(&self) -> Option<bool> {
        match (self.duplicate, self.no_duplicate) {
            (true, _) => Some(true),
            (false, true) => Some(false),
            (false, false) => None,
        }
    }
}

fn ask<R: BufRead, W: Write>(input: &mut R, output: &mut W, question: &str) -> io::Result<String> {
    writeln!(output, "\n{question}")?;
    output.flush()?;
    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(answer.trim().to_string())
}

fn parse_number(key: &'static str, answer: &str) -> Result<f64, ConfigError> {
    answer.parse::<f64>().map_err(|_| ConfigError::InvalidValue {
        key,
        value: answer.to_string(),
    })
}

/// Fill the missing keys of `partial` from answers read on `input`.
fn prompt_missing<R: BufRead, W: Write>(
    mut partial: PartialConfig,
    input: &mut R,
    output: &mut W,
) -> Result<PartialConfig, BeamError> {
    if partial.p_cut.is_none() {
        let answer = ask(
            input,
            output,
            "Enter the momentum cut boundaries in MeV/c with the form [p_low, p_high]\n\
             Enter 0 if you do not need a cut",
        )?;
        partial.p_cut = Some(answer.parse::<MomentumCut>()?.bounds());
    }
    if partial.mult.is_none() {
        let answer = ask(
            input,
            output,
            "Do you want to multiply the particle weights by a factor?\n\
             Enter factor: (Enter 1 if no multiplication)\n\
             If duplication is needed later, the particle will be duplicated based on the new weights",
        )?;
        partial.mult = Some(parse_number("mult", &answer)?);
    }
    if partial.duplicate.is_none() {
        let answer = ask(
            input,
            output,
            "Do you want to duplicate the particles based on their current weight?\ny or n? (n)",
        )?;
        partial.duplicate = Some(answer.eq_ignore_ascii_case("y"));
    }
    if partial.fraction.is_none() {
        let answer = ask(
            input,
            output,
            "Do you want to take only a fraction of the beam? The pick will be random.\n\
             Enter the fraction n: (1 for all the beam)",
        )?;
        partial.fraction = Some(parse_number("fraction", &answer)?);
    }
    Ok(partial)
}

fn run(cli: Cli) -> Result<(), BeamError> {
    let file_layer = match &cli.config {
        Some(path) => PartialConfig::from_json_file(path)?,
        None => PartialConfig::default(),
    };
    let flag_layer = PartialConfig {
        p_cut: cli.p_cut.map(|cut| cut.bounds()),
        mult: cli.mult,
        duplicate: cli.duplicate_flag(),
        fraction: cli.fraction,
    };

    let mut partial = file_layer.merge(flag_layer);
    if cli.interactive {
        partial = prompt_missing(partial, &mut io::stdin().lock(), &mut io::stdout())?;
    }
    let config = partial.resolve()?;
    tracing::info!(%config, "conversion parameters");

    let output = cli
        .output
        .unwrap_or_else(|| default_output_path(&cli.marsfile));
    tracing::info!(path = %output, "G4Beamline output file");

    let mut rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let report = convert_file(&cli.marsfile, &output, &config, &mut rng)?;
    println!("{report}");
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_max_level(cli.log_level)
        .with_target(false)
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("---Error: {err}");
            ExitCode::FAILURE
        }
    }
}
