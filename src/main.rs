//! This crate simulates the BER-versus-SNR and BLER-versus-SNR performance of the DAB
//! convolutional code, under a given UEP or EEP protection profile, over a BPSK-AWGN channel.
//! Simulation parameters are specified on the command line, and simulation results are saved to a
//! JSON file.
//!
//! Build the executable with `cargo build --release` and then run `./target/release/dabcore -h` for
//! help on the command-line interface. Set `RUST_LOG` or use `-l` to control logging.

#![warn(
    clippy::complexity,
    clippy::pedantic,
    clippy::perf,
    clippy::style,
    clippy::suspicious,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    trivial_casts,
    trivial_numeric_casts,
    unused_allocation,
    unused_import_braces,
    unused_qualifications
)]

use anyhow::Result;
use clap::error::ErrorKind;
use clap::parser::ValueSource;
use clap::{crate_name, crate_version, value_parser, Arg, ArgMatches, Command};
use dabcore::protection::ProtectionProfile;
use dabcore::sim;
use dabcore::viterbi::Backend;
use std::ffi::OsString;
use std::time::Instant;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Main function
fn main() -> Result<()> {
    let timer = Instant::now();
    let matches = parse_command_line(std::env::args_os()).unwrap_or_else(|error| error.exit());
    init_logging(&log_level_from_matches(&matches));
    let json_filename = &json_filename_from_matches(&matches);
    sim::run_bpsk_awgn_sims(&all_sim_params(&matches), json_filename)?;
    info!("Elapsed time: {:.3?}", timer.elapsed());
    Ok(())
}

/// Installs the log subscriber; `RUST_LOG` takes precedence over the given level.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Returns matches for given command line, checking the protection level against the profile.
fn parse_command_line<I, T>(args: I) -> Result<ArgMatches, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let mut parser = command_line_parser();
    let matches = parser.try_get_matches_from_mut(args)?;
    let profile = profile_from_matches(&matches);
    if let ProtectionProfile::EepA(level) | ProtectionProfile::EepB(level) = profile {
        if level > 4 {
            return Err(parser.error(
                ErrorKind::ValueValidation,
                format!("EEP protection levels go from 1 to 4 (found {level})"),
            ));
        }
    }
    Ok(matches)
}

/// Returns command line parser.
fn command_line_parser() -> Command {
    Command::new(crate_name!())
        .version(crate_version!())
        .about("Evaluates the performance of a DAB protection profile over a BPSK-AWGN channel")
        .arg(profile_name())
        .arg(protection_level())
        .arg(bit_rate())
        .arg(backend_name())
        .arg(first_snr_db())
        .arg(snr_step_db())
        .arg(num_snr())
        .arg(num_block_errors_min())
        .arg(num_blocks_per_run())
        .arg(num_runs_min())
        .arg(num_runs_max())
        .arg(json_filename())
        .arg(log_level())
}

/// Returns argument for protection profile name.
fn profile_name() -> Arg {
    Arg::new("profile_name")
        .short('a')
        .value_parser(["UEP", "EEP-A", "EEP-B"])
        .default_value("EEP-A")
        .help("Protection profile name")
}

/// Returns argument for protection level.
fn protection_level() -> Arg {
    Arg::new("protection_level")
        .short('t')
        .value_parser(value_parser!(u8).range(1 ..= 5))
        .default_value("3")
        .help("Protection level (1 is strongest; EEP profiles stop at 4)")
}

/// Returns argument for sub-channel bit rate.
fn bit_rate() -> Arg {
    Arg::new("bit_rate")
        .short('k')
        .value_parser(value_parser!(u16))
        .default_value("64")
        .help("Sub-channel bit rate (kbit/s)")
}

/// Returns argument for Viterbi strategy name.
fn backend_name() -> Arg {
    Arg::new("backend_name")
        .short('c')
        .value_parser(["auto", "scalar", "sse", "neon", "avx2"])
        .default_value("auto")
        .help("Viterbi add-compare-select strategy")
}

/// Returns argument for first Es/N0 (dB).
fn first_snr_db() -> Arg {
    Arg::new("first_snr_db")
        .short('r')
        .value_parser(value_parser!(f64))
        .allow_negative_numbers(true)
        .default_value("-3.0")
        .help("First Es/N0 (dB)")
}

/// Returns argument for Es/N0 step (dB).
fn snr_step_db() -> Arg {
    Arg::new("snr_step_db")
        .short('p')
        .value_parser(value_parser!(f64))
        .allow_negative_numbers(true)
        .default_value("1.0")
        .help("Es/N0 step (dB)")
}

/// Returns argument for number of Es/N0 values.
fn num_snr() -> Arg {
    Arg::new("num_snr")
        .short('s')
        .value_parser(value_parser!(u32))
        .default_value("4")
        .help("Number of Es/N0 values")
}

/// Returns argument for desired minimum number of block errors.
fn num_block_errors_min() -> Arg {
    Arg::new("num_block_errors_min")
        .short('e')
        .value_parser(value_parser!(u32))
        .default_value("100")
        .help("Desired minimum number of block errors")
}

/// Returns argument for number of blocks to be transmitted per run.
fn num_blocks_per_run() -> Arg {
    Arg::new("num_blocks_per_run")
        .short('b')
        .value_parser(value_parser!(u32))
        .default_value("200")
        .help("Number of blocks to be transmitted per run")
}

/// Returns argument for minimum number of runs of blocks to be simulated.
fn num_runs_min() -> Arg {
    Arg::new("num_runs_min")
        .short('n')
        .value_parser(value_parser!(u32))
        .default_value("5")
        .help("Minimum number of runs of blocks to be simulated")
}

/// Returns argument for maximum number of runs of blocks to be simulated.
fn num_runs_max() -> Arg {
    Arg::new("num_runs_max")
        .short('x')
        .value_parser(value_parser!(u32))
        .default_value("50")
        .help("Maximum number of runs of blocks to be simulated")
}

/// Returns argument for name of JSON file to which results must be saved.
fn json_filename() -> Arg {
    Arg::new("json_filename")
        .short('f')
        .default_value("results.json")
        .help("Name of JSON file to which results must be saved")
}

/// Returns argument for log level.
fn log_level() -> Arg {
    Arg::new("log_level")
        .short('l')
        .value_parser(["error", "warn", "info", "debug", "trace"])
        .default_value("info")
        .help("Log level, unless overridden by RUST_LOG")
}

/// Returns simulation parameters based on command-line arguments.
fn all_sim_params(matches: &ArgMatches) -> Vec<sim::SimParams> {
    let mut num_runs_min = num_runs_min_from_matches(matches);
    let mut num_runs_max = num_runs_max_from_matches(matches);
    if num_runs_min > num_runs_max {
        if let Some(ValueSource::DefaultValue) = matches.value_source("num_runs_min") {
            num_runs_min = num_runs_max;
        }
        if let Some(ValueSource::DefaultValue) = matches.value_source("num_runs_max") {
            num_runs_max = num_runs_min;
        }
    }
    let profile = profile_from_matches(matches);
    let backend = backend_from_matches(matches);
    all_es_over_n0_db_from_matches(matches)
        .into_iter()
        .map(|es_over_n0_db| sim::SimParams {
            profile,
            bit_rate: bit_rate_from_matches(matches),
            es_over_n0_db,
            backend,
            num_block_errors_min: num_block_errors_min_from_matches(matches),
            num_blocks_per_run: num_blocks_per_run_from_matches(matches),
            num_runs_min,
            num_runs_max,
        })
        .collect()
}

// OK to unwrap: All command-line arguments have default values, so an error cannot occur in any
// of the `*_from_matches` functions below.

/// Returns protection profile.
fn profile_from_matches(matches: &ArgMatches) -> ProtectionProfile {
    let level = *matches.get_one("protection_level").unwrap();
    match matches
        .get_one::<String>("profile_name")
        .unwrap()
        .as_str()
    {
        "UEP" => ProtectionProfile::Uep(level),
        "EEP-A" => ProtectionProfile::EepA(level),
        "EEP-B" => ProtectionProfile::EepB(level),
        _ => panic!("Invalid protection profile name"),
    }
}

/// Returns Viterbi strategy.
fn backend_from_matches(matches: &ArgMatches) -> Backend {
    match matches
        .get_one::<String>("backend_name")
        .unwrap()
        .as_str()
    {
        "auto" => Backend::detect(),
        "scalar" => Backend::Scalar,
        "sse" => Backend::Sse,
        "neon" => Backend::Neon,
        "avx2" => Backend::Avx2,
        _ => panic!("Invalid Viterbi strategy name"),
    }
}

/// Returns sub-channel bit rate.
fn bit_rate_from_matches(matches: &ArgMatches) -> u16 {
    *matches.get_one("bit_rate").unwrap()
}

/// Returns all Es/N0 (dB) values.
fn all_es_over_n0_db_from_matches(matches: &ArgMatches) -> Vec<f64> {
    let first_snr_db: f64 = *matches.get_one("first_snr_db").unwrap();
    let snr_step_db: f64 = *matches.get_one("snr_step_db").unwrap();
    let num_snr: u32 = *matches.get_one("num_snr").unwrap();
    (0 .. num_snr)
        .map(|n| first_snr_db + snr_step_db * f64::from(n))
        .collect()
}

/// Returns desired minimum number of block errors.
fn num_block_errors_min_from_matches(matches: &ArgMatches) -> u32 {
    *matches.get_one("num_block_errors_min").unwrap()
}

/// Returns number of blocks to be transmitted per run.
fn num_blocks_per_run_from_matches(matches: &ArgMatches) -> u32 {
    *matches.get_one("num_blocks_per_run").unwrap()
}

/// Returns minimum number of runs of blocks to be simulated.
fn num_runs_min_from_matches(matches: &ArgMatches) -> u32 {
    *matches.get_one("num_runs_min").unwrap()
}

/// Returns maximum number of runs of blocks to be simulated.
fn num_runs_max_from_matches(matches: &ArgMatches) -> u32 {
    *matches.get_one("num_runs_max").unwrap()
}

/// Returns name of JSON file to which simulation results must be saved.
fn json_filename_from_matches(matches: &ArgMatches) -> String {
    matches
        .get_one::<String>("json_filename")
        .unwrap()
        .to_string()
}

/// Returns log level.
fn log_level_from_matches(matches: &ArgMatches) -> String {
    matches.get_one::<String>("log_level").unwrap().to_string()
}
