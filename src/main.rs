//! This crate simulates the BLER-versus-SNR performance of the LTE turbo coding chain
//! (3GPP TS 36.212) over a BPSK-AWGN channel, with codeblock segmentation, rate matching
//! and HARQ soft combining in the loop. Simulation parameters are specified on the command
//! line, and simulation results are saved to a JSON file.
//!
//! Build the executable with `cargo build --release` and then run
//! `./target/release/lte-turbo -h` for help on the command-line interface.

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
use clap::parser::ValueSource;
use clap::{crate_name, crate_version, value_parser, Arg, ArgMatches, Command};
use lte_turbo::{MapVariant, SimParams};
use std::time::Instant;

/// Main function
fn main() -> Result<()> {
    let timer = Instant::now();
    let matches = command_line_parser().get_matches();
    let json_filename = &json_filename_from_matches(&matches);
    lte_turbo::run_bpsk_awgn_sims(&all_sim_params(&matches), json_filename)?;
    eprintln!("Elapsed time: {:.3?}", timer.elapsed());
    Ok(())
}

/// Returns command line parser.
fn command_line_parser() -> Command {
    Command::new(crate_name!())
        .version(crate_version!())
        .about("Evaluates the performance of the LTE turbo coding chain over a BPSK-AWGN channel")
        .arg(tbs())
        .arg(num_coded_bits())
        .arg(num_transmissions())
        .arg(map_variant_name())
        .arg(max_turbo_iterations())
        .arg(first_snr_db())
        .arg(snr_step_db())
        .arg(num_snr())
        .arg(num_block_errors_min())
        .arg(num_blocks_per_run())
        .arg(num_runs_min())
        .arg(num_runs_max())
        .arg(json_filename())
}

/// Returns argument for transport block size.
fn tbs() -> Arg {
    Arg::new("tbs")
        .short('i')
        .value_parser(value_parser!(usize))
        .default_value("1024")
        .help("Transport block size (bits)")
}

/// Returns argument for number of coded bits per transmission.
fn num_coded_bits() -> Arg {
    Arg::new("num_coded_bits")
        .short('g')
        .value_parser(value_parser!(usize))
        .default_value("2112")
        .help("Number of coded bits per transmission")
}

/// Returns argument for number of transmissions per block.
fn num_transmissions() -> Arg {
    Arg::new("num_transmissions")
        .short('m')
        .value_parser(value_parser!(usize))
        .default_value("1")
        .help("Number of transmissions per block")
}

/// Returns argument for decoder engine name.
fn map_variant_name() -> Arg {
    Arg::new("map_variant_name")
        .short('a')
        .value_parser(["Scalar", "StateLanes", "InterFrame8", "InterFrame16"])
        .default_value("StateLanes")
        .help("Decoder engine name")
}

/// Returns argument for maximum number of turbo iterations.
fn max_turbo_iterations() -> Arg {
    Arg::new("max_turbo_iterations")
        .short('t')
        .value_parser(value_parser!(u32))
        .default_value("8")
        .help("Maximum number of turbo iterations")
}

/// Returns argument for first Es/N0 (dB).
fn first_snr_db() -> Arg {
    Arg::new("first_snr_db")
        .short('r')
        .value_parser(value_parser!(f64))
        .allow_negative_numbers(true)
        .default_value("-1.0")
        .help("First Es/N0 (dB)")
}

/// Returns argument for Es/N0 step (dB).
fn snr_step_db() -> Arg {
    Arg::new("snr_step_db")
        .short('p')
        .value_parser(value_parser!(f64))
        .allow_negative_numbers(true)
        .default_value("0.5")
        .help("Es/N0 step (dB)")
}

/// Returns argument for number of Es/N0 values.
fn num_snr() -> Arg {
    Arg::new("num_snr")
        .short('s')
        .value_parser(value_parser!(u32))
        .default_value("6")
        .help("Number of Es/N0 values")
}

/// Returns argument for desired minimum number of block errors.
fn num_block_errors_min() -> Arg {
    Arg::new("num_block_errors_min")
        .short('e')
        .value_parser(value_parser!(u32))
        .default_value("500")
        .help("Desired minimum number of block errors")
}

/// Returns argument for number of blocks to be transmitted per run.
fn num_blocks_per_run() -> Arg {
    Arg::new("num_blocks_per_run")
        .short('b')
        .value_parser(value_parser!(u32))
        .default_value("1000")
        .help("Number of blocks to be transmitted per run")
}

/// Returns argument for minimum number of runs of blocks to be simulated.
fn num_runs_min() -> Arg {
    Arg::new("num_runs_min")
        .short('n')
        .value_parser(value_parser!(u32))
        .default_value("10")
        .help("Minimum number of runs of blocks to be simulated")
}

/// Returns argument for maximum number of runs of blocks to be simulated.
fn num_runs_max() -> Arg {
    Arg::new("num_runs_max")
        .short('x')
        .value_parser(value_parser!(u32))
        .default_value("100")
        .help("Maximum number of runs of blocks to be simulated")
}

/// Returns argument for name of JSON file to which results must be saved.
fn json_filename() -> Arg {
    Arg::new("json_filename")
        .short('f')
        .default_value("results.json")
        .help("Name of JSON file to which results must be saved")
}

/// Returns simulation parameters based on command-line arguments.
fn all_sim_params(matches: &ArgMatches) -> Vec<SimParams> {
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
    let mut all_params = Vec::new();
    for es_over_n0_db in all_es_over_n0_db_from_matches(matches) {
        all_params.push(SimParams {
            tbs: tbs_from_matches(matches),
            num_coded_bits: num_coded_bits_from_matches(matches),
            num_transmissions: num_transmissions_from_matches(matches),
            map_variant: map_variant_from_matches(matches),
            max_turbo_iterations: max_turbo_iterations_from_matches(matches),
            es_over_n0_db,
            num_block_errors_min: num_block_errors_min_from_matches(matches),
            num_blocks_per_run: num_blocks_per_run_from_matches(matches),
            num_runs_min,
            num_runs_max,
        });
    }
    // OK to unwrap: All command-line arguments have default values, so an error cannot occur
    // in any of the associated functions called above.
    all_params
}

/// Returns transport block size.
fn tbs_from_matches(matches: &ArgMatches) -> usize {
    *matches.get_one("tbs").unwrap()
}

/// Returns number of coded bits per transmission.
fn num_coded_bits_from_matches(matches: &ArgMatches) -> usize {
    *matches.get_one("num_coded_bits").unwrap()
}

/// Returns number of transmissions per block.
fn num_transmissions_from_matches(matches: &ArgMatches) -> usize {
    *matches.get_one("num_transmissions").unwrap()
}

/// Returns decoder engine.
fn map_variant_from_matches(matches: &ArgMatches) -> MapVariant {
    match matches
        .get_one::<String>("map_variant_name")
        .unwrap()
        .as_str()
    {
        "Scalar" => MapVariant::Scalar,
        "StateLanes" => MapVariant::StateLanes,
        "InterFrame8" => MapVariant::InterFrame8,
        "InterFrame16" => MapVariant::InterFrame16,
        _ => panic!("Invalid decoder engine name"),
    }
}

/// Returns maximum number of turbo iterations.
fn max_turbo_iterations_from_matches(matches: &ArgMatches) -> u32 {
    *matches.get_one("max_turbo_iterations").unwrap()
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
