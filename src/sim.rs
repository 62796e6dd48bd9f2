//! Simulator to evaluate block error rate of the turbo coding chain over a BPSK-AWGN channel

use std::sync::Arc;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::tables::TurboTables;
use crate::transport::{Grant, TbCodec, RV_SEQUENCE};
use crate::{utils, Bit, Error, MapVariant, SoftBufferRx, SoftBufferTx, MAX_BLOCK_LEN};

/// Modulation order assumed when splitting coded bits among codeblocks. Each coded bit is
/// then sent as one BPSK symbol.
const MODULATION_ORDER: usize = 2;

/// Parameters for transport-block simulation over a BPSK-AWGN channel
#[allow(clippy::module_name_repetitions)]
#[derive(Clone, PartialEq, Debug, Copy, Deserialize, Serialize)]
pub struct SimParams {
    /// Transport block size (bits)
    pub tbs: usize,
    /// Number of coded bits per transmission
    pub num_coded_bits: usize,
    /// Number of transmissions per block, with redundancy versions cycling through
    /// [`RV_SEQUENCE`]
    pub num_transmissions: usize,
    /// Decoder engine to be used
    pub map_variant: MapVariant,
    /// Maximum number of turbo iterations per codeblock
    pub max_turbo_iterations: u32,
    /// Ratio (dB) of symbol energy to noise power spectral density at BPSK-AWGN channel
    /// output
    pub es_over_n0_db: f64,
    /// Desired minimum number of block errors
    pub num_block_errors_min: u32,
    /// Number of blocks to be transmitted per run
    pub num_blocks_per_run: u32,
    /// Minimum number of runs of blocks to be simulated
    pub num_runs_min: u32,
    /// Maximum number of runs of blocks to be simulated
    pub num_runs_max: u32,
}

/// Results of transport-block simulation over a BPSK-AWGN channel
#[allow(clippy::module_name_repetitions)]
#[derive(Clone, PartialEq, Debug, Copy, Deserialize, Serialize)]
pub struct SimResults {
    /// Simulation parameters
    pub params: SimParams,
    /// Number of blocks transmitted
    pub num_blocks: u32,
    /// Number of blocks decoded incorrectly
    pub num_block_errors: u32,
    /// Smoothed average number of turbo iterations per codeblock
    pub avg_turbo_iterations: f64,
}

impl SimResults {
    /// Returns the block error rate observed so far.
    #[must_use]
    pub fn block_error_rate(&self) -> f64 {
        if self.num_blocks == 0 {
            0.0
        } else {
            f64::from(self.num_block_errors) / f64::from(self.num_blocks)
        }
    }
}

impl std::fmt::Display for SimResults {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Es/N0 = {:.2} dB: {} block errors in {} blocks (BLER = {:.2e}, {:.1} turbo iterations per codeblock)",
            self.params.es_over_n0_db,
            self.num_block_errors,
            self.num_blocks,
            self.block_error_rate(),
            self.avg_turbo_iterations
        )
    }
}

/// Runs BPSK-AWGN simulations of the turbo coding chain for all given parameter sets.
///
/// Each simulated transport block is sent `num_transmissions` times, with the redundancy
/// version cycling through [`RV_SEQUENCE`] and the receiver soft combining everything it
/// has seen for that block; the block is in error if the decoder output after the last
/// transmission differs from the transmitted data. Blocks within a run are spread over
/// worker threads, each holding its own codec and soft buffers.
///
/// # Parameters
///
/// - `all_params`: Parameters for each simulation case of interest.
///
/// - `json_filename`: Name of JSON file to which simulation results must be saved.
///
/// # Returns
///
/// - `all_results`: Simulation results for each given parameter set.
///
/// # Errors
///
/// Returns an error if any parameter set is invalid or if the results cannot be saved to
/// the given file.
///
/// # Examples
/// ```no_run
/// use lte_turbo::{run_bpsk_awgn_sims, MapVariant, SimParams};
///
/// let params = SimParams {
///     tbs: 1024,
///     num_coded_bits: 2112,
///     num_transmissions: 1,
///     map_variant: MapVariant::StateLanes,
///     max_turbo_iterations: 8,
///     es_over_n0_db: 0.0,
///     num_block_errors_min: 100,
///     num_blocks_per_run: 1000,
///     num_runs_min: 1,
///     num_runs_max: 100,
/// };
/// let all_results = run_bpsk_awgn_sims(&[params], "results.json")?;
/// assert_eq!(all_results.len(), 1);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn run_bpsk_awgn_sims(
    all_params: &[SimParams],
    json_filename: &str,
) -> Result<Vec<SimResults>, Error> {
    let tables = Arc::new(TurboTables::new()?);
    let mut all_results = Vec::with_capacity(all_params.len());
    for &params in all_params {
        all_results.push(run_sims_for_given_params(&tables, params)?);
    }
    save_results_to_json_file(&all_results, json_filename)?;
    Ok(all_results)
}

/// Runs simulation for given parameters until enough block errors have been seen.
fn run_sims_for_given_params(
    tables: &Arc<TurboTables>,
    params: SimParams,
) -> Result<SimResults, Error> {
    check_sim_params(&params)?;
    let num_workers = rayon::current_num_threads();
    let num_workers_u32 = u32::try_from(num_workers).unwrap_or(1);
    let mut workers = (0 .. num_workers)
        .map(|_| SimWorker::new(Arc::clone(tables), &params))
        .collect::<Result<Vec<_>, Error>>()?;
    let counts: Vec<u32> = (0 .. num_workers_u32)
        .map(|w| {
            params.num_blocks_per_run / num_workers_u32
                + u32::from(w < params.num_blocks_per_run % num_workers_u32)
        })
        .collect();
    let mut results = SimResults {
        params,
        num_blocks: 0,
        num_block_errors: 0,
        avg_turbo_iterations: 0.0,
    };
    let mut num_runs = 0;
    while more_runs_needed(num_runs, &results, &params) {
        let tallies = workers
            .par_iter_mut()
            .zip(counts.par_iter().copied())
            .map(|(worker, num_blocks)| worker.simulate_blocks(&params, num_blocks))
            .collect::<Result<Vec<_>, Error>>()?;
        for tally in tallies {
            results.num_blocks += tally.num_blocks;
            results.num_block_errors += tally.num_block_errors;
        }
        results.avg_turbo_iterations = workers
            .iter()
            .map(|worker| worker.codec.average_iterations())
            .sum::<f64>()
            / f64::from(num_workers_u32);
        num_runs += 1;
        eprintln!("{results}");
    }
    Ok(results)
}

/// Indicates whether given simulation state calls for another run of blocks.
fn more_runs_needed(num_runs: u32, results: &SimResults, params: &SimParams) -> bool {
    num_runs < params.num_runs_max
        && (num_runs < params.num_runs_min
            || results.num_block_errors < params.num_block_errors_min)
}

/// Checks validity of simulation parameters.
fn check_sim_params(params: &SimParams) -> Result<(), Error> {
    if params.num_transmissions == 0 {
        return Err(Error::InvalidInput(
            "Number of transmissions cannot be zero".to_string(),
        ));
    }
    if params.num_blocks_per_run == 0 {
        return Err(Error::InvalidInput(
            "Number of blocks per run cannot be zero".to_string(),
        ));
    }
    if params.num_runs_min > params.num_runs_max {
        return Err(Error::InvalidInput(format!(
            "Minimum number of runs ({}) exceeds maximum number of runs ({})",
            params.num_runs_min, params.num_runs_max
        )));
    }
    Ok(())
}

/// Saves simulation results to a JSON file.
fn save_results_to_json_file(
    all_results: &[SimResults],
    json_filename: &str,
) -> Result<(), Error> {
    let json_string = serde_json::to_string_pretty(all_results)?;
    std::fs::write(json_filename, json_string)?;
    Ok(())
}

/// Per-thread codec and soft buffers for block simulation
struct SimWorker {
    codec: TbCodec,
    tx_buffer: SoftBufferTx,
    rx_buffer: SoftBufferRx,
    decoded: Vec<Bit>,
}

/// Block and block error counts from one run on one worker
#[derive(Clone, Copy, Debug, Default)]
struct RunTally {
    num_blocks: u32,
    num_block_errors: u32,
}

impl SimWorker {
    /// Returns a new worker for given simulation parameters.
    fn new(tables: Arc<TurboTables>, params: &SimParams) -> Result<Self, Error> {
        Ok(Self {
            codec: TbCodec::with_variant(
                tables,
                params.map_variant,
                params.max_turbo_iterations,
            )?,
            tx_buffer: SoftBufferTx::new(MAX_BLOCK_LEN),
            rx_buffer: SoftBufferRx::new(MAX_BLOCK_LEN),
            decoded: Vec::new(),
        })
    }

    /// Simulates given number of blocks and returns the error tally.
    fn simulate_blocks(&mut self, params: &SimParams, num_blocks: u32) -> Result<RunTally, Error> {
        let mut tally = RunTally::default();
        for _ in 0 .. num_blocks {
            if !self.simulate_block(params)? {
                tally.num_block_errors += 1;
            }
            tally.num_blocks += 1;
        }
        Ok(tally)
    }

    /// Simulates all transmissions of one block, returning `true` on correct decoding.
    fn simulate_block(&mut self, params: &SimParams) -> Result<bool, Error> {
        let data = utils::random_bits(params.tbs);
        self.tx_buffer.reset(params.tbs)?;
        self.rx_buffer.reset(params.tbs)?;
        let mut crc_ok = false;
        for transmission in 0 .. params.num_transmissions {
            let grant = Grant {
                tbs: params.tbs,
                modulation_order: MODULATION_ORDER,
                num_coded_bits: params.num_coded_bits,
                redundancy_version: RV_SEQUENCE[transmission % RV_SEQUENCE.len()],
            };
            let codeword = self.codec.encode_tb(&grant, &data, &mut self.tx_buffer)?;
            let llrs = utils::bpsk_awgn_llrs(&codeword, params.es_over_n0_db);
            crc_ok = self
                .codec
                .decode_tb(&grant, &mut self.rx_buffer, &llrs, &mut self.decoded)?;
            if crc_ok {
                break;
            }
        }
        // A passing checksum with wrong data still counts as a block error.
        Ok(crc_ok && self.decoded == data)
    }
}

#[cfg(test)]
mod tests_of_functions {
    use float_eq::assert_float_eq;

    use super::*;

    fn params_for_test() -> SimParams {
        SimParams {
            tbs: 40,
            num_coded_bits: 132,
            num_transmissions: 1,
            map_variant: MapVariant::StateLanes,
            max_turbo_iterations: 8,
            es_over_n0_db: 8.0,
            num_block_errors_min: 1,
            num_blocks_per_run: 10,
            num_runs_min: 1,
            num_runs_max: 1,
        }
    }

    #[test]
    fn test_check_sim_params() {
        // Invalid input
        let mut params = params_for_test();
        params.num_transmissions = 0;
        assert!(check_sim_params(&params).is_err());
        let mut params = params_for_test();
        params.num_blocks_per_run = 0;
        assert!(check_sim_params(&params).is_err());
        let mut params = params_for_test();
        params.num_runs_min = 2;
        params.num_runs_max = 1;
        assert!(check_sim_params(&params).is_err());
        // Valid input
        assert!(check_sim_params(&params_for_test()).is_ok());
    }

    #[test]
    fn test_more_runs_needed() {
        let mut params = params_for_test();
        params.num_block_errors_min = 5;
        params.num_runs_min = 2;
        params.num_runs_max = 4;
        let mut results = SimResults {
            params,
            num_blocks: 10,
            num_block_errors: 8,
            avg_turbo_iterations: 0.0,
        };
        // Below the minimum number of runs
        assert!(more_runs_needed(1, &results, &params));
        // Enough runs and enough errors
        assert!(!more_runs_needed(2, &results, &params));
        // Enough runs but too few errors
        results.num_block_errors = 3;
        assert!(more_runs_needed(2, &results, &params));
        // At the maximum number of runs
        assert!(!more_runs_needed(4, &results, &params));
    }

    #[test]
    fn test_run_sims_for_given_params() {
        let tables = Arc::new(TurboTables::new().unwrap());
        // Invalid input
        let mut params = params_for_test();
        params.num_blocks_per_run = 0;
        assert!(run_sims_for_given_params(&tables, params).is_err());
        // High SNR, single transmission
        let results = run_sims_for_given_params(&tables, params_for_test()).unwrap();
        assert_eq!(results.num_blocks, 10);
        assert_eq!(results.num_block_errors, 0);
        assert!(results.avg_turbo_iterations > 0.0);
        assert_float_eq!(results.block_error_rate(), 0.0, abs <= 1e-12);
        // Very low SNR, two transmissions
        let mut params = params_for_test();
        params.es_over_n0_db = -20.0;
        params.num_transmissions = 2;
        let results = run_sims_for_given_params(&tables, params).unwrap();
        assert_eq!(results.num_blocks, 10);
        assert_eq!(results.num_block_errors, 10);
        assert_float_eq!(results.block_error_rate(), 1.0, abs <= 1e-12);
    }

    #[test]
    fn test_run_bpsk_awgn_sims() {
        let json_path = std::env::temp_dir().join("lte_turbo_sim_results.json");
        let json_filename = json_path.to_str().unwrap();
        // Invalid input
        let mut params = params_for_test();
        params.num_runs_min = 2;
        params.num_runs_max = 1;
        assert!(run_bpsk_awgn_sims(&[params], json_filename).is_err());
        // Valid input
        let all_results = run_bpsk_awgn_sims(&[params_for_test()], json_filename).unwrap();
        assert_eq!(all_results.len(), 1);
        let json_string = std::fs::read_to_string(json_filename).unwrap();
        let saved_results: Vec<SimResults> = serde_json::from_str(&json_string).unwrap();
        assert_eq!(saved_results, all_results);
        std::fs::remove_file(json_filename).unwrap();
    }
}
