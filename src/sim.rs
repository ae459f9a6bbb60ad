//! Simulator to evaluate performance of DAB protection profiles over BPSK-AWGN channel
//!
//! Each block is one logical frame of random bits, convolutionally encoded, punctured according
//! to the profile, sent over the BPSK-AWGN channel and decoded by [`Protection::deconvolve`].
//! Blocks of a run are simulated in parallel.

use std::fs::File;
use std::io::{BufReader, BufWriter};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::protection::{Protection, ProtectionProfile};
use crate::viterbi::{Backend, ConvolutionalEncoder};
use crate::{utils, Error};

/// Parameters for protection profile simulation over BPSK-AWGN channel
#[derive(Clone, PartialEq, Debug, Copy, Deserialize, Serialize)]
pub struct SimParams {
    /// Protection profile with its level
    pub profile: ProtectionProfile,
    /// Sub-channel bit rate (kbit/s)
    pub bit_rate: u16,
    /// Ratio (dB) of symbol energy to noise power spectral density at BPSK-AWGN channel output
    pub es_over_n0_db: f64,
    /// Viterbi strategy to be used
    pub backend: Backend,
    /// Desired minimum number of block errors
    pub num_block_errors_min: u32,
    /// Number of blocks to be transmitted per run
    pub num_blocks_per_run: u32,
    /// Minimum number of runs of blocks to be simulated
    pub num_runs_min: u32,
    /// Maximum number of runs of blocks to be simulated
    pub num_runs_max: u32,
}

/// Results from protection profile simulation over BPSK-AWGN channel
#[derive(Clone, PartialEq, Debug, Copy, Deserialize, Serialize)]
pub struct SimResults {
    /// Simulation parameters
    pub params: SimParams,
    /// Number of runs simulated
    pub num_runs: u32,
    /// Number of blocks transmitted
    pub num_blocks: u32,
    /// Number of information bits transmitted
    pub num_info_bits: u64,
    /// Number of blocks in error
    pub num_block_errors: u32,
    /// Number of information bit errors
    pub num_info_bit_errors: u64,
}

impl SimResults {
    /// Returns empty results for given parameters.
    #[must_use]
    pub fn new(params: &SimParams) -> Self {
        Self {
            params: *params,
            num_runs: 0,
            num_blocks: 0,
            num_info_bits: 0,
            num_block_errors: 0,
            num_info_bit_errors: 0,
        }
    }

    /// Returns block error rate.
    #[must_use]
    pub fn block_error_rate(&self) -> f64 {
        if self.num_blocks > 0 {
            f64::from(self.num_block_errors) / f64::from(self.num_blocks)
        } else {
            0.0
        }
    }

    /// Returns information bit error rate.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn info_bit_error_rate(&self) -> f64 {
        if self.num_info_bits > 0 {
            self.num_info_bit_errors as f64 / self.num_info_bits as f64
        } else {
            0.0
        }
    }

    /// Returns whether the simulation has run long enough.
    fn run_complete(&self) -> bool {
        self.num_runs >= self.params.num_runs_max
            || (self.num_runs >= self.params.num_runs_min
                && self.num_block_errors >= self.params.num_block_errors_min)
    }

    /// Updates results with the outcome of one block.
    fn update_after_block(&mut self, num_info_bits: usize, num_info_bit_errors: usize) {
        self.num_blocks += 1;
        self.num_info_bits += num_info_bits as u64;
        if num_info_bit_errors > 0 {
            self.num_block_errors += 1;
            self.num_info_bit_errors += num_info_bit_errors as u64;
        }
    }
}

/// Runs simulations for given parameters and saves results to a JSON file.
///
/// # Parameters
///
/// - `all_params`: Parameters for each simulation.
///
/// - `json_filename`: Name of the JSON file to which all results must be written.
///
/// # Errors
///
/// Returns an error if any parameters are invalid or if the results cannot be written.
pub fn run_bpsk_awgn_sims(all_params: &[SimParams], json_filename: &str) -> Result<(), Error> {
    let mut all_results = Vec::with_capacity(all_params.len());
    for params in all_params {
        let results = run_bpsk_awgn_sim(params)?;
        info!(
            profile = %params.profile,
            bit_rate = params.bit_rate,
            es_over_n0_db = params.es_over_n0_db,
            ber = results.info_bit_error_rate(),
            bler = results.block_error_rate(),
            num_blocks = results.num_blocks,
            "simulation done"
        );
        all_results.push(results);
    }
    let writer = BufWriter::new(File::create(json_filename)?);
    serde_json::to_writer_pretty(writer, &all_results)?;
    Ok(())
}

/// Returns results read from a JSON file written by [`run_bpsk_awgn_sims`].
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn read_results(json_filename: &str) -> Result<Vec<SimResults>, Error> {
    let reader = BufReader::new(File::open(json_filename)?);
    Ok(serde_json::from_reader(reader)?)
}

/// Returns results from simulation for given parameters.
///
/// # Errors
///
/// Returns an error if the parameters are invalid.
pub fn run_bpsk_awgn_sim(params: &SimParams) -> Result<SimResults, Error> {
    check_sim_params(params)?;
    let mut results = SimResults::new(params);
    while !results.run_complete() {
        let outcomes = (0 .. params.num_blocks_per_run)
            .into_par_iter()
            .map_init(
                || Protection::new(params.profile, params.bit_rate, params.backend),
                |protection, _| match protection {
                    Ok(protection) => simulate_block(protection, params.es_over_n0_db),
                    Err(error) => Err(Error::InvalidProtection(error.to_string())),
                },
            )
            .collect::<Result<Vec<(usize, usize)>, Error>>()?;
        for (num_info_bits, num_info_bit_errors) in outcomes {
            results.update_after_block(num_info_bits, num_info_bit_errors);
        }
        results.num_runs += 1;
    }
    Ok(results)
}

/// Returns `(num_info_bits, num_info_bit_errors)` for one block sent over the channel.
fn simulate_block(
    protection: &mut Protection,
    es_over_n0_db: f64,
) -> Result<(usize, usize), Error> {
    let info_bits = utils::random_bits(protection.frame_bits());
    let code_bits: Vec<u8> = ConvolutionalEncoder::encode(&info_bits)
        .into_iter()
        .zip(protection.puncture_table().mask())
        .filter_map(|(bit, &kept)| kept.then_some(bit))
        .collect();
    let soft = utils::bpsk_awgn_channel(&code_bits, es_over_n0_db);
    let mut info_bits_hat = vec![0; info_bits.len()];
    protection.deconvolve(&soft, &mut info_bits_hat)?;
    Ok((
        info_bits.len(),
        utils::error_count(&info_bits_hat, &info_bits),
    ))
}

/// Checks validity of simulation parameters.
fn check_sim_params(params: &SimParams) -> Result<(), Error> {
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
    params.profile.sub_channel_size(params.bit_rate)?;
    Ok(())
}

#[cfg(test)]
mod tests_of_functions {
    use super::*;
    use float_eq::assert_float_eq;

    fn params_for_test() -> SimParams {
        SimParams {
            profile: ProtectionProfile::EepA(2),
            bit_rate: 8,
            es_over_n0_db: 20.0,
            backend: Backend::Scalar,
            num_block_errors_min: 10,
            num_blocks_per_run: 4,
            num_runs_min: 1,
            num_runs_max: 2,
        }
    }

    #[test]
    fn test_check_sim_params() {
        // Invalid input
        let params = SimParams {
            num_blocks_per_run: 0,
            ..params_for_test()
        };
        assert!(check_sim_params(&params).is_err());
        let params = SimParams {
            num_runs_min: 3,
            ..params_for_test()
        };
        assert!(check_sim_params(&params).is_err());
        let params = SimParams {
            bit_rate: 12,
            ..params_for_test()
        };
        assert!(matches!(
            check_sim_params(&params),
            Err(Error::InvalidProtection(_))
        ));
        // Valid input
        assert!(check_sim_params(&params_for_test()).is_ok());
    }

    #[test]
    fn test_sim_results() {
        let mut results = SimResults::new(&params_for_test());
        assert_float_eq!(results.block_error_rate(), 0.0, abs <= 1e-12);
        assert_float_eq!(results.info_bit_error_rate(), 0.0, abs <= 1e-12);
        assert!(!results.run_complete());
        results.update_after_block(192, 0);
        results.update_after_block(192, 3);
        results.update_after_block(192, 0);
        results.update_after_block(192, 1);
        assert_eq!(results.num_blocks, 4);
        assert_eq!(results.num_block_errors, 2);
        assert_float_eq!(results.block_error_rate(), 0.5, abs <= 1e-12);
        assert_float_eq!(results.info_bit_error_rate(), 4.0 / 768.0, abs <= 1e-12);
        results.num_runs = 2;
        assert!(results.run_complete());
    }

    #[test]
    fn test_run_bpsk_awgn_sim() {
        // Error-free at high SNR
        let results = run_bpsk_awgn_sim(&params_for_test()).unwrap();
        assert_eq!(results.num_runs, 2);
        assert_eq!(results.num_blocks, 8);
        assert_eq!(results.num_info_bits, 8 * 192);
        assert_eq!(results.num_block_errors, 0);
        // Every block in error at very low SNR
        let params = SimParams {
            es_over_n0_db: -15.0,
            num_block_errors_min: 4,
            ..params_for_test()
        };
        let results = run_bpsk_awgn_sim(&params).unwrap();
        assert_eq!(results.num_runs, 1);
        assert_eq!(results.num_block_errors, 4);
        assert!(results.info_bit_error_rate() > 0.2);
    }

    #[test]
    fn test_run_bpsk_awgn_sims() {
        let path = std::env::temp_dir().join("dabcore_sim_results_test.json");
        let json_filename = path.to_str().unwrap();
        let all_params = [
            params_for_test(),
            SimParams {
                profile: ProtectionProfile::Uep(3),
                bit_rate: 32,
                ..params_for_test()
            },
        ];
        run_bpsk_awgn_sims(&all_params, json_filename).unwrap();
        let all_results = read_results(json_filename).unwrap();
        assert_eq!(all_results.len(), 2);
        assert_eq!(all_results[1].params, all_params[1]);
        assert_eq!(all_results[1].num_info_bits, 8 * 768);
        std::fs::remove_file(path).unwrap();
    }
}
