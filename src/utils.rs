//! # Some useful functions for handling bits and simulating code performance
//!
//! The [`random_bits`] function returns a given number of random bits; the [`bpsk_awgn_channel`]
//! function returns the soft decisions at the output of a BPSK-AWGN channel corresponding to given
//! input bits; the [`bpsk_slicer`] function slices soft decisions to bits; the [`error_count`]
//! function returns the number of errors in a sequence with respect to a reference sequence; and
//! [`pack_bits`] and [`unpack_bits`] convert between bits and bytes (MSB first).
//!
//! Bits are `u8` values `0` or `1` throughout the crate, and soft decisions are `i16` values with
//! positive values indicating that `0` is more likely.
//!
//! # Examples
//!
//! The code below illustrates the usage of the functions in this module.
//! ```
//! use dabcore::utils;
//!
//! let num_bits = 40;
//! let es_over_n0_db = 10.0;
//! let bits = utils::random_bits(num_bits);
//! let soft = utils::bpsk_awgn_channel(&bits, es_over_n0_db);
//! let bits_hat = utils::bpsk_slicer(&soft);
//! let err_count = utils::error_count(&bits_hat, &bits);
//! assert_eq!(utils::unpack_bits(&utils::pack_bits(&bits)), bits);
//! ```

use bitvec::prelude::*;
use rand::Rng;
use rand_distr::StandardNormal;

/// Magnitude of the soft decision for a noiseless BPSK symbol
pub const SOFT_SCALE: f64 = 64.0;

/// Largest magnitude of a soft decision
pub const SOFT_MAX: i16 = 127;

/// Returns given number of random bits.
///
/// # Parameters
///
/// - `num_bits`: Number of random bits to be generated.
///
/// # Returns
///
/// - `bits`: Random bits.
#[must_use]
pub fn random_bits(num_bits: usize) -> Vec<u8> {
    let mut rng = rand::rng();
    (0 .. num_bits)
        .map(|_| u8::from(rng.random_bool(0.5)))
        .collect()
}

/// Returns soft decisions at BPSK-AWGN channel output corresponding to given input bits.
///
/// # Parameters
///
/// - `bits`: Bits to be transmitted over the BPSK-AWGN channel.
///
/// - `es_over_n0_db`: Ratio (dB) of symbol energy to noise power spectral density at the BPSK-AWGN
///   channel output (if the BPSK symbols are `+1.0` and `-1.0`, then the noise variance is
///   `0.5 / 10f64.powf(0.1 * es_over_n0_db)`).
///
/// # Returns
///
/// - `soft`: Channel outputs scaled by [`SOFT_SCALE`] and clipped to `±SOFT_MAX`, with positive
///   values indicating that `0` is more likely.
#[must_use]
pub fn bpsk_awgn_channel(bits: &[u8], es_over_n0_db: f64) -> Vec<i16> {
    let mut rng = rand::rng();
    let es_over_n0 = 10f64.powf(0.1 * es_over_n0_db);
    let noise_std = (0.5 / es_over_n0).sqrt();
    bits.iter()
        .map(|&b| if b == 0 { 1f64 } else { -1f64 })
        .map(|x| soft_decision(x + noise_std * rng.sample::<f64, _>(StandardNormal)))
        .collect()
}

/// Returns soft decision for a channel output.
#[allow(clippy::cast_possible_truncation)]
fn soft_decision(y: f64) -> i16 {
    let limit = f64::from(SOFT_MAX);
    (SOFT_SCALE * y).round().clamp(-limit, limit) as i16
}

/// Returns BPSK slicer output.
///
/// # Parameters
///
/// - `soft`: Soft decisions to be sliced. Nonnegative values are mapped to `0`, and negative values
///   to `1`.
///
/// # Returns
///
/// - `bits_hat`: Bits obtained by slicing the given soft decisions.
#[must_use]
pub fn bpsk_slicer(soft: &[i16]) -> Vec<u8> {
    soft.iter().map(|&x| u8::from(x < 0)).collect()
}

/// Returns number of errors in a sequence with respect to a reference sequence.
///
/// # Parameters
///
/// - `seq`: Sequence in which errors must be counted.
///
/// - `ref_seq`: Reference sequence to which the given sequence is compared.
///
/// # Returns
///
/// - `err_count`: Number of positions in which the two sequences differ. If they are of different
///   lengths, then the longer sequence is effectively truncated to the length of the shorter one.
pub fn error_count<T: PartialEq>(seq: &[T], ref_seq: &[T]) -> usize {
    ref_seq
        .iter()
        .zip(seq.iter())
        .filter(|&(x, y)| x != y)
        .count()
}

/// Returns bytes holding given bits, MSB first; a partial last byte is padded with zeros.
#[must_use]
pub fn pack_bits(bits: &[u8]) -> Vec<u8> {
    let mut bytes = vec![0u8; bits.len().div_ceil(8)];
    let view = bytes.view_bits_mut::<Msb0>();
    for (k, &bit) in bits.iter().enumerate() {
        view.set(k, bit != 0);
    }
    bytes
}

/// Returns bits of given bytes, MSB first.
#[must_use]
pub fn unpack_bits(bytes: &[u8]) -> Vec<u8> {
    bytes
        .view_bits::<Msb0>()
        .iter()
        .map(|bit| u8::from(*bit))
        .collect()
}
