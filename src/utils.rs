//! # Some useful functions for exercising the coding chain
//!
//! The [`random_bits`] function returns a given number of random bits; the [`ideal_llrs`]
//! function maps bits to the strong soft values of a noiseless channel; the
//! [`bpsk_awgn_llrs`] function returns quantized LLR values at the output of a BPSK-AWGN
//! channel corresponding to given input bits; the [`llr_slicer`] function slices soft
//! values to bits; and the [`error_count`] function returns the number of errors in a
//! sequence with respect to a reference sequence.
//!
//! # Examples
//!
//! The code below illustrates the usage of the functions in this module.
//! ```
//! use lte_turbo::utils;
//!
//! let num_bits = 40;
//! let es_over_n0_db = 10.0;
//! let bits = utils::random_bits(num_bits);
//! let llrs = utils::bpsk_awgn_llrs(&bits, es_over_n0_db);
//! let bits_hat = utils::llr_slicer(&llrs);
//! let err_count = utils::error_count(&bits_hat, &bits);
//! ```

use rand::Rng;
use rand_distr::StandardNormal;

use crate::common::clamp_llr;
use crate::{Bit, Llr};

/// Quantization gain, in fixed-point units per natural-log unit
const LLR_UNIT: f64 = 100.0;

/// Magnitude of an ideal soft value
const IDEAL_MAGNITUDE: Llr = 1000;

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
pub fn random_bits(num_bits: usize) -> Vec<Bit> {
    let mut rng = rand::rng();
    (0 .. num_bits)
        .map(|_| {
            if rng.random_bool(0.5) {
                Bit::One
            } else {
                Bit::Zero
            }
        })
        .collect()
}

/// Returns the soft values of given bits as seen over a noiseless channel.
///
/// # Parameters
///
/// - `bits`: Bits whose soft values are sought.
///
/// # Returns
///
/// - `llrs`: One strong LLR value per bit, positive for `One` and negative for `Zero`.
#[must_use]
pub fn ideal_llrs(bits: &[Bit]) -> Vec<Llr> {
    bits.iter()
        .map(|bit| match bit {
            Bit::Zero => -IDEAL_MAGNITUDE,
            Bit::One => IDEAL_MAGNITUDE,
        })
        .collect()
}

/// Returns quantized LLR values at BPSK-AWGN channel output corresponding to given input
/// bits.
///
/// # Parameters
///
/// - `bits`: Bits to be transmitted over the BPSK-AWGN channel, with `One` sent as `+1.0`
///   and `Zero` as `-1.0`.
///
/// - `es_over_n0_db`: Ratio (dB) of symbol energy to noise power spectral density at the
///   BPSK-AWGN channel output (the noise variance is `0.5 / 10f64.powf(0.1 *
///   es_over_n0_db)`).
///
/// # Returns
///
/// - `llrs`: LLR values at the channel output, quantized at 100 fixed-point units per
///   natural-log unit, with positive values indicating that `One` is more likely.
#[must_use]
pub fn bpsk_awgn_llrs(bits: &[Bit], es_over_n0_db: f64) -> Vec<Llr> {
    let mut rng = rand::rng();
    let es_over_n0 = 10f64.powf(0.1 * es_over_n0_db);
    let noise_var = 0.5 / es_over_n0;
    bits.iter()
        .map(|bit| match bit {
            Bit::Zero => -1f64,
            Bit::One => 1f64,
        })
        .map(|x| {
            let llr = 4.0
                * es_over_n0
                * (x + noise_var.sqrt() * rng.sample::<f64, _>(StandardNormal));
            quantize(llr * LLR_UNIT)
        })
        .collect()
}

/// Returns slicer output for given soft values.
///
/// # Parameters
///
/// - `llrs`: Soft values to be sliced. Positive values are mapped to `One`, and all
///   others to `Zero`.
///
/// # Returns
///
/// - `bits_hat`: Bits obtained by slicing the given soft values.
#[must_use]
pub fn llr_slicer(llrs: &[Llr]) -> Vec<Bit> {
    llrs.iter()
        .map(|&llr| if llr > 0 { Bit::One } else { Bit::Zero })
        .collect()
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
/// - `err_count`: Number of positions in which the two sequences differ. If they are of
///   different lengths, then the longer sequence is effectively truncated to the length
///   of the shorter one.
pub fn error_count<T: PartialEq>(seq: &[T], ref_seq: &[T]) -> usize {
    ref_seq
        .iter()
        .zip(seq.iter())
        .filter(|&(x, y)| x != y)
        .count()
}

/// Rounds a real value into the fixed-point LLR domain.
#[allow(clippy::cast_possible_truncation)]
fn quantize(value: f64) -> Llr {
    clamp_llr(value.round().clamp(f64::from(i32::MIN), f64::from(i32::MAX)) as i32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use Bit::{One, Zero};

    #[test]
    fn test_random_bits() {
        let num_bits = 0;
        assert!(random_bits(num_bits).is_empty());
        let num_bits = 10000;
        let bits = random_bits(num_bits);
        let num_zeros = bits.iter().filter(|&b| *b == Zero).count();
        let num_ones = bits.iter().filter(|&b| *b == One).count();
        assert!(num_zeros > 9 * num_bits / 20 && num_ones > 9 * num_bits / 20);
    }

    #[test]
    fn test_ideal_llrs() {
        assert!(ideal_llrs(&[]).is_empty());
        assert_eq!(ideal_llrs(&[Zero, One, One]), [-1000, 1000, 1000]);
    }

    #[test]
    fn test_bpsk_awgn_llrs() {
        assert!(bpsk_awgn_llrs(&random_bits(0), 0.0).is_empty());
        let es_over_n0_db = 6f64;
        let num_bits = 10000;
        let bits = random_bits(num_bits);
        let llrs = bpsk_awgn_llrs(&bits, es_over_n0_db);
        let es_over_n0 = 10f64.powf(0.1 * es_over_n0_db);
        let clean = 4.0 * es_over_n0 * LLR_UNIT;
        let noise_var_est = llrs
            .iter()
            .zip(bits)
            .map(|(&y, b)| match b {
                Zero => f64::from(y) + clean,
                One => f64::from(y) - clean,
            })
            .map(|x| (x / LLR_UNIT) * (x / LLR_UNIT))
            .sum::<f64>()
            / f64::from(u32::try_from(num_bits).unwrap());
        assert!(noise_var_est > 7.2 * es_over_n0 && noise_var_est < 8.8 * es_over_n0);
    }

    #[test]
    fn test_llr_slicer() {
        assert!(llr_slicer(&[]).is_empty());
        assert_eq!(llr_slicer(&[0, 25, -25]), [Zero, One, Zero]);
    }

    #[test]
    fn test_error_count() {
        assert_eq!(error_count(&[], &[One, Zero]), 0);
        assert_eq!(error_count(&[One, Zero], &[]), 0);
        // Longer `seq`
        let ref_seq = [One, Zero, Zero, One, One, One, Zero, Zero];
        let seq = [One, One, Zero, Zero, One, One, Zero, Zero, Zero, One];
        assert_eq!(error_count(&seq, &ref_seq), 2);
        // Shorter `seq`
        let ref_seq = [One, Zero, Zero, One, One, One, Zero, Zero, Zero, One];
        let seq = [One, One, Zero, Zero, One, One, Zero, Zero];
        assert_eq!(error_count(&seq, &ref_seq), 2);
    }
}
