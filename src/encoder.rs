//! Rate-1/3 turbo encoder (parallel concatenation of two constituent encoders)

use crate::interleaver::Interleaver;
use crate::{coded_block_len, tables, Bit, Error};

/// Feedback polynomial of each constituent encoder, `1 + D^2 + D^3` (MSB first)
pub(crate) const FEEDBACK_POLY: usize = 0o13;

/// Feedforward polynomial of each constituent encoder, `1 + D + D^3` (MSB first)
pub(crate) const FEEDFORWARD_POLY: usize = 0o15;

/// Number of memory elements per constituent encoder
pub(crate) const MEMORY_LEN: usize = 3;

/// State machine for one recursive systematic constituent encoder.
///
/// The state index holds the three memory elements with the most recent one in the most
/// significant position. An input step produces the systematic and parity outputs; a
/// termination step feeds back the bit that drives the register toward zero.
#[derive(Clone, Eq, PartialEq, Debug, Copy)]
struct StateMachine {
    state_index: usize,
}

impl StateMachine {
    /// Returns a state machine in the all-zero state.
    fn new() -> Self {
        Self { state_index: 0 }
    }

    /// Runs one trellis step, returning the systematic and parity output bits.
    ///
    /// An input of `None` is a termination step: the information bit is replaced by the
    /// feedback value, so three such steps return the machine to the all-zero state.
    fn step(&mut self, in_bit: Option<Bit>) -> (Bit, Bit) {
        let msb_of_next_state = match in_bit {
            Some(bit) => {
                let augmented = (bit_value(bit) << MEMORY_LEN) | self.state_index;
                parity_bit(augmented & FEEDBACK_POLY)
            }
            None => 0,
        };
        let augmented = (msb_of_next_state << MEMORY_LEN) | self.state_index;
        let systematic = parity_bit(augmented & FEEDBACK_POLY);
        let parity = parity_bit(augmented & FEEDFORWARD_POLY);
        self.state_index = augmented >> 1;
        (to_bit(systematic), to_bit(parity))
    }
}

/// Encodes one codeblock with the LTE rate-1/3 turbo code.
///
/// # Parameters
///
/// - `info_bits`: Codeblock to encode. Its length must be in the standard size table.
///
/// - `interleaver`: QPP interleaver for this codeblock length, between the two
///   constituent encoders.
///
/// # Returns
///
/// The `3 * (K + 4)` code bits in triplet layout: position `3k + s` holds bit `k` of
/// stream `s`, where stream 0 is systematic and streams 1 and 2 are the two parity
/// streams. The twelve trellis termination bits fill positions `3K ..` in the standard
/// arrangement.
///
/// # Errors
///
/// Returns an error if the codeblock length is not in the standard size table or does not
/// match the interleaver.
///
/// # Examples
///
/// ```
/// use lte_turbo::{encoder, tables, utils};
///
/// let info_bits = utils::random_bits(40);
/// let interleaver = tables::interleaver(40)?;
/// let code_bits = encoder::encode(&info_bits, &interleaver)?;
/// assert_eq!(code_bits.len(), 132);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn encode(info_bits: &[Bit], interleaver: &Interleaver) -> Result<Vec<Bit>, Error> {
    let mut code_bits = Vec::new();
    encode_into(info_bits, interleaver, &mut code_bits)?;
    Ok(code_bits)
}

/// Encodes one codeblock into a caller buffer (any pre-existing contents will be cleared).
///
/// Same contract as [`encode`].
///
/// # Errors
///
/// Returns an error if the codeblock length is not in the standard size table or does not
/// match the interleaver.
pub fn encode_into(
    info_bits: &[Bit],
    interleaver: &Interleaver,
    code_bits: &mut Vec<Bit>,
) -> Result<(), Error> {
    tables::cb_index(info_bits.len())?;
    if interleaver.length() != info_bits.len() {
        return Err(Error::InvalidInput(format!(
            "Interleaver length {} does not match codeblock length {}",
            interleaver.length(),
            info_bits.len()
        )));
    }
    let mut interleaved_bits = Vec::with_capacity(info_bits.len());
    interleaver.interleave(info_bits, &mut interleaved_bits)?;
    code_bits.clear();
    code_bits.reserve(coded_block_len(info_bits.len()));
    let mut top_encoder = StateMachine::new();
    let mut bottom_encoder = StateMachine::new();
    for (&info_bit, &interleaved_bit) in info_bits.iter().zip(&interleaved_bits) {
        let (systematic, top_parity) = top_encoder.step(Some(info_bit));
        let (_, bottom_parity) = bottom_encoder.step(Some(interleaved_bit));
        code_bits.push(systematic);
        code_bits.push(top_parity);
        code_bits.push(bottom_parity);
    }
    // Each encoder closes its own trellis; the standard arrangement of the twelve
    // termination bits is the top encoder's systematic/parity pairs followed by the
    // bottom encoder's.
    for encoder in [&mut top_encoder, &mut bottom_encoder] {
        for _ in 0 .. MEMORY_LEN {
            let (systematic, parity) = encoder.step(None);
            code_bits.push(systematic);
            code_bits.push(parity);
        }
    }
    Ok(())
}

/// Returns the binary parity of a value (XOR of its bits).
pub(crate) fn parity_bit(value: usize) -> usize {
    if value.count_ones() % 2 == 1 {
        1
    } else {
        0
    }
}

/// Returns the numeric value of a bit.
fn bit_value(bit: Bit) -> usize {
    match bit {
        Bit::Zero => 0,
        Bit::One => 1,
    }
}

/// Returns the bit with a given numeric value (which must be 0 or 1).
fn to_bit(value: usize) -> Bit {
    if value == 1 {
        Bit::One
    } else {
        Bit::Zero
    }
}


#[cfg(test)]
mod tests_of_functions {
    use super::*;
    use crate::utils;
    use crate::Bit::{One, Zero};

    /// Reference encoder for one constituent code, built from the published next-state
    /// tables rather than the polynomial arithmetic under test.
    fn reference_constituent(bits: &[Bit]) -> (Vec<(Bit, Bit)>, Vec<(Bit, Bit)>) {
        const NEXT_STATE_FOR_ZERO: [usize; 8] = [0, 4, 5, 1, 2, 6, 7, 3];
        const NEXT_STATE_FOR_ONE: [usize; 8] = [4, 0, 1, 5, 6, 2, 3, 7];
        let parity_for_one = [One, One, Zero, Zero, Zero, Zero, One, One];
        let mut state = 0usize;
        let mut outputs = Vec::new();
        for &bit in bits {
            let parity = match (bit, parity_for_one[state]) {
                (One, p) => p,
                (Zero, One) => Zero,
                (Zero, Zero) => One,
            };
            outputs.push((bit, parity));
            state = match bit {
                Zero => NEXT_STATE_FOR_ZERO[state],
                One => NEXT_STATE_FOR_ONE[state],
            };
        }
        // Termination: the systematic bit is XOR of the two oldest memory elements,
        // the next state discards the oldest element and shifts in zero
        let mut tail = Vec::new();
        for _ in 0 .. 3 {
            let closing_bit = to_bit(((state >> 1) ^ state) & 1);
            let parity = match (closing_bit, parity_for_one[state]) {
                (One, p) => p,
                (Zero, One) => Zero,
                (Zero, Zero) => One,
            };
            tail.push((closing_bit, parity));
            state >>= 1;
        }
        (outputs, tail)
    }

    #[test]
    fn test_encode_invalid_input() {
        let interleaver = crate::tables::interleaver(40).unwrap();
        // Length not in the size table
        assert!(encode(&[Zero; 32], &interleaver).is_err());
        // Interleaver does not match the codeblock length
        assert!(encode(&[Zero; 48], &interleaver).is_err());
    }

    #[test]
    fn test_encode_all_zero_input() {
        let interleaver = crate::tables::interleaver(40).unwrap();
        let code_bits = encode(&[Zero; 40], &interleaver).unwrap();
        assert_eq!(code_bits, vec![Zero; 132]);
    }

    #[test]
    fn test_encode_against_reference_tables() {
        let block_len = 40;
        let interleaver = crate::tables::interleaver(block_len).unwrap();
        let info_bits = utils::random_bits(block_len);
        let code_bits = encode(&info_bits, &interleaver).unwrap();
        assert_eq!(code_bits.len(), coded_block_len(block_len));

        let mut interleaved_bits = Vec::new();
        interleaver.interleave(&info_bits, &mut interleaved_bits).unwrap();
        let (top_outputs, top_tail) = reference_constituent(&info_bits);
        let (_, bottom_tail) = reference_constituent(&interleaved_bits);
        let bottom_parities: Vec<Bit> = reference_constituent(&interleaved_bits)
            .0
            .iter()
            .map(|&(_, parity)| parity)
            .collect();
        for k in 0 .. block_len {
            assert_eq!(code_bits[3 * k], info_bits[k]);
            assert_eq!(code_bits[3 * k + 1], top_outputs[k].1);
            assert_eq!(code_bits[3 * k + 2], bottom_parities[k]);
        }
        // Termination bits follow the standard arrangement: top pairs, then bottom pairs
        for index in 0 .. 3 {
            assert_eq!(code_bits[3 * block_len + 2 * index], top_tail[index].0);
            assert_eq!(code_bits[3 * block_len + 2 * index + 1], top_tail[index].1);
            assert_eq!(code_bits[3 * block_len + 6 + 2 * index], bottom_tail[index].0);
            assert_eq!(
                code_bits[3 * block_len + 6 + 2 * index + 1],
                bottom_tail[index].1
            );
        }
    }

    #[test]
    fn test_encode_into_reuses_buffer() {
        let interleaver = crate::tables::interleaver(40).unwrap();
        let mut code_bits = vec![One; 5];
        encode_into(&[Zero; 40], &interleaver, &mut code_bits).unwrap();
        assert_eq!(code_bits, vec![Zero; 132]);
    }
}
