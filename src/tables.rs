//! Standard codeblock size table, QPP interleaver construction, and the shared table arena

use crate::interleaver::Interleaver;
use crate::rate_match::SubBlockMap;
use crate::{Error, MAX_BLOCK_LEN, MIN_BLOCK_LEN};

/// Number of codeblock lengths in Table 5.1.3-3 of 3GPP TS 36.212
pub const NUM_CB_SIZES: usize = 188;

/// Returns the codeblock length at a given position in the standard size table.
///
/// The table runs from 40 to 512 in steps of 8, to 1024 in steps of 16, to 2048 in steps
/// of 32, and to 6144 in steps of 64.
///
/// # Errors
///
/// Returns an error if `index` is not less than [`NUM_CB_SIZES`].
pub fn cb_size(index: usize) -> Result<usize, Error> {
    match index {
        0 ..= 59 => Ok(40 + 8 * index),
        60 ..= 91 => Ok(528 + 16 * (index - 60)),
        92 ..= 123 => Ok(1056 + 32 * (index - 92)),
        124 ..= 187 => Ok(2112 + 64 * (index - 124)),
        _ => Err(Error::InvalidInput(format!(
            "Codeblock size table index {index} exceeds {}",
            NUM_CB_SIZES - 1
        ))),
    }
}

/// Returns the position of a codeblock length in the standard size table.
///
/// # Errors
///
/// Returns an error if `block_len` is not a legal codeblock length.
pub fn cb_index(block_len: usize) -> Result<usize, Error> {
    let index = match block_len {
        40 ..= 512 if block_len % 8 == 0 => (block_len - 40) / 8,
        528 ..= 1024 if block_len % 16 == 0 => 60 + (block_len - 528) / 16,
        1056 ..= 2048 if block_len % 32 == 0 => 92 + (block_len - 1056) / 32,
        2112 ..= 6144 if block_len % 64 == 0 => 124 + (block_len - 2112) / 64,
        _ => {
            return Err(Error::UnsupportedLength(invalid_block_len_message(
                block_len,
            )))
        }
    };
    Ok(index)
}

/// Returns the position of the smallest table entry that is at least `num_bits`.
///
/// # Errors
///
/// Returns an error if `num_bits` exceeds the largest codeblock length.
pub fn cb_index_at_least(num_bits: usize) -> Result<usize, Error> {
    if num_bits > MAX_BLOCK_LEN {
        return Err(Error::UnsupportedLength(format!(
            "No codeblock length in Table 5.1.3-3 of 3GPP TS 36.212 can hold {num_bits} bits"
        )));
    }
    let index = if num_bits <= 512 {
        num_bits.saturating_sub(MIN_BLOCK_LEN).div_ceil(8)
    } else if num_bits <= 1024 {
        60 + num_bits.saturating_sub(528).div_ceil(16)
    } else if num_bits <= 2048 {
        92 + num_bits.saturating_sub(1056).div_ceil(32)
    } else {
        124 + num_bits.saturating_sub(2112).div_ceil(64)
    };
    Ok(index)
}

/// Returns the quadratic permutation polynomial (QPP) interleaver for a codeblock length.
///
/// # Parameters
///
/// - `block_len`: Codeblock length in bits. Must be one of the values specified in Table
///   5.1.3-3 of 3GPP TS 36.212.
///
/// # Errors
///
/// Returns an error if `block_len` is invalid.
///
/// # Examples
///
/// ```
/// use lte_turbo::tables;
///
/// let interleaver = tables::interleaver(40)?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn interleaver(block_len: usize) -> Result<Interleaver, Error> {
    let (coeff1, coeff2) = if block_len <= 128 {
        qpp_coefficients_40_to_128_bits(block_len)?
    } else if block_len <= 256 {
        qpp_coefficients_136_to_256_bits(block_len)?
    } else if block_len <= 512 {
        qpp_coefficients_264_to_512_bits(block_len)?
    } else if block_len <= 1024 {
        qpp_coefficients_528_to_1024_bits(block_len)?
    } else if block_len <= 2048 {
        qpp_coefficients_1056_to_2048_bits(block_len)?
    } else if block_len <= 4096 {
        qpp_coefficients_2112_to_4096_bits(block_len)?
    } else {
        qpp_coefficients_4160_to_6144_bits(block_len)?
    };
    let perm: Vec<usize> = (0 .. block_len)
        .map(|out_index| ((coeff1 + coeff2 * out_index) * out_index) % block_len)
        .collect();
    Interleaver::new(&perm)
}

/// Immutable per-length coding tables, built once and shared.
///
/// Holds, for every legal codeblock length, the QPP interleaver and the sub-block
/// interleaving map used by rate matching. Encoder, decoder, and transport-block codec
/// instances borrow entries from here instead of recomputing permutations.
#[derive(Debug)]
pub struct TurboTables {
    entries: Vec<CbTable>,
}

/// Coding tables for one codeblock length
#[derive(Debug)]
pub struct CbTable {
    /// Codeblock length in bits
    pub block_len: usize,
    /// QPP interleaver between the two constituent encoders
    pub interleaver: Interleaver,
    /// Sub-block interleaving and circular-buffer map for rate matching
    pub subblock: SubBlockMap,
}

impl TurboTables {
    /// Returns the full arena, with tables for all [`NUM_CB_SIZES`] codeblock lengths.
    ///
    /// # Errors
    ///
    /// Returns an error if any table entry fails to build (this indicates an internal
    /// inconsistency and should not occur).
    ///
    /// # Examples
    ///
    /// ```
    /// use lte_turbo::tables::TurboTables;
    ///
    /// let tables = TurboTables::new()?;
    /// assert_eq!(tables.by_len(40)?.block_len, 40);
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn new() -> Result<Self, Error> {
        let mut entries = Vec::with_capacity(NUM_CB_SIZES);
        for index in 0 .. NUM_CB_SIZES {
            let block_len = cb_size(index)?;
            entries.push(CbTable {
                block_len,
                interleaver: interleaver(block_len)?,
                subblock: SubBlockMap::new(block_len),
            });
        }
        Ok(Self { entries })
    }

    /// Returns the table entry for a given codeblock length.
    ///
    /// # Errors
    ///
    /// Returns an error if `block_len` is not a legal codeblock length.
    pub fn by_len(&self, block_len: usize) -> Result<&CbTable, Error> {
        Ok(&self.entries[cb_index(block_len)?])
    }
}

/// Returns QPP coefficients for `40 <= block_len <= 128`.
fn qpp_coefficients_40_to_128_bits(block_len: usize) -> Result<(usize, usize), Error> {
    match block_len {
        40 => Ok((3, 10)),
        48 => Ok((7, 12)),
        56 => Ok((19, 42)),
        64 => Ok((7, 16)),
        72 => Ok((7, 18)),
        80 => Ok((11, 20)),
        88 => Ok((5, 22)),
        96 => Ok((11, 24)),
        104 => Ok((7, 26)),
        112 => Ok((41, 84)),
        120 => Ok((103, 90)),
        128 => Ok((15, 32)),
        _ => Err(Error::UnsupportedLength(invalid_block_len_message(
            block_len,
        ))),
    }
}

/// Returns QPP coefficients for `136 <= block_len <= 256`.
fn qpp_coefficients_136_to_256_bits(block_len: usize) -> Result<(usize, usize), Error> {
    match block_len {
        136 => Ok((9, 34)),
        144 => Ok((17, 108)),
        152 => Ok((9, 38)),
        160 => Ok((21, 120)),
        168 => Ok((101, 84)),
        176 => Ok((21, 44)),
        184 => Ok((57, 46)),
        192 => Ok((23, 48)),
        200 => Ok((13, 50)),
        208 => Ok((27, 52)),
        216 => Ok((11, 36)),
        224 => Ok((27, 56)),
        232 => Ok((85, 58)),
        240 => Ok((29, 60)),
        248 => Ok((33, 62)),
        256 => Ok((15, 32)),
        _ => Err(Error::UnsupportedLength(invalid_block_len_message(
            block_len,
        ))),
    }
}

/// Returns QPP coefficients for `264 <= block_len <= 512`.
fn qpp_coefficients_264_to_512_bits(block_len: usize) -> Result<(usize, usize), Error> {
    match block_len {
        264 => Ok((17, 198)),
        272 => Ok((33, 68)),
        280 => Ok((103, 210)),
        288 => Ok((19, 36)),
        296 => Ok((19, 74)),
        304 => Ok((37, 76)),
        312 => Ok((19, 78)),
        320 => Ok((21, 120)),
        328 => Ok((21, 82)),
        336 => Ok((115, 84)),
        344 => Ok((193, 86)),
        352 => Ok((21, 44)),
        360 => Ok((133, 90)),
        368 => Ok((81, 46)),
        376 => Ok((45, 94)),
        384 => Ok((23, 48)),
        392 => Ok((243, 98)),
        400 => Ok((151, 40)),
        408 => Ok((155, 102)),
        416 => Ok((25, 52)),
        424 => Ok((51, 106)),
        432 => Ok((47, 72)),
        440 => Ok((91, 110)),
        448 => Ok((29, 168)),
        456 => Ok((29, 114)),
        464 => Ok((247, 58)),
        472 => Ok((29, 118)),
        480 => Ok((89, 180)),
        488 => Ok((91, 122)),
        496 => Ok((157, 62)),
        504 => Ok((55, 84)),
        512 => Ok((31, 64)),
        _ => Err(Error::UnsupportedLength(invalid_block_len_message(
            block_len,
        ))),
    }
}

/// Returns QPP coefficients for `528 <= block_len <= 1024`.
fn qpp_coefficients_528_to_1024_bits(block_len: usize) -> Result<(usize, usize), Error> {
    match block_len {
        528 => Ok((17, 66)),
        544 => Ok((35, 68)),
        560 => Ok((227, 420)),
        576 => Ok((65, 96)),
        592 => Ok((19, 74)),
        608 => Ok((37, 76)),
        624 => Ok((41, 234)),
        640 => Ok((39, 80)),
        656 => Ok((185, 82)),
        672 => Ok((43, 252)),
        688 => Ok((21, 86)),
        704 => Ok((155, 44)),
        720 => Ok((79, 120)),
        736 => Ok((139, 92)),
        752 => Ok((23, 94)),
        768 => Ok((217, 48)),
        784 => Ok((25, 98)),
        800 => Ok((17, 80)),
        816 => Ok((127, 102)),
        832 => Ok((25, 52)),
        848 => Ok((239, 106)),
        864 => Ok((17, 48)),
        880 => Ok((137, 110)),
        896 => Ok((215, 112)),
        912 => Ok((29, 114)),
        928 => Ok((15, 58)),
        944 => Ok((147, 118)),
        960 => Ok((29, 60)),
        976 => Ok((59, 122)),
        992 => Ok((65, 124)),
        1008 => Ok((55, 84)),
        1024 => Ok((31, 64)),
        _ => Err(Error::UnsupportedLength(invalid_block_len_message(
            block_len,
        ))),
    }
}

/// Returns QPP coefficients for `1056 <= block_len <= 2048`.
fn qpp_coefficients_1056_to_2048_bits(block_len: usize) -> Result<(usize, usize), Error> {
    match block_len {
        1056 => Ok((17, 66)),
        1088 => Ok((171, 204)),
        1120 => Ok((67, 140)),
        1152 => Ok((35, 72)),
        1184 => Ok((19, 74)),
        1216 => Ok((39, 76)),
        1248 => Ok((19, 78)),
        1280 => Ok((199, 240)),
        1312 => Ok((21, 82)),
        1344 => Ok((211, 252)),
        1376 => Ok((21, 86)),
        1408 => Ok((43, 88)),
        1440 => Ok((149, 60)),
        1472 => Ok((45, 92)),
        1504 => Ok((49, 846)),
        1536 => Ok((71, 48)),
        1568 => Ok((13, 28)),
        1600 => Ok((17, 80)),
        1632 => Ok((25, 102)),
        1664 => Ok((183, 104)),
        1696 => Ok((55, 954)),
        1728 => Ok((127, 96)),
        1760 => Ok((27, 110)),
        1792 => Ok((29, 112)),
        1824 => Ok((29, 114)),
        1856 => Ok((57, 116)),
        1888 => Ok((45, 354)),
        1920 => Ok((31, 120)),
        1952 => Ok((59, 610)),
        1984 => Ok((185, 124)),
        2016 => Ok((113, 420)),
        2048 => Ok((31, 64)),
        _ => Err(Error::UnsupportedLength(invalid_block_len_message(
            block_len,
        ))),
    }
}

/// Returns QPP coefficients for `2112 <= block_len <= 4096`.
fn qpp_coefficients_2112_to_4096_bits(block_len: usize) -> Result<(usize, usize), Error> {
    match block_len {
        2112 => Ok((17, 66)),
        2176 => Ok((171, 136)),
        2240 => Ok((209, 420)),
        2304 => Ok((253, 216)),
        2368 => Ok((367, 444)),
        2432 => Ok((265, 456)),
        2496 => Ok((181, 468)),
        2560 => Ok((39, 80)),
        2624 => Ok((27, 164)),
        2688 => Ok((127, 504)),
        2752 => Ok((143, 172)),
        2816 => Ok((43, 88)),
        2880 => Ok((29, 300)),
        2944 => Ok((45, 92)),
        3008 => Ok((157, 188)),
        3072 => Ok((47, 96)),
        3136 => Ok((13, 28)),
        3200 => Ok((111, 240)),
        3264 => Ok((443, 204)),
        3328 => Ok((51, 104)),
        3392 => Ok((51, 212)),
        3456 => Ok((451, 192)),
        3520 => Ok((257, 220)),
        3584 => Ok((57, 336)),
        3648 => Ok((313, 228)),
        3712 => Ok((271, 232)),
        3776 => Ok((179, 236)),
        3840 => Ok((331, 120)),
        3904 => Ok((363, 244)),
        3968 => Ok((375, 248)),
        4032 => Ok((127, 168)),
        4096 => Ok((31, 64)),
        _ => Err(Error::UnsupportedLength(invalid_block_len_message(
            block_len,
        ))),
    }
}

/// Returns QPP coefficients for `4160 <= block_len <= 6144`.
fn qpp_coefficients_4160_to_6144_bits(block_len: usize) -> Result<(usize, usize), Error> {
    match block_len {
        4160 => Ok((33, 130)),
        4224 => Ok((43, 264)),
        4288 => Ok((33, 134)),
        4352 => Ok((477, 408)),
        4416 => Ok((35, 138)),
        4480 => Ok((233, 280)),
        4544 => Ok((357, 142)),
        4608 => Ok((337, 480)),
        4672 => Ok((37, 146)),
        4736 => Ok((71, 444)),
        4800 => Ok((71, 120)),
        4864 => Ok((37, 152)),
        4928 => Ok((39, 462)),
        4992 => Ok((127, 234)),
        5056 => Ok((39, 158)),
        5120 => Ok((39, 80)),
        5184 => Ok((31, 96)),
        5248 => Ok((113, 902)),
        5312 => Ok((41, 166)),
        5376 => Ok((251, 336)),
        5440 => Ok((43, 170)),
        5504 => Ok((21, 86)),
        5568 => Ok((43, 174)),
        5632 => Ok((45, 176)),
        5696 => Ok((45, 178)),
        5760 => Ok((161, 120)),
        5824 => Ok((89, 182)),
        5888 => Ok((323, 184)),
        5952 => Ok((47, 186)),
        6016 => Ok((23, 94)),
        6080 => Ok((47, 190)),
        6144 => Ok((263, 480)),
        _ => Err(Error::UnsupportedLength(invalid_block_len_message(
            block_len,
        ))),
    }
}

/// Returns error message for an illegal codeblock length.
fn invalid_block_len_message(block_len: usize) -> String {
    format!("Codeblock length {block_len} is not in Table 5.1.3-3 of 3GPP TS 36.212")
}
