//! Transport-block segmentation into legal codeblock lengths

use crate::{tables, Error, CRC_LEN, MAX_BLOCK_LEN, MAX_TB_BITS};

/// Codeblock segmentation of one transport block, per 3GPP TS 36.212, Section 5.1.2.
///
/// A transport block of `tbs` bits is extended by its 24-bit CRC and split into
/// `num_blocks` codeblocks drawn from two adjacent entries of the standard size table.
/// The `num_small_blocks` blocks of the smaller length come first, filler bits sit at the
/// head of the first codeblock, and when there is more than one codeblock each one carries
/// its own trailing CRC24B.
#[derive(Clone, Eq, PartialEq, Debug, Copy)]
pub struct Segmentation {
    /// Transport block size in bits, excluding its CRC
    pub tbs: usize,
    /// Total number of codeblocks
    pub num_blocks: usize,
    /// Number of codeblocks of the smaller length
    pub num_small_blocks: usize,
    /// Number of codeblocks of the larger length
    pub num_large_blocks: usize,
    /// Smaller codeblock length (zero when no codeblock uses it)
    pub small_block_len: usize,
    /// Larger codeblock length
    pub large_block_len: usize,
    /// Number of filler bits at the head of the first codeblock
    pub num_filler_bits: usize,
}

impl Segmentation {
    /// Computes the segmentation for a transport block size.
    ///
    /// # Parameters
    ///
    /// - `tbs`: Transport block size in bits, excluding its CRC. Must be a positive
    ///   multiple of 8 no greater than [`MAX_TB_BITS`].
    ///
    /// # Errors
    ///
    /// Returns an error if `tbs` violates the constraints above.
    ///
    /// # Examples
    ///
    /// ```
    /// use lte_turbo::segmentation::Segmentation;
    ///
    /// let seg = Segmentation::new(256)?;
    /// assert_eq!(seg.num_blocks, 1);
    /// assert_eq!(seg.large_block_len, 280);
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn new(tbs: usize) -> Result<Self, Error> {
        if tbs == 0 {
            return Err(Error::InvalidSegmentation(
                "Transport block size cannot be zero".to_string(),
            ));
        }
        if tbs % 8 != 0 {
            return Err(Error::InvalidSegmentation(format!(
                "Transport block size {tbs} is not a multiple of 8"
            )));
        }
        if tbs > MAX_TB_BITS {
            return Err(Error::InvalidSegmentation(format!(
                "Transport block size {tbs} exceeds the maximum of {MAX_TB_BITS}"
            )));
        }
        let num_bits = tbs + CRC_LEN;
        let (num_blocks, num_bits_with_block_crcs) = if num_bits <= MAX_BLOCK_LEN {
            (1, num_bits)
        } else {
            let num_blocks = num_bits.div_ceil(MAX_BLOCK_LEN - CRC_LEN);
            (num_blocks, num_bits + num_blocks * CRC_LEN)
        };
        let large_index = tables::cb_index_at_least(num_bits_with_block_crcs.div_ceil(num_blocks))?;
        let large_block_len = tables::cb_size(large_index)?;
        let small_block_len = if large_index == 0 {
            0
        } else {
            tables::cb_size(large_index - 1)?
        };
        let num_small_blocks = if small_block_len == 0 {
            0
        } else {
            (num_blocks * large_block_len - num_bits_with_block_crcs)
                / (large_block_len - small_block_len)
        };
        let num_large_blocks = num_blocks - num_small_blocks;
        let num_filler_bits = num_small_blocks * small_block_len
            + num_large_blocks * large_block_len
            - num_bits_with_block_crcs;
        Ok(Self {
            tbs,
            num_blocks,
            num_small_blocks,
            num_large_blocks,
            small_block_len: if num_small_blocks == 0 {
                0
            } else {
                small_block_len
            },
            large_block_len,
            num_filler_bits,
        })
    }

    /// Returns the length of a given codeblock (smaller blocks come first).
    #[must_use]
    pub fn block_len(&self, block_index: usize) -> usize {
        if block_index < self.num_small_blocks {
            self.small_block_len
        } else {
            self.large_block_len
        }
    }

    /// Returns `true` when each codeblock carries its own trailing CRC24B.
    #[must_use]
    pub fn has_block_crc(&self) -> bool {
        self.num_blocks > 1
    }

    /// Returns the number of transport-block stream bits carried by a given codeblock.
    ///
    /// This excludes filler bits (first codeblock only) and the per-codeblock CRC, but the
    /// last codeblock's share includes the transport CRC bits.
    #[must_use]
    pub fn payload_len(&self, block_index: usize) -> usize {
        let mut len = self.block_len(block_index);
        if block_index == 0 {
            len -= self.num_filler_bits;
        }
        if self.has_block_crc() {
            len -= CRC_LEN;
        }
        len
    }
}
