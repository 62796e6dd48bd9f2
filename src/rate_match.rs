//! Sub-block interleaving and circular-buffer rate matching tables

use crate::{coded_block_len, Error, TAIL_LEN};

/// Number of columns of the sub-block interleaver matrix
const NUM_COLUMNS: usize = 32;

/// Inter-column permutation of the sub-block interleaver (Table 5.1.4-1 of 3GPP TS 36.212)
const COLUMN_PERM: [usize; NUM_COLUMNS] = [
    0, 16, 8, 24, 4, 20, 12, 28, 2, 18, 10, 26, 6, 22, 14, 30, 1, 17, 9, 25, 5, 21, 13, 29, 3,
    19, 11, 27, 7, 23, 15, 31,
];

/// Number of redundancy versions
pub const NUM_REDUNDANCY_VERSIONS: usize = 4;

/// Sub-block interleaving map for one codeblock length, with the dummy padding removed.
///
/// Each of the three encoder output streams of `K + 4` bits is written row-wise into a
/// 32-column matrix (padded at the head with dummy entries), columns are permuted, and the
/// columns are read out to form the circular buffer: first the systematic stream, then the
/// two parity streams interlaced. This map drops the dummy entries up front, so the
/// circular buffer holds exactly `3 * (K + 4)` live positions and every position maps
/// straight to an index in the encoder's triplet layout. The four redundancy-version
/// starting offsets are carried in the same stripped coordinates.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct SubBlockMap {
    /// Codeblock length in bits
    block_len: usize,
    /// Triplet-layout index for each circular-buffer position
    d_index_given_ring_index: Vec<usize>,
    /// Circular-buffer starting position for each redundancy version
    k0_given_rv: [usize; NUM_REDUNDANCY_VERSIONS],
}

impl SubBlockMap {
    /// Builds the map for a codeblock length.
    ///
    /// Any length works geometrically; lengths outside the standard size table are caught
    /// earlier, when looking up the shared tables.
    #[must_use]
    pub fn new(block_len: usize) -> Self {
        let stream_len = block_len + TAIL_LEN;
        let num_rows = stream_len.div_ceil(NUM_COLUMNS);
        let padded_len = num_rows * NUM_COLUMNS;
        let num_dummy = padded_len - stream_len;
        // Standard starting offsets in unstripped circular-buffer coordinates; with a
        // buffer of 3 * padded_len entries the soft-buffer row count term is always 12
        let unstripped_k0: [usize; NUM_REDUNDANCY_VERSIONS] =
            std::array::from_fn(|rv| num_rows * (24 * rv + 2));

        let mut d_index_given_ring_index = Vec::with_capacity(coded_block_len(block_len));
        let mut k0_given_rv = [usize::MAX; NUM_REDUNDANCY_VERSIONS];
        // Systematic stream: columns of the permuted matrix, top to bottom
        for column in 0 .. NUM_COLUMNS {
            for row in 0 .. num_rows {
                let matrix_pos = row * NUM_COLUMNS + COLUMN_PERM[column];
                if matrix_pos >= num_dummy {
                    resolve_k0(
                        &mut k0_given_rv,
                        &unstripped_k0,
                        d_index_given_ring_index.len(),
                        column * num_rows + row,
                    );
                    d_index_given_ring_index.push(3 * (matrix_pos - num_dummy));
                }
            }
        }
        // Parity streams, interlaced pairwise; the second parity stream reads the matrix
        // through the same permutation rotated by one position
        for pair in 0 .. padded_len {
            let matrix_pos =
                (pair % num_rows) * NUM_COLUMNS + COLUMN_PERM[pair / num_rows];
            if matrix_pos >= num_dummy {
                resolve_k0(
                    &mut k0_given_rv,
                    &unstripped_k0,
                    d_index_given_ring_index.len(),
                    padded_len + 2 * pair,
                );
                d_index_given_ring_index.push(3 * (matrix_pos - num_dummy) + 1);
            }
            let rotated_pos =
                (COLUMN_PERM[pair / num_rows] + NUM_COLUMNS * (pair % num_rows) + 1) % padded_len;
            if rotated_pos >= num_dummy {
                resolve_k0(
                    &mut k0_given_rv,
                    &unstripped_k0,
                    d_index_given_ring_index.len(),
                    padded_len + 2 * pair + 1,
                );
                d_index_given_ring_index.push(3 * (rotated_pos - num_dummy) + 2);
            }
        }
        for k0 in &mut k0_given_rv {
            if *k0 == usize::MAX {
                *k0 = 0;
            }
        }
        Self {
            block_len,
            d_index_given_ring_index,
            k0_given_rv,
        }
    }

    /// Returns the codeblock length this map was built for.
    #[must_use]
    pub fn block_len(&self) -> usize {
        self.block_len
    }

    /// Returns the number of live circular-buffer positions, `3 * (K + 4)`.
    #[must_use]
    pub fn ring_len(&self) -> usize {
        self.d_index_given_ring_index.len()
    }

    /// Returns the triplet-layout index stored at a circular-buffer position.
    #[must_use]
    pub fn d_index(&self, ring_index: usize) -> usize {
        self.d_index_given_ring_index[ring_index]
    }

    /// Returns the circular-buffer starting position for a redundancy version.
    ///
    /// # Errors
    ///
    /// Returns an error if `rv` is not in `0 ..= 3`.
    pub fn k0(&self, rv: usize) -> Result<usize, Error> {
        self.k0_given_rv
            .get(rv)
            .copied()
            .ok_or_else(|| Error::InvalidInput(format!("Redundancy version {rv} is not in 0 ..= 3")))
    }
}

/// Records the first surviving circular-buffer position at or after each standard
/// starting offset.
fn resolve_k0(
    k0_given_rv: &mut [usize; NUM_REDUNDANCY_VERSIONS],
    unstripped_k0: &[usize; NUM_REDUNDANCY_VERSIONS],
    ring_index: usize,
    unstripped_index: usize,
) {
    for (k0, &threshold) in k0_given_rv.iter_mut().zip(unstripped_k0) {
        if *k0 == usize::MAX && unstripped_index >= threshold {
            *k0 = ring_index;
        }
    }
}

/// Returns the number of codeword bits granted to one codeblock.
///
/// The `num_coded_bits` of the grant are divided among `num_blocks` codeblocks in whole
/// modulation symbols: the later codeblocks receive the rounded-up share.
///
/// # Errors
///
/// Returns an error if `modulation_order` is zero, if `num_coded_bits` is not a multiple
/// of `modulation_order`, or if `block_index` is not less than `num_blocks`.
///
/// # Examples
///
/// ```
/// use lte_turbo::rate_match;
///
/// assert_eq!(rate_match::bits_for_block(100, 2, 3, 0)?, 32);
/// assert_eq!(rate_match::bits_for_block(100, 2, 3, 2)?, 34);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn bits_for_block(
    num_coded_bits: usize,
    modulation_order: usize,
    num_blocks: usize,
    block_index: usize,
) -> Result<usize, Error> {
    if modulation_order == 0 {
        return Err(Error::InvalidInput(
            "Modulation order cannot be zero".to_string(),
        ));
    }
    if num_coded_bits % modulation_order != 0 {
        return Err(Error::InvalidInput(format!(
            "Number of coded bits {num_coded_bits} is not a multiple of the modulation order {modulation_order}"
        )));
    }
    if block_index >= num_blocks {
        return Err(Error::InvalidInput(format!(
            "Codeblock index {block_index} is not less than the codeblock count {num_blocks}"
        )));
    }
    let num_symbols = num_coded_bits / modulation_order;
    let num_raised_blocks = num_symbols % num_blocks;
    if block_index < num_blocks - num_raised_blocks {
        Ok(modulation_order * (num_symbols / num_blocks))
    } else {
        Ok(modulation_order * num_symbols.div_ceil(num_blocks))
    }
}

#[cfg(test)]
mod tests_of_sub_block_map {
    use super::*;

    #[test]
    fn test_column_perm_is_permutation() {
        let mut entries = COLUMN_PERM.to_vec();
        entries.sort_unstable();
        assert!(entries.into_iter().eq(0 .. NUM_COLUMNS));
    }

    #[test]
    fn test_ring_covers_every_code_bit() {
        // The stripped circular buffer is a permutation of the triplet layout
        for block_len in [40, 48, 256, 512, 1024, 2048, 6144] {
            let map = SubBlockMap::new(block_len);
            assert_eq!(map.ring_len(), coded_block_len(block_len));
            let mut d_indices: Vec<usize> = (0 .. map.ring_len())
                .map(|ring_index| map.d_index(ring_index))
                .collect();
            d_indices.sort_unstable();
            assert!(d_indices.into_iter().eq(0 .. coded_block_len(block_len)));
        }
    }

    #[test]
    fn test_first_ring_positions_for_smallest_block() {
        // K = 40: two rows, 20 dummy entries. The first surviving positions of the
        // systematic stream are matrix positions 32, 48, and 40, which are code bits
        // 12, 28, and 20 of stream 0.
        let map = SubBlockMap::new(40);
        assert_eq!(map.d_index(0), 36);
        assert_eq!(map.d_index(1), 84);
        assert_eq!(map.d_index(2), 60);
    }

    #[test]
    fn test_k0() {
        // K = 40: the unstripped offsets are 4, 52, 100, 148; position 4 is a dummy, so
        // redundancy version zero starts at the third surviving position
        let map = SubBlockMap::new(40);
        assert_eq!(map.k0(0).unwrap(), 2);
        for rv in 1 .. NUM_REDUNDANCY_VERSIONS {
            assert!(map.k0(rv).unwrap() > map.k0(rv - 1).unwrap());
            assert!(map.k0(rv).unwrap() < map.ring_len());
        }
        // Invalid input
        assert!(map.k0(4).is_err());
    }

    #[test]
    fn test_k0_across_sizes() {
        for block_len in [40, 512, 1024, 6144] {
            let map = SubBlockMap::new(block_len);
            for rv in 0 .. NUM_REDUNDANCY_VERSIONS {
                assert!(map.k0(rv).unwrap() < map.ring_len());
            }
        }
    }
}
