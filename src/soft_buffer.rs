//! HARQ soft buffers holding per-codeblock circular buffers across retransmissions

use crate::rate_match::SubBlockMap;
use crate::segmentation::Segmentation;
use crate::{coded_block_len, Bit, Error, Llr};

/// Transmit-side soft buffer: the rate-matching circular buffer of every codeblock of one
/// transport block.
///
/// The buffers are filled once, at the first transmission, and later redundancy versions
/// only re-read them. Nothing is cleared implicitly; a new transport block requires an
/// explicit [`reset`](SoftBufferTx::reset).
#[derive(Debug)]
pub struct SoftBufferTx {
    max_block_len: usize,
    seg: Option<Segmentation>,
    rings: Vec<Vec<Bit>>,
}

impl SoftBufferTx {
    /// Returns a buffer able to hold codeblocks up to `max_block_len` bits.
    #[must_use]
    pub fn new(max_block_len: usize) -> Self {
        Self {
            max_block_len,
            seg: None,
            rings: Vec::new(),
        }
    }

    /// Prepares the buffer for a transport block, dropping any stored code bits.
    ///
    /// # Errors
    ///
    /// Returns an error if `tbs` cannot be segmented or needs codeblocks longer than this
    /// buffer was sized for.
    pub fn reset(&mut self, tbs: usize) -> Result<(), Error> {
        let seg = Segmentation::new(tbs)?;
        if seg.large_block_len > self.max_block_len {
            return Err(Error::InsufficientBuffer(format!(
                "Transport block of {tbs} bits needs codeblocks of {} bits, but the buffer holds at most {}",
                seg.large_block_len, self.max_block_len
            )));
        }
        self.rings.clear();
        self.rings.resize(seg.num_blocks, Vec::new());
        self.seg = Some(seg);
        Ok(())
    }

    /// Returns the segmentation this buffer was last reset for.
    #[must_use]
    pub fn segmentation(&self) -> Option<&Segmentation> {
        self.seg.as_ref()
    }

    /// Returns `true` when the circular buffer of a codeblock holds code bits.
    #[must_use]
    pub fn is_filled(&self, block_index: usize) -> bool {
        self.rings.get(block_index).is_some_and(|ring| !ring.is_empty())
    }

    /// Fills the circular buffer of one codeblock from encoder output.
    ///
    /// # Parameters
    ///
    /// - `block_index`: Codeblock position within the transport block.
    ///
    /// - `code_bits`: Encoder output in triplet layout, `3 * (K + 4)` bits.
    ///
    /// - `map`: Sub-block interleaving map for this codeblock length.
    ///
    /// # Errors
    ///
    /// Returns an error if the buffer has not been reset, or if the codeblock index, the
    /// map, or the code bits do not match the segmentation.
    pub fn fill(
        &mut self,
        block_index: usize,
        code_bits: &[Bit],
        map: &SubBlockMap,
    ) -> Result<(), Error> {
        let seg = checked_segmentation(self.seg.as_ref(), block_index)?;
        check_map(map, code_bits.len(), seg.block_len(block_index))?;
        let mut ring = vec![Bit::Zero; map.ring_len()];
        for (ring_index, entry) in ring.iter_mut().enumerate() {
            *entry = code_bits[map.d_index(ring_index)];
        }
        self.rings[block_index] = ring;
        Ok(())
    }

    /// Appends `num_bits` selected bits of one codeblock to `output`, reading the circular
    /// buffer from position `k0` with wraparound.
    ///
    /// # Errors
    ///
    /// Returns an error if the buffer has not been reset, if the codeblock index is out of
    /// range, or if the codeblock has not been filled.
    pub fn read_into(
        &self,
        block_index: usize,
        k0: usize,
        num_bits: usize,
        output: &mut Vec<Bit>,
    ) -> Result<(), Error> {
        checked_segmentation(self.seg.as_ref(), block_index)?;
        let ring = &self.rings[block_index];
        if ring.is_empty() {
            return Err(Error::InvalidInput(format!(
                "Circular buffer of codeblock {block_index} has not been filled at redundancy version 0"
            )));
        }
        output.reserve(num_bits);
        for offset in 0 .. num_bits {
            output.push(ring[(k0 + offset) % ring.len()]);
        }
        Ok(())
    }
}

/// Receive-side soft buffer: the combined log-likelihood ratios of every codeblock of one
/// transport block.
///
/// Arriving transmissions are added into the stored values (HARQ chase and incremental
/// redundancy combining), saturating at the fixed-point limits. Nothing is cleared
/// implicitly; a new transport block requires an explicit [`reset`](SoftBufferRx::reset).
#[derive(Debug)]
pub struct SoftBufferRx {
    max_block_len: usize,
    seg: Option<Segmentation>,
    rings: Vec<Vec<Llr>>,
}

impl SoftBufferRx {
    /// Returns a buffer able to hold codeblocks up to `max_block_len` bits.
    #[must_use]
    pub fn new(max_block_len: usize) -> Self {
        Self {
            max_block_len,
            seg: None,
            rings: Vec::new(),
        }
    }

    /// Prepares the buffer for a transport block, zeroing all combined values.
    ///
    /// # Errors
    ///
    /// Returns an error if `tbs` cannot be segmented or needs codeblocks longer than this
    /// buffer was sized for.
    pub fn reset(&mut self, tbs: usize) -> Result<(), Error> {
        let seg = Segmentation::new(tbs)?;
        if seg.large_block_len > self.max_block_len {
            return Err(Error::InsufficientBuffer(format!(
                "Transport block of {tbs} bits needs codeblocks of {} bits, but the buffer holds at most {}",
                seg.large_block_len, self.max_block_len
            )));
        }
        self.rings.clear();
        for block_index in 0 .. seg.num_blocks {
            self.rings
                .push(vec![0; coded_block_len(seg.block_len(block_index))]);
        }
        self.seg = Some(seg);
        Ok(())
    }

    /// Returns the segmentation this buffer was last reset for.
    #[must_use]
    pub fn segmentation(&self) -> Option<&Segmentation> {
        self.seg.as_ref()
    }

    /// Adds one transmission's soft values into the circular buffer of a codeblock,
    /// starting at position `k0` with wraparound. Values repeated within the transmission
    /// combine as well.
    ///
    /// # Errors
    ///
    /// Returns an error if the buffer has not been reset or the codeblock index is out of
    /// range.
    pub fn add_combine(
        &mut self,
        block_index: usize,
        k0: usize,
        llrs: &[Llr],
    ) -> Result<(), Error> {
        checked_segmentation(self.seg.as_ref(), block_index)?;
        let ring = &mut self.rings[block_index];
        for (offset, &llr) in llrs.iter().enumerate() {
            let pos = (k0 + offset) % ring.len();
            ring[pos] = ring[pos].saturating_add(llr);
        }
        Ok(())
    }

    /// Writes the combined values of a codeblock into `d_llrs` in triplet layout (any
    /// pre-existing contents will be cleared).
    ///
    /// # Errors
    ///
    /// Returns an error if the buffer has not been reset or the map does not match the
    /// codeblock length.
    pub fn deinterleave_into(
        &self,
        block_index: usize,
        map: &SubBlockMap,
        d_llrs: &mut Vec<Llr>,
    ) -> Result<(), Error> {
        let seg = checked_segmentation(self.seg.as_ref(), block_index)?;
        check_map(map, map.ring_len(), seg.block_len(block_index))?;
        let ring = &self.rings[block_index];
        d_llrs.clear();
        d_llrs.resize(ring.len(), 0);
        for (ring_index, &llr) in ring.iter().enumerate() {
            d_llrs[map.d_index(ring_index)] = llr;
        }
        Ok(())
    }
}

/// Returns the segmentation of a reset buffer, checking the codeblock index against it.
fn checked_segmentation(
    seg: Option<&Segmentation>,
    block_index: usize,
) -> Result<&Segmentation, Error> {
    let seg = seg.ok_or_else(|| {
        Error::InvalidInput("Soft buffer has not been reset for a transport block".to_string())
    })?;
    if block_index >= seg.num_blocks {
        return Err(Error::InvalidInput(format!(
            "Codeblock index {block_index} is not less than the codeblock count {}",
            seg.num_blocks
        )));
    }
    Ok(seg)
}

/// Checks a sub-block map and a coded length against the expected codeblock length.
fn check_map(map: &SubBlockMap, coded_len: usize, block_len: usize) -> Result<(), Error> {
    if map.block_len() != block_len || coded_len != coded_block_len(block_len) {
        return Err(Error::InvalidInput(format!(
            "Sub-block map for length {} and {coded_len} code bits do not fit a codeblock of {block_len} bits",
            map.block_len()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests_of_soft_buffer_tx {
    use super::*;
    use crate::utils;

    #[test]
    fn test_reset() {
        let mut buffer = SoftBufferTx::new(6144);
        // Invalid input
        assert!(buffer.reset(0).is_err());
        assert!(SoftBufferTx::new(40).reset(256).is_err());
        // Valid input
        buffer.reset(256).unwrap();
        assert_eq!(buffer.segmentation().unwrap().num_blocks, 1);
        assert!(!buffer.is_filled(0));
    }

    #[test]
    fn test_fill_and_read() {
        let map = SubBlockMap::new(40);
        let code_bits = utils::random_bits(132);
        let mut buffer = SoftBufferTx::new(6144);
        // Fill before reset fails
        assert!(buffer.fill(0, &code_bits, &map).is_err());
        buffer.reset(8).unwrap();
        // Read before fill fails
        let mut output = Vec::new();
        assert!(buffer.read_into(0, 0, 10, &mut output).is_err());
        buffer.fill(0, &code_bits, &map).unwrap();
        assert!(buffer.is_filled(0));
        // A full two turns of the ring repeat every bit twice, in ring order
        buffer.read_into(0, 2, 264, &mut output).unwrap();
        assert_eq!(output.len(), 264);
        for offset in 0 .. 264 {
            let ring_index = (2 + offset) % 132;
            assert_eq!(output[offset], code_bits[map.d_index(ring_index)]);
        }
    }

    #[test]
    fn test_read_covers_ring_across_redundancy_versions() {
        let map = SubBlockMap::new(40);
        let code_bits = utils::random_bits(132);
        let mut buffer = SoftBufferTx::new(6144);
        buffer.reset(8).unwrap();
        buffer.fill(0, &code_bits, &map).unwrap();
        // Reading half the ring from each redundancy version offset touches every
        // position at least once
        let mut covered = vec![false; 132];
        for rv in 0 .. 4 {
            let k0 = map.k0(rv).unwrap();
            for offset in 0 .. 66 {
                covered[(k0 + offset) % 132] = true;
            }
        }
        assert!(covered.into_iter().all(|touched| touched));
    }
}
