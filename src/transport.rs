//! Transport-block encoding and decoding through the full channel-coding chain

use crate::crc::Crc;
use crate::decoder::{EarlyStop, MapVariant, TurboDecoder};
use crate::segmentation::Segmentation;
use crate::soft_buffer::{SoftBufferRx, SoftBufferTx};
use crate::tables::TurboTables;
use crate::{encoder, rate_match, Bit, Error, Llr, CRC_LEN, LLR_INF, MAX_BLOCK_LEN};
use itertools::repeat_n;
use std::sync::Arc;

/// Redundancy version order used across the transmissions of one transport block
pub const RV_SEQUENCE: [usize; 4] = [0, 2, 3, 1];

/// Scheduling grant for one transmission of a transport block.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Grant {
    /// Transport block size in bits
    pub tbs: usize,
    /// Modulation order in bits per symbol
    pub modulation_order: usize,
    /// Total number of coded bits carried by this transmission
    pub num_coded_bits: usize,
    /// Redundancy version of this transmission, in `[0, 4)`
    pub redundancy_version: usize,
}

/// Encoder and decoder for whole transport blocks.
///
/// Encoding attaches the transport block checksum, segments into codeblocks with
/// per-codeblock checksums and filler where needed, turbo encodes each codeblock into a
/// transmit soft buffer, and selects the coded bits of the granted redundancy version.
/// Decoding combines a transmission into a receive soft buffer and works through the
/// codeblocks, stopping at the first one whose checksum cannot be satisfied.
#[derive(Debug)]
pub struct TbCodec {
    tables: Arc<TurboTables>,
    decoder: TurboDecoder,
    max_iterations: u32,
    block_bits: Vec<Bit>,
    code_bits: Vec<Bit>,
    d_llrs: Vec<Llr>,
    decoded_block: Vec<Bit>,
}

impl TbCodec {
    /// Returns a codec running the default decoder engine with the given iteration limit
    /// per codeblock.
    ///
    /// # Errors
    ///
    /// Returns an error if `max_iterations` is zero.
    ///
    /// # Examples
    ///
    /// ```
    /// use lte_turbo::tables::TurboTables;
    /// use lte_turbo::transport::TbCodec;
    /// use std::sync::Arc;
    ///
    /// let tables = Arc::new(TurboTables::new()?);
    /// let codec = TbCodec::new(tables, 8)?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn new(tables: Arc<TurboTables>, max_iterations: u32) -> Result<Self, Error> {
        Self::with_variant(tables, MapVariant::default(), max_iterations)
    }

    /// Returns a codec running a chosen decoder engine.
    ///
    /// # Errors
    ///
    /// Returns an error if `max_iterations` is zero.
    pub fn with_variant(
        tables: Arc<TurboTables>,
        variant: MapVariant,
        max_iterations: u32,
    ) -> Result<Self, Error> {
        if max_iterations == 0 {
            return Err(Error::InvalidInput(
                "At least one decoder iteration is required".to_string(),
            ));
        }
        let decoder = TurboDecoder::with_variant(Arc::clone(&tables), variant, MAX_BLOCK_LEN)?;
        Ok(Self {
            tables,
            decoder,
            max_iterations,
            block_bits: Vec::new(),
            code_bits: Vec::new(),
            d_llrs: Vec::new(),
            decoded_block: Vec::new(),
        })
    }

    /// Returns the decoder's exponential moving average of iterations per codeblock.
    #[must_use]
    pub fn average_iterations(&self) -> f64 {
        self.decoder.average_iterations()
    }

    /// Returns the number of iterations spent on the codeblock decoded most recently.
    #[must_use]
    pub fn last_iterations(&self) -> u32 {
        self.decoder.iterations(0)
    }

    /// Encodes one transmission of a transport block.
    ///
    /// At redundancy version 0 the transport block checksum is attached, the block is
    /// segmented and turbo encoded, and every codeblock's circular buffer in `tx` is
    /// filled. At later redundancy versions the buffers filled earlier are only re-read.
    /// Either way the returned codeword holds the `num_coded_bits` selected bits of all
    /// codeblocks in order.
    ///
    /// # Parameters
    ///
    /// - `grant`: Grant of this transmission.
    ///
    /// - `data`: Transport block, `grant.tbs` bits.
    ///
    /// - `tx`: Transmit soft buffer, reset for `grant.tbs`.
    ///
    /// # Errors
    ///
    /// Returns an error if the grant is inconsistent, `tx` was not reset for this
    /// transport block size, or a redundancy version other than 0 is requested before
    /// the buffers were filled at redundancy version 0.
    pub fn encode_tb(
        &mut self,
        grant: &Grant,
        data: &[Bit],
        tx: &mut SoftBufferTx,
    ) -> Result<Vec<Bit>, Error> {
        let seg = checked_buffer_segmentation(grant, tx.segmentation())?;
        if data.len() != grant.tbs {
            return Err(Error::InvalidInput(format!(
                "Transport block length {} does not match the granted size {}",
                data.len(),
                grant.tbs
            )));
        }
        if grant.redundancy_version == 0 {
            let mut tb_bits = data.to_vec();
            Crc::crc24a().attach(&mut tb_bits);
            let mut consumed = 0;
            for block_index in 0 .. seg.num_blocks {
                let block_len = seg.block_len(block_index);
                let payload_len = seg.payload_len(block_index);
                self.block_bits.clear();
                if block_index == 0 {
                    self.block_bits
                        .extend(repeat_n(Bit::Zero, seg.num_filler_bits));
                }
                self.block_bits
                    .extend(&tb_bits[consumed .. consumed + payload_len]);
                consumed += payload_len;
                if seg.has_block_crc() {
                    // The codeblock checksum covers the filler bits as well
                    Crc::crc24b().attach(&mut self.block_bits);
                }
                let table = self.tables.by_len(block_len)?;
                encoder::encode_into(&self.block_bits, &table.interleaver, &mut self.code_bits)?;
                tx.fill(block_index, &self.code_bits, &table.subblock)?;
            }
        }
        let mut codeword = Vec::with_capacity(grant.num_coded_bits);
        for block_index in 0 .. seg.num_blocks {
            let num_bits = rate_match::bits_for_block(
                grant.num_coded_bits,
                grant.modulation_order,
                seg.num_blocks,
                block_index,
            )?;
            let table = self.tables.by_len(seg.block_len(block_index))?;
            let k0 = table.subblock.k0(grant.redundancy_version)?;
            tx.read_into(block_index, k0, num_bits, &mut codeword)?;
        }
        Ok(codeword)
    }

    /// Combines one received transmission into `rx` and attempts to decode the transport
    /// block.
    ///
    /// The codeblocks are decoded in order, each gated on its checksum; the first
    /// codeblock whose checksum cannot be satisfied within the iteration limit aborts
    /// the transport block, since one bad codeblock already fails it. On success
    /// `decoded` holds the `grant.tbs` transport block bits.
    ///
    /// # Parameters
    ///
    /// - `grant`: Grant of this transmission.
    ///
    /// - `rx`: Receive soft buffer, reset for `grant.tbs` and accumulating across
    ///   retransmissions.
    ///
    /// - `llrs`: Soft values of this transmission, `grant.num_coded_bits` entries.
    ///
    /// - `decoded`: Buffer for the decoded transport block (any pre-existing contents
    ///   will be cleared).
    ///
    /// # Returns
    ///
    /// `true` if every codeblock checksum and the transport block checksum pass. A
    /// transport block that cannot be decoded is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the grant is inconsistent with the soft buffer or the number
    /// of soft values.
    pub fn decode_tb(
        &mut self,
        grant: &Grant,
        rx: &mut SoftBufferRx,
        llrs: &[Llr],
        decoded: &mut Vec<Bit>,
    ) -> Result<bool, Error> {
        let seg = checked_buffer_segmentation(grant, rx.segmentation())?;
        if llrs.len() != grant.num_coded_bits {
            return Err(Error::InvalidInput(format!(
                "Number of soft values {} does not match the granted {} coded bits",
                llrs.len(),
                grant.num_coded_bits
            )));
        }
        let mut offset = 0;
        for block_index in 0 .. seg.num_blocks {
            let num_bits = rate_match::bits_for_block(
                grant.num_coded_bits,
                grant.modulation_order,
                seg.num_blocks,
                block_index,
            )?;
            let table = self.tables.by_len(seg.block_len(block_index))?;
            let k0 = table.subblock.k0(grant.redundancy_version)?;
            rx.add_combine(block_index, k0, &llrs[offset .. offset + num_bits])?;
            offset += num_bits;
        }

        let block_crc = if seg.has_block_crc() {
            Crc::crc24b()
        } else {
            Crc::crc24a()
        };
        decoded.clear();
        for block_index in 0 .. seg.num_blocks {
            let block_len = seg.block_len(block_index);
            let table = self.tables.by_len(block_len)?;
            rx.deinterleave_into(block_index, &table.subblock, &mut self.d_llrs)?;
            let filler_len = if block_index == 0 {
                seg.num_filler_bits
            } else {
                0
            };
            // Filler bits are known zeros; pin their systematic values
            for k in 0 .. filler_len {
                self.d_llrs[3 * k] = -LLR_INF;
            }
            self.decoder.reset(block_len)?;
            self.decoder.run_all(
                &self.d_llrs,
                &mut self.decoded_block,
                self.max_iterations,
                Some(EarlyStop {
                    crc: block_crc,
                    filler_len,
                }),
            )?;
            if !block_crc.check(&self.decoded_block[filler_len ..]) {
                decoded.clear();
                return Ok(false);
            }
            let payload_end = if seg.has_block_crc() {
                self.decoded_block.len() - CRC_LEN
            } else {
                self.decoded_block.len()
            };
            decoded.extend(&self.decoded_block[filler_len .. payload_end]);
        }
        let crc_ok = Crc::crc24a().check(decoded);
        decoded.truncate(grant.tbs);
        Ok(crc_ok)
    }
}

/// Checks a soft buffer's segmentation against a grant and returns a copy of it.
fn checked_buffer_segmentation(
    grant: &Grant,
    seg: Option<&Segmentation>,
) -> Result<Segmentation, Error> {
    match seg {
        Some(seg) if seg.tbs == grant.tbs => Ok(*seg),
        Some(seg) => Err(Error::InvalidInput(format!(
            "Soft buffer was reset for a transport block of {} bits, but the grant carries {}",
            seg.tbs, grant.tbs
        ))),
        None => Err(Error::InvalidInput(
            "Soft buffer has not been reset for a transport block".to_string(),
        )),
    }
}
